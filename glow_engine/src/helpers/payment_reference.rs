use rand::RngCore;

const REFERENCE_BYTES: usize = 16;

/// Generates a fresh random payment reference: 32 lowercase hex characters.
///
/// Payconiq requires the merchant to supply a reference when the payment is created, and quotes it back in every
/// callback.
pub fn new_payment_reference() -> String {
    let mut bytes = [0u8; REFERENCE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// A reference is acceptable if it is non-empty, at most 128 characters long, and made of ASCII alphanumerics, `-`
/// and `_`. This covers both our own hex references and Pay.nl transaction ids (e.g. `EX-1234-5678-9012`).
pub fn is_valid_reference(reference: &str) -> bool {
    !reference.is_empty()
        && reference.len() <= 128
        && reference.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
