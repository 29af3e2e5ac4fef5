mod amount;

pub mod helpers;
pub mod op;
mod secret;

pub use amount::{Amount, AmountConversionError, EURO_CURRENCY_CODE};
pub use secret::Secret;
