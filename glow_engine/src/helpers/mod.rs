mod formatting;
mod payment_reference;

pub use formatting::{format_donation_date, truncate_field};
pub use payment_reference::{is_valid_reference, new_payment_reference};
