mod amount;

pub mod helpers;
pub mod op;

pub use amount::{Amount, AmountConversionError, AMOUNT_DECIMAL_PLACES, MAX_AMOUNT_DIGITS};
