mod rupees;

pub mod op;
mod secret;

pub use rupees::{Paise, PaiseConversionError, INR_CURRENCY_CODE};
pub use secret::Secret;
