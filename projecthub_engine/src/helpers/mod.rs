mod price;
mod signature;

pub use price::{instalment_amount, parse_catalog_price, PriceError};
pub use signature::{payment_signature, verify_payment_signature};
