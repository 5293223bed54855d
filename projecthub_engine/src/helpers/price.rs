//! Price arithmetic for catalog items and quote instalments.

use ph_common::Paise;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PriceError {
    #[error("The listed price '{0}' does not contain a usable amount")]
    Unparseable(String),
    #[error("The amount {0} is not a positive price")]
    NonPositive(i64),
}

/// Extracts the rupee amount from a catalog item's free-text price field. Admins enter prices in forms like
/// "50000", "INR 50,000" or "Rs. 50000/-"; billing keeps only the digits.
pub fn parse_catalog_price(listed: &str) -> Result<Paise, PriceError> {
    let digits: String = listed.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(PriceError::Unparseable(listed.to_string()));
    }
    let rupees: i64 = digits.parse().map_err(|_| PriceError::Unparseable(listed.to_string()))?;
    if rupees <= 0 {
        return Err(PriceError::NonPositive(rupees));
    }
    Ok(Paise::from_rupees(rupees))
}

/// The 50% instalment of a quote, in paise. Computed as `floor(quote / 2)` rupees, so an odd quote leaves the
/// extra rupee for the final instalment.
pub fn instalment_amount(final_quote_rupees: i64) -> Paise {
    Paise::from_rupees(final_quote_rupees / 2)
}
