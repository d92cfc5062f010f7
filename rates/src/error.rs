//! Rate engine error types.

use ratedesk_common::Currency;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in the rate engine.
#[derive(Debug, Error)]
pub enum RateError {
    /// Edit or lookup referenced a currency outside the seeded set.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(Currency),

    /// Edited rate is not a usable exchange rate.
    #[error("Invalid rate {rate} for {currency}")]
    InvalidRate { currency: Currency, rate: Decimal },
}

/// Result type for rate operations.
pub type RateResult<T> = Result<T, RateError>;
