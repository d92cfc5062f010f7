//! Order store error types.

use ratedesk_common::{Currency, OrderId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in the order store.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Edit addressed to an order id not in the book.
    #[error("Unknown order: {0}")]
    UnknownOrder(OrderId),

    /// Price must be non-negative.
    #[error("Invalid price: {0}")]
    InvalidPrice(Decimal),

    /// Totalling found no confirmed rate for a currency.
    #[error("No confirmed rate for {0}")]
    MissingRate(Currency),
}

/// Result type for order operations.
pub type OrderResult<T> = Result<T, OrderError>;
