//! Shared types for the RateDesk workspace.

pub mod identifiers;
pub mod monetary;

pub use identifiers::OrderId;
pub use monetary::{Currency, CurrencyMismatchError, Money};
