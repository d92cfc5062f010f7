//! RateDesk Rate Engine
//!
//! Debounced editing and asynchronous validation of per-currency exchange
//! rates against a base currency.
//!
//! # Features
//!
//! - Optimistic edits with confirmed-value reconciliation
//! - Per-currency debounce coalescing rapid edits into a single check
//! - At most one validation cycle in flight per currency
//! - Settle events for UI layers
//!
//! # Example
//!
//! ```rust,ignore
//! use ratedesk_rates::{BoundedDriftValidator, RateEngine, RateEngineConfig};
//! use ratedesk_common::Currency;
//!
//! let seeds = [(Currency::eur(), rate) /* … */];
//! let validator = Arc::new(BoundedDriftValidator::new(seeds.clone(), 500));
//! let engine = RateEngine::new(Currency::usd(), &seeds, validator, RateEngineConfig::default());
//!
//! engine.edit(&Currency::eur(), new_rate)?;
//! // … the debounced check settles asynchronously …
//! let confirmed = engine.confirmed_rate(&Currency::eur())?;
//! ```

pub mod debounce;
pub mod engine;
pub mod entry;
pub mod error;
pub mod validator;

pub use debounce::Debouncer;
pub use engine::{CheckOutcome, RateEngine, RateEngineConfig, RateEngineStats, RateEvent};
pub use entry::{RateEntry, RateStatus};
pub use error::{RateError, RateResult};
#[cfg(any(test, feature = "test-utils"))]
pub use validator::MockValidator;
pub use validator::{BoundedDriftValidator, RateValidator, ValidatorError};
