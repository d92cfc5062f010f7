//! Rate validation boundary.

use async_trait::async_trait;
use ratedesk_common::Currency;
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Failure of the validation call itself, distinct from a rejection verdict.
#[derive(Debug, Clone, Error)]
#[error("Validator {validator} unavailable: {reason}")]
pub struct ValidatorError {
    /// Name of the validator that failed.
    pub validator: String,
    /// What went wrong.
    pub reason: String,
}

impl ValidatorError {
    /// Create a new validator error.
    pub fn new(validator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            validator: validator.into(),
            reason: reason.into(),
        }
    }
}

/// Trait for asynchronous rate checks.
#[async_trait]
pub trait RateValidator: Send + Sync {
    /// Get the validator name.
    fn name(&self) -> &str;

    /// Decide whether an edited rate is acceptable for the currency.
    ///
    /// `Ok(true)` accepts, `Ok(false)` rejects. `Err` means the check
    /// could not be carried out at all and is reported to callers as its
    /// own outcome, never as a rejection.
    async fn validate(&self, currency: &Currency, rate: Decimal) -> Result<bool, ValidatorError>;
}

/// Accepts a rate iff it stays within a configured drift of the seeded
/// reference rate.
pub struct BoundedDriftValidator {
    reference: HashMap<Currency, Decimal>,
    max_drift_bps: u32,
}

impl BoundedDriftValidator {
    /// Create a validator from reference rates and a drift ceiling in
    /// basis points.
    pub fn new(
        reference: impl IntoIterator<Item = (Currency, Decimal)>,
        max_drift_bps: u32,
    ) -> Self {
        Self {
            reference: reference.into_iter().collect(),
            max_drift_bps,
        }
    }
}

#[async_trait]
impl RateValidator for BoundedDriftValidator {
    fn name(&self) -> &str {
        "BOUNDED_DRIFT"
    }

    async fn validate(&self, currency: &Currency, rate: Decimal) -> Result<bool, ValidatorError> {
        let reference = *self.reference.get(currency).ok_or_else(|| {
            ValidatorError::new(self.name(), format!("no reference rate for {}", currency))
        })?;

        if rate <= Decimal::ZERO || reference.is_zero() {
            return Ok(false);
        }

        let drift_bps = ((rate - reference).abs() / reference) * Decimal::from(10_000);
        let accepted = drift_bps <= Decimal::from(self.max_drift_bps);

        debug!(
            currency = %currency,
            rate = %rate,
            drift_bps = %drift_bps.round_dp(1),
            accepted,
            "Drift check"
        );

        Ok(accepted)
    }
}

/// Mock validator for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockValidator {
    name: String,
    verdicts: dashmap::DashMap<Currency, bool>,
    failures: dashmap::DashMap<Currency, String>,
    delay: Option<std::time::Duration>,
    checked: std::sync::Mutex<Vec<(Currency, Decimal)>>,
    in_flight: std::sync::atomic::AtomicUsize,
    max_in_flight: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockValidator {
    /// Create a new mock validator that accepts everything.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verdicts: dashmap::DashMap::new(),
            failures: dashmap::DashMap::new(),
            delay: None,
            checked: std::sync::Mutex::new(Vec::new()),
            in_flight: std::sync::atomic::AtomicUsize::new(0),
            max_in_flight: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Make every check take this long to resolve.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Script the verdict for a currency (default is accept).
    pub fn set_verdict(&self, currency: Currency, accepted: bool) {
        self.verdicts.insert(currency, accepted);
    }

    /// Script a transport failure for a currency.
    pub fn set_failure(&self, currency: Currency, reason: impl Into<String>) {
        self.failures.insert(currency, reason.into());
    }

    /// Number of checks dispatched so far.
    pub fn call_count(&self) -> usize {
        self.checked.lock().unwrap().len()
    }

    /// Every (currency, rate) pair submitted for checking, in order.
    pub fn checked(&self) -> Vec<(Currency, Decimal)> {
        self.checked.lock().unwrap().clone()
    }

    /// Highest number of checks that were ever in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateValidator for MockValidator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn validate(&self, currency: &Currency, rate: Decimal) -> Result<bool, ValidatorError> {
        use std::sync::atomic::Ordering;

        self.checked.lock().unwrap().push((currency.clone(), rate));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(reason) = self.failures.get(currency) {
            return Err(ValidatorError::new(self.name(), reason.clone()));
        }

        Ok(self.verdicts.get(currency).map(|v| *v).unwrap_or(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn drift_validator() -> BoundedDriftValidator {
        BoundedDriftValidator::new(
            [(Currency::usd(), dec!(1.0)), (Currency::eur(), dec!(0.9))],
            200, // 2%
        )
    }

    #[tokio::test]
    async fn test_within_drift_accepted() {
        let validator = drift_validator();

        let verdict = validator
            .validate(&Currency::usd(), dec!(1.01))
            .await
            .unwrap();

        assert!(verdict);
    }

    #[tokio::test]
    async fn test_excess_drift_rejected() {
        let validator = drift_validator();

        let verdict = validator
            .validate(&Currency::usd(), dec!(1.5))
            .await
            .unwrap();

        assert!(!verdict);
    }

    #[tokio::test]
    async fn test_non_positive_rate_rejected() {
        let validator = drift_validator();

        let verdict = validator
            .validate(&Currency::usd(), dec!(0))
            .await
            .unwrap();

        assert!(!verdict);
    }

    #[tokio::test]
    async fn test_missing_reference_is_a_failure() {
        let validator = drift_validator();

        let result = validator.validate(&Currency::jpy(), dec!(150)).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_scripted_verdicts() {
        let mock = MockValidator::new("mock");
        mock.set_verdict(Currency::eur(), false);

        assert!(mock.validate(&Currency::usd(), dec!(1.1)).await.unwrap());
        assert!(!mock.validate(&Currency::eur(), dec!(0.9)).await.unwrap());
        assert_eq!(mock.call_count(), 2);
    }
}
