//! Rate engine: owns the per-currency entries, coalesces edits, and
//! reconciles asynchronous check outcomes.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use ratedesk_common::{Currency, Money};
use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::debounce::Debouncer;
use crate::entry::{RateEntry, RateStatus};
use crate::error::{RateError, RateResult};
use crate::validator::{RateValidator, ValidatorError};

/// Configuration for the rate engine.
#[derive(Debug, Clone)]
pub struct RateEngineConfig {
    /// Quiet period before an edited rate is sent for checking.
    pub debounce_window: Duration,
    /// Capacity of the event channel handed to subscribers.
    pub event_capacity: usize,
}

impl Default for RateEngineConfig {
    fn default() -> Self {
        Self {
            debounce_window: Duration::from_millis(400), // typing quiet period
            event_capacity: 64,
        }
    }
}

/// How a validation cycle settled.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// Edit passed; the confirmed value now matches the entry.
    Confirmed { rate: Decimal },
    /// Edit rejected; the entry reverted to its confirmed value.
    Reverted { rate: Decimal },
    /// The check itself failed; the entry reverted, failure surfaced.
    CheckFailed { rate: Decimal, reason: String },
}

/// Emitted once per completed validation cycle. UI layers subscribe to
/// repaint the affected row.
#[derive(Debug, Clone)]
pub struct RateEvent {
    /// Currency whose cycle settled.
    pub currency: Currency,
    /// How it settled.
    pub outcome: CheckOutcome,
}

/// The rate engine. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct RateEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    base: Currency,
    entries: DashMap<Currency, RateEntry>,
    in_flight: DashMap<Currency, ()>,
    debouncer: Debouncer<Currency>,
    validator: Arc<dyn RateValidator>,
    events: broadcast::Sender<RateEvent>,
    config: RateEngineConfig,
}

impl RateEngine {
    /// Create an engine over the seeded currency list. The key set is
    /// fixed from here on: edits to other currencies are errors.
    pub fn new(
        base: Currency,
        seeds: &[(Currency, Decimal)],
        validator: Arc<dyn RateValidator>,
        config: RateEngineConfig,
    ) -> Self {
        let entries = DashMap::new();
        for (currency, rate) in seeds {
            entries.insert(currency.clone(), RateEntry::seeded(*rate));
        }

        let (events, _) = broadcast::channel(config.event_capacity);

        Self {
            inner: Arc::new(EngineInner {
                base,
                entries,
                in_flight: DashMap::new(),
                debouncer: Debouncer::new(config.debounce_window),
                validator,
                events,
                config,
            }),
        }
    }

    /// The base currency all orders are totalled in.
    pub fn base(&self) -> &Currency {
        &self.inner.base
    }

    /// Seeded currency codes, sorted.
    pub fn currencies(&self) -> Vec<Currency> {
        let mut codes: Vec<Currency> = self
            .inner
            .entries
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        codes.sort();
        codes
    }

    /// Record a rate edit and schedule a debounced check for it.
    ///
    /// The displayed value updates immediately; the confirmed value moves
    /// only when the check settles. A burst of edits within the quiet
    /// window results in a single check carrying the last value.
    pub fn edit(&self, currency: &Currency, new_rate: Decimal) -> RateResult<()> {
        if new_rate <= Decimal::ZERO {
            return Err(RateError::InvalidRate {
                currency: currency.clone(),
                rate: new_rate,
            });
        }

        {
            let mut entry = self
                .inner
                .entries
                .get_mut(currency)
                .ok_or_else(|| RateError::UnknownCurrency(currency.clone()))?;
            entry.apply_edit(new_rate);
        }

        debug!(currency = %currency, rate = %new_rate, "Edit recorded, check scheduled");

        let inner = Arc::clone(&self.inner);
        let key = currency.clone();
        self.inner
            .debouncer
            .schedule(currency.clone(), async move {
                EngineInner::dispatch(inner, key);
            });

        Ok(())
    }

    /// Snapshot of a currency's entry.
    pub fn entry(&self, currency: &Currency) -> RateResult<RateEntry> {
        self.inner
            .entries
            .get(currency)
            .map(|entry| entry.clone())
            .ok_or_else(|| RateError::UnknownCurrency(currency.clone()))
    }

    /// Lifecycle state of a currency's entry.
    pub fn status(&self, currency: &Currency) -> RateResult<RateStatus> {
        Ok(self.entry(currency)?.status)
    }

    /// The last validated rate for a currency. This is the only value
    /// monetary conversions may read.
    pub fn confirmed_rate(&self, currency: &Currency) -> RateResult<Decimal> {
        Ok(self.entry(currency)?.confirmed_rate)
    }

    /// Convert an amount into the base currency at its confirmed rate.
    /// Provisional edits never influence the result.
    pub fn convert_to_base(&self, amount: &Money) -> RateResult<Money> {
        if amount.currency == self.inner.base {
            return Ok(amount.round());
        }
        let rate = self.confirmed_rate(&amount.currency)?;
        Ok(amount.convert(rate, self.inner.base.clone()))
    }

    /// Subscribe to settle events.
    pub fn subscribe(&self) -> broadcast::Receiver<RateEvent> {
        self.inner.events.subscribe()
    }

    /// Get engine statistics.
    pub fn stats(&self) -> RateEngineStats {
        let mut dirty = 0;
        let mut pending = 0;
        for entry in self.inner.entries.iter() {
            match entry.status {
                RateStatus::Dirty => dirty += 1,
                RateStatus::Pending => pending += 1,
                RateStatus::Accepted => {}
            }
        }

        RateEngineStats {
            entries: self.inner.entries.len(),
            dirty,
            pending,
            checks_in_flight: self.inner.in_flight.len(),
        }
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &RateEngineConfig {
        &self.inner.config
    }
}

impl EngineInner {
    /// Debounce expiry: open a validation cycle for the currency, or
    /// absorb the edit into the cycle already out.
    ///
    /// Runs synchronously so that superseding a *scheduled* edit can
    /// never tear down a dispatch in progress; the check itself goes to
    /// its own task, which nothing cancels.
    fn dispatch(inner: Arc<EngineInner>, currency: Currency) {
        // At most one cycle per currency. A dispatch landing while one is
        // out is absorbed into it: the open cycle's resolution reads the
        // entry's latest rate on accept, and a rejection discards every
        // edit since the confirmed value anyway.
        if inner.in_flight.insert(currency.clone(), ()).is_some() {
            debug!(currency = %currency, "Check already in flight, edit coalesced");
            return;
        }

        let submitted = match inner.entries.get_mut(&currency) {
            Some(mut entry) => {
                entry.begin_validation();
                entry.rate
            }
            None => {
                // Dispatches only originate from successful edits, so the
                // key must exist; a miss here is a bug in the caller.
                error!(currency = %currency, "Check dispatched for unseeded currency");
                inner.in_flight.remove(&currency);
                return;
            }
        };

        debug!(currency = %currency, rate = %submitted, "Validation started");
        tokio::spawn(async move {
            let verdict = inner.validator.validate(&currency, submitted).await;
            EngineInner::resolve(&inner, currency, verdict);
        });
    }

    /// Terminal step of a validation cycle: reconcile the verdict with
    /// the entry's current rate and notify subscribers.
    fn resolve(inner: &EngineInner, currency: Currency, verdict: Result<bool, ValidatorError>) {
        let outcome = {
            let Some(mut entry) = inner.entries.get_mut(&currency) else {
                inner.in_flight.remove(&currency);
                return;
            };

            match verdict {
                Ok(true) => {
                    // Read-back, not the submitted value: an edit that
                    // landed mid-flight is blessed with this accept.
                    entry.resolve(true);
                    info!(
                        currency = %currency,
                        rate = %entry.confirmed_rate,
                        "Rate confirmed"
                    );
                    CheckOutcome::Confirmed {
                        rate: entry.confirmed_rate,
                    }
                }
                Ok(false) => {
                    entry.resolve(false);
                    info!(
                        currency = %currency,
                        rate = %entry.confirmed_rate,
                        "Edit rejected, rate reverted"
                    );
                    CheckOutcome::Reverted {
                        rate: entry.confirmed_rate,
                    }
                }
                Err(e) => {
                    entry.resolve(false);
                    warn!(
                        currency = %currency,
                        error = %e,
                        "Check failed, rate reverted"
                    );
                    CheckOutcome::CheckFailed {
                        rate: entry.confirmed_rate,
                        reason: e.to_string(),
                    }
                }
            }
        };

        inner.in_flight.remove(&currency);
        let _ = inner.events.send(RateEvent { currency, outcome });
    }
}

/// Engine statistics.
#[derive(Debug, Clone)]
pub struct RateEngineStats {
    pub entries: usize,
    pub dirty: usize,
    pub pending: usize,
    pub checks_in_flight: usize,
}
