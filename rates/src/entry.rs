//! Per-currency rate entry and its validation lifecycle.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Validation lifecycle state of a rate entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateStatus {
    /// Last validation cycle completed; displayed and confirmed values match.
    Accepted,
    /// Edited locally, check not yet dispatched.
    Dirty,
    /// An asynchronous check for this entry is in flight.
    Pending,
}

impl RateStatus {
    /// Check if the entry has settled (no cycle open or scheduled).
    pub fn is_settled(&self) -> bool {
        matches!(self, RateStatus::Accepted)
    }

    /// Check if a validation cycle is open or scheduled.
    pub fn is_awaiting_check(&self) -> bool {
        !self.is_settled()
    }
}

/// One editable exchange rate against the base currency.
///
/// `rate` is what an editor sees and may be provisional; `confirmed_rate`
/// is the last value that survived a validation cycle and is the only one
/// downstream conversions may read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    /// Displayed, possibly provisional value.
    pub rate: Decimal,
    /// Last value that passed validation. Authoritative for conversions.
    pub confirmed_rate: Decimal,
    /// Lifecycle state.
    pub status: RateStatus,
}

impl RateEntry {
    /// Create an entry from a seed rate, already accepted.
    pub fn seeded(rate: Decimal) -> Self {
        Self {
            rate,
            confirmed_rate: rate,
            status: RateStatus::Accepted,
        }
    }

    /// Record an edit. The confirmed value stays untouched until a
    /// validation cycle completes.
    pub fn apply_edit(&mut self, new_rate: Decimal) {
        self.rate = new_rate;
        self.status = RateStatus::Dirty;
    }

    /// A check for this entry's current rate is now in flight.
    pub fn begin_validation(&mut self) {
        self.status = RateStatus::Pending;
    }

    /// Terminal step of a validation cycle.
    ///
    /// Accept blesses whatever the entry holds *now* — a later edit
    /// supersedes the value the check was issued with. Reject reverts to
    /// the confirmed value, discarding every edit since it. Either branch
    /// restores `rate == confirmed_rate`.
    pub fn resolve(&mut self, accepted: bool) {
        if accepted {
            self.confirmed_rate = self.rate;
        } else {
            self.rate = self.confirmed_rate;
        }
        self.status = RateStatus::Accepted;
    }

    /// Invariant check: an accepted entry's values must match.
    pub fn is_consistent(&self) -> bool {
        self.status != RateStatus::Accepted || self.rate == self.confirmed_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_seeded_entry_is_accepted() {
        let entry = RateEntry::seeded(dec!(1.1));

        assert_eq!(entry.status, RateStatus::Accepted);
        assert_eq!(entry.rate, entry.confirmed_rate);
        assert!(entry.is_consistent());
    }

    #[test]
    fn test_edit_leaves_confirmed_untouched() {
        let mut entry = RateEntry::seeded(dec!(1.1));

        entry.apply_edit(dec!(1.2));

        assert_eq!(entry.rate, dec!(1.2));
        assert_eq!(entry.confirmed_rate, dec!(1.1));
        assert_eq!(entry.status, RateStatus::Dirty);
    }

    #[test]
    fn test_accept_confirms_edit() {
        let mut entry = RateEntry::seeded(dec!(1.1));

        entry.apply_edit(dec!(1.2));
        entry.begin_validation();
        entry.resolve(true);

        assert_eq!(entry.confirmed_rate, dec!(1.2));
        assert_eq!(entry.status, RateStatus::Accepted);
        assert!(entry.is_consistent());
    }

    #[test]
    fn test_reject_reverts_to_confirmed() {
        let mut entry = RateEntry::seeded(dec!(1.1));

        entry.apply_edit(dec!(1.2));
        entry.begin_validation();
        entry.resolve(false);

        assert_eq!(entry.rate, dec!(1.1));
        assert_eq!(entry.confirmed_rate, dec!(1.1));
        assert_eq!(entry.status, RateStatus::Accepted);
    }

    #[test]
    fn test_accept_blesses_rate_at_resolution() {
        let mut entry = RateEntry::seeded(dec!(1.1));

        entry.apply_edit(dec!(1.2));
        entry.begin_validation();
        // A newer edit lands while the check is out.
        entry.apply_edit(dec!(1.3));
        entry.resolve(true);

        assert_eq!(entry.confirmed_rate, dec!(1.3));
        assert!(entry.is_consistent());
    }

    #[test]
    fn test_reject_discards_newer_edit() {
        let mut entry = RateEntry::seeded(dec!(1.1));

        entry.apply_edit(dec!(1.2));
        entry.begin_validation();
        entry.apply_edit(dec!(1.3));
        entry.resolve(false);

        assert_eq!(entry.rate, dec!(1.1));
        assert_eq!(entry.confirmed_rate, dec!(1.1));
    }

    proptest! {
        // Whatever order edits, dispatches, and resolutions arrive in,
        // an accepted entry never shows a value that differs from its
        // confirmed one.
        #[test]
        fn accepted_entries_always_converge(
            steps in prop::collection::vec((0u8..3, 1u32..1_000_000), 1..64)
        ) {
            let mut entry = RateEntry::seeded(Decimal::ONE);

            for (op, raw) in steps {
                match op {
                    0 => entry.apply_edit(Decimal::from(raw) / Decimal::from(1000)),
                    1 => entry.begin_validation(),
                    _ => entry.resolve(raw % 2 == 0),
                }
                prop_assert!(entry.is_consistent());
            }
        }
    }
}
