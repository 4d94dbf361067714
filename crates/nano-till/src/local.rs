//! # Local Till View
//!
//! What one terminal shows between authoritative reads. Sales are noted here
//! for display the moment they are confirmed locally; the next read from the
//! store replaces the estimate, whatever it was.
//!
//! ```text
//!   note_sale(t) ──► pending += t ──► displayed_accrual()
//!                                            │
//!   reconcile(store snapshot) ◄──────────────┘
//!        │
//!        ├── estimate == snapshot ──► InSync
//!        └── estimate != snapshot ──► Drift { local, authoritative }
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use nano_core::validation::validate_sale_total;
use nano_core::{CoreResult, Money, Shift, TillState, ValidationError};

/// Outcome of replacing the local estimate with the store's snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "sync", rename_all = "snake_case")]
pub enum SyncOutcome {
    InSync,
    /// Someone else moved the shift (another cashier on a relayed shift, a
    /// close from another terminal) or a local note never reached the store.
    Drift { local: Money, authoritative: Money },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTill {
    state: TillState,
    pending: Money,
}

impl LocalTill {
    pub fn new(state: TillState) -> Self {
        LocalTill {
            state,
            pending: Money::zero(),
        }
    }

    pub fn from_shift(shift: Option<Shift>) -> Self {
        Self::new(TillState::from_shift(shift))
    }

    pub fn state(&self) -> &TillState {
        &self.state
    }

    /// Adds a sale to the display estimate.
    ///
    /// ## Errors
    /// `NoActiveShift` unless the local view shows an open till.
    pub fn note_sale(&mut self, total: Money) -> CoreResult<()> {
        self.state.require_open("cannot sell without opening the till")?;
        let total = validate_sale_total(total)?;
        self.pending = self
            .pending
            .checked_add(total)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "pending sales".to_string(),
                min: 0,
                max: i64::MAX,
            })?;
        Ok(())
    }

    /// Accrual to show: last authoritative value plus unconfirmed notes.
    pub fn displayed_accrual(&self) -> Money {
        let base = self.state.shift().map(Shift::accrual).unwrap_or_default();
        base.saturating_add(self.pending)
    }

    pub fn pending(&self) -> Money {
        self.pending
    }

    /// Replaces the local view with `authoritative` and reports whether the
    /// estimate matched it.
    pub fn reconcile(&mut self, authoritative: Option<Shift>) -> SyncOutcome {
        let local = self.displayed_accrual();
        let same_shift = match (self.state.shift(), authoritative.as_ref()) {
            (Some(mine), Some(theirs)) => mine.id == theirs.id,
            (None, None) => true,
            _ => false,
        };

        self.state = TillState::from_shift(authoritative);
        self.pending = Money::zero();

        let authoritative = self.displayed_accrual();
        if same_shift && local == authoritative {
            SyncOutcome::InSync
        } else {
            warn!(local = %local, authoritative = %authoritative, "Local till drifted from store");
            SyncOutcome::Drift {
                local,
                authoritative,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use nano_core::{CoreError, ShiftStatus};

    fn open_shift(id: &str, accrual: i64) -> Shift {
        Shift {
            id: id.to_string(),
            location_id: 1,
            opened_by: "seller-1".to_string(),
            opening_balance_cents: 0,
            expected_cash_cents: accrual * 100,
            status: ShiftStatus::Open,
            declared_cash_cents: None,
            expected_total_cents: None,
            variance_cents: None,
            opened_at: Utc::now(),
            closed_at: None,
        }
    }

    #[test]
    fn test_confirmed_estimate_is_in_sync() {
        let mut till = LocalTill::from_shift(Some(open_shift("a", 100)));
        till.note_sale(Money::from_major(50)).unwrap();
        assert_eq!(till.displayed_accrual(), Money::from_major(150));

        let outcome = till.reconcile(Some(open_shift("a", 150)));
        assert_eq!(outcome, SyncOutcome::InSync);
        assert_eq!(till.pending(), Money::zero());
    }

    #[test]
    fn test_other_cashier_causes_drift() {
        let mut till = LocalTill::from_shift(Some(open_shift("a", 100)));
        till.note_sale(Money::from_major(50)).unwrap();

        let outcome = till.reconcile(Some(open_shift("a", 230)));
        assert_eq!(
            outcome,
            SyncOutcome::Drift {
                local: Money::from_major(150),
                authoritative: Money::from_major(230),
            }
        );
        // The store wins
        assert_eq!(till.displayed_accrual(), Money::from_major(230));
    }

    #[test]
    fn test_closed_elsewhere_is_drift() {
        let mut till = LocalTill::from_shift(Some(open_shift("a", 0)));
        let outcome = till.reconcile(None);
        assert!(matches!(outcome, SyncOutcome::Drift { .. }));
        assert!(!till.state().is_open());
    }

    #[test]
    fn test_note_sale_requires_open_till() {
        let mut till = LocalTill::from_shift(None);
        let err = till.note_sale(Money::from_major(10)).unwrap_err();
        assert!(matches!(err, CoreError::NoActiveShift { .. }));

        let mut till = LocalTill::from_shift(Some(open_shift("a", 0)));
        assert!(till.note_sale(Money::zero()).is_err());
    }
}
