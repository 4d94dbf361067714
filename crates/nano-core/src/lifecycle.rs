//! # Till Lifecycle
//!
//! The per-location till as an explicit tagged state with a pure transition
//! function. The engine feeds store results through [`TillState::apply`] so
//! illegal moves are rejected in one place instead of being re-derived from
//! loose flags at every call site.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │              Opened(shift)                Closed(shift)                 │
//! │   ┌─────────┐ ─────────────► ┌──────────┐ ─────────────► ┌──────────┐   │
//! │   │ NotOpen │                │   Open   │                │  Closed  │   │
//! │   └─────────┘                └──────────┘                └──────────┘   │
//! │                                │      ▲                     │           │
//! │                 SaleAccrued(t) │      │ Opened(same id)     │ Opened    │
//! │                                └──────┘ (relay / resume)    │ (new)     │
//! │                                                             ▼           │
//! │                                                  a fresh shift: Open    │
//! │                                                                         │
//! │   Accrue / close on NotOpen or Closed  → NoActiveShift                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A closed shift never becomes open again: `Closed + Opened` always carries a
//! *different* shift.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Shift, ShiftStatus};
use crate::validation::validate_sale_total;

/// What the terminal knows about a location's drawer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "shift", rename_all = "snake_case")]
pub enum TillState {
    /// No OPEN shift exists for the location.
    NotOpen,
    /// The drawer is in use.
    Open(Shift),
    /// The last shift was reconciled.
    Closed(Shift),
}

/// An event that moves the till.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TillTransition {
    /// A shift was created or found OPEN in the store.
    Opened(Shift),
    /// A sale was accrued into the open shift.
    SaleAccrued(Money),
    /// The store accepted the close; carries the final snapshot.
    Closed(Shift),
}

impl TillState {
    /// Builds the state implied by a stored shift (or its absence).
    pub fn from_shift(shift: Option<Shift>) -> Self {
        match shift {
            None => TillState::NotOpen,
            Some(s) if s.status == ShiftStatus::Open => TillState::Open(s),
            Some(s) => TillState::Closed(s),
        }
    }

    /// The shift the state refers to, if any.
    pub fn shift(&self) -> Option<&Shift> {
        match self {
            TillState::NotOpen => None,
            TillState::Open(s) | TillState::Closed(s) => Some(s),
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self, TillState::Open(_))
    }

    /// Returns the open shift or `NoActiveShift` with the given context.
    pub fn require_open(&self, context: &str) -> CoreResult<&Shift> {
        match self {
            TillState::Open(s) => Ok(s),
            _ => Err(CoreError::no_active_shift(context)),
        }
    }

    /// Applies a transition.
    ///
    /// ## Errors
    /// - `NoActiveShift` for an accrual or close outside `Open`
    /// - `ShiftAlreadyOpen` when a different shift is opened over an open one
    /// - `ShiftNotFound` when a close refers to another shift
    /// - `Validation` for a non-positive accrual, or one that would overflow
    pub fn apply(self, transition: TillTransition) -> CoreResult<TillState> {
        match (self, transition) {
            (TillState::NotOpen, TillTransition::Opened(shift))
            | (TillState::Closed(_), TillTransition::Opened(shift)) => {
                ensure_status(&shift, ShiftStatus::Open)?;
                Ok(TillState::Open(shift))
            }

            (TillState::Open(current), TillTransition::Opened(shift)) => {
                if current.id != shift.id {
                    return Err(CoreError::ShiftAlreadyOpen {
                        location_id: current.location_id,
                        shift_id: current.id,
                    });
                }
                ensure_status(&shift, ShiftStatus::Open)?;
                Ok(TillState::Open(shift))
            }

            (TillState::Open(mut shift), TillTransition::SaleAccrued(total)) => {
                let total = validate_sale_total(total)?;
                // The drawer's gross (opening + accrual) must stay representable
                // so the shift can always be reconciled.
                let accrual = shift
                    .accrual()
                    .checked_add(total)
                    .filter(|a| shift.opening_balance().checked_add(*a).is_some())
                    .ok_or_else(|| ValidationError::OutOfRange {
                        field: "sales accrual".to_string(),
                        min: 0,
                        max: i64::MAX - shift.opening_balance_cents,
                    })?;
                shift.expected_cash_cents = accrual.cents();
                Ok(TillState::Open(shift))
            }

            (TillState::Open(current), TillTransition::Closed(closed)) => {
                if current.id != closed.id {
                    return Err(CoreError::ShiftNotFound(closed.id));
                }
                ensure_status(&closed, ShiftStatus::Closed)?;
                Ok(TillState::Closed(closed))
            }

            (_, TillTransition::SaleAccrued(_)) => {
                Err(CoreError::no_active_shift("cannot sell without opening the till"))
            }

            (_, TillTransition::Closed(_)) => {
                Err(CoreError::no_active_shift("there is no open till to close"))
            }
        }
    }
}

fn ensure_status(shift: &Shift, expected: ShiftStatus) -> CoreResult<()> {
    if shift.status != expected {
        return Err(CoreError::no_active_shift(format!(
            "shift {} is {}",
            shift.id,
            shift.status.as_str()
        )));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn shift(id: &str, status: ShiftStatus) -> Shift {
        Shift {
            id: id.to_string(),
            location_id: 1,
            opened_by: "seller-1".to_string(),
            opening_balance_cents: 500_000,
            expected_cash_cents: 0,
            status,
            declared_cash_cents: None,
            expected_total_cents: None,
            variance_cents: None,
            opened_at: Utc::now(),
            closed_at: None,
        }
    }

    #[test]
    fn test_open_from_not_open() {
        let state = TillState::NotOpen
            .apply(TillTransition::Opened(shift("a", ShiftStatus::Open)))
            .unwrap();
        assert!(state.is_open());
        assert_eq!(state.shift().unwrap().id, "a");
    }

    #[test]
    fn test_resume_same_shift() {
        let state = TillState::Open(shift("a", ShiftStatus::Open))
            .apply(TillTransition::Opened(shift("a", ShiftStatus::Open)))
            .unwrap();
        assert_eq!(state.shift().unwrap().id, "a");
    }

    #[test]
    fn test_second_open_shift_rejected() {
        let err = TillState::Open(shift("a", ShiftStatus::Open))
            .apply(TillTransition::Opened(shift("b", ShiftStatus::Open)))
            .unwrap_err();
        assert!(matches!(err, CoreError::ShiftAlreadyOpen { shift_id, .. } if shift_id == "a"));
    }

    #[test]
    fn test_accrual_adds_to_open_shift() {
        let state = TillState::Open(shift("a", ShiftStatus::Open))
            .apply(TillTransition::SaleAccrued(Money::from_major(700)))
            .unwrap()
            .apply(TillTransition::SaleAccrued(Money::from_major(500)))
            .unwrap();
        assert_eq!(state.shift().unwrap().accrual(), Money::from_major(1200));
    }

    #[test]
    fn test_accrual_overflow_rejected() {
        let mut near_top = shift("a", ShiftStatus::Open);
        near_top.expected_cash_cents = i64::MAX - near_top.opening_balance_cents - 100;

        let state = TillState::Open(near_top)
            .apply(TillTransition::SaleAccrued(Money::from_cents(100)))
            .unwrap();
        let err = state
            .apply(TillTransition::SaleAccrued(Money::from_cents(1)))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "sales accrual"
        ));
    }

    #[test]
    fn test_non_positive_accrual_rejected() {
        let err = TillState::Open(shift("a", ShiftStatus::Open))
            .apply(TillTransition::SaleAccrued(Money::zero()))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_accrual_without_open_shift() {
        let err = TillState::NotOpen
            .apply(TillTransition::SaleAccrued(Money::from_major(10)))
            .unwrap_err();
        assert!(matches!(err, CoreError::NoActiveShift { .. }));
    }

    #[test]
    fn test_closed_is_terminal_for_accrual_and_close() {
        let closed = TillState::Closed(shift("a", ShiftStatus::Closed));

        let err = closed
            .clone()
            .apply(TillTransition::SaleAccrued(Money::from_major(10)))
            .unwrap_err();
        assert!(matches!(err, CoreError::NoActiveShift { .. }));

        let err = closed
            .apply(TillTransition::Closed(shift("a", ShiftStatus::Closed)))
            .unwrap_err();
        assert!(matches!(err, CoreError::NoActiveShift { .. }));
    }

    #[test]
    fn test_close_requires_matching_id() {
        let err = TillState::Open(shift("a", ShiftStatus::Open))
            .apply(TillTransition::Closed(shift("b", ShiftStatus::Closed)))
            .unwrap_err();
        assert!(matches!(err, CoreError::ShiftNotFound(id) if id == "b"));
    }

    #[test]
    fn test_fresh_shift_after_close() {
        let state = TillState::Open(shift("a", ShiftStatus::Open))
            .apply(TillTransition::Closed(shift("a", ShiftStatus::Closed)))
            .unwrap()
            .apply(TillTransition::Opened(shift("b", ShiftStatus::Open)))
            .unwrap();
        assert_eq!(state.shift().unwrap().id, "b");
    }

    #[test]
    fn test_from_shift() {
        assert_eq!(TillState::from_shift(None), TillState::NotOpen);
        assert!(TillState::from_shift(Some(shift("a", ShiftStatus::Open))).is_open());
        assert!(matches!(
            TillState::from_shift(Some(shift("a", ShiftStatus::Closed))),
            TillState::Closed(_)
        ));
    }
}
