//! # Reconciliation (Arqueo)
//!
//! End-of-shift comparison of physically counted cash against the figure the
//! till says should be in the drawer.
//!
//! ## The Identity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   expected_total = opening_balance + sales_accrual − expense_sum        │
//! │   variance       = declared_cash − expected_total                       │
//! │                                                                         │
//! │   variance == 0  → Balanced                                             │
//! │   variance  > 0  → Surplus(variance)                                    │
//! │   variance  < 0  → Shortage(|variance|)                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Expenses are applied here and only here. The shift's accrual stays gross so
//! the audit trail keeps sales and withdrawals apart.
//!
//! Every step is checked: a figure outside `i64` cents is a validation error,
//! never a wrapped number.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

/// Signed classification of a variance. Three cases, never collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum VarianceKind {
    /// Drawer matches exactly.
    Balanced,
    /// More cash than expected, by this much.
    Surplus(Money),
    /// Less cash than expected, by this much (positive amount).
    Shortage(Money),
}

impl VarianceKind {
    /// Classifies a signed variance.
    pub fn classify(variance: Money) -> Self {
        if variance.is_zero() {
            VarianceKind::Balanced
        } else if variance.is_positive() {
            VarianceKind::Surplus(variance)
        } else {
            VarianceKind::Shortage(Money::from_cents(variance.cents().saturating_neg()))
        }
    }

    #[inline]
    pub fn is_balanced(&self) -> bool {
        matches!(self, VarianceKind::Balanced)
    }
}

impl fmt::Display for VarianceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarianceKind::Balanced => write!(f, "balanced"),
            VarianceKind::Surplus(amount) => write!(f, "surplus of {}", amount),
            VarianceKind::Shortage(amount) => write!(f, "shortage of {}", amount),
        }
    }
}

/// The numbers of one close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Reconciliation {
    pub opening_balance: Money,
    pub accrual: Money,
    pub expense_sum: Money,
    pub declared: Money,
    pub expected_total: Money,
    pub variance: Money,
}

impl Reconciliation {
    /// Applies the reconciliation identity.
    ///
    /// ## Errors
    /// `Validation(OutOfRange)` when an intermediate figure does not fit.
    ///
    /// ## Example
    /// ```rust
    /// use nano_core::money::Money;
    /// use nano_core::reconciliation::{Reconciliation, VarianceKind};
    ///
    /// let rec = Reconciliation::compute(
    ///     Money::from_major(5000), // opening
    ///     Money::from_major(1200), // sales
    ///     Money::from_major(300),  // supplier payment
    ///     Money::from_major(5900), // counted
    /// )
    /// .unwrap();
    /// assert_eq!(rec.kind(), VarianceKind::Balanced);
    /// ```
    pub fn compute(
        opening_balance: Money,
        accrual: Money,
        expense_sum: Money,
        declared: Money,
    ) -> CoreResult<Self> {
        let expected_total = expected_cash(opening_balance, accrual, expense_sum)?;
        let variance = declared
            .checked_sub(expected_total)
            .filter(|v| v.cents() != i64::MIN)
            .ok_or_else(|| out_of_range("variance"))?;

        Ok(Reconciliation {
            opening_balance,
            accrual,
            expense_sum,
            declared,
            expected_total,
            variance,
        })
    }

    #[inline]
    pub fn kind(&self) -> VarianceKind {
        VarianceKind::classify(self.variance)
    }
}

/// opening + accrual − expenses, checked.
pub fn expected_cash(opening_balance: Money, accrual: Money, expense_sum: Money) -> CoreResult<Money> {
    opening_balance
        .checked_add(accrual)
        .and_then(|gross| gross.checked_sub(expense_sum))
        .ok_or_else(|| out_of_range("expected total"))
}

fn out_of_range(field: &str) -> CoreError {
    CoreError::Validation(ValidationError::OutOfRange {
        field: field.to_string(),
        min: -i64::MAX,
        max: i64::MAX,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pesos(n: i64) -> Money {
        Money::from_major(n)
    }

    #[test]
    fn test_balanced_close() {
        let rec = Reconciliation::compute(pesos(5000), pesos(1200), pesos(300), pesos(5900)).unwrap();
        assert_eq!(rec.expected_total, pesos(5900));
        assert_eq!(rec.variance, Money::zero());
        assert_eq!(rec.kind(), VarianceKind::Balanced);
    }

    #[test]
    fn test_shortage_close() {
        let rec = Reconciliation::compute(pesos(5000), pesos(1200), pesos(300), pesos(5800)).unwrap();
        assert_eq!(rec.variance, pesos(-100));
        assert_eq!(rec.kind(), VarianceKind::Shortage(pesos(100)));
        assert_eq!(rec.kind().to_string(), "shortage of $100.00");
    }

    #[test]
    fn test_surplus_close() {
        let rec = Reconciliation::compute(pesos(5000), pesos(1200), pesos(300), pesos(5950)).unwrap();
        assert_eq!(rec.kind(), VarianceKind::Surplus(pesos(50)));
    }

    #[test]
    fn test_expenses_can_exceed_sales() {
        // Drawer started with 1000, no sales, 400 paid out
        let rec = Reconciliation::compute(pesos(1000), Money::zero(), pesos(400), pesos(600)).unwrap();
        assert_eq!(rec.expected_total, pesos(600));
        assert!(rec.kind().is_balanced());
    }

    #[test]
    fn test_identity_holds_for_cents() {
        for (b, a, e, d) in [(0, 1, 0, 0), (1999, 5, 7, 2000), (10, 0, 10, 1)] {
            let rec = Reconciliation::compute(
                Money::from_cents(b),
                Money::from_cents(a),
                Money::from_cents(e),
                Money::from_cents(d),
            )
            .unwrap();
            assert_eq!(rec.expected_total.cents(), b + a - e);
            assert_eq!(rec.variance.cents(), d - (b + a - e));
        }
    }

    #[test]
    fn test_overflow_is_an_error() {
        let top = Money::from_cents(i64::MAX);

        // accrual pushed past the top by the opening balance
        let err = Reconciliation::compute(pesos(1), top, Money::zero(), Money::zero()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "expected total"
        ));

        // huge declared against a negative expected total
        let err = Reconciliation::compute(Money::zero(), Money::zero(), Money::from_cents(1), top)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "variance"
        ));
    }

    #[test]
    fn test_largest_figures_still_reconcile() {
        let big = Money::from_cents(i64::MAX / 2);
        let rec = Reconciliation::compute(big, big, Money::zero(), Money::zero()).unwrap();
        assert_eq!(rec.expected_total.cents(), (i64::MAX / 2) * 2);
        assert_eq!(rec.kind(), VarianceKind::Shortage(rec.expected_total));
    }

    #[test]
    fn test_variance_kind_serialization() {
        let json = serde_json::to_string(&VarianceKind::Shortage(pesos(100))).unwrap();
        assert_eq!(json, r#"{"kind":"shortage","amount":10000}"#);
        let json = serde_json::to_string(&VarianceKind::Balanced).unwrap();
        assert_eq!(json, r#"{"kind":"balanced"}"#);
    }
}
