//! # Domain Types
//!
//! Core domain types used throughout the Nano POS till.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐        ┌─────────────────────┐                 │
//! │  │       Shift         │ 1    N │   ExpenseRecord     │                 │
//! │  │  ─────────────────  │◄───────│  ─────────────────  │                 │
//! │  │  id (UUID)          │        │  id (UUID)          │                 │
//! │  │  location_id        │        │  shift_id (FK)      │                 │
//! │  │  opening_balance    │        │  amount_cents       │                 │
//! │  │  expected_cash      │        │  description        │                 │
//! │  │  status             │        └─────────────────────┘                 │
//! │  │  declared / variance│ 1    N ┌─────────────────────┐                 │
//! │  └─────────────────────┘◄───────│       Sale          │                 │
//! │                                 │  (sales subsystem)  │                 │
//! │  ┌─────────────────────┐        └─────────────────────┘                 │
//! │  │    UserProfile      │                                                │
//! │  │  id, role,          │   ┌─────────────────────┐                      │
//! │  │  assigned_location  │   │     Location        │                      │
//! │  └─────────────────────┘   │  id, name (config)  │                      │
//! │                            └─────────────────────┘                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! A shift exclusively owns its expense records. Shifts are never deleted:
//! closed shifts are retained as immutable history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::access::Role;
use crate::error::CoreResult;
use crate::money::Money;
use crate::reconciliation::{expected_cash, VarianceKind};

/// Identifier of a shop in the gallery.
pub type LocationId = i64;

// =============================================================================
// Shift Status
// =============================================================================

/// Persisted status of a shift.
///
/// NOT_OPEN is not a status: it is the absence of an OPEN shift for a
/// location (see [`crate::lifecycle::TillState`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    /// Drawer in use; accepts sales and expenses.
    Open,
    /// Reconciled and terminal.
    Closed,
}

impl ShiftStatus {
    /// Database/wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ShiftStatus::Open => "open",
            ShiftStatus::Closed => "closed",
        }
    }
}

// =============================================================================
// Shift
// =============================================================================

/// One cash-drawer operating period at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Shift {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Shop this drawer belongs to.
    pub location_id: LocationId,

    /// User who opened the shift.
    pub opened_by: String,

    /// Cash placed in the drawer at open. Fixed at creation.
    pub opening_balance_cents: i64,

    /// Running total of cash sales posted against this shift.
    /// Only ever increases; expenses do not reduce it.
    pub expected_cash_cents: i64,

    pub status: ShiftStatus,

    /// Physically counted cash, set at close.
    pub declared_cash_cents: Option<i64>,

    /// opening + accrual − expenses, set at close.
    pub expected_total_cents: Option<i64>,

    /// declared − expected total, set at close.
    pub variance_cents: Option<i64>,

    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,

    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Shift {
    /// Returns the opening balance as Money.
    #[inline]
    pub fn opening_balance(&self) -> Money {
        Money::from_cents(self.opening_balance_cents)
    }

    /// Returns the sales accrual as Money.
    #[inline]
    pub fn accrual(&self) -> Money {
        Money::from_cents(self.expected_cash_cents)
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Open
    }

    /// Declared cash, once closed.
    pub fn declared_cash(&self) -> Option<Money> {
        self.declared_cash_cents.map(Money::from_cents)
    }

    /// Expected total, once closed.
    pub fn expected_total(&self) -> Option<Money> {
        self.expected_total_cents.map(Money::from_cents)
    }

    /// Signed variance, once closed.
    pub fn variance(&self) -> Option<Money> {
        self.variance_cents.map(Money::from_cents)
    }

    /// Surplus/shortage classification, once closed.
    pub fn variance_kind(&self) -> Option<VarianceKind> {
        self.variance().map(VarianceKind::classify)
    }

    /// Cash that should physically be in the drawer right now.
    ///
    /// The stored accrual is gross; this nets out the withdrawals so a live
    /// screen can show both figures.
    pub fn expected_now(&self, expense_total: Money) -> CoreResult<Money> {
        expected_cash(self.opening_balance(), self.accrual(), expense_total)
    }
}

// =============================================================================
// Expense Record
// =============================================================================

/// A cash withdrawal from an open drawer. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ExpenseRecord {
    pub id: String,
    pub shift_id: String,
    /// Amount withdrawn, always > 0.
    pub amount_cents: i64,
    /// Reason for the withdrawal ("supplier payment").
    pub description: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl ExpenseRecord {
    /// Returns the amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Sale
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment. The only method that accrues into the drawer.
    Cash,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

/// A sale as handed to the sales subsystem by checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSale {
    pub location_id: LocationId,
    pub seller_id: String,
    pub shift_id: String,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
}

impl NewSale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A sale durably recorded by the sales subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub location_id: LocationId,
    pub seller_id: String,
    pub shift_id: String,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Users and Locations
// =============================================================================

/// The identity provider's profile row for the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    pub role: Role,
    /// Shop a seller is confined to. Owners usually have none.
    pub assigned_location_id: Option<LocationId>,
}

/// A shop in the gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
}

impl Location {
    pub fn new(id: LocationId, name: impl Into<String>) -> Self {
        Location {
            id,
            name: name.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn open_shift() -> Shift {
        Shift {
            id: "s-1".to_string(),
            location_id: 1,
            opened_by: "u-1".to_string(),
            opening_balance_cents: Money::from_major(5000).cents(),
            expected_cash_cents: Money::from_major(1200).cents(),
            status: ShiftStatus::Open,
            declared_cash_cents: None,
            expected_total_cents: None,
            variance_cents: None,
            opened_at: Utc::now(),
            closed_at: None,
        }
    }

    #[test]
    fn test_shift_money_accessors() {
        let shift = open_shift();
        assert_eq!(shift.opening_balance(), Money::from_major(5000));
        assert_eq!(shift.accrual(), Money::from_major(1200));
        assert!(shift.is_open());
        assert_eq!(shift.variance(), None);
        assert_eq!(shift.variance_kind(), None);
    }

    #[test]
    fn test_expected_now_nets_expenses() {
        let shift = open_shift();
        assert_eq!(
            shift.expected_now(Money::from_major(300)).unwrap(),
            Money::from_major(5900)
        );
        // Gross accrual is untouched
        assert_eq!(shift.accrual(), Money::from_major(1200));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&ShiftStatus::Open).unwrap(), "\"open\"");
        assert_eq!(ShiftStatus::Closed.as_str(), "closed");
    }

    #[test]
    fn test_payment_method_default() {
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
    }
}
