//! # Store Boundary
//!
//! What the engine needs from persistence, as async traits. The engine is
//! generic over these so tests can wrap or replace the SQLite adapter.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operation              Must guarantee                                  │
//! │  ─────────              ──────────────                                  │
//! │  create_shift           CoreError::ConcurrentOpenConflict when the      │
//! │                         location already has an OPEN shift              │
//! │  update_shift_accrual   atomic increment; None when not OPEN            │
//! │  insert_expense         OPEN check and insert in one step; None when    │
//! │                         not OPEN                                        │
//! │  close_shift            all-or-nothing; None when the shift moved       │
//! │                         since the figures in ShiftClosing were read     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use nano_core::{
    ExpenseRecord, LocationId, Money, NewSale, Reconciliation, Sale, Shift, UserProfile,
};

use crate::error::TillResult;

pub use sqlite::SqliteTillStore;

/// A close, with the figures it was computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftClosing {
    pub shift_id: String,
    pub reconciliation: Reconciliation,
    pub closed_at: DateTime<Utc>,
}

#[async_trait]
pub trait TillStore: Send + Sync {
    /// The OPEN shift for a location, if any.
    async fn fetch_open_shift(&self, location_id: LocationId) -> TillResult<Option<Shift>>;

    async fn fetch_shift(&self, shift_id: &str) -> TillResult<Option<Shift>>;

    /// Creates a fresh OPEN shift with zero accrual.
    async fn create_shift(
        &self,
        location_id: LocationId,
        user_id: &str,
        opening_balance: Money,
    ) -> TillResult<Shift>;

    async fn sum_expenses(&self, shift_id: &str) -> TillResult<Money>;

    async fn list_expenses(&self, shift_id: &str) -> TillResult<Vec<ExpenseRecord>>;

    async fn insert_expense(
        &self,
        shift_id: &str,
        amount: Money,
        description: &str,
    ) -> TillResult<Option<ExpenseRecord>>;

    async fn update_shift_accrual(&self, shift_id: &str, delta: Money) -> TillResult<Option<Shift>>;

    async fn close_shift(&self, closing: &ShiftClosing) -> TillResult<Option<Shift>>;

    /// Profile of the signed-in user, if anyone is signed in.
    async fn current_user(&self) -> TillResult<Option<UserProfile>>;

    /// Signs the current user out of the identity provider.
    async fn end_session(&self) -> TillResult<()>;

    /// Shifts opened at or after `since`, any location.
    async fn list_shifts_since(&self, since: DateTime<Utc>) -> TillResult<Vec<Shift>>;
}

/// The sales subsystem, as seen by checkout.
#[async_trait]
pub trait SaleRecorder: Send + Sync {
    /// Durably records a sale.
    async fn record_sale(&self, sale: &NewSale) -> TillResult<Sale>;
}
