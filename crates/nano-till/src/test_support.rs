//! Shared fixtures for engine tests: an in-memory gallery and a store wrapper
//! that injects races and write failures.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use nano_core::{
    ExpenseRecord, LocationId, Money, NewSale, Sale, SessionContext, Shift, UserProfile,
};
use nano_db::{Database, DbConfig};

use crate::engine::TillEngine;
use crate::error::{TillError, TillResult};
use crate::store::{SaleRecorder, ShiftClosing, SqliteTillStore, TillStore};

pub struct Harness {
    pub engine: TillEngine<SqliteTillStore>,
    pub store: SqliteTillStore,
}

impl Harness {
    /// Signs `user_id` in and establishes their session.
    pub async fn sign_in(&self, user_id: &str) -> SessionContext {
        self.store.sign_in(user_id).await.unwrap();
        self.engine.establish_session().await.unwrap()
    }
}

/// One owner, one seller per default shop, and a second seller at shop 2.
pub async fn harness() -> Harness {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let profiles = db.profiles();
    profiles.upsert("owner", "Marta", "dueño", None).await.unwrap();
    for location in 1..=4 {
        profiles
            .upsert(&format!("seller-{location}"), "Vendedor", "seller", Some(location))
            .await
            .unwrap();
    }
    profiles.upsert("seller-2b", "Relevo", "seller", Some(2)).await.unwrap();

    let store = SqliteTillStore::new(db);
    Harness {
        engine: TillEngine::new(store.clone()),
        store,
    }
}

/// Delegates to SQLite, misbehaving on request.
pub struct FaultyStore {
    inner: SqliteTillStore,
    hide_open_once: AtomicBool,
    fail_accrual: AtomicBool,
    stale_closes: AtomicU32,
}

impl FaultyStore {
    pub fn new(inner: SqliteTillStore) -> Self {
        FaultyStore {
            inner,
            hide_open_once: AtomicBool::new(false),
            fail_accrual: AtomicBool::new(false),
            stale_closes: AtomicU32::new(0),
        }
    }

    /// The next open-shift lookup sees nothing, as if another terminal's
    /// insert landed just after it.
    pub fn hide_open_shift_once(&self) {
        self.hide_open_once.store(true, Ordering::SeqCst);
    }

    pub fn fail_accruals(&self) {
        self.fail_accrual.store(true, Ordering::SeqCst);
    }

    /// The next `n` closes report a moved shift without writing.
    pub fn make_closes_stale(&self, n: u32) {
        self.stale_closes.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl TillStore for FaultyStore {
    async fn fetch_open_shift(&self, location_id: LocationId) -> TillResult<Option<Shift>> {
        if self.hide_open_once.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.fetch_open_shift(location_id).await
    }

    async fn fetch_shift(&self, shift_id: &str) -> TillResult<Option<Shift>> {
        self.inner.fetch_shift(shift_id).await
    }

    async fn create_shift(
        &self,
        location_id: LocationId,
        user_id: &str,
        opening_balance: Money,
    ) -> TillResult<Shift> {
        self.inner.create_shift(location_id, user_id, opening_balance).await
    }

    async fn sum_expenses(&self, shift_id: &str) -> TillResult<Money> {
        self.inner.sum_expenses(shift_id).await
    }

    async fn list_expenses(&self, shift_id: &str) -> TillResult<Vec<ExpenseRecord>> {
        self.inner.list_expenses(shift_id).await
    }

    async fn insert_expense(
        &self,
        shift_id: &str,
        amount: Money,
        description: &str,
    ) -> TillResult<Option<ExpenseRecord>> {
        self.inner.insert_expense(shift_id, amount, description).await
    }

    async fn update_shift_accrual(&self, shift_id: &str, delta: Money) -> TillResult<Option<Shift>> {
        if self.fail_accrual.load(Ordering::SeqCst) {
            return Err(TillError::persistence("database is locked"));
        }
        self.inner.update_shift_accrual(shift_id, delta).await
    }

    async fn close_shift(&self, closing: &ShiftClosing) -> TillResult<Option<Shift>> {
        let stale = self
            .stale_closes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if stale {
            return Ok(None);
        }
        self.inner.close_shift(closing).await
    }

    async fn current_user(&self) -> TillResult<Option<UserProfile>> {
        self.inner.current_user().await
    }

    async fn end_session(&self) -> TillResult<()> {
        self.inner.end_session().await
    }

    async fn list_shifts_since(&self, since: DateTime<Utc>) -> TillResult<Vec<Shift>> {
        self.inner.list_shifts_since(since).await
    }
}

#[async_trait]
impl SaleRecorder for FaultyStore {
    async fn record_sale(&self, sale: &NewSale) -> TillResult<Sale> {
        self.inner.record_sale(sale).await
    }
}
