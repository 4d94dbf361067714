//! # SQLite Store
//!
//! [`TillStore`] and [`SaleRecorder`] over `nano_db::Database`.
//!
//! The signed-in user is held here, standing in for the identity provider's
//! session: `sign_in` records the profile id, `end_session` forgets it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use nano_core::{
    CoreError, ExpenseRecord, LocationId, Money, NewSale, Sale, Shift, UserProfile,
};
use nano_db::{CloseShift, Database};

use super::{SaleRecorder, ShiftClosing, TillStore};
use crate::error::{TillError, TillResult};

#[derive(Debug, Clone)]
pub struct SqliteTillStore {
    db: Database,
    signed_in: Arc<RwLock<Option<String>>>,
}

impl SqliteTillStore {
    pub fn new(db: Database) -> Self {
        SqliteTillStore {
            db,
            signed_in: Arc::new(RwLock::new(None)),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Marks `user_id` as the signed-in user.
    ///
    /// ## Errors
    /// `PermissionDenied` when no profile exists for the id.
    pub async fn sign_in(&self, user_id: &str) -> TillResult<UserProfile> {
        let profile = self
            .db
            .profiles()
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| CoreError::denied(format!("unknown user {user_id}")))?;

        debug!(user_id, role = profile.role.as_str(), "Signed in");
        *self.signed_in.write().await = Some(profile.id.clone());
        Ok(profile)
    }
}

#[async_trait]
impl TillStore for SqliteTillStore {
    async fn fetch_open_shift(&self, location_id: LocationId) -> TillResult<Option<Shift>> {
        Ok(self.db.shifts().find_open(location_id).await?)
    }

    async fn fetch_shift(&self, shift_id: &str) -> TillResult<Option<Shift>> {
        Ok(self.db.shifts().get_by_id(shift_id).await?)
    }

    async fn create_shift(
        &self,
        location_id: LocationId,
        user_id: &str,
        opening_balance: Money,
    ) -> TillResult<Shift> {
        match self
            .db
            .shifts()
            .create(location_id, user_id, opening_balance.cents())
            .await
        {
            Ok(shift) => Ok(shift),
            Err(err) if err.is_open_shift_conflict() => {
                Err(CoreError::ConcurrentOpenConflict { location_id }.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn sum_expenses(&self, shift_id: &str) -> TillResult<Money> {
        let cents = self.db.expenses().sum_for_shift(shift_id).await?;
        Ok(Money::from_cents(cents))
    }

    async fn list_expenses(&self, shift_id: &str) -> TillResult<Vec<ExpenseRecord>> {
        Ok(self.db.expenses().list_for_shift(shift_id).await?)
    }

    async fn insert_expense(
        &self,
        shift_id: &str,
        amount: Money,
        description: &str,
    ) -> TillResult<Option<ExpenseRecord>> {
        Ok(self
            .db
            .expenses()
            .insert_if_open(shift_id, amount.cents(), description)
            .await?)
    }

    async fn update_shift_accrual(&self, shift_id: &str, delta: Money) -> TillResult<Option<Shift>> {
        Ok(self
            .db
            .shifts()
            .increment_accrual(shift_id, delta.cents())
            .await?)
    }

    async fn close_shift(&self, closing: &ShiftClosing) -> TillResult<Option<Shift>> {
        let rec = &closing.reconciliation;
        let close = CloseShift {
            shift_id: &closing.shift_id,
            seen_accrual_cents: rec.accrual.cents(),
            seen_expense_sum_cents: rec.expense_sum.cents(),
            declared_cash_cents: rec.declared.cents(),
            expected_total_cents: rec.expected_total.cents(),
            variance_cents: rec.variance.cents(),
            closed_at: closing.closed_at,
        };
        Ok(self.db.shifts().close(&close).await?)
    }

    async fn current_user(&self) -> TillResult<Option<UserProfile>> {
        let user_id = self.signed_in.read().await.clone();
        match user_id {
            Some(id) => Ok(self.db.profiles().get_by_id(&id).await?),
            None => Ok(None),
        }
    }

    async fn end_session(&self) -> TillResult<()> {
        if let Some(user_id) = self.signed_in.write().await.take() {
            debug!(%user_id, "Signed out");
        }
        Ok(())
    }

    async fn list_shifts_since(&self, since: DateTime<Utc>) -> TillResult<Vec<Shift>> {
        Ok(self.db.shifts().list_opened_since(since).await?)
    }
}

#[async_trait]
impl SaleRecorder for SqliteTillStore {
    async fn record_sale(&self, sale: &NewSale) -> TillResult<Sale> {
        self.db.sales().insert(sale).await.map_err(TillError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nano_db::DbConfig;

    async fn store() -> SqliteTillStore {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.profiles().upsert("s-2", "Luis", "seller", Some(2)).await.unwrap();
        SqliteTillStore::new(db)
    }

    #[tokio::test]
    async fn test_conflict_is_distinguishable() {
        let store = store().await;
        store.create_shift(2, "s-2", Money::zero()).await.unwrap();

        let err = store
            .create_shift(2, "s-2", Money::from_major(10))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TillError::Core(CoreError::ConcurrentOpenConflict { location_id: 2 })
        ));
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let store = store().await;
        assert!(store.current_user().await.unwrap().is_none());

        store.sign_in("s-2").await.unwrap();
        let user = store.current_user().await.unwrap().unwrap();
        assert_eq!(user.assigned_location_id, Some(2));

        store.end_session().await.unwrap();
        assert!(store.current_user().await.unwrap().is_none());

        assert!(store.sign_in("ghost").await.is_err());
    }
}
