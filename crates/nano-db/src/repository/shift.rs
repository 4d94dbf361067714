//! # Shift Repository
//!
//! Database operations for till shifts.
//!
//! ## Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create()             INSERT ... status = 'open'                        │
//! │                       └── partial UNIQUE index rejects a second OPEN    │
//! │                           shift for the location                        │
//! │                                                                         │
//! │  increment_accrual()  UPDATE SET expected = expected + ?                │
//! │                       WHERE id = ? AND status = 'open' RETURNING ...    │
//! │                       └── one statement: no lost updates between        │
//! │                           terminals sharing the shift                   │
//! │                                                                         │
//! │  close()              UPDATE SET status = 'closed', ...                 │
//! │                       WHERE status = 'open'                             │
//! │                         AND expected_cash_cents = <read value>          │
//! │                         AND SUM(expenses) = <read value>                │
//! │                       └── None when anything moved since the read       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use nano_core::{LocationId, Shift, ShiftStatus};

const SHIFT_COLUMNS: &str = "id, location_id, opened_by, opening_balance_cents, \
     expected_cash_cents, status, declared_cash_cents, expected_total_cents, \
     variance_cents, opened_at, closed_at";

/// Figures a close is based on, plus the values to store.
#[derive(Debug, Clone)]
pub struct CloseShift<'a> {
    pub shift_id: &'a str,
    /// Accrual the reconciliation read.
    pub seen_accrual_cents: i64,
    /// Expense sum the reconciliation read.
    pub seen_expense_sum_cents: i64,
    pub declared_cash_cents: i64,
    pub expected_total_cents: i64,
    pub variance_cents: i64,
    pub closed_at: DateTime<Utc>,
}

/// Repository for shift database operations.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// Gets a shift by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shift>> {
        let sql = format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?1");

        let shift = sqlx::query_as::<_, Shift>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(shift)
    }

    /// Gets the OPEN shift for a location, if any.
    pub async fn find_open(&self, location_id: LocationId) -> DbResult<Option<Shift>> {
        let sql = format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE location_id = ?1 AND status = 'open'"
        );

        let shift = sqlx::query_as::<_, Shift>(&sql)
            .bind(location_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(shift)
    }

    /// Inserts a fresh OPEN shift.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation { field: "shifts.location_id" }` when the
    /// location already has an OPEN shift.
    pub async fn create(
        &self,
        location_id: LocationId,
        opened_by: &str,
        opening_balance_cents: i64,
    ) -> DbResult<Shift> {
        let shift = Shift {
            id: Uuid::new_v4().to_string(),
            location_id,
            opened_by: opened_by.to_string(),
            opening_balance_cents,
            expected_cash_cents: 0,
            status: ShiftStatus::Open,
            declared_cash_cents: None,
            expected_total_cents: None,
            variance_cents: None,
            opened_at: Utc::now(),
            closed_at: None,
        };

        debug!(id = %shift.id, location_id, opened_by, "Creating shift");

        sqlx::query(
            r#"
            INSERT INTO shifts (
                id, location_id, opened_by, opening_balance_cents,
                expected_cash_cents, status, opened_at
            ) VALUES (?1, ?2, ?3, ?4, 0, 'open', ?5)
            "#,
        )
        .bind(&shift.id)
        .bind(shift.location_id)
        .bind(&shift.opened_by)
        .bind(shift.opening_balance_cents)
        .bind(shift.opened_at)
        .execute(&self.pool)
        .await?;

        Ok(shift)
    }

    /// Adds `delta_cents` to the accrual of an OPEN shift.
    ///
    /// ## Returns
    /// The updated row, or `None` if the shift is missing, not OPEN, or the
    /// new accrual would not fit in an `i64`. SQLite would otherwise widen
    /// the overflowing sum to REAL.
    pub async fn increment_accrual(&self, id: &str, delta_cents: i64) -> DbResult<Option<Shift>> {
        debug!(id, delta_cents, "Incrementing shift accrual");

        let sql = format!(
            "UPDATE shifts SET expected_cash_cents = expected_cash_cents + ?2 \
             WHERE id = ?1 AND status = 'open' \
               AND expected_cash_cents <= 9223372036854775807 - ?2 \
             RETURNING {SHIFT_COLUMNS}"
        );

        let shift = sqlx::query_as::<_, Shift>(&sql)
            .bind(id)
            .bind(delta_cents)
            .fetch_optional(&self.pool)
            .await?;

        Ok(shift)
    }

    /// Moves an OPEN shift to CLOSED if nothing changed since it was read.
    ///
    /// ## Returns
    /// The closed row, or `None` when the shift is no longer OPEN or its
    /// accrual / expense sum differ from what the caller saw.
    pub async fn close(&self, close: &CloseShift<'_>) -> DbResult<Option<Shift>> {
        debug!(
            id = close.shift_id,
            declared = close.declared_cash_cents,
            variance = close.variance_cents,
            "Closing shift"
        );

        let sql = format!(
            "UPDATE shifts SET \
                 status = 'closed', \
                 declared_cash_cents = ?2, \
                 expected_total_cents = ?3, \
                 variance_cents = ?4, \
                 closed_at = ?5 \
             WHERE id = ?1 \
               AND status = 'open' \
               AND expected_cash_cents = ?6 \
               AND (SELECT COALESCE(SUM(amount_cents), 0) FROM expenses WHERE shift_id = ?1) = ?7 \
             RETURNING {SHIFT_COLUMNS}"
        );

        let shift = sqlx::query_as::<_, Shift>(&sql)
            .bind(close.shift_id)
            .bind(close.declared_cash_cents)
            .bind(close.expected_total_cents)
            .bind(close.variance_cents)
            .bind(close.closed_at)
            .bind(close.seen_accrual_cents)
            .bind(close.seen_expense_sum_cents)
            .fetch_optional(&self.pool)
            .await?;

        Ok(shift)
    }

    /// Lists shifts opened at or after `since`, newest first.
    pub async fn list_opened_since(&self, since: DateTime<Utc>) -> DbResult<Vec<Shift>> {
        let sql = format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE opened_at >= ?1 ORDER BY opened_at DESC"
        );

        let shifts = sqlx::query_as::<_, Shift>(&sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;

        Ok(shifts)
    }

    /// Counts OPEN shifts for a location. Never more than one.
    pub async fn count_open(&self, location_id: LocationId) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shifts WHERE location_id = ?1 AND status = 'open'",
        )
        .bind(location_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, DbError};
    use chrono::Duration as ChronoDuration;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find_open() {
        let db = db().await;
        let created = db.shifts().create(2, "seller-2", 500_000).await.unwrap();

        let found = db.shifts().find_open(2).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.status, ShiftStatus::Open);
        assert_eq!(found.expected_cash_cents, 0);
        assert!(db.shifts().find_open(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_open_shift_rejected_by_index() {
        let db = db().await;
        db.shifts().create(2, "a", 0).await.unwrap();

        let err = db.shifts().create(2, "b", 100).await.unwrap_err();
        assert!(err.is_open_shift_conflict(), "unexpected error: {err:?}");
        assert_eq!(db.shifts().count_open(2).await.unwrap(), 1);

        // Other locations are unaffected
        db.shifts().create(3, "c", 0).await.unwrap();
    }

    #[tokio::test]
    async fn test_increment_accrual() {
        let db = db().await;
        let shift = db.shifts().create(1, "a", 500_000).await.unwrap();

        db.shifts().increment_accrual(&shift.id, 70_000).await.unwrap();
        let updated = db
            .shifts()
            .increment_accrual(&shift.id, 50_000)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.expected_cash_cents, 120_000);
        assert_eq!(updated.opening_balance_cents, 500_000);

        assert!(db
            .shifts()
            .increment_accrual("missing", 1)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_increment_accrual_refuses_to_overflow() {
        let db = db().await;
        let shift = db.shifts().create(1, "a", 0).await.unwrap();

        let near_max = i64::MAX - 10;
        db.shifts().increment_accrual(&shift.id, near_max).await.unwrap().unwrap();

        assert!(db
            .shifts()
            .increment_accrual(&shift.id, 11)
            .await
            .unwrap()
            .is_none());
        let stored = db.shifts().get_by_id(&shift.id).await.unwrap().unwrap();
        assert_eq!(stored.expected_cash_cents, near_max);

        // Exactly reaching the limit is still representable
        let topped = db.shifts().increment_accrual(&shift.id, 10).await.unwrap().unwrap();
        assert_eq!(topped.expected_cash_cents, i64::MAX);
    }

    #[tokio::test]
    async fn test_close_guard_and_reopen() {
        let db = db().await;
        let shift = db.shifts().create(1, "a", 500_000).await.unwrap();
        db.shifts().increment_accrual(&shift.id, 120_000).await.unwrap();

        let mut close = CloseShift {
            shift_id: &shift.id,
            seen_accrual_cents: 100_000, // stale
            seen_expense_sum_cents: 0,
            declared_cash_cents: 620_000,
            expected_total_cents: 620_000,
            variance_cents: 0,
            closed_at: Utc::now(),
        };
        assert!(db.shifts().close(&close).await.unwrap().is_none());

        close.seen_accrual_cents = 120_000;
        let closed = db.shifts().close(&close).await.unwrap().unwrap();
        assert_eq!(closed.status, ShiftStatus::Closed);
        assert_eq!(closed.variance_cents, Some(0));
        assert!(closed.closed_at.is_some());

        // Terminal: no accrual, no second close
        assert!(db.shifts().increment_accrual(&shift.id, 1).await.unwrap().is_none());
        assert!(db.shifts().close(&close).await.unwrap().is_none());

        // The index only covers OPEN rows
        db.shifts().create(1, "b", 0).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_opened_since() {
        let db = db().await;
        let first = db.shifts().create(1, "a", 0).await.unwrap();
        let second = db.shifts().create(2, "b", 0).await.unwrap();

        let all = db
            .shifts()
            .list_opened_since(Utc::now() - ChronoDuration::hours(1))
            .await
            .unwrap();
        let ids: Vec<_> = all.iter().map(|s| s.id.as_str()).collect();
        assert!(ids.contains(&first.id.as_str()));
        assert!(ids.contains(&second.id.as_str()));

        let none = db
            .shifts()
            .list_opened_since(Utc::now() + ChronoDuration::hours(1))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_accruals_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("till.db")).max_connections(4))
            .await
            .unwrap();
        let shift = db.shifts().create(1, "a", 0).await.unwrap();

        let mut handles = Vec::new();
        for i in 1..=40i64 {
            let repo = db.shifts();
            let id = shift.id.clone();
            handles.push(tokio::spawn(async move {
                repo.increment_accrual(&id, i * 100).await
            }));
        }
        for handle in handles {
            let result: Result<Option<Shift>, DbError> = handle.await.unwrap();
            assert!(result.unwrap().is_some());
        }

        let expected: i64 = (1..=40i64).map(|i| i * 100).sum();
        let stored = db.shifts().get_by_id(&shift.id).await.unwrap().unwrap();
        assert_eq!(stored.expected_cash_cents, expected);
    }
}
