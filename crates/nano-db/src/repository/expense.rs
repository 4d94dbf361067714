//! # Expense Repository
//!
//! Append-only cash withdrawals against a shift.
//!
//! The insert carries its own "shift is OPEN" check, so an expense can never
//! land on a shift that closed between the caller's read and this write.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use nano_core::ExpenseRecord;

#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Inserts an expense if its shift is OPEN.
    ///
    /// ## Returns
    /// The stored record, or `None` when the shift is missing or CLOSED.
    pub async fn insert_if_open(
        &self,
        shift_id: &str,
        amount_cents: i64,
        description: &str,
    ) -> DbResult<Option<ExpenseRecord>> {
        let record = ExpenseRecord {
            id: Uuid::new_v4().to_string(),
            shift_id: shift_id.to_string(),
            amount_cents,
            description: description.to_string(),
            created_at: Utc::now(),
        };

        debug!(id = %record.id, shift_id, amount_cents, "Recording expense");

        let result = sqlx::query(
            r#"
            INSERT INTO expenses (id, shift_id, amount_cents, description, created_at)
            SELECT ?1, ?2, ?3, ?4, ?5
            WHERE EXISTS (SELECT 1 FROM shifts WHERE id = ?2 AND status = 'open')
            "#,
        )
        .bind(&record.id)
        .bind(&record.shift_id)
        .bind(record.amount_cents)
        .bind(&record.description)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(record))
    }

    /// Σ amount over the shift's expenses (0 when there are none).
    pub async fn sum_for_shift(&self, shift_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM expenses WHERE shift_id = ?1",
        )
        .bind(shift_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Lists the shift's expenses in the order they were taken.
    pub async fn list_for_shift(&self, shift_id: &str) -> DbResult<Vec<ExpenseRecord>> {
        let records = sqlx::query_as::<_, ExpenseRecord>(
            r#"
            SELECT id, shift_id, amount_cents, description, created_at
            FROM expenses
            WHERE shift_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(shift_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
