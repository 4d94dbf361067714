//! # Sale Repository
//!
//! Minimal sales ledger: one row per confirmed checkout, tied to the shift
//! it was rung up under. Line items stay with the front end's cart.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use nano_core::{NewSale, Sale};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, location_id, seller_id, shift_id, total_cents,
                   payment_method, created_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Durably records a sale.
    pub async fn insert(&self, new_sale: &NewSale) -> DbResult<Sale> {
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            location_id: new_sale.location_id,
            seller_id: new_sale.seller_id.clone(),
            shift_id: new_sale.shift_id.clone(),
            total_cents: new_sale.total_cents,
            payment_method: new_sale.payment_method,
            created_at: Utc::now(),
        };

        debug!(id = %sale.id, shift_id = %sale.shift_id, total = sale.total_cents, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, location_id, seller_id, shift_id,
                total_cents, payment_method, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&sale.id)
        .bind(sale.location_id)
        .bind(&sale.seller_id)
        .bind(&sale.shift_id)
        .bind(sale.total_cents)
        .bind(sale.payment_method)
        .bind(sale.created_at)
        .execute(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Lists sales rung up under a shift.
    pub async fn list_for_shift(&self, shift_id: &str) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, location_id, seller_id, shift_id, total_cents,
                   payment_method, created_at
            FROM sales
            WHERE shift_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(shift_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Σ totals of a shift's sales. Should equal the shift's accrual.
    pub async fn total_for_shift(&self, shift_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_cents), 0) FROM sales WHERE shift_id = ?1",
        )
        .bind(shift_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use nano_core::{NewSale, PaymentMethod};

    #[tokio::test]
    async fn test_insert_and_total() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shift = db.shifts().create(1, "a", 0).await.unwrap();

        let new_sale = NewSale {
            location_id: 1,
            seller_id: "a".to_string(),
            shift_id: shift.id.clone(),
            total_cents: 120_000,
            payment_method: PaymentMethod::Cash,
        };
        let sale = db.sales().insert(&new_sale).await.unwrap();

        let fetched = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(fetched.total_cents, 120_000);
        assert_eq!(fetched.payment_method, PaymentMethod::Cash);
        assert_eq!(db.sales().total_for_shift(&shift.id).await.unwrap(), 120_000);
        assert_eq!(db.sales().list_for_shift(&shift.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sale_requires_existing_shift() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .sales()
            .insert(&NewSale {
                location_id: 1,
                seller_id: "a".to_string(),
                shift_id: "missing".to_string(),
                total_cents: 100,
                payment_method: PaymentMethod::Cash,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
