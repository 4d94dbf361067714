//! # Profile Repository
//!
//! Local mirror of the identity provider's profile rows. The role column is
//! kept as the provider's free text and resolved on read.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use nano_core::{LocationId, Role, UserProfile};

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: String,
    display_name: String,
    role: String,
    assigned_location_id: Option<i64>,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        UserProfile {
            id: row.id,
            display_name: row.display_name,
            role: Role::parse_lenient(&row.role),
            assigned_location_id: row.assigned_location_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProfileRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, display_name, role, assigned_location_id FROM profiles WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserProfile::from))
    }

    /// Inserts or replaces a profile.
    pub async fn upsert(
        &self,
        id: &str,
        display_name: &str,
        role: &str,
        assigned_location_id: Option<LocationId>,
    ) -> DbResult<()> {
        debug!(id, role, ?assigned_location_id, "Upserting profile");

        sqlx::query(
            r#"
            INSERT INTO profiles (id, display_name, role, assigned_location_id)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (id) DO UPDATE SET
                display_name = excluded.display_name,
                role = excluded.role,
                assigned_location_id = excluded.assigned_location_id
            "#,
        )
        .bind(id)
        .bind(display_name)
        .bind(role)
        .bind(assigned_location_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
