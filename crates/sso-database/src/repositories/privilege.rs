//! PostgreSQL privilege grant repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sso_core::result::AppResult;
use sso_entity::privilege::{NewPrivilegeGrant, PrivilegeGrant, PrivilegeKind};

use super::PrivilegeRepository;
use crate::classify::store_error;

/// Grant repository backed by the `privilege_grants` table.
#[derive(Debug, Clone)]
pub struct PgPrivilegeRepository {
    pool: PgPool,
}

impl PgPrivilegeRepository {
    /// Create a new grant repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PrivilegeRepository for PgPrivilegeRepository {
    async fn find_by_member(&self, member_id: i64) -> AppResult<Vec<PrivilegeGrant>> {
        sqlx::query_as::<_, PrivilegeGrant>(
            "SELECT * FROM privilege_grants WHERE member_id = $1 \
             ORDER BY granted_at DESC, id DESC",
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("Failed to load privilege grants", e))
    }

    async fn insert(
        &self,
        grant: &NewPrivilegeGrant,
        now: DateTime<Utc>,
    ) -> AppResult<PrivilegeGrant> {
        sqlx::query_as::<_, PrivilegeGrant>(
            "INSERT INTO privilege_grants (member_id, kind, is_active, granted_at, expires_at, granted_by) \
             VALUES ($1, $2, TRUE, $3, $4, $5) \
             RETURNING *",
        )
        .bind(grant.member_id)
        .bind(grant.kind)
        .bind(now)
        .bind(grant.expires_at)
        .bind(&grant.granted_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| store_error("Failed to insert privilege grant", e))
    }

    async fn deactivate(&self, member_id: i64, kind: PrivilegeKind) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE privilege_grants SET is_active = FALSE \
             WHERE member_id = $1 AND kind = $2 AND is_active",
        )
        .bind(member_id)
        .bind(kind)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("Failed to deactivate privilege grants", e))?;
        Ok(result.rows_affected())
    }
}
