//! PostgreSQL member repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sso_core::result::AppResult;
use sso_entity::member::{Member, UpsertMember};

use super::MemberRepository;
use crate::classify::store_error;

/// Member repository backed by the `members` table.
#[derive(Debug, Clone)]
pub struct PgMemberRepository {
    pool: PgPool,
}

impl PgMemberRepository {
    /// Create a new member repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberRepository for PgMemberRepository {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Member>> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("Failed to find member", e))
    }

    async fn upsert_by_external_id(
        &self,
        data: &UpsertMember,
        now: DateTime<Utc>,
    ) -> AppResult<Member> {
        sqlx::query_as::<_, Member>(
            "INSERT INTO members (external_id, email, display_name, created_at, last_login_at) \
             VALUES ($1, $2, $3, $4, $4) \
             ON CONFLICT (external_id) DO UPDATE SET \
                email = EXCLUDED.email, \
                display_name = EXCLUDED.display_name, \
                last_login_at = EXCLUDED.last_login_at \
             RETURNING *",
        )
        .bind(&data.external_id)
        .bind(&data.email)
        .bind(&data.display_name)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| store_error("Failed to upsert member", e))
    }
}
