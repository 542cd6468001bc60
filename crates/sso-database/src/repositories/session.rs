//! PostgreSQL session repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use sso_core::result::AppResult;
use sso_entity::session::{NewSession, Session};

use super::SessionRepository;
use crate::classify::store_error;

/// Session repository backed by the `sessions` table.
#[derive(Debug, Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn insert(&self, data: &NewSession, now: DateTime<Utc>) -> AppResult<Session> {
        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (id, member_id, access_token_hash, refresh_token_hash, \
             user_agent, ip_address, created_at, last_activity_at, expires_at, generation) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8, 0) \
             RETURNING *",
        )
        .bind(data.id)
        .bind(data.member_id)
        .bind(&data.access_token_hash)
        .bind(&data.refresh_token_hash)
        .bind(&data.device.user_agent)
        .bind(&data.device.ip_address)
        .bind(now)
        .bind(data.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| store_error("Failed to create session", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("Failed to find session", e))
    }

    async fn find_by_refresh_token_hash(&self, hash: &str) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE refresh_token_hash = $1")
            .bind(hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("Failed to find session by refresh token", e))
    }

    async fn find_by_access_token_hash(&self, hash: &str) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE access_token_hash = $1 LIMIT 1",
        )
        .bind(hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("Failed to find session by access token", e))
    }

    async fn rotate(
        &self,
        id: Uuid,
        expected_generation: i64,
        access_token_hash: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>(
            "UPDATE sessions SET \
                access_token_hash = $3, \
                expires_at = $4, \
                last_activity_at = $5, \
                generation = CASE WHEN generation = $2 THEN generation + 1 ELSE generation END \
             WHERE id = $1 AND expires_at > $5 \
               AND (generation = $2 OR (generation = $2 + 1 AND access_token_hash = $3)) \
             RETURNING *",
        )
        .bind(id)
        .bind(expected_generation)
        .bind(access_token_hash)
        .bind(expires_at)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("Failed to rotate session", e))
    }

    async fn list_active(&self, member_id: i64, now: DateTime<Utc>) -> AppResult<Vec<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE member_id = $1 AND expires_at > $2 \
             ORDER BY last_activity_at DESC",
        )
        .bind(member_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("Failed to list sessions", e))
    }

    async fn touch(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE sessions SET last_activity_at = $2 WHERE id = $1 AND expires_at > $2",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("Failed to update session activity", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("Failed to delete session", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("Failed to delete expired sessions", e))?;
        Ok(result.rows_affected())
    }
}
