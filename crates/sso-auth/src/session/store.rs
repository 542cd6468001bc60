//! Session storage operations wrapping the session repository.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use sso_core::config::SessionConfig;
use sso_core::config::session::MAX_IDLE_EXPIRY_DAYS;
use sso_core::error::AppError;
use sso_core::result::AppResult;
use sso_core::retry::RetryExecutor;
use sso_database::repositories::SessionRepository;
use sso_entity::session::{DeviceInfo, NewSession, Session};

/// SHA-256 hex digest of a token. Raw tokens are never stored.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Durable per-device sessions. Every repository call runs through the
/// retry executor.
#[derive(Clone)]
pub struct SessionStore {
    repo: Arc<dyn SessionRepository>,
    retry: RetryExecutor,
    idle_expiry: Duration,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("retry", &self.retry)
            .field("idle_expiry", &self.idle_expiry)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Creates a new session store. The idle window is clamped to
    /// [`MAX_IDLE_EXPIRY_DAYS`].
    pub fn new(repo: Arc<dyn SessionRepository>, retry: RetryExecutor, config: &SessionConfig) -> Self {
        Self {
            repo,
            retry,
            idle_expiry: Duration::days(config.idle_expiry_days.min(MAX_IDLE_EXPIRY_DAYS) as i64),
        }
    }

    /// Records a new session under the pre-allocated `session_id`.
    ///
    /// The session expires after the idle window or when the refresh token
    /// does, whichever comes first.
    pub async fn create(
        &self,
        session_id: Uuid,
        member_id: i64,
        access_token: &str,
        refresh_token: &str,
        refresh_expires_at: DateTime<Utc>,
        device: DeviceInfo,
    ) -> AppResult<Session> {
        let now = Utc::now();
        let new_session = NewSession {
            id: session_id,
            member_id,
            access_token_hash: hash_token(access_token),
            refresh_token_hash: hash_token(refresh_token),
            device,
            expires_at: self.expiry_from(now, refresh_expires_at),
        };

        let session = self
            .retry
            .execute("session.create", || self.repo.insert(&new_session, now))
            .await?;

        info!(
            member_id,
            session_id = %session.id,
            expires_at = %session.expires_at,
            "Session created"
        );
        Ok(session)
    }

    /// Session expiry for activity at `now`: the idle window, capped at the
    /// refresh token's own expiry.
    pub fn expiry_from(&self, now: DateTime<Utc>, refresh_expires_at: DateTime<Utc>) -> DateTime<Utc> {
        (now + self.idle_expiry).min(refresh_expires_at)
    }

    /// Finds a session by id.
    pub async fn find_by_id(&self, session_id: Uuid) -> AppResult<Option<Session>> {
        self.retry
            .execute("session.find_by_id", || self.repo.find_by_id(session_id))
            .await
    }

    /// Finds the session a refresh token was issued for.
    pub async fn find_by_refresh_token(&self, refresh_token: &str) -> AppResult<Option<Session>> {
        let hash = hash_token(refresh_token);
        self.retry
            .execute("session.find_by_refresh_token", || {
                self.repo.find_by_refresh_token_hash(&hash)
            })
            .await
    }

    /// Finds the session whose current access token is `access_token`.
    pub async fn find_by_access_token(&self, access_token: &str) -> AppResult<Option<Session>> {
        let hash = hash_token(access_token);
        self.retry
            .execute("session.find_by_access_token", || {
                self.repo.find_by_access_token_hash(&hash)
            })
            .await
    }

    /// Swaps in a new access token if nobody rotated the session since
    /// `expected_generation` was observed.
    ///
    /// Fails with `StaleSession` when the row is gone, expired, or already
    /// rotated. The stored row is then unchanged. A retried attempt whose
    /// first write landed matches its own result instead of reporting
    /// `StaleSession`.
    pub async fn rotate(
        &self,
        session_id: Uuid,
        expected_generation: i64,
        new_access_token: &str,
        new_expires_at: DateTime<Utc>,
    ) -> AppResult<Session> {
        let hash = hash_token(new_access_token);
        let now = Utc::now();

        let rotated = self
            .retry
            .execute("session.rotate", || {
                self.repo
                    .rotate(session_id, expected_generation, &hash, new_expires_at, now)
            })
            .await?;

        match rotated {
            Some(session) => {
                debug!(
                    session_id = %session.id,
                    generation = session.generation,
                    "Session rotated"
                );
                Ok(session)
            }
            None => Err(AppError::stale_session(
                "Session was revoked, expired, or already refreshed",
            )),
        }
    }

    /// Live sessions of a member, most recent activity first.
    pub async fn list_active(&self, member_id: i64) -> AppResult<Vec<Session>> {
        let now = Utc::now();
        self.retry
            .execute("session.list_active", || {
                self.repo.list_active(member_id, now)
            })
            .await
    }

    /// Deletes a session. Revoking a missing session is not an error.
    pub async fn revoke(&self, session_id: Uuid) -> AppResult<()> {
        let removed = self
            .retry
            .execute("session.revoke", || self.repo.delete(session_id))
            .await?;

        if removed {
            info!(session_id = %session_id, "Session revoked");
        }
        Ok(())
    }

    /// Records activity on a live session. Returns whether it matched.
    pub async fn touch(&self, session_id: Uuid) -> AppResult<bool> {
        let now = Utc::now();
        self.retry
            .execute("session.touch", || self.repo.touch(session_id, now))
            .await
    }

    /// Deletes every expired session. Returns the count.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        let now = Utc::now();
        self.retry
            .execute("session.purge_expired", || self.repo.delete_expired(now))
            .await
    }
}
