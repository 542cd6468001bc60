//! In-memory session repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use sso_core::error::AppError;
use sso_core::result::AppResult;
use sso_entity::session::{NewSession, Session};

use crate::repositories::SessionRepository;

/// Session repository held in process memory.
///
/// `rotate` checks and updates a row under its shard write lock, which
/// gives the same single-winner behaviour as the conditional `UPDATE`.
#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    sessions: DashMap<Uuid, Session>,
}

impl MemorySessionRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows, expired ones included.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the repository holds no rows.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn insert(&self, data: &NewSession, now: DateTime<Utc>) -> AppResult<Session> {
        if self
            .sessions
            .iter()
            .any(|s| s.refresh_token_hash == data.refresh_token_hash)
        {
            return Err(AppError::permanent_store(
                "Duplicate refresh token for session",
            ));
        }

        match self.sessions.entry(data.id) {
            Entry::Occupied(_) => Err(AppError::permanent_store(format!(
                "Session {} already exists",
                data.id
            ))),
            Entry::Vacant(slot) => {
                let session = Session {
                    id: data.id,
                    member_id: data.member_id,
                    access_token_hash: data.access_token_hash.clone(),
                    refresh_token_hash: data.refresh_token_hash.clone(),
                    user_agent: data.device.user_agent.clone(),
                    ip_address: data.device.ip_address.clone(),
                    created_at: now,
                    last_activity_at: now,
                    expires_at: data.expires_at,
                    generation: 0,
                };
                slot.insert(session.clone());
                Ok(session)
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>> {
        Ok(self.sessions.get(&id).map(|s| s.value().clone()))
    }

    async fn find_by_refresh_token_hash(&self, hash: &str) -> AppResult<Option<Session>> {
        Ok(self
            .sessions
            .iter()
            .find(|s| s.refresh_token_hash == hash)
            .map(|s| s.value().clone()))
    }

    async fn find_by_access_token_hash(&self, hash: &str) -> AppResult<Option<Session>> {
        Ok(self
            .sessions
            .iter()
            .find(|s| s.access_token_hash == hash)
            .map(|s| s.value().clone()))
    }

    async fn rotate(
        &self,
        id: Uuid,
        expected_generation: i64,
        access_token_hash: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Session>> {
        let Some(mut session) = self.sessions.get_mut(&id) else {
            return Ok(None);
        };
        if !session.is_live_at(now) {
            return Ok(None);
        }

        let replayed = session.generation == expected_generation + 1
            && session.access_token_hash == access_token_hash;
        if session.generation != expected_generation && !replayed {
            return Ok(None);
        }

        if !replayed {
            session.generation += 1;
        }
        session.access_token_hash = access_token_hash.to_string();
        session.expires_at = expires_at;
        session.last_activity_at = now;
        Ok(Some(session.value().clone()))
    }

    async fn list_active(&self, member_id: i64, now: DateTime<Utc>) -> AppResult<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .sessions
            .iter()
            .filter(|s| s.member_id == member_id && s.is_live_at(now))
            .map(|s| s.value().clone())
            .collect();
        sessions.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
        Ok(sessions)
    }

    async fn touch(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        match self.sessions.get_mut(&id) {
            Some(mut session) if session.is_live_at(now) => {
                session.last_activity_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.sessions.remove(&id).is_some())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut removed = 0u64;
        self.sessions.retain(|_, s| {
            let keep = s.is_live_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}
