//! Repository traits and their PostgreSQL implementations.
//!
//! Services hold `Arc<dyn …Repository>` handles constructed at startup, so
//! the same service code runs against PostgreSQL or the in-memory store.
//! Timestamps that decide liveness are passed in by the caller rather than
//! read from the database clock.

pub mod member;
pub mod privilege;
pub mod session;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use sso_core::result::AppResult;
use sso_entity::member::{Member, UpsertMember};
use sso_entity::privilege::{NewPrivilegeGrant, PrivilegeGrant, PrivilegeKind};
use sso_entity::session::{NewSession, Session};

use crate::connection::DatabasePool;
use crate::memory::{MemoryMemberRepository, MemoryPrivilegeRepository, MemorySessionRepository};

pub use member::PgMemberRepository;
pub use privilege::PgPrivilegeRepository;
pub use session::PgSessionRepository;

/// Member lookups and provisioning.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Find a member by primary key.
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Member>>;

    /// Insert or update the member identified by `external_id` and stamp
    /// `last_login_at`. The external id of an existing row never changes.
    async fn upsert_by_external_id(
        &self,
        data: &UpsertMember,
        now: DateTime<Utc>,
    ) -> AppResult<Member>;
}

/// Privilege grant storage.
#[async_trait]
pub trait PrivilegeRepository: Send + Sync {
    /// All grants of a member, active or not, newest first.
    async fn find_by_member(&self, member_id: i64) -> AppResult<Vec<PrivilegeGrant>>;

    /// Insert a new active grant.
    async fn insert(&self, grant: &NewPrivilegeGrant, now: DateTime<Utc>)
    -> AppResult<PrivilegeGrant>;

    /// Deactivate every active grant of `kind` for the member. Returns the
    /// number of rows changed.
    async fn deactivate(&self, member_id: i64, kind: PrivilegeKind) -> AppResult<u64>;
}

/// Session storage.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert a new session row.
    async fn insert(&self, session: &NewSession, now: DateTime<Utc>) -> AppResult<Session>;

    /// Find a session by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>>;

    /// Find a session by refresh token digest.
    async fn find_by_refresh_token_hash(&self, hash: &str) -> AppResult<Option<Session>>;

    /// Find a session by access token digest.
    async fn find_by_access_token_hash(&self, hash: &str) -> AppResult<Option<Session>>;

    /// Conditionally replace the access token digest.
    ///
    /// Matches only when the row exists, its generation equals
    /// `expected_generation`, and it is still live at `now`. On match the
    /// generation is incremented and `last_activity_at` set to `now`.
    ///
    /// Re-running the same rotation is idempotent: a row already at
    /// `expected_generation + 1` holding `access_token_hash` matches again
    /// without a second increment. This lets a retry after a lost reply
    /// succeed. Returns `None` when nothing matched; the row is then
    /// untouched.
    async fn rotate(
        &self,
        id: Uuid,
        expected_generation: i64,
        access_token_hash: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Session>>;

    /// Live sessions of a member, most recent activity first.
    async fn list_active(&self, member_id: i64, now: DateTime<Utc>) -> AppResult<Vec<Session>>;

    /// Set `last_activity_at` on a live session. Returns whether it matched.
    async fn touch(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<bool>;

    /// Delete a session. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Delete every session expired at `now`. Returns the count.
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Store connectivity probe for health checks.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Succeeds when the store answers.
    async fn ping(&self) -> AppResult<()>;
}

#[async_trait]
impl HealthProbe for DatabasePool {
    async fn ping(&self) -> AppResult<()> {
        self.health_check().await
    }
}

/// The full set of repository handles the services need.
#[derive(Clone)]
pub struct Repositories {
    /// Member repository.
    pub members: Arc<dyn MemberRepository>,
    /// Privilege grant repository.
    pub privileges: Arc<dyn PrivilegeRepository>,
    /// Session repository.
    pub sessions: Arc<dyn SessionRepository>,
    /// Connectivity probe.
    pub health: Arc<dyn HealthProbe>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool.
    pub fn postgres(db: &DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            members: Arc::new(PgMemberRepository::new(pool.clone())),
            privileges: Arc::new(PgPrivilegeRepository::new(pool.clone())),
            sessions: Arc::new(PgSessionRepository::new(pool)),
            health: Arc::new(db.clone()),
        }
    }

    /// Process-local repositories.
    pub fn memory() -> Self {
        Self {
            members: Arc::new(MemoryMemberRepository::new()),
            privileges: Arc::new(MemoryPrivilegeRepository::new()),
            sessions: Arc::new(MemorySessionRepository::new()),
            health: Arc::new(crate::memory::AlwaysHealthy),
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
