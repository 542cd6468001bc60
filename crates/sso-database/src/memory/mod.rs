//! Process-local repositories backed by `DashMap`.
//!
//! Used for tests and for single-instance runs with
//! `database.provider = "memory"`. Each operation that must be atomic in
//! PostgreSQL holds the shard lock of the affected entry for its duration.

mod member;
mod privilege;
mod session;

use async_trait::async_trait;

use sso_core::result::AppResult;

use crate::repositories::HealthProbe;

pub use member::MemoryMemberRepository;
pub use privilege::MemoryPrivilegeRepository;
pub use session::MemorySessionRepository;

/// Health probe for the in-memory store.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysHealthy;

#[async_trait]
impl HealthProbe for AlwaysHealthy {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
