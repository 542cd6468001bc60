//! Shared fixtures for sso-auth integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;

use sso_core::config::{AuthConfig, SessionConfig};
use sso_core::retry::RetryExecutor;
use sso_database::memory::{
    MemoryMemberRepository, MemoryPrivilegeRepository, MemorySessionRepository,
};
use sso_database::repositories::{MemberRepository, SessionRepository};
use sso_auth::{PrivilegeResolver, SessionStore, TokenService};
use sso_entity::member::{Member, UpsertMember};

pub const ACCESS_SECRET: &str = "test-access-secret-0123456789";
pub const REFRESH_SECRET: &str = "test-refresh-secret-9876543210";

pub fn auth_config() -> AuthConfig {
    AuthConfig::new(ACCESS_SECRET, REFRESH_SECRET)
}

/// A token service over in-memory repositories.
pub struct Harness {
    pub tokens: TokenService,
    pub members: Arc<MemoryMemberRepository>,
    pub privileges: Arc<MemoryPrivilegeRepository>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_sessions(Arc::new(MemorySessionRepository::new()))
    }

    pub fn with_sessions(sessions: Arc<dyn SessionRepository>) -> Self {
        Self::build(sessions, RetryExecutor::no_retry())
    }

    pub fn build(sessions: Arc<dyn SessionRepository>, retry: RetryExecutor) -> Self {
        let config = auth_config();
        let members = Arc::new(MemoryMemberRepository::new());
        let privileges = Arc::new(MemoryPrivilegeRepository::new());

        let store = SessionStore::new(sessions, retry.clone(), &SessionConfig::default());
        let resolver = PrivilegeResolver::new(privileges.clone(), retry.clone(), &config);
        let tokens = TokenService::new(&config, store, resolver, members.clone(), retry)
            .expect("valid config");

        Self {
            tokens,
            members,
            privileges,
        }
    }

    pub async fn member(&self, external_id: &str) -> Member {
        self.members
            .upsert_by_external_id(
                &UpsertMember {
                    external_id: external_id.to_string(),
                    email: format!("{external_id}@example.com"),
                    display_name: "Dewi".to_string(),
                },
                Utc::now(),
            )
            .await
            .expect("upsert member")
    }
}
