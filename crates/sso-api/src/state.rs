//! Application state shared across all handlers.

use std::sync::Arc;

use sso_auth::{PrivilegeResolver, SessionStore, TokenService};
use sso_core::config::AppConfig;
use sso_core::result::AppResult;
use sso_core::retry::RetryExecutor;
use sso_database::repositories::{HealthProbe, Repositories};

/// Shared application state passed to every handler via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Token issuance, verification, and refresh.
    pub tokens: Arc<TokenService>,
    /// Store connectivity probe.
    pub health: Arc<dyn HealthProbe>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wires the auth services on top of a set of repositories.
    pub fn from_repositories(config: AppConfig, repos: Repositories) -> AppResult<Self> {
        let retry = RetryExecutor::new(&config.retry);

        let sessions = SessionStore::new(repos.sessions, retry.clone(), &config.session);
        let privileges = PrivilegeResolver::new(repos.privileges, retry.clone(), &config.auth);
        let tokens = TokenService::new(&config.auth, sessions, privileges, repos.members, retry)?;

        Ok(Self {
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            health: repos.health,
        })
    }

    /// Session store behind the token service.
    pub fn sessions(&self) -> &SessionStore {
        self.tokens.sessions()
    }

    /// Privilege resolver behind the token service.
    pub fn privileges(&self) -> &PrivilegeResolver {
        self.tokens.privileges()
    }
}
