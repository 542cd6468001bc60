//! Resolves a member's effective privilege from stored grants.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use tracing::{debug, info};

use sso_core::config::AuthConfig;
use sso_core::error::AppError;
use sso_core::result::AppResult;
use sso_core::retry::RetryExecutor;
use sso_database::repositories::PrivilegeRepository;
use sso_entity::privilege::{NewPrivilegeGrant, PrivilegeGrant, PrivilegeKind};

/// Highest-ranked grant that is active and not expired at `now`.
/// A member with no such grant is a plain `user`.
pub fn effective_privilege(grants: &[PrivilegeGrant], now: DateTime<Utc>) -> PrivilegeKind {
    grants
        .iter()
        .filter(|g| g.is_effective(now))
        .map(|g| g.kind)
        .max()
        .unwrap_or(PrivilegeKind::User)
}

/// Computes effective privileges, optionally caching grant rows per member.
///
/// Cached rows are re-evaluated against the clock on every call, so a
/// grant that expires while cached stops counting immediately.
#[derive(Clone)]
pub struct PrivilegeResolver {
    repo: Arc<dyn PrivilegeRepository>,
    retry: RetryExecutor,
    cache: Option<Cache<i64, Arc<Vec<PrivilegeGrant>>>>,
}

impl std::fmt::Debug for PrivilegeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivilegeResolver")
            .field("retry", &self.retry)
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

impl PrivilegeResolver {
    /// Creates a resolver. A zero `privilege_cache_ttl_seconds` disables
    /// the cache.
    pub fn new(repo: Arc<dyn PrivilegeRepository>, retry: RetryExecutor, config: &AuthConfig) -> Self {
        let cache = (config.privilege_cache_ttl_seconds > 0).then(|| {
            Cache::builder()
                .max_capacity(config.privilege_cache_capacity)
                .time_to_live(Duration::from_secs(config.privilege_cache_ttl_seconds))
                .build()
        });

        Self { repo, retry, cache }
    }

    /// The member's effective privilege right now.
    pub async fn resolve(&self, member_id: i64) -> AppResult<PrivilegeKind> {
        let grants = self.grants(member_id).await?;
        let kind = effective_privilege(&grants, Utc::now());
        debug!(member_id, privilege = %kind, "Resolved effective privilege");
        Ok(kind)
    }

    /// Whether the member's effective privilege ranks at or above `required`.
    pub async fn has_at_least(&self, member_id: i64, required: PrivilegeKind) -> AppResult<bool> {
        Ok(self.resolve(member_id).await?.has_at_least(required))
    }

    /// Kinds of the member's effective grants, newest grant first, without
    /// duplicates.
    pub async fn active_kinds(&self, member_id: i64) -> AppResult<Vec<PrivilegeKind>> {
        let grants = self.grants(member_id).await?;
        let now = Utc::now();

        let mut kinds = Vec::new();
        for grant in grants.iter().filter(|g| g.is_effective(now)) {
            if !kinds.contains(&grant.kind) {
                kinds.push(grant.kind);
            }
        }
        Ok(kinds)
    }

    /// Adds a grant. An expiry, when given, must lie in the future.
    pub async fn grant(
        &self,
        member_id: i64,
        kind: PrivilegeKind,
        granted_by: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<PrivilegeGrant> {
        let now = Utc::now();
        if expires_at.is_some_and(|exp| exp <= now) {
            return Err(AppError::validation("Grant expiry must be in the future"));
        }

        let new_grant = NewPrivilegeGrant {
            member_id,
            kind,
            granted_by: granted_by.to_string(),
            expires_at,
        };
        let grant = self
            .retry
            .execute("privilege.grant", || self.repo.insert(&new_grant, now))
            .await?;

        self.invalidate(member_id).await;
        info!(member_id, privilege = %kind, granted_by, "Privilege granted");
        Ok(grant)
    }

    /// Deactivates every active grant of `kind`. Returns how many changed.
    pub async fn revoke(&self, member_id: i64, kind: PrivilegeKind) -> AppResult<u64> {
        let changed = self
            .retry
            .execute("privilege.revoke", || self.repo.deactivate(member_id, kind))
            .await?;

        self.invalidate(member_id).await;
        info!(member_id, privilege = %kind, changed, "Privilege revoked");
        Ok(changed)
    }

    async fn grants(&self, member_id: i64) -> AppResult<Arc<Vec<PrivilegeGrant>>> {
        match &self.cache {
            Some(cache) => cache
                .try_get_with(member_id, self.load(member_id))
                .await
                .map_err(|e| (*e).clone()),
            None => self.load(member_id).await,
        }
    }

    async fn load(&self, member_id: i64) -> AppResult<Arc<Vec<PrivilegeGrant>>> {
        self.retry
            .execute("privilege.find_by_member", || {
                self.repo.find_by_member(member_id)
            })
            .await
            .map(Arc::new)
    }

    async fn invalidate(&self, member_id: i64) {
        if let Some(cache) = &self.cache {
            cache.invalidate(&member_id).await;
        }
    }
}
