//! In-memory privilege grant repository.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use sso_core::result::AppResult;
use sso_entity::privilege::{NewPrivilegeGrant, PrivilegeGrant, PrivilegeKind};

use crate::repositories::PrivilegeRepository;

/// Grant repository held in process memory, keyed by member.
#[derive(Debug)]
pub struct MemoryPrivilegeRepository {
    grants: DashMap<i64, Vec<PrivilegeGrant>>,
    next_id: AtomicI64,
}

impl MemoryPrivilegeRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            grants: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Store a grant row as given, including its timestamps.
    pub fn insert_raw(&self, mut grant: PrivilegeGrant) -> PrivilegeGrant {
        grant.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.grants
            .entry(grant.member_id)
            .or_default()
            .push(grant.clone());
        grant
    }
}

impl Default for MemoryPrivilegeRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PrivilegeRepository for MemoryPrivilegeRepository {
    async fn find_by_member(&self, member_id: i64) -> AppResult<Vec<PrivilegeGrant>> {
        let mut grants = self
            .grants
            .get(&member_id)
            .map(|g| g.value().clone())
            .unwrap_or_default();
        grants.sort_by(|a, b| b.granted_at.cmp(&a.granted_at).then(b.id.cmp(&a.id)));
        Ok(grants)
    }

    async fn insert(
        &self,
        grant: &NewPrivilegeGrant,
        now: DateTime<Utc>,
    ) -> AppResult<PrivilegeGrant> {
        Ok(self.insert_raw(PrivilegeGrant {
            id: 0,
            member_id: grant.member_id,
            kind: grant.kind,
            is_active: true,
            granted_at: now,
            expires_at: grant.expires_at,
            granted_by: grant.granted_by.clone(),
        }))
    }

    async fn deactivate(&self, member_id: i64, kind: PrivilegeKind) -> AppResult<u64> {
        let Some(mut grants) = self.grants.get_mut(&member_id) else {
            return Ok(0);
        };
        let mut changed = 0;
        for grant in grants.iter_mut().filter(|g| g.kind == kind && g.is_active) {
            grant.is_active = false;
            changed += 1;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn new_grant(member_id: i64, kind: PrivilegeKind) -> NewPrivilegeGrant {
        NewPrivilegeGrant {
            member_id,
            kind,
            granted_by: "test".to_string(),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_member_newest_first() {
        let repo = MemoryPrivilegeRepository::new();
        let now = Utc::now();
        repo.insert(&new_grant(1, PrivilegeKind::User), now - Duration::days(2))
            .await
            .unwrap();
        repo.insert(&new_grant(1, PrivilegeKind::Partner), now)
            .await
            .unwrap();
        repo.insert(&new_grant(2, PrivilegeKind::Admin), now)
            .await
            .unwrap();

        let grants = repo.find_by_member(1).await.unwrap();
        let kinds: Vec<_> = grants.iter().map(|g| g.kind).collect();
        assert_eq!(kinds, vec![PrivilegeKind::Partner, PrivilegeKind::User]);
    }

    #[tokio::test]
    async fn test_deactivate_only_matching_active_rows() {
        let repo = MemoryPrivilegeRepository::new();
        let now = Utc::now();
        repo.insert(&new_grant(1, PrivilegeKind::Admin), now).await.unwrap();
        repo.insert(&new_grant(1, PrivilegeKind::Admin), now).await.unwrap();
        repo.insert(&new_grant(1, PrivilegeKind::User), now).await.unwrap();

        assert_eq!(repo.deactivate(1, PrivilegeKind::Admin).await.unwrap(), 2);
        assert_eq!(repo.deactivate(1, PrivilegeKind::Admin).await.unwrap(), 0);
        assert_eq!(repo.deactivate(99, PrivilegeKind::Admin).await.unwrap(), 0);

        let grants = repo.find_by_member(1).await.unwrap();
        assert_eq!(grants.len(), 3);
        assert!(
            grants
                .iter()
                .filter(|g| g.kind == PrivilegeKind::User)
                .all(|g| g.is_active)
        );
    }
}
