//! In-memory member repository.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use sso_core::result::AppResult;
use sso_entity::member::{Member, UpsertMember};

use crate::repositories::MemberRepository;

/// Member repository held in process memory.
#[derive(Debug)]
pub struct MemoryMemberRepository {
    members: DashMap<i64, Member>,
    by_external_id: DashMap<String, i64>,
    next_id: AtomicI64,
}

impl MemoryMemberRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            members: DashMap::new(),
            by_external_id: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Remove a member. Grants and sessions are left alone.
    pub fn remove(&self, id: i64) -> Option<Member> {
        let (_, member) = self.members.remove(&id)?;
        self.by_external_id.remove(&member.external_id);
        Some(member)
    }
}

impl Default for MemoryMemberRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemberRepository for MemoryMemberRepository {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Member>> {
        Ok(self.members.get(&id).map(|m| m.value().clone()))
    }

    async fn upsert_by_external_id(
        &self,
        data: &UpsertMember,
        now: DateTime<Utc>,
    ) -> AppResult<Member> {
        let id = *self
            .by_external_id
            .entry(data.external_id.clone())
            .or_insert_with(|| self.next_id.fetch_add(1, Ordering::SeqCst));

        let member = self
            .members
            .entry(id)
            .and_modify(|m| {
                m.email = data.email.clone();
                m.display_name = data.display_name.clone();
                m.last_login_at = Some(now);
            })
            .or_insert_with(|| Member {
                id,
                external_id: data.external_id.clone(),
                email: data.email.clone(),
                display_name: data.display_name.clone(),
                created_at: now,
                last_login_at: Some(now),
            })
            .clone();

        Ok(member)
    }
}
