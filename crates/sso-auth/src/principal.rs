//! The authenticated caller.

use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use uuid::Uuid;

use sso_core::result::AppResult;
use sso_entity::privilege::PrivilegeKind;

use crate::jwt::AccessClaims;
use crate::privilege::PrivilegeResolver;

/// Identity established by a verified access token.
///
/// The effective privilege is looked up on first use and then reused for
/// the rest of the request.
#[derive(Clone)]
pub struct Principal {
    /// Member id.
    pub member_id: i64,
    /// Member email at token issuance.
    pub email: String,
    /// Identity-provider subject.
    pub external_id: String,
    /// Session the token belongs to.
    pub session_id: Uuid,
    /// Access token expiry.
    pub expires_at: DateTime<Utc>,
    privilege: OnceCell<PrivilegeKind>,
    resolver: PrivilegeResolver,
}

impl std::fmt::Debug for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Principal")
            .field("member_id", &self.member_id)
            .field("session_id", &self.session_id)
            .field("privilege", &self.privilege.get())
            .finish_non_exhaustive()
    }
}

impl Principal {
    pub(crate) fn from_claims(claims: AccessClaims, resolver: PrivilegeResolver) -> Self {
        let expires_at = claims.expires_at();
        Self {
            member_id: claims.sub,
            email: claims.email,
            external_id: claims.ext,
            session_id: claims.sid,
            expires_at,
            privilege: OnceCell::new(),
            resolver,
        }
    }

    /// The member's effective privilege, resolved once per principal.
    pub async fn privilege(&self) -> AppResult<PrivilegeKind> {
        self.privilege
            .get_or_try_init(|| self.resolver.resolve(self.member_id))
            .await
            .copied()
    }

    /// Whether the member ranks at or above `required`.
    pub async fn has_at_least(&self, required: PrivilegeKind) -> AppResult<bool> {
        Ok(self.privilege().await?.has_at_least(required))
    }
}
