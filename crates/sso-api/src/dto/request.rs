//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use sso_entity::privilege::PrivilegeKind;

/// Body of `POST /sso/verify`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyRequest {
    /// Access token to verify.
    pub token: String,
}

/// Body of `POST /sso/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// Refresh token issued at login.
    pub refresh_token: String,
}

/// Body of `POST /sso/login`, sent by the trusted identity-provider
/// bridge after it authenticated the member.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Identity-provider subject.
    #[validate(length(min = 1, max = 255, message = "externalId is required"))]
    pub external_id: String,
    /// Verified email address.
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    /// Display name.
    #[validate(length(max = 255))]
    #[serde(default)]
    pub name: Option<String>,
}

/// Body of `POST /privileges/grant`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GrantPrivilegeRequest {
    /// Member receiving the grant.
    #[validate(range(min = 1))]
    pub member_id: i64,
    /// Privilege kind.
    pub privilege: PrivilegeKind,
    /// Optional expiry.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Body of `POST /privileges/revoke`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RevokePrivilegeRequest {
    /// Member losing the grant.
    #[validate(range(min = 1))]
    pub member_id: i64,
    /// Privilege kind.
    pub privilege: PrivilegeKind,
}
