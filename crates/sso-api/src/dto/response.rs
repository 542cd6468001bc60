//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sso_entity::member::Member;
use sso_entity::privilege::PrivilegeKind;
use sso_entity::session::{DeviceType, Session};

/// Member summary returned by verify and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// Member id.
    pub id: i64,
    /// Email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Effective privilege.
    pub privilege: PrivilegeKind,
    /// Whether the effective privilege is `admin` or above.
    pub is_admin: bool,
}

impl UserResponse {
    /// Builds the summary from a member and its effective privilege.
    pub fn new(member: &Member, privilege: PrivilegeKind) -> Self {
        Self {
            id: member.id,
            email: member.email.clone(),
            name: member.display_name.clone(),
            privilege,
            is_admin: privilege.is_admin(),
        }
    }
}

/// `POST /sso/verify` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// Always `true`.
    pub success: bool,
    /// Verified member.
    pub user: UserResponse,
}

/// `POST /sso/refresh` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// Always `true`.
    pub success: bool,
    /// Newly signed access token.
    pub access_token: String,
    /// Its expiry.
    pub expires_at: DateTime<Utc>,
}

/// `POST /sso/login` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Always `true`.
    pub success: bool,
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Access token expiry.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiry.
    pub refresh_expires_at: DateTime<Utc>,
    /// Logged-in member.
    pub user: UserResponse,
}

/// One entry of the sessions listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Session id.
    pub id: Uuid,
    /// Whether this is the session making the request.
    pub is_current: bool,
    /// User-Agent recorded at login.
    pub user_agent: Option<String>,
    /// Device class derived from the user agent.
    pub device_type: DeviceType,
    /// Client IP recorded at login.
    pub ip_address: Option<String>,
    /// Login time.
    pub created_at: DateTime<Utc>,
    /// Last login, refresh, or activity ping.
    pub last_activity_at: DateTime<Utc>,
    /// Expiry.
    pub expires_at: DateTime<Utc>,
}

impl SessionResponse {
    /// Converts a stored session.
    pub fn from_session(session: &Session, is_current: bool) -> Self {
        Self {
            id: session.id,
            is_current,
            user_agent: session.user_agent.clone(),
            device_type: session.device_type(),
            ip_address: session.ip_address.clone(),
            created_at: session.created_at,
            last_activity_at: session.last_activity_at,
            expires_at: session.expires_at,
        }
    }
}

/// `GET /sso/sessions` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionListResponse {
    /// Always `true`.
    pub success: bool,
    /// Live sessions, most recent activity first.
    pub sessions: Vec<SessionResponse>,
}

/// `GET /privileges` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivilegesResponse {
    /// Always `true`.
    pub success: bool,
    /// Kinds of the caller's effective grants, newest first.
    pub privileges: Vec<PrivilegeKind>,
}

/// Grant or revoke outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivilegeChangeResponse {
    /// Always `true`.
    pub success: bool,
    /// Member whose grants changed.
    pub member_id: i64,
    /// Effective privilege after the change.
    pub privilege: PrivilegeKind,
}

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable message.
    pub message: String,
}

impl MessageResponse {
    /// Successful acknowledgement with `message`.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// `GET /health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// `connected` or `unavailable`.
    pub database: String,
}
