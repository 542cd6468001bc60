//! Session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A live login on one device.
///
/// Only SHA-256 digests of the tokens are stored. `generation` counts
/// access-token rotations and guards concurrent refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Unique session identifier (also embedded in token claims as `sid`).
    pub id: Uuid,
    /// The member this session belongs to.
    pub member_id: i64,
    /// SHA-256 hex digest of the current access token.
    pub access_token_hash: String,
    /// SHA-256 hex digest of the refresh token.
    pub refresh_token_hash: String,
    /// User-Agent header at login.
    pub user_agent: Option<String>,
    /// Client IP at login.
    pub ip_address: Option<String>,
    /// Login time.
    pub created_at: DateTime<Utc>,
    /// Last refresh or activity ping.
    pub last_activity_at: DateTime<Utc>,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
    /// Rotation counter.
    pub generation: i64,
}

impl Session {
    /// Whether the session is still live at `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// Whether the session has expired.
    pub fn is_expired(&self) -> bool {
        !self.is_live_at(Utc::now())
    }

    /// Device class derived from the stored user agent.
    pub fn device_type(&self) -> DeviceType {
        DeviceType::from_user_agent(self.user_agent.as_deref())
    }
}

/// Data required to create a new session.
#[derive(Debug, Clone)]
pub struct NewSession {
    /// Pre-allocated session id.
    pub id: Uuid,
    /// The member this session belongs to.
    pub member_id: i64,
    /// SHA-256 hex digest of the access token.
    pub access_token_hash: String,
    /// SHA-256 hex digest of the refresh token.
    pub refresh_token_hash: String,
    /// Client device.
    pub device: DeviceInfo,
    /// When the session expires.
    pub expires_at: DateTime<Utc>,
}

/// Request metadata recorded with a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// User-Agent header.
    pub user_agent: Option<String>,
    /// Client IP.
    pub ip_address: Option<String>,
}

/// Coarse device class shown in the sessions listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    /// Desktop or laptop browser.
    Desktop,
    /// Phone.
    Mobile,
    /// Tablet.
    Tablet,
    /// Crawler or scripted client.
    Bot,
    /// No user agent or nothing recognisable.
    Unknown,
}

impl DeviceType {
    /// Classify a User-Agent string.
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        let Some(ua) = user_agent.map(str::to_lowercase) else {
            return Self::Unknown;
        };
        if ua.trim().is_empty() {
            return Self::Unknown;
        }

        if ["bot", "crawler", "spider", "curl/", "wget/"]
            .iter()
            .any(|needle| ua.contains(needle))
        {
            Self::Bot
        } else if ua.contains("ipad") || ua.contains("tablet") {
            Self::Tablet
        } else if ua.contains("android") && !ua.contains("mobile") {
            // Android tablets omit the "Mobile" token.
            Self::Tablet
        } else if ua.contains("mobi") || ua.contains("iphone") || ua.contains("android") {
            Self::Mobile
        } else if ["windows", "macintosh", "linux", "x11", "cros"]
            .iter()
            .any(|needle| ua.contains(needle))
        {
            Self::Desktop
        } else {
            Self::Unknown
        }
    }

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
            Self::Bot => "bot",
            Self::Unknown => "unknown",
        }
    }
}
