//! Authentication configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Longest accepted access token TTL: one week.
pub const MAX_ACCESS_TTL_MINUTES: u64 = 7 * 24 * 60;

/// Longest accepted refresh token TTL.
pub const MAX_REFRESH_TTL_DAYS: u64 = 365;

/// Token signing and cookie configuration.
///
/// The two signing secrets are loaded once at startup and must differ.
/// `Debug` redacts them so the struct can be logged safely.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC-SHA256 secret for access tokens.
    pub access_secret: String,
    /// HMAC-SHA256 secret for refresh tokens.
    pub refresh_secret: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_minutes: u64,
    /// Refresh token TTL in days.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_days: u64,
    /// Clock-skew leeway applied to `exp` validation, in seconds. Zero by
    /// default, so a token is rejected the moment it expires.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
    /// Cookie carrying the access token for browser clients.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Shared key the identity provider presents on provisioning login.
    /// Provisioning login is disabled when unset.
    #[serde(default)]
    pub provisioning_key: Option<String>,
    /// TTL of the per-member privilege cache in seconds (0 disables it).
    #[serde(default)]
    pub privilege_cache_ttl_seconds: u64,
    /// Maximum number of members held in the privilege cache.
    #[serde(default = "default_cache_capacity")]
    pub privilege_cache_capacity: u64,
}

impl AuthConfig {
    /// Builds a config with the given secrets and default everything else.
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl_minutes: default_access_ttl(),
            refresh_ttl_days: default_refresh_ttl(),
            leeway_seconds: default_leeway(),
            cookie_name: default_cookie_name(),
            provisioning_key: None,
            privilege_cache_ttl_seconds: 0,
            privilege_cache_capacity: default_cache_capacity(),
        }
    }

    /// Enforces the secret contract (both present and distinct) and keeps
    /// the token TTLs within their bounds.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.access_secret.is_empty() || self.refresh_secret.is_empty() {
            return Err(AppError::configuration(
                "auth.access_secret and auth.refresh_secret must both be set",
            ));
        }
        if self.access_secret == self.refresh_secret {
            return Err(AppError::configuration(
                "auth.access_secret and auth.refresh_secret must differ",
            ));
        }
        if self.access_ttl_minutes == 0 || self.refresh_ttl_days == 0 {
            return Err(AppError::configuration("token TTLs must be non-zero"));
        }
        if self.access_ttl_minutes > MAX_ACCESS_TTL_MINUTES {
            return Err(AppError::configuration(format!(
                "auth.access_ttl_minutes must be at most {MAX_ACCESS_TTL_MINUTES}"
            )));
        }
        if self.refresh_ttl_days > MAX_REFRESH_TTL_DAYS {
            return Err(AppError::configuration(format!(
                "auth.refresh_ttl_days must be at most {MAX_REFRESH_TTL_DAYS}"
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .field("leeway_seconds", &self.leeway_seconds)
            .field("cookie_name", &self.cookie_name)
            .field(
                "provisioning_key",
                &self.provisioning_key.as_ref().map(|_| "<redacted>"),
            )
            .field(
                "privilege_cache_ttl_seconds",
                &self.privilege_cache_ttl_seconds,
            )
            .field("privilege_cache_capacity", &self.privilege_cache_capacity)
            .finish()
    }
}

fn default_access_ttl() -> u64 {
    120
}

fn default_refresh_ttl() -> u64 {
    30
}

fn default_leeway() -> u64 {
    0
}

fn default_cookie_name() -> String {
    "sso_access_token".to_string()
}

fn default_cache_capacity() -> u64 {
    10_000
}
