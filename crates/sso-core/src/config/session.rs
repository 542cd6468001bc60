//! Session lifetime configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Longest accepted session idle window.
pub const MAX_IDLE_EXPIRY_DAYS: u64 = 365;

/// Session lifetime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Days a session stays valid after creation. Never extends past
    /// the refresh token's own expiry.
    #[serde(default = "default_idle_expiry")]
    pub idle_expiry_days: u64,
    /// Interval for expired session cleanup in minutes (0 disables it).
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_expiry_days: default_idle_expiry(),
            cleanup_interval_minutes: default_cleanup_interval(),
        }
    }
}

impl SessionConfig {
    /// Rejects an empty or out-of-range idle window.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.idle_expiry_days == 0 {
            return Err(AppError::configuration(
                "session.idle_expiry_days must be non-zero",
            ));
        }
        if self.idle_expiry_days > MAX_IDLE_EXPIRY_DAYS {
            return Err(AppError::configuration(format!(
                "session.idle_expiry_days must be at most {MAX_IDLE_EXPIRY_DAYS}"
            )));
        }
        Ok(())
    }
}

fn default_idle_expiry() -> u64 {
    7
}

fn default_cleanup_interval() -> u64 {
    15
}
