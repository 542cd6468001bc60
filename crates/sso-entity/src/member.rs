//! Member entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A community member known to the SSO layer.
///
/// Rows are created by identity provisioning. The external id is the
/// identity provider's subject and never changes once set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Member {
    /// Immutable primary key.
    pub id: i64,
    /// Identity-provider subject (unique).
    pub external_id: String,
    /// Verified email address.
    pub email: String,
    /// Display name supplied by the identity provider.
    pub display_name: String,
    /// When the member row was created.
    pub created_at: DateTime<Utc>,
    /// Last successful login.
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Data supplied by the identity provider on login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertMember {
    /// Identity-provider subject.
    pub external_id: String,
    /// Verified email address.
    pub email: String,
    /// Display name.
    pub display_name: String,
}
