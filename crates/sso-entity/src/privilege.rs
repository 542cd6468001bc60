//! Privilege kinds and grants.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Privilege tiers, ordered from least to most privileged:
/// User < Partner < BerkomunitasPlus < Admin < SuperAdmin.
///
/// Comparisons go through [`PrivilegeKind::rank`]. Never compare the
/// string names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "privilege_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PrivilegeKind {
    /// Baseline tier every member has.
    User,
    /// Partner organisations.
    Partner,
    /// Paid community tier.
    #[sqlx(rename = "berkomunitasplus")]
    #[serde(rename = "berkomunitasplus")]
    BerkomunitasPlus,
    /// Community administrators.
    Admin,
    /// Platform owners.
    SuperAdmin,
}

impl PrivilegeKind {
    /// All kinds in ascending rank order.
    pub const ALL: [PrivilegeKind; 5] = [
        Self::User,
        Self::Partner,
        Self::BerkomunitasPlus,
        Self::Admin,
        Self::SuperAdmin,
    ];

    /// Numeric rank (higher = more privileged).
    pub fn rank(&self) -> u8 {
        match self {
            Self::User => 1,
            Self::Partner => 2,
            Self::BerkomunitasPlus => 3,
            Self::Admin => 4,
            Self::SuperAdmin => 5,
        }
    }

    /// Check if this kind carries at least the privileges of `other`.
    pub fn has_at_least(&self, other: PrivilegeKind) -> bool {
        self.rank() >= other.rank()
    }

    /// Admin or above.
    pub fn is_admin(&self) -> bool {
        self.has_at_least(Self::Admin)
    }

    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Partner => "partner",
            Self::BerkomunitasPlus => "berkomunitasplus",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }
}

impl PartialOrd for PrivilegeKind {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PrivilegeKind {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for PrivilegeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrivilegeKind {
    type Err = sso_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "partner" => Ok(Self::Partner),
            "berkomunitasplus" => Ok(Self::BerkomunitasPlus),
            "admin" => Ok(Self::Admin),
            "super_admin" => Ok(Self::SuperAdmin),
            _ => Err(sso_core::AppError::validation(format!(
                "Invalid privilege: '{s}'. Expected one of: user, partner, \
                 berkomunitasplus, admin, super_admin"
            ))),
        }
    }
}

/// A stored privilege grant. A member may hold several at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PrivilegeGrant {
    /// Row identifier.
    pub id: i64,
    /// Member the grant belongs to.
    pub member_id: i64,
    /// Granted tier.
    pub kind: PrivilegeKind,
    /// Cleared on revocation. Grants are never deleted.
    pub is_active: bool,
    /// When the grant was created.
    pub granted_at: DateTime<Utc>,
    /// Optional expiry. Past-expiry grants are ignored even when active.
    pub expires_at: Option<DateTime<Utc>>,
    /// Who issued the grant.
    pub granted_by: String,
}

impl PrivilegeGrant {
    /// Whether the grant counts toward the effective privilege at `now`.
    pub fn is_effective(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.is_none_or(|exp| exp > now)
    }
}

/// Data required to create a grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPrivilegeGrant {
    /// Member receiving the grant.
    pub member_id: i64,
    /// Granted tier.
    pub kind: PrivilegeKind,
    /// Who issued the grant.
    pub granted_by: String,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
}
