//! # sso-entity
//!
//! Row and value models for the SSO layer. Database rows derive
//! `sqlx::FromRow`; enums stored in PostgreSQL derive `sqlx::Type`.

pub mod member;
pub mod privilege;
pub mod session;

pub use member::{Member, UpsertMember};
pub use privilege::{NewPrivilegeGrant, PrivilegeGrant, PrivilegeKind};
pub use session::{DeviceInfo, DeviceType, NewSession, Session};
