//! # sso-database
//!
//! Store adapters for the SSO layer. Repository traits live in
//! [`repositories`]; PostgreSQL implementations sit next to them and
//! process-local implementations live in [`memory`]. Every sqlx error is
//! classified once, in [`classify`], into a transient or permanent store
//! failure.

pub mod classify;
pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{
    HealthProbe, MemberRepository, PrivilegeRepository, Repositories, SessionRepository,
};
