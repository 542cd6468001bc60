//! # sso-api
//!
//! HTTP API layer for the Berkomunitas SSO service built on Axum.
//!
//! Partner sites call these endpoints to verify access tokens, refresh
//! them, and manage the caller's sessions and privileges.

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
