//! Token issuance, verification, and refresh.

pub mod service;

pub use service::{IssuedTokens, RefreshedAccess, TokenService};
