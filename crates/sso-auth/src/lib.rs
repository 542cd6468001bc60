//! # sso-auth
//!
//! Token lifecycle, session persistence, and privilege resolution.
//!
//! ## Modules
//!
//! - `jwt`: access/refresh claims, HS256 signing and verification
//! - `privilege`: effective privilege from time-bound grants
//! - `session`: session rows keyed by token digests, rotation, cleanup
//! - `token`: issuance, verification, and refresh orchestration
//! - `principal`: the authenticated caller handed to request handlers

pub mod jwt;
pub mod principal;
pub mod privilege;
pub mod session;
pub mod token;

pub use jwt::{AccessClaims, JwtDecoder, JwtEncoder, RefreshClaims};
pub use principal::Principal;
pub use privilege::{PrivilegeResolver, effective_privilege};
pub use session::{SessionCleanup, SessionStore, hash_token};
pub use token::{IssuedTokens, RefreshedAccess, TokenService};
