//! # sso-core
//!
//! Core crate for the Berkomunitas SSO layer. Contains configuration
//! schemas, the unified error system, and the retry executor used to run
//! storage operations against a flaky connection.
//!
//! This crate has **no** internal dependencies on other SSO crates.

pub mod config;
pub mod error;
pub mod result;
pub mod retry;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
pub use retry::RetryExecutor;
