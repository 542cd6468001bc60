//! Session persistence, rotation, and expiry cleanup.

pub mod cleanup;
pub mod store;

pub use cleanup::SessionCleanup;
pub use store::{SessionStore, hash_token};
