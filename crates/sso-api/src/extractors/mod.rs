//! Custom Axum extractors.

pub mod auth;
pub mod device;
pub mod json;

pub use auth::AuthUser;
pub use device::ClientDevice;
pub use json::ValidJson;
