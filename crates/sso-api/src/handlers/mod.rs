//! Request handlers organized by domain.

pub mod health;
pub mod privileges;
pub mod sso;
