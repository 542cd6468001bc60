//! Effective privilege resolution.

pub mod resolver;

pub use resolver::{PrivilegeResolver, effective_privilege};
