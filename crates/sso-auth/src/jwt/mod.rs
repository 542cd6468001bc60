//! JWT claims, encoding, and decoding.

pub mod claims;
pub mod decoder;
pub mod encoder;

pub use claims::{AccessClaims, RefreshClaims, TokenType};
pub use decoder::JwtDecoder;
pub use encoder::JwtEncoder;
