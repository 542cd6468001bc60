//! HS256 token signing.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use sso_core::config::AuthConfig;
use sso_core::config::auth::{MAX_ACCESS_TTL_MINUTES, MAX_REFRESH_TTL_DAYS};
use sso_core::error::AppError;
use sso_entity::member::Member;

use super::claims::{AccessClaims, RefreshClaims, TokenType};

/// Signs access tokens and refresh tokens with separate secrets.
#[derive(Clone)]
pub struct JwtEncoder {
    access_key: EncodingKey,
    refresh_key: EncodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration. TTLs above the
    /// accepted bounds are clamped to them.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_key: EncodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_key: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl: Duration::minutes(config.access_ttl_minutes.min(MAX_ACCESS_TTL_MINUTES) as i64),
            refresh_ttl: Duration::days(config.refresh_ttl_days.min(MAX_REFRESH_TTL_DAYS) as i64),
        }
    }

    /// Signs an access token for `member` bound to `session_id`.
    pub fn encode_access(
        &self,
        member: &Member,
        session_id: Uuid,
        issued_at: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let expires_at = issued_at + self.access_ttl;
        let claims = AccessClaims {
            sub: member.id,
            email: member.email.clone(),
            ext: member.external_id.clone(),
            sid: session_id,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
            typ: TokenType::Access,
        };

        let token = encode(&Header::default(), &claims, &self.access_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))?;
        Ok((token, expires_at))
    }

    /// Signs a refresh token for `member_id` bound to `session_id`.
    pub fn encode_refresh(
        &self,
        member_id: i64,
        session_id: Uuid,
        issued_at: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let expires_at = issued_at + self.refresh_ttl;
        let claims = RefreshClaims {
            sub: member_id,
            sid: session_id,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
            typ: TokenType::Refresh,
        };

        let token = encode(&Header::default(), &claims, &self.refresh_key)
            .map_err(|e| AppError::internal(format!("Failed to encode refresh token: {e}")))?;
        Ok((token, expires_at))
    }
}
