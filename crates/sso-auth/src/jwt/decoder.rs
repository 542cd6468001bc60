//! HS256 token verification.

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use sso_core::config::AuthConfig;
use sso_core::error::AppError;

use super::claims::{AccessClaims, RefreshClaims, TokenType};

/// Verifies signatures, expiry, and token type. Never touches storage.
#[derive(Clone)]
pub struct JwtDecoder {
    access_key: DecodingKey,
    refresh_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;

        Self {
            access_key: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_key: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token.
    ///
    /// An expired signature yields `ExpiredToken`; every other failure,
    /// including a refresh token presented here, yields `InvalidToken`.
    pub fn decode_access(&self, token: &str) -> Result<AccessClaims, AppError> {
        let data = decode::<AccessClaims>(token, &self.access_key, &self.validation).map_err(
            |e| match e.kind() {
                JwtErrorKind::ExpiredSignature => AppError::expired_token("Token has expired"),
                JwtErrorKind::InvalidSignature => {
                    AppError::invalid_token("Invalid token signature")
                }
                _ => AppError::invalid_token("Invalid token"),
            },
        )?;

        if data.claims.typ != TokenType::Access {
            return Err(AppError::invalid_token(
                "Invalid token type: expected access token",
            ));
        }
        Ok(data.claims)
    }

    /// Decodes and validates a refresh token. Every failure, expiry
    /// included, yields `InvalidRefreshToken`.
    pub fn decode_refresh(&self, token: &str) -> Result<RefreshClaims, AppError> {
        let data = decode::<RefreshClaims>(token, &self.refresh_key, &self.validation)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => {
                    AppError::invalid_refresh_token("Refresh token has expired")
                }
                _ => AppError::invalid_refresh_token("Invalid refresh token"),
            })?;

        if data.claims.typ != TokenType::Refresh {
            return Err(AppError::invalid_refresh_token(
                "Invalid token type: expected refresh token",
            ));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use sso_core::error::ErrorKind;
    use sso_entity::member::Member;

    use super::*;
    use crate::jwt::encoder::JwtEncoder;

    fn config() -> AuthConfig {
        AuthConfig::new("access-secret-for-tests", "refresh-secret-for-tests")
    }

    fn member() -> Member {
        Member {
            id: 42,
            external_id: "google-42".to_string(),
            email: "budi@example.com".to_string(),
            display_name: "Budi".to_string(),
            created_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_access_round_trip() {
        let config = config();
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&config);
        let sid = Uuid::new_v4();

        let (token, _) = encoder.encode_access(&member(), sid, Utc::now()).unwrap();
        let claims = decoder.decode_access(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.sid, sid);
        assert_eq!(claims.ext, "google-42");
    }

    #[test]
    fn test_expired_access_token() {
        let config = config();
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&config);

        let issued = Utc::now() - Duration::hours(3);
        let (token, _) = encoder.encode_access(&member(), Uuid::new_v4(), issued).unwrap();
        let err = decoder.decode_access(&token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExpiredToken);
    }

    #[test]
    fn test_access_token_expired_seconds_ago() {
        let config = config();
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&config);

        for seconds in 1..=3 {
            let issued = Utc::now()
                - Duration::minutes(config.access_ttl_minutes as i64)
                - Duration::seconds(seconds);
            let (token, _) = encoder.encode_access(&member(), Uuid::new_v4(), issued).unwrap();
            let err = decoder.decode_access(&token).unwrap_err();
            assert_eq!(err.kind, ErrorKind::ExpiredToken, "expired {seconds}s ago");
        }
    }

    #[test]
    fn test_leeway_is_opt_in() {
        let mut config = config();
        config.leeway_seconds = 30;
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&config);

        let issued = Utc::now()
            - Duration::minutes(config.access_ttl_minutes as i64)
            - Duration::seconds(3);
        let (token, _) = encoder.encode_access(&member(), Uuid::new_v4(), issued).unwrap();
        assert!(decoder.decode_access(&token).is_ok());
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let config = config();
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&config);

        let (refresh, _) = encoder.encode_refresh(42, Uuid::new_v4(), Utc::now()).unwrap();
        let err = decoder.decode_access(&refresh).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }

    #[test]
    fn test_access_token_rejected_as_refresh() {
        let config = config();
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&config);

        let (access, _) = encoder.encode_access(&member(), Uuid::new_v4(), Utc::now()).unwrap();
        let err = decoder.decode_refresh(&access).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRefreshToken);
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let encoder = JwtEncoder::new(&AuthConfig::new("other-access", "other-refresh"));
        let decoder = JwtDecoder::new(&config());

        let (token, _) = encoder.encode_access(&member(), Uuid::new_v4(), Utc::now()).unwrap();
        let err = decoder.decode_access(&token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }

    #[test]
    fn test_garbage_rejected() {
        let decoder = JwtDecoder::new(&config());
        assert_eq!(
            decoder.decode_access("not-a-jwt").unwrap_err().kind,
            ErrorKind::InvalidToken
        );
        assert_eq!(
            decoder.decode_refresh("not-a-jwt").unwrap_err().kind,
            ErrorKind::InvalidRefreshToken
        );
    }
}
