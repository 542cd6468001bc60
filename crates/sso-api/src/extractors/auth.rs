//! `AuthUser` extractor: takes the access token from the `Authorization`
//! header or the session cookie and verifies it.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;

use sso_auth::Principal;
use sso_core::error::AppError;
use sso_core::result::AppResult;
use sso_entity::privilege::PrivilegeKind;

use crate::state::AppState;

/// The verified caller of a request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Identity carried by the access token.
    pub principal: Principal,
    /// Token from `Authorization: Bearer`, if sent.
    pub bearer_token: Option<String>,
    /// Token from the session cookie, if sent.
    pub cookie_token: Option<String>,
}

impl AuthUser {
    /// The token identifying the caller's current session: the cookie
    /// when present, otherwise the bearer token.
    pub fn current_token(&self) -> Option<&str> {
        self.cookie_token
            .as_deref()
            .or(self.bearer_token.as_deref())
    }

    /// Fails with `Forbidden` unless the caller ranks at or above `required`.
    pub async fn require(&self, required: PrivilegeKind) -> AppResult<()> {
        if self.principal.has_at_least(required).await? {
            Ok(())
        } else {
            Err(AppError::forbidden(format!("Requires {required} privilege")))
        }
    }
}

impl std::ops::Deref for AuthUser {
    type Target = Principal;
    fn deref(&self) -> &Self::Target {
        &self.principal
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer_token = bearer_token(&parts.headers).map(String::from);
        let cookie_token =
            cookie_value(&parts.headers, &state.config.auth.cookie_name).map(String::from);

        let token = bearer_token
            .as_deref()
            .or(cookie_token.as_deref())
            .ok_or_else(|| AppError::unauthenticated("No token provided"))?;

        let principal = state.tokens.verify(token)?;

        Ok(AuthUser {
            principal,
            bearer_token,
            cookie_token,
        })
    }
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Value of the cookie called `name`, searching every `Cookie` header.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
        .filter(|value| !value.is_empty())
}
