//! Unified application error types for the SSO layer.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the `?` operator. Authentication failures and store
//! failures are separate kinds so the HTTP layer never confuses "could not
//! reach the session store" with "your credentials are invalid".

use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Signature mismatch or malformed access token.
    InvalidToken,
    /// Access token signature is valid but its expiry has passed.
    ExpiredToken,
    /// Refresh token is malformed, expired, or matches no session.
    InvalidRefreshToken,
    /// The refresh token no longer matches a live session
    /// (concurrent rotation, prior logout, or session expiry).
    StaleSession,
    /// The token references a member that no longer exists.
    MemberNotFound,
    /// No credential was presented.
    Unauthenticated,
    /// The caller is authenticated but lacks the required privilege.
    Forbidden,
    /// Input validation failed.
    Validation,
    /// The requested resource was not found.
    NotFound,
    /// A connection-level storage failure that outlived the retry budget.
    TransientStoreFailure,
    /// Any other storage failure. Never retried.
    PermanentStoreFailure,
    /// A configuration error occurred.
    Configuration,
    /// An internal server error occurred.
    Internal,
}

impl ErrorKind {
    /// Whether this kind is an authentication failure (401-class).
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken
                | Self::ExpiredToken
                | Self::InvalidRefreshToken
                | Self::StaleSession
                | Self::MemberNotFound
                | Self::Unauthenticated
        )
    }

    /// Whether this kind is a storage failure (5xx-class).
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Self::TransientStoreFailure | Self::PermanentStoreFailure
        )
    }

    /// HTTP status this kind surfaces as.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidToken
            | Self::ExpiredToken
            | Self::InvalidRefreshToken
            | Self::StaleSession
            | Self::MemberNotFound
            | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::TransientStoreFailure => StatusCode::SERVICE_UNAVAILABLE,
            Self::PermanentStoreFailure | Self::Configuration | Self::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidToken => write!(f, "INVALID_TOKEN"),
            Self::ExpiredToken => write!(f, "EXPIRED_TOKEN"),
            Self::InvalidRefreshToken => write!(f, "INVALID_REFRESH_TOKEN"),
            Self::StaleSession => write!(f, "STALE_SESSION"),
            Self::MemberNotFound => write!(f, "MEMBER_NOT_FOUND"),
            Self::Unauthenticated => write!(f, "UNAUTHENTICATED"),
            Self::Forbidden => write!(f, "FORBIDDEN"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::TransientStoreFailure => write!(f, "TRANSIENT_STORE_FAILURE"),
            Self::PermanentStoreFailure => write!(f, "PERMANENT_STORE_FAILURE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout the SSO layer.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid-token error.
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidToken, message)
    }

    /// Create an expired-token error.
    pub fn expired_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExpiredToken, message)
    }

    /// Create an invalid-refresh-token error.
    pub fn invalid_refresh_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRefreshToken, message)
    }

    /// Create a stale-session error.
    pub fn stale_session(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StaleSession, message)
    }

    /// Create a member-not-found error.
    pub fn member_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MemberNotFound, message)
    }

    /// Create an unauthenticated error.
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthenticated, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a transient store failure.
    pub fn transient_store(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransientStoreFailure, message)
    }

    /// Create a permanent store failure.
    pub fn permanent_store(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PermanentStoreFailure, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether the retry executor should try the failed operation again.
    pub fn is_transient(&self) -> bool {
        self.kind == ErrorKind::TransientStoreFailure
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Internal,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

/// Error body returned to HTTP clients.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();

        // Store and internal details stay in the logs.
        let message = if status.is_server_error() {
            tracing::error!(kind = %self.kind, error = %self.message, "Request failed");
            match self.kind {
                ErrorKind::TransientStoreFailure => "Session store temporarily unavailable",
                _ => "Internal server error",
            }
            .to_string()
        } else {
            self.message
        };

        let body = ErrorBody {
            error: message,
            code: self.kind.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
