//! Store error classification.
//!
//! The single place where a sqlx error becomes an [`AppError`]. Connection
//! level failures map to [`ErrorKind::TransientStoreFailure`] and are
//! retried by the retry executor; everything else maps to
//! [`ErrorKind::PermanentStoreFailure`].

use std::io;

use sso_core::error::{AppError, ErrorKind};

/// SQLSTATE codes outside class `08` that indicate a transient condition.
const TRANSIENT_SQLSTATES: &[&str] = &[
    // admin_shutdown
    "57P01",
    // crash_shutdown
    "57P02",
    // cannot_connect_now
    "57P03",
    // too_many_connections
    "53300",
];

/// Converts a sqlx error into an [`AppError`] with `context` as message.
pub fn store_error(context: &str, err: sqlx::Error) -> AppError {
    let kind = if is_transient(&err) {
        ErrorKind::TransientStoreFailure
    } else {
        ErrorKind::PermanentStoreFailure
    };
    AppError::with_source(kind, context.to_string(), err)
}

/// Whether a sqlx error is a connection-level failure worth retrying.
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(io_err) => is_transient_io(io_err.kind()),
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .map(|code| is_transient_sqlstate(&code))
            .unwrap_or(false),
        _ => false,
    }
}

/// Whether an I/O error kind indicates a dropped or unreachable connection.
pub fn is_transient_io(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::TimedOut
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof
    )
}

/// Whether a PostgreSQL SQLSTATE code indicates a transient condition.
pub fn is_transient_sqlstate(code: &str) -> bool {
    code.starts_with("08") || TRANSIENT_SQLSTATES.contains(&code)
}
