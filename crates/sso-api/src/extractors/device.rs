//! Client device details for session bookkeeping.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;

use sso_entity::session::DeviceInfo;

/// User agent and client IP of the request.
///
/// The IP comes from the first `X-Forwarded-For` entry, then `X-Real-IP`,
/// then the socket peer when the server was started with connect info.
#[derive(Debug, Clone, Default)]
pub struct ClientDevice(pub DeviceInfo);

impl<S> FromRequestParts<S> for ClientDevice
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let ip_address = header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .or_else(|| header("x-real-ip").map(String::from))
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|info| info.0.ip().to_string())
            });

        Ok(ClientDevice(DeviceInfo {
            user_agent,
            ip_address,
        }))
    }
}
