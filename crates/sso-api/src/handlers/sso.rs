//! SSO handlers: verify, refresh, login, logout, sessions, activity.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use tracing::info;
use uuid::Uuid;

use sso_auth::hash_token;
use sso_core::config::AuthConfig;
use sso_core::error::AppError;
use sso_core::result::AppResult;
use sso_entity::member::UpsertMember;
use sso_entity::privilege::PrivilegeKind;

use crate::dto::request::{LoginRequest, RefreshRequest, VerifyRequest};
use crate::dto::response::{
    LoginResponse, MessageResponse, RefreshResponse, SessionListResponse, SessionResponse,
    UserResponse, VerifyResponse,
};
use crate::extractors::{AuthUser, ClientDevice, ValidJson};
use crate::state::AppState;

/// Header carrying the shared key of the trusted login bridge.
pub const PROVISIONING_KEY_HEADER: &str = "x-provisioning-key";

/// POST /sso/verify
pub async fn verify(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<VerifyRequest>,
) -> AppResult<Json<VerifyResponse>> {
    let principal = state.tokens.verify(&req.token)?;
    let member = state.tokens.member(principal.member_id).await?;
    let privilege = principal.privilege().await?;

    Ok(Json(VerifyResponse {
        success: true,
        user: UserResponse::new(&member, privilege),
    }))
}

/// POST /sso/refresh
pub async fn refresh(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RefreshRequest>,
) -> AppResult<Json<RefreshResponse>> {
    let refreshed = state.tokens.refresh(&req.refresh_token).await?;

    Ok(Json(RefreshResponse {
        success: true,
        access_token: refreshed.access_token,
        expires_at: refreshed.expires_at,
    }))
}

/// POST /sso/login
///
/// Only the identity-provider bridge holding the provisioning key may call
/// this. It sets the session cookie alongside the JSON tokens.
pub async fn login(
    State(state): State<AppState>,
    ClientDevice(device): ClientDevice,
    headers: HeaderMap,
    ValidJson(req): ValidJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    check_provisioning_key(&state.config.auth, &headers)?;

    let display_name = req
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| req.email.clone());
    let profile = UpsertMember {
        external_id: req.external_id,
        email: req.email,
        display_name,
    };

    let (member, issued) = state.tokens.login(&profile, device).await?;
    let privilege = state.privileges().resolve(member.id).await?;

    info!(member_id = member.id, session_id = %issued.session.id, "Member logged in");

    let cookie = session_cookie(
        &state.config.auth,
        &issued.access_token,
        state.config.auth.access_ttl_minutes * 60,
    );

    Ok((
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            success: true,
            access_token: issued.access_token,
            refresh_token: issued.refresh_token,
            access_expires_at: issued.access_expires_at,
            refresh_expires_at: issued.refresh_expires_at,
            user: UserResponse::new(&member, privilege),
        }),
    ))
}

/// POST /sso/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    state.tokens.revoke_session(auth.session_id).await?;
    info!(member_id = auth.member_id, session_id = %auth.session_id, "Member logged out");

    Ok((
        [(SET_COOKIE, session_cookie(&state.config.auth, "", 0))],
        Json(MessageResponse::ok("Logged out")),
    ))
}

/// GET /sso/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<SessionListResponse>> {
    let sessions = state.sessions().list_active(auth.member_id).await?;
    let current_hash = auth.current_token().map(hash_token);

    let sessions = sessions
        .iter()
        .map(|s| {
            let is_current = current_hash.as_deref() == Some(s.access_token_hash.as_str());
            SessionResponse::from_session(s, is_current)
        })
        .collect();

    Ok(Json(SessionListResponse {
        success: true,
        sessions,
    }))
}

/// DELETE /sso/sessions/{id}
///
/// Members may end their own sessions. Ending someone else's requires
/// `admin`. Unknown ids succeed.
pub async fn revoke_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    if let Some(session) = state.sessions().find_by_id(session_id).await? {
        if session.member_id != auth.member_id {
            auth.require(PrivilegeKind::Admin).await?;
        }
        state.tokens.revoke_session(session_id).await?;
    }

    Ok(Json(MessageResponse::ok("Session revoked")))
}

/// POST /sso/track-activity
pub async fn track_activity(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<MessageResponse>> {
    if !state.sessions().touch(auth.session_id).await? {
        return Err(AppError::stale_session("Session has ended"));
    }

    Ok(Json(MessageResponse::ok("Activity recorded")))
}

fn check_provisioning_key(config: &AuthConfig, headers: &HeaderMap) -> AppResult<()> {
    let expected = config
        .provisioning_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::forbidden("Provisioning login is disabled"))?;

    let provided = headers
        .get(PROVISIONING_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(AppError::forbidden("Invalid provisioning key"))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// `Set-Cookie` value for the access token. A zero `max_age` clears it.
fn session_cookie(config: &AuthConfig, token: &str, max_age_seconds: u64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.cookie_name, token, max_age_seconds
    )
}
