//! Privilege handlers.

use axum::Json;
use axum::extract::State;

use sso_core::error::{AppError, ErrorKind};
use sso_core::result::AppResult;
use sso_entity::privilege::PrivilegeKind;

use crate::dto::request::{GrantPrivilegeRequest, RevokePrivilegeRequest};
use crate::dto::response::{PrivilegeChangeResponse, PrivilegesResponse};
use crate::extractors::{AuthUser, ValidJson};
use crate::state::AppState;

/// GET /privileges
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<PrivilegesResponse>> {
    let privileges = state.privileges().active_kinds(auth.member_id).await?;

    Ok(Json(PrivilegesResponse {
        success: true,
        privileges,
    }))
}

/// POST /privileges/grant
pub async fn grant(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<GrantPrivilegeRequest>,
) -> AppResult<Json<PrivilegeChangeResponse>> {
    authorize_change(&state, &auth, req.member_id, req.privilege).await?;

    let granted_by = format!("member:{}", auth.member_id);
    state
        .privileges()
        .grant(req.member_id, req.privilege, &granted_by, req.expires_at)
        .await?;

    let privilege = state.privileges().resolve(req.member_id).await?;
    Ok(Json(PrivilegeChangeResponse {
        success: true,
        member_id: req.member_id,
        privilege,
    }))
}

/// POST /privileges/revoke
pub async fn revoke(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<RevokePrivilegeRequest>,
) -> AppResult<Json<PrivilegeChangeResponse>> {
    authorize_change(&state, &auth, req.member_id, req.privilege).await?;

    state
        .privileges()
        .revoke(req.member_id, req.privilege)
        .await?;

    let privilege = state.privileges().resolve(req.member_id).await?;
    Ok(Json(PrivilegeChangeResponse {
        success: true,
        member_id: req.member_id,
        privilege,
    }))
}

/// Admins manage grants up to their own rank, for members that exist.
async fn authorize_change(
    state: &AppState,
    auth: &AuthUser,
    member_id: i64,
    kind: PrivilegeKind,
) -> AppResult<()> {
    auth.require(PrivilegeKind::Admin).await?;
    auth.require(kind).await?;

    state.tokens.member(member_id).await.map_err(|e| {
        if e.kind == ErrorKind::MemberNotFound {
            AppError::not_found(format!("Member {member_id} not found"))
        } else {
            e
        }
    })?;
    Ok(())
}
