//! HTTP tests for the SSO endpoints, driven through the router.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

use sso_core::error::AppError;
use sso_core::result::AppResult;
use sso_database::repositories::HealthProbe;
use sso_entity::privilege::PrivilegeKind;

use common::{PROVISIONING_KEY, TestApp, authed, post_json};

const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/126.0";
const PHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148";

#[tokio::test]
async fn test_login_then_verify() {
    let app = TestApp::new();
    let login = app.login("google-101", DESKTOP_UA).await;

    let (status, _, body) = app
        .send(post_json("/sso/verify", json!({ "token": login.access_token })))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["id"], login.member_id);
    assert_eq!(body["user"]["email"], "google-101@example.com");
    assert_eq!(body["user"]["name"], "Rina");
    assert_eq!(body["user"]["privilege"], "user");
    assert_eq!(body["user"]["isAdmin"], false);
}

#[tokio::test]
async fn test_verify_reports_admin() {
    let app = TestApp::new();
    let login = app.login("google-102", DESKTOP_UA).await;
    app.grant(login.member_id, PrivilegeKind::Admin);

    let (status, _, body) = app
        .send(post_json("/sso/verify", json!({ "token": login.access_token })))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["privilege"], "admin");
    assert_eq!(body["user"]["isAdmin"], true);
}

#[tokio::test]
async fn test_verify_rejects_garbage_token() {
    let app = TestApp::new();

    let (status, _, body) = app
        .send(post_json("/sso/verify", json!({ "token": "not.a.jwt" })))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_TOKEN");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_verify_rejects_refresh_token() {
    let app = TestApp::new();
    let login = app.login("google-103", DESKTOP_UA).await;

    let (status, _, body) = app
        .send(post_json("/sso/verify", json!({ "token": login.refresh_token })))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_malformed_body_is_validation_error() {
    let app = TestApp::new();

    let (status, _, body) = app
        .send(post_json("/sso/verify", json!({ "tok": "x" })))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = TestApp::new();
    let req = Request::post("/sso/login")
        .header("content-type", "application/json")
        .header("x-provisioning-key", PROVISIONING_KEY)
        .body(Body::from(
            json!({ "externalId": "google-104", "email": "a@example.com" }).to_string(),
        ))
        .unwrap();

    let (status, headers, body) = app.send(req).await;

    assert_eq!(status, StatusCode::OK);
    let cookie = headers["set-cookie"].to_str().unwrap();
    let access = body["accessToken"].as_str().unwrap();
    assert!(cookie.starts_with(&format!("sso_access_token={access};")));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=7200"));
    // Falls back to the email without a name.
    assert_eq!(body["user"]["name"], "a@example.com");
}

#[tokio::test]
async fn test_login_requires_provisioning_key() {
    let app = TestApp::new();
    let body = json!({ "externalId": "google-105", "email": "b@example.com" });

    let (status, _, resp) = app.send(post_json("/sso/login", body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(resp["code"], "FORBIDDEN");

    let req = Request::post("/sso/login")
        .header("content-type", "application/json")
        .header("x-provisioning-key", "wrong")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, _, _) = app.send(req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_validates_email() {
    let app = TestApp::new();
    let req = Request::post("/sso/login")
        .header("content-type", "application/json")
        .header("x-provisioning-key", PROVISIONING_KEY)
        .body(Body::from(
            json!({ "externalId": "google-106", "email": "not-an-email" }).to_string(),
        ))
        .unwrap();

    let (status, _, body) = app.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");
}

#[tokio::test]
async fn test_refresh_issues_working_access_token() {
    let app = TestApp::new();
    let login = app.login("google-107", DESKTOP_UA).await;

    let (status, _, body) = app
        .send(post_json(
            "/sso/refresh",
            json!({ "refreshToken": login.refresh_token }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let new_access = body["accessToken"].as_str().unwrap().to_string();
    assert_ne!(new_access, login.access_token);

    let (status, _, body) = app
        .send(post_json("/sso/verify", json!({ "token": new_access })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], login.member_id);

    // The refresh token is not rotated.
    let (status, _, _) = app
        .send(post_json(
            "/sso/refresh",
            json!({ "refreshToken": login.refresh_token }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rejects_unknown_token() {
    let app = TestApp::new();

    let (status, _, body) = app
        .send(post_json("/sso/refresh", json!({ "refreshToken": "bogus" })))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_REFRESH_TOKEN");
}

#[tokio::test]
async fn test_missing_credentials() {
    let app = TestApp::new();
    let req = Request::get("/sso/sessions").body(Body::empty()).unwrap();

    let (status, _, body) = app.send(req).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_sessions_list_marks_current_and_orders_by_activity() {
    let app = TestApp::new();
    let laptop = app.login("google-108", DESKTOP_UA).await;
    let phone = app.login("google-108", PHONE_UA).await;
    assert_eq!(laptop.member_id, phone.member_id);

    // Laptop becomes the most recently active session.
    let (status, _, _) = app
        .send(authed("POST", "/sso/track-activity", &laptop.access_token, None))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = app
        .send(authed("GET", "/sso/sessions", &laptop.access_token, None))
        .await;
    assert_eq!(status, StatusCode::OK);

    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["isCurrent"], true);
    assert_eq!(sessions[0]["deviceType"], "desktop");
    assert_eq!(sessions[0]["ipAddress"], "203.0.113.7");
    assert_eq!(sessions[1]["isCurrent"], false);
    assert_eq!(sessions[1]["deviceType"], "mobile");
}

#[tokio::test]
async fn test_sessions_current_from_cookie() {
    let app = TestApp::new();
    let laptop = app.login("google-109", DESKTOP_UA).await;
    let _phone = app.login("google-109", PHONE_UA).await;

    let req = Request::get("/sso/sessions")
        .header("cookie", format!("theme=dark; sso_access_token={}", laptop.access_token))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = app.send(req).await;

    assert_eq!(status, StatusCode::OK);
    let current: Vec<_> = body["sessions"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["isCurrent"] == true)
        .map(|s| s["userAgent"].clone())
        .collect();
    assert_eq!(current, vec![json!(DESKTOP_UA)]);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::new();
    let login = app.login("google-110", DESKTOP_UA).await;

    let (status, headers, _) = app
        .send(authed("POST", "/sso/logout", &login.access_token, None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers["set-cookie"].to_str().unwrap().contains("Max-Age=0"));

    let (status, _, body) = app
        .send(post_json(
            "/sso/refresh",
            json!({ "refreshToken": login.refresh_token }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_REFRESH_TOKEN");

    let (status, _, body) = app
        .send(authed("POST", "/sso/track-activity", &login.access_token, None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "STALE_SESSION");
}

#[tokio::test]
async fn test_revoking_another_members_session_requires_admin() {
    let app = TestApp::new();
    let owner = app.login("google-111", DESKTOP_UA).await;
    let other = app.login("google-112", DESKTOP_UA).await;

    let (_, _, body) = app
        .send(authed("GET", "/sso/sessions", &owner.access_token, None))
        .await;
    let session_id = body["sessions"][0]["id"].as_str().unwrap().to_string();
    let uri = format!("/sso/sessions/{session_id}");

    let (status, _, body) = app
        .send(authed("DELETE", &uri, &other.access_token, None))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    app.grant(other.member_id, PrivilegeKind::Admin);
    let (status, _, _) = app
        .send(authed("DELETE", &uri, &other.access_token, None))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = app
        .send(post_json(
            "/sso/refresh",
            json!({ "refreshToken": owner.refresh_token }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Revoking again is not an error.
    let (status, _, _) = app
        .send(authed("DELETE", &uri, &other.access_token, None))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_privilege_grant_flow() {
    let app = TestApp::new();
    let admin = app.login("google-113", DESKTOP_UA).await;
    let member = app.login("google-114", DESKTOP_UA).await;
    app.grant(admin.member_id, PrivilegeKind::Admin);

    let (status, _, body) = app
        .send(authed("GET", "/privileges", &member.access_token, None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["privileges"], json!([]));

    let grant = json!({ "memberId": member.member_id, "privilege": "berkomunitasplus" });
    let (status, _, body) = app
        .send(authed("POST", "/privileges/grant", &admin.access_token, Some(grant.clone())))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["privilege"], "berkomunitasplus");

    let (_, _, body) = app
        .send(authed("GET", "/privileges", &member.access_token, None))
        .await;
    assert_eq!(body["privileges"], json!(["berkomunitasplus"]));

    // A plain member cannot grant.
    let (status, _, _) = app
        .send(authed("POST", "/privileges/grant", &member.access_token, Some(grant)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let revoke = json!({ "memberId": member.member_id, "privilege": "berkomunitasplus" });
    let (status, _, body) = app
        .send(authed("POST", "/privileges/revoke", &admin.access_token, Some(revoke)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["privilege"], "user");
}

#[tokio::test]
async fn test_admin_cannot_grant_above_own_rank() {
    let app = TestApp::new();
    let admin = app.login("google-115", DESKTOP_UA).await;
    app.grant(admin.member_id, PrivilegeKind::Admin);

    let grant = json!({ "memberId": admin.member_id, "privilege": "super_admin" });
    let (status, _, _) = app
        .send(authed("POST", "/privileges/grant", &admin.access_token, Some(grant)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_grant_for_unknown_member() {
    let app = TestApp::new();
    let admin = app.login("google-116", DESKTOP_UA).await;
    app.grant(admin.member_id, PrivilegeKind::Admin);

    let grant = json!({ "memberId": 9999, "privilege": "partner" });
    let (status, _, body) = app
        .send(authed("POST", "/privileges/grant", &admin.access_token, Some(grant)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

struct Unreachable;

#[async_trait]
impl HealthProbe for Unreachable {
    async fn ping(&self) -> AppResult<()> {
        Err(AppError::transient_store("connection refused"))
    }
}

#[tokio::test]
async fn test_health() {
    let req = || Request::get("/health").body(Body::empty()).unwrap();

    let (status, _, body) = TestApp::new().send(req()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _, body) = TestApp::with_health(Arc::new(Unreachable)).send(req()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["database"], "unavailable");
}
