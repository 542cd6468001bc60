//! Shared helpers for HTTP tests against the in-memory stack.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use sso_api::AppState;
use sso_core::config::{
    AppConfig, AuthConfig, DatabaseConfig, DatabaseProvider, LoggingConfig, RetryConfig,
    ServerConfig, SessionConfig,
};
use sso_database::memory::{
    AlwaysHealthy, MemoryMemberRepository, MemoryPrivilegeRepository, MemorySessionRepository,
};
use sso_database::repositories::{HealthProbe, Repositories};
use sso_entity::privilege::{PrivilegeGrant, PrivilegeKind};

pub const PROVISIONING_KEY: &str = "bridge-key";

pub fn test_config() -> AppConfig {
    let mut auth = AuthConfig::new("api-test-access-secret", "api-test-refresh-secret");
    auth.provisioning_key = Some(PROVISIONING_KEY.to_string());

    AppConfig {
        server: ServerConfig::default(),
        database: DatabaseConfig {
            provider: DatabaseProvider::Memory,
            ..DatabaseConfig::default()
        },
        auth,
        session: SessionConfig::default(),
        retry: RetryConfig::new(1, Duration::ZERO),
        logging: LoggingConfig::default(),
    }
}

/// Router plus direct handles on the repositories behind it.
pub struct TestApp {
    pub router: Router,
    pub privileges: Arc<MemoryPrivilegeRepository>,
}

/// A logged-in member.
pub struct LoggedIn {
    pub member_id: i64,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_health(Arc::new(AlwaysHealthy))
    }

    pub fn with_health(health: Arc<dyn HealthProbe>) -> Self {
        let privileges = Arc::new(MemoryPrivilegeRepository::new());
        let repos = Repositories {
            members: Arc::new(MemoryMemberRepository::new()),
            privileges: privileges.clone(),
            sessions: Arc::new(MemorySessionRepository::new()),
            health,
        };
        let state = AppState::from_repositories(test_config(), repos).expect("valid config");

        Self {
            router: sso_api::build_router(state),
            privileges,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let resp = self.router.clone().oneshot(req).await.expect("infallible");
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    /// Logs in through the provisioning endpoint.
    pub async fn login(&self, external_id: &str, user_agent: &str) -> LoggedIn {
        let req = Request::post("/sso/login")
            .header("content-type", "application/json")
            .header("x-provisioning-key", PROVISIONING_KEY)
            .header("user-agent", user_agent)
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::from(
                json!({
                    "externalId": external_id,
                    "email": format!("{external_id}@example.com"),
                    "name": "Rina",
                })
                .to_string(),
            ))
            .expect("request");

        let (status, _, body) = self.send(req).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");

        LoggedIn {
            member_id: body["user"]["id"].as_i64().expect("member id"),
            access_token: body["accessToken"].as_str().expect("access").to_string(),
            refresh_token: body["refreshToken"].as_str().expect("refresh").to_string(),
        }
    }

    /// Stores an active grant directly.
    pub fn grant(&self, member_id: i64, kind: PrivilegeKind) {
        self.privileges.insert_raw(PrivilegeGrant {
            id: 0,
            member_id,
            kind,
            is_active: true,
            granted_at: Utc::now(),
            expires_at: None,
            granted_by: "seed".to_string(),
        });
    }
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn authed(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"));

    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request")
}
