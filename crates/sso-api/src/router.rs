//! Route definitions for the SSO HTTP API.

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::cors::build_cors_layer;
use crate::state::AppState;

/// Builds the router with all routes and layers.
pub fn build_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);

    Router::new()
        .merge(sso_routes())
        .merge(privilege_routes())
        .route("/health", get(handlers::health::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Token and session endpoints.
fn sso_routes() -> Router<AppState> {
    Router::new()
        .route("/sso/verify", post(handlers::sso::verify))
        .route("/sso/refresh", post(handlers::sso::refresh))
        .route("/sso/login", post(handlers::sso::login))
        .route("/sso/logout", post(handlers::sso::logout))
        .route("/sso/sessions", get(handlers::sso::list_sessions))
        .route("/sso/sessions/{id}", delete(handlers::sso::revoke_session))
        .route("/sso/track-activity", post(handlers::sso::track_activity))
}

/// Privilege lookup and administration.
fn privilege_routes() -> Router<AppState> {
    Router::new()
        .route("/privileges", get(handlers::privileges::list))
        .route("/privileges/grant", post(handlers::privileges::grant))
        .route("/privileges/revoke", post(handlers::privileges::revoke))
}
