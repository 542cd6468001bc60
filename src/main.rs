//! Berkomunitas SSO server.
//!
//! Wires configuration, storage, the token service, and the HTTP API
//! together and runs until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use sso_api::AppState;
use sso_auth::SessionCleanup;
use sso_core::config::{AppConfig, DatabaseProvider};
use sso_core::error::AppError;
use sso_database::connection::DatabasePool;
use sso_database::repositories::Repositories;

#[tokio::main]
async fn main() {
    let env = std::env::var("SSO_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Berkomunitas SSO v{}", env!("CARGO_PKG_VERSION"));

    // Storage
    let (repos, db_pool) = match config.database.provider {
        DatabaseProvider::Postgres => {
            let db_pool = DatabasePool::connect(&config.database).await?;
            if config.database.run_migrations {
                sso_database::migration::run_migrations(db_pool.pool()).await?;
            }
            (Repositories::postgres(&db_pool), Some(db_pool))
        }
        DatabaseProvider::Memory => {
            tracing::warn!("Using in-memory storage; sessions are lost on restart");
            (Repositories::memory(), None)
        }
    };

    let shutdown_grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let cleanup_minutes = config.session.cleanup_interval_minutes;
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let app_state = AppState::from_repositories(config, repos)?;

    // Expired session purge
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let cleanup_handle = if cleanup_minutes > 0 {
        let interval = Duration::from_secs(cleanup_minutes.saturating_mul(60));
        let cleanup = SessionCleanup::new(app_state.sessions().clone(), interval);
        Some(tokio::spawn(cleanup.run(shutdown_rx)))
    } else {
        tracing::info!("Expired session cleanup disabled");
        None
    };

    let app = sso_api::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("SSO server listening on {}", addr);

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    tracing::info!("Waiting for background tasks to complete...");
    if let Some(handle) = cleanup_handle {
        let _ = tokio::time::timeout(shutdown_grace, handle).await;
    }

    if let Some(db_pool) = db_pool {
        db_pool.close().await;
    }

    tracing::info!("SSO server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
