//! Periodic purge of expired sessions.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use sso_core::error::AppError;

use super::store::SessionStore;

/// Deletes expired session rows on an interval until shutdown.
#[derive(Debug, Clone)]
pub struct SessionCleanup {
    session_store: SessionStore,
    interval: Duration,
}

impl SessionCleanup {
    /// Creates a new cleanup handler.
    pub fn new(session_store: SessionStore, interval: Duration) -> Self {
        Self {
            session_store,
            interval,
        }
    }

    /// Runs one cleanup cycle. Returns the number of sessions removed.
    pub async fn run_cleanup(&self) -> Result<u64, AppError> {
        let purged = self.session_store.purge_expired().await?;
        if purged > 0 {
            info!(purged, "Expired sessions purged");
        }
        Ok(purged)
    }

    /// Runs cleanup cycles until `shutdown` flips to `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cleanup().await {
                        error!(error = %e, "Session cleanup failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Session cleanup stopped");
                        return;
                    }
                }
            }
        }
    }
}
