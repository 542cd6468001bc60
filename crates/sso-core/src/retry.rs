//! Bounded retry with exponential backoff for store operations.
//!
//! Only [`ErrorKind::TransientStoreFailure`](crate::ErrorKind) is retried.
//! Every other failure, including authentication failures and permanent
//! store failures, is returned after the first attempt.
//!
//! Cancellation is by drop: if the caller drops the future returned by
//! [`RetryExecutor::execute`] (for example because the HTTP request was
//! aborted), the pending sleep or attempt is dropped with it and no
//! further attempts run.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::config::RetryConfig;
use crate::result::AppResult;

/// Executes store operations with the configured retry policy.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryExecutor {
    /// Creates an executor from configuration.
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.base_delay(),
        }
    }

    /// An executor that never retries. Handy in tests and tools.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Total attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay slept after the failed attempt with zero-based index `attempt`.
    ///
    /// Uses exponential backoff: `base_delay * 2^attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(multiplier)
    }

    /// Runs `operation` until it succeeds, fails non-transiently, or the
    /// attempt budget is spent. The last error is returned unchanged.
    pub async fn execute<F, Fut, T>(&self, op_name: &str, mut operation: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 0u32;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !err.is_transient() || attempt + 1 >= self.max_attempts {
                        return Err(err);
                    }

                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        op = op_name,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient store failure, retrying"
                    );

                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::sync::Mutex;
    use tokio::time::Instant;

    use super::*;
    use crate::error::{AppError, ErrorKind};

    fn executor(max_attempts: u32, base_ms: u64) -> RetryExecutor {
        RetryExecutor::new(&RetryConfig::new(
            max_attempts,
            Duration::from_millis(base_ms),
        ))
    }

    #[test]
    fn test_delay_for_attempt() {
        let exec = executor(3, 500);
        assert_eq!(exec.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(exec.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(exec.delay_for_attempt(2), Duration::from_millis(2000));
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        assert_eq!(executor(0, 10).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_twice_then_success() {
        let exec = executor(3, 500);
        let calls = Arc::new(Mutex::new(Vec::<Instant>::new()));
        let start = Instant::now();

        let result = exec
            .execute("test", || {
                let calls = calls.clone();
                async move {
                    let mut calls = calls.lock().await;
                    calls.push(Instant::now());
                    if calls.len() < 3 {
                        Err(AppError::transient_store("connection reset"))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        let calls = calls.lock().await;
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1] - calls[0], Duration::from_millis(500));
        assert_eq!(calls[2] - calls[1], Duration::from_millis(1000));
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_error_not_retried() {
        let exec = executor(3, 500);
        let count = AtomicU32::new(0);
        let start = Instant::now();

        let result: AppResult<()> = exec
            .execute("test", || {
                count.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::invalid_token("bad signature")) }
            })
            .await;

        assert_eq!(result.unwrap_err().kind, ErrorKind::InvalidToken);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_store_failure_not_retried() {
        let exec = executor(3, 500);
        let count = AtomicU32::new(0);

        let result: AppResult<()> = exec
            .execute("test", || {
                count.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::permanent_store("unique violation")) }
            })
            .await;

        assert_eq!(result.unwrap_err().kind, ErrorKind::PermanentStoreFailure);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let exec = executor(3, 100);
        let count = AtomicU32::new(0);
        let start = Instant::now();

        let result: AppResult<()> = exec
            .execute("test", || {
                let n = count.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Err(AppError::transient_store(format!("attempt {n}"))) }
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::TransientStoreFailure);
        assert_eq!(err.message, "attempt 3");
        assert_eq!(count.load(Ordering::SeqCst), 3);
        // No sleep after the final attempt.
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_future_stops_attempts() {
        let exec = executor(5, 1000);
        let count = Arc::new(AtomicU32::new(0));

        let counter = count.clone();
        let outcome = tokio::time::timeout(
            Duration::from_millis(1500),
            exec.execute("test", move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(AppError::transient_store("timed out")) }
            }),
        )
        .await;

        assert!(outcome.is_err());
        // Attempts at t=0 and t=1000; the t=3000 attempt never runs.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
