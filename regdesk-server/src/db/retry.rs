//! Fixed-delay retry for transient connection loss
//!
//! A dropped connection waits a constant delay and tries again, up to
//! `max_attempts` attempts in total. Every other failure returns at once.

use std::future::Future;
use std::time::Duration;

use super::error::DbError;

/// Default attempts for a single statement.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Constant pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Retry policy for statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts in total, including the first. Zero is treated as one.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

/// Run `op` under `policy`. `op` receives the 1-based attempt number.
///
/// Exhausting the attempts surfaces the last error observed.
pub async fn run<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, DbError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, DbError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < max_attempts => {
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %err,
                    "connection lost, retrying statement"
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(err) => {
                if err.is_transient() {
                    tracing::error!(attempts = attempt, error = %err, "retries exhausted");
                }
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn connection_lost() -> DbError {
        DbError::Sqlx(sqlx::Error::Io(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "connection lost",
        )))
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt_after_two_delays() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result = run(RetryPolicy::new(3), |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(connection_lost())
                } else {
                    Ok("row")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "row");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Two fixed one-second pauses on the paused clock
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(2) && waited < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_surfaces_last_error() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = run(RetryPolicy::new(3), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Err(DbError::Sqlx(sqlx::Error::Io(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    format!("attempt {attempt}"),
                ))))
            }
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("attempt 3"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_is_not_retried() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result: Result<(), _> = run(RetryPolicy::new(3), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(DbError::Sqlx(sqlx::Error::RowNotFound)) }
        })
        .await;

        assert!(matches!(result, Err(DbError::Sqlx(sqlx::Error::RowNotFound))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_runs_once() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = run(RetryPolicy::new(0), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(connection_lost()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(1));
    }
}
