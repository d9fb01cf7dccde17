//! Retry logic.
//!
//! # Responsibilities
//! - Re-run a fallible async operation with exponential backoff + jitter
//! - Propagate the last failure unchanged once attempts are exhausted
//!
//! # Design Decisions
//! - No retryable/fatal classification here; callers decide what to wrap
//! - Jittered backoff prevents thundering herd
//! - Attempt counting starts at 0; total invocations = `max_attempts + 1`

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::resilience::backoff::backoff_delay;

/// Retry parameters for one call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first invocation.
    pub max_attempts: u32,
    /// Delay scale for exponential backoff.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts, base_delay }
    }

    /// Upper bound on how many times the operation runs.
    pub const fn total_invocations(&self) -> u32 {
        self.max_attempts.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Run `operation` until it succeeds or the policy is exhausted.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < policy.max_attempts => {
                let delay = backoff_delay(attempt, policy.base_delay);
                tracing::warn!(
                    attempt = attempt + 1,
                    total = policy.total_invocations(),
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => {
                tracing::warn!(
                    attempts = attempt + 1,
                    error = %error,
                    "All attempts failed"
                );
                return Err(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::new(3, Duration::from_millis(100));

        let result: Result<&str, String> = retry(&policy, move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(format!("failure {n}"))
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::new(3, Duration::from_millis(100));

        let result: Result<(), String> = retry(&policy, move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Err(format!("failure {n}"))
        })
        .await;

        assert_eq!(result.unwrap_err(), "failure 3");
        assert_eq!(calls.load(Ordering::SeqCst), policy.total_invocations());
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_grows_between_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        let start = tokio::time::Instant::now();

        let _: Result<(), &str> = retry(&policy, || async { Err("nope") }).await;

        // 100*[0.5,1) + 200*[0.5,1) + 400*[0.5,1)
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(350), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(703), "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn test_first_success_runs_once() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<u32, String> = retry(&RetryPolicy::default(), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
