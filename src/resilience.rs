//! Bounded retries for outbound calls
//!
//! Transient failures wait out a doubling backoff schedule and try again;
//! anything else surfaces immediately. Retry state lives on the stack of
//! each call, so concurrent callers never share it.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio_retry::RetryIf;
use tracing::warn;

/// Failures that may clear up on retry.
pub trait Transient {
    /// Whether waiting and retrying can plausibly change the outcome.
    fn is_transient(&self) -> bool;
}

/// Bounded doubling-backoff schedule for one logical client.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: u32,
    base: Duration,
}

impl RetryPolicy {
    /// Creates a policy allowing `max_retries` extra attempts after the
    /// first, starting at `base` delay and doubling each time.
    #[must_use]
    pub const fn new(max_retries: u32, base: Duration) -> Self {
        Self { max_retries, base }
    }

    /// Delay schedule: base, 2×base, 4×base, ...
    fn delays(&self) -> Vec<Duration> {
        (0..self.max_retries).map(|n| self.base * 2u32.pow(n)).collect()
    }

    /// Total wall-clock delay added when every retry is consumed.
    #[must_use]
    pub fn worst_case(&self) -> Duration {
        self.delays().into_iter().sum()
    }
}

/// Runs `operation`, retrying transient failures per `policy`.
///
/// Non-transient failures return without consuming any retry budget. An
/// exhausted budget returns the last observed error.
///
/// # Errors
///
/// Returns the operation's error once it is non-transient or the policy
/// is spent.
pub async fn retry_transient<F, Fut, T, E>(
    policy: RetryPolicy,
    operation_name: &str,
    operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + Display,
{
    RetryIf::spawn(policy.delays(), operation, E::is_transient)
        .await
        .map_err(|e| {
            warn!("{operation_name} failed: {e}");
            e
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use thiserror::Error;
    use tokio::time::Instant;

    #[derive(Debug, Error)]
    enum FakeError {
        #[error("connection reset")]
        Transient,
        #[error("bad request")]
        Permanent,
    }

    impl Transient for FakeError {
        fn is_transient(&self) -> bool {
            matches!(self, Self::Transient)
        }
    }

    const POLICY: RetryPolicy = RetryPolicy::new(3, Duration::from_secs(2));

    #[test]
    fn test_worst_case_sums_the_schedule() {
        // 2s + 4s + 8s
        assert_eq!(POLICY.worst_case(), Duration::from_secs(14));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_back_off_then_succeed() {
        let start = Instant::now();
        let attempt_offsets = Arc::new(std::sync::Mutex::new(Vec::new()));
        let attempts = Arc::new(AtomicU32::new(0));

        let task_offsets = Arc::clone(&attempt_offsets);
        let task_attempts = Arc::clone(&attempts);
        let result = retry_transient(POLICY, "fake call", move || {
            let offsets = Arc::clone(&task_offsets);
            let attempts = Arc::clone(&task_attempts);
            async move {
                offsets
                    .lock()
                    .expect("offsets lock")
                    .push(start.elapsed());
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(FakeError::Transient)
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.expect("third attempt succeeds"), 3);
        // Attempts land at 0s, +2s, +4s on the virtual clock
        let offsets = attempt_offsets.lock().expect("offsets lock").clone();
        assert_eq!(
            offsets,
            vec![
                Duration::ZERO,
                Duration::from_secs(2),
                Duration::from_secs(6),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_budget_surfaces_last_error() {
        let start = Instant::now();
        let attempts = Arc::new(AtomicU32::new(0));

        let task_attempts = Arc::clone(&attempts);
        let result: Result<(), FakeError> = retry_transient(POLICY, "fake call", move || {
            let attempts = Arc::clone(&task_attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(FakeError::Transient)
            }
        })
        .await;

        assert!(matches!(result, Err(FakeError::Transient)));
        // First attempt plus the full schedule of three retries
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(14));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_skips_the_schedule() {
        let start = Instant::now();
        let attempts = Arc::new(AtomicU32::new(0));

        let task_attempts = Arc::clone(&attempts);
        let result: Result<(), FakeError> = retry_transient(POLICY, "fake call", move || {
            let attempts = Arc::clone(&task_attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(FakeError::Permanent)
            }
        })
        .await;

        assert!(matches!(result, Err(FakeError::Permanent)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
