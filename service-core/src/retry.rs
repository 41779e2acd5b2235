//! Bounded retry with exponential backoff.
//!
//! Each attempt returns an explicit `Result`. The executor sleeps between
//! attempts without blocking the runtime and gives up once the attempt
//! ceiling is reached, handing back the last error.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{info, warn};

/// Retry ceiling and backoff schedule.
///
/// The delay before attempt `n` (zero-based) is `base_delay * 2^n`, and
/// nothing before the first attempt. No jitter is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Always at least 1.
    pub max_attempts: u32,
    /// Unit of the doubling schedule. The first retry waits twice this.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay to wait before the given zero-based attempt.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Delays before every retry, in order.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts.max(1))
            .map(|attempt| self.delay_before(attempt))
            .collect()
    }
}

/// Every attempt failed.
#[derive(Debug, Error)]
#[error("operation failed after {attempts} attempt(s): {last_error}")]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Run `f` until it succeeds or the policy's attempt ceiling is reached.
///
/// `f` receives the zero-based attempt index. Every error is treated as
/// retryable.
///
/// # Example
/// ```ignore
/// let result = retry_with_backoff(&RetryPolicy::default(), "gemini_analyze", |_| async {
///     provider.analyze(&input).await
/// })
/// .await;
/// ```
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut f: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let backoff = policy.delay_before(attempt);
        if !backoff.is_zero() {
            sleep(backoff).await;
        }

        match f(attempt).await {
            Ok(value) => {
                if attempt > 0 {
                    info!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        "Call succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(error) => {
                if attempt + 1 >= max_attempts {
                    warn!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        error = %error,
                        "Call failed after max attempts"
                    );
                    return Err(RetryExhausted {
                        attempts: attempt + 1,
                        last_error: error,
                    });
                }

                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    error = %error,
                    backoff_ms = policy.delay_before(attempt + 1).as_millis() as u64,
                    "Call failed, retrying after backoff"
                );
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn total_delay(policy: &RetryPolicy) -> Duration {
        policy
            .schedule()
            .into_iter()
            .fold(Duration::ZERO, Duration::saturating_add)
    }

    #[test]
    fn default_policy_doubles_from_two_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(
            policy.schedule(),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
                Duration::from_secs(16),
            ]
        );
        assert_eq!(total_delay(&policy), Duration::from_secs(30));
    }

    #[test]
    fn first_attempt_has_no_delay() {
        assert_eq!(RetryPolicy::default().delay_before(0), Duration::ZERO);
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10));
        assert_eq!(policy.max_attempts, 1);
        assert!(policy.schedule().is_empty());
        assert!(RetryPolicy::no_retry().schedule().is_empty());
    }

    #[test]
    fn large_attempt_index_saturates() {
        let policy = RetryPolicy::new(100, Duration::from_secs(1));
        assert!(policy.delay_before(64) >= policy.delay_before(31));
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt_does_not_sleep() {
        let start = Instant::now();
        let result = retry_with_backoff(&RetryPolicy::default(), "test_op", |_| async {
            Ok::<_, String>(42)
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_last_attempt_after_full_backoff() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let counter = calls.clone();
        let result = retry_with_backoff(&RetryPolicy::default(), "test_op", move |attempt| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 4 {
                    Err(format!("failure {}", attempt + 1))
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_reports_last_error() {
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let result = retry_with_backoff(&RetryPolicy::default(), "test_op", move |attempt| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Err::<(), _>(format!("failure {}", attempt + 1)) }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 5);
        assert_eq!(err.last_error, "failure 5");
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn no_retry_policy_calls_once() {
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let result = retry_with_backoff(&RetryPolicy::no_retry(), "test_op", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>("nope") }
        })
        .await;

        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
