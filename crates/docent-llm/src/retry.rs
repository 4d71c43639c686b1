use std::future::Future;
use std::time::Duration;

use crate::error::LlmError;

/// Bounded retry with exponential backoff and a per-attempt deadline.
///
/// Every attempt runs under `timeout`; an expired deadline surfaces as
/// [`LlmError::Timeout`]. Only errors for which [`LlmError::is_transient`] holds
/// are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A single attempt under the default deadline.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before the retry that follows the zero-based `attempt`.
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Run `f` until it succeeds, fails permanently, or attempts are exhausted.
    ///
    /// # Errors
    ///
    /// Returns the last error produced by `f`, or [`LlmError::Timeout`] if the final
    /// attempt exceeded the deadline.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut f: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let result = match tokio::time::timeout(self.timeout, f()).await {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout {
                    operation: operation.to_owned(),
                    timeout: self.timeout,
                }),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt + 1 < max_attempts => {
                    let delay = self.backoff_for(attempt);
                    tracing::warn!(
                        operation,
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "{e}, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(40),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = fast_policy(5);
        assert_eq!(policy.backoff_for(0), Duration::from_millis(10));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(20));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(40));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(40));
        assert_eq!(policy.backoff_for(40), Duration::from_millis(40));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_first_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = fast_policy(3)
            .run("test", || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, LlmError>(7)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = fast_policy(3)
            .run("test", || {
                let c = Arc::clone(&c);
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(LlmError::RateLimited)
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<(), _> = fast_policy(3)
            .run("test", || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(LlmError::Unavailable)
                }
            })
            .await;
        assert!(matches!(result, Err(LlmError::Unavailable)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<(), _> = fast_policy(5)
            .run("test", || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(LlmError::Other("bad request".into()))
                }
            })
            .await;
        assert!(matches!(result, Err(LlmError::Other(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_call_surfaces_as_timeout() {
        let policy = RetryPolicy {
            max_attempts: 2,
            timeout: Duration::from_millis(100),
            ..fast_policy(2)
        };
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<(), _> = policy
            .run("slow embed", || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    std::future::pending::<()>().await;
                    Ok(())
                }
            })
            .await;
        match result {
            Err(LlmError::Timeout { operation, timeout }) => {
                assert_eq!(operation, "slow embed");
                assert_eq!(timeout, Duration::from_millis(100));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_runs_once() {
        let result = fast_policy(0)
            .run("test", || async { Ok::<_, LlmError>(1) })
            .await;
        assert_eq!(result.unwrap(), 1);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn backoff_never_exceeds_cap(attempt in 0u32..200, initial_ms in 1u64..5_000, cap_ms in 1u64..60_000) {
            let policy = RetryPolicy {
                max_attempts: 3,
                initial_backoff: Duration::from_millis(initial_ms),
                max_backoff: Duration::from_millis(cap_ms),
                timeout: Duration::from_secs(1),
            };
            prop_assert!(policy.backoff_for(attempt) <= Duration::from_millis(cap_ms));
        }
    }
}
