use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Whether a failed attempt is worth repeating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Network hiccup or upstream error - retry after the fixed delay
    Transient,
    /// Anything else - fail immediately
    Fatal,
}

/// Bounded fixed-delay retry budget. No backoff: every wait is `delay_ms`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Fixed wait between attempts in milliseconds
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Retry an async operation with a fixed delay between attempts.
///
/// Transient failures are retried until the attempt budget is exhausted;
/// fatal failures and the final transient failure return the error as-is so
/// the caller sees exactly what went wrong (never a silent empty result).
pub async fn retry_fixed_delay<F, Fut, T, E>(
    mut operation: F,
    policy: &RetryPolicy,
    classify: impl Fn(&E) -> ErrorClass,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("Operation succeeded on attempt {}", attempt);
                }
                return Ok(result);
            }
            Err(e) => {
                if classify(&e) == ErrorClass::Fatal {
                    error!("Operation failed with non-retryable error: {}", e);
                    return Err(e);
                }

                if attempt >= policy.max_attempts {
                    error!(
                        "Operation failed after {} attempts (retry budget exhausted): {}",
                        attempt, e
                    );
                    return Err(e);
                }

                warn!(
                    "Attempt {}/{} failed: {} - retrying in {}ms",
                    attempt, policy.max_attempts, e, policy.delay_ms
                );
                tokio::time::sleep(policy.delay()).await;
                attempt += 1;
            }
        }
    }
}
