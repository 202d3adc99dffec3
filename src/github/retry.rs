use std::future::Future;
use std::time::Duration;

use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;
use tracing::{error, warn};

use super::GithubError;

/// Fixed-delay retry policy for a single GraphQL request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Pause between consecutive attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's attempts are used up. The last error is returned.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, GithubError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GithubError>>,
{
    let max_attempts = policy.attempts();
    let strategy = FixedInterval::new(policy.delay).take((max_attempts - 1) as usize);
    let mut attempt = 0u32;

    let result = RetryIf::spawn(
        strategy,
        || {
            attempt += 1;
            let current = attempt;
            let pending = operation();
            async move {
                pending.await.inspect_err(|e| {
                    if e.is_retryable() {
                        warn!(attempt = current, max_attempts, error = %e, "network error, retrying");
                    } else {
                        error!(error = %e, "GraphQL request rejected");
                    }
                })
            }
        },
        |e: &GithubError| e.is_retryable(),
    )
    .await;

    if let Err(e) = &result {
        if e.is_retryable() {
            error!(max_attempts, "query failed after repeated attempts");
        }
    }
    result
}
