use std::future::Future;
use std::time::Duration;

use blindhour_core::SourceError;

/// Bounded retry with linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Wait after failed attempt `n` is `n * backoff_step`.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            backoff_step: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_step.saturating_mul(attempt)
    }
}

/// Failure of a single attempt.
#[derive(Debug)]
pub enum AttemptError {
    /// Worth another try (transport error, 5xx, 429).
    Retryable(String),
    /// Give up immediately.
    Terminal(SourceError),
}

/// Run `op` until it succeeds, fails terminally, or the policy is spent.
///
/// `op` receives the 1-based attempt number.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, SourceError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last = String::new();
    for attempt in 1..=attempts {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(AttemptError::Terminal(err)) => return Err(err),
            Err(AttemptError::Retryable(message)) => {
                if attempt < attempts {
                    let wait = policy.backoff_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = attempts,
                        wait_ms = wait.as_millis() as u64,
                        error = %message,
                        "source request failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
                last = message;
            }
        }
    }
    Err(SourceError::Unavailable {
        attempts,
        message: last,
    })
}
