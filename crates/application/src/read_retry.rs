use std::future::Future;
use std::time::Duration;

use tracing::warn;
use turnstile_core::AppResult;

/// Retry policy for read operations that hit transient failures.
///
/// Mutations never go through this policy: a batch whose effect is unknown
/// must not be applied twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRetryPolicy {
    attempts: u32,
    backoff: Duration,
}

impl Default for ReadRetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(50))
    }
}

impl ReadRetryPolicy {
    /// Creates a policy with a total attempt count and a linear backoff step.
    #[must_use]
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// Creates a policy that never retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Returns the total number of attempts.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Runs `read`, retrying only transient errors.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut read: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match read().await {
                Err(error) if error.is_transient() && attempt < self.attempts => {
                    warn!(operation, attempt, %error, "retrying transient read failure");
                    tokio::time::sleep(self.backoff * attempt).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
