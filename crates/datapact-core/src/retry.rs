//! Bounded retry policy for startup loads
//!
//! The issuer and the serving process share a filesystem location but
//! run on independent schedules, so the data may not exist yet when a
//! load first runs. The retry policy is explicit (max attempts, fixed
//! delay) rather than inline control flow so both the store and the
//! directory load with the same discipline.

use std::future::Future;
use std::time::Duration;

/// A fixed-delay retry policy with a bounded attempt count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (at least one is always made).
    pub max_attempts: u32,

    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            delay: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt bound and delay.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// A policy that attempts exactly once, useful in tests.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Run `op` until it succeeds or the attempt bound is reached.
    ///
    /// Returns the error from the final attempt when exhausted. This
    /// is the only suspension point on the startup path; nothing on
    /// the per-request path ever retries.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt >= max_attempts => return Err(error),
                Err(error) => {
                    tracing::debug!(attempt, max_attempts, %error, "load not ready, waiting");
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}
