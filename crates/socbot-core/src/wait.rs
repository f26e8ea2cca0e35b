//! Condition-based waiting.
//!
//! The target system gives no reliable completion signal for its page scripts, so every wait
//! is a predicate polled until it holds or the policy's timeout elapses.

use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Bounded polling with optional backoff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub interval: Duration,
    /// Multiplier applied to the interval after every unsuccessful poll
    pub backoff: f64,
    pub max_interval: Duration,
}

impl WaitPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(250);

    /// Poll every [`Self::DEFAULT_INTERVAL`] for at most `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            interval: Self::DEFAULT_INTERVAL,
            backoff: 1.0,
            max_interval: Self::DEFAULT_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self.max_interval = self.max_interval.max(interval);
        self
    }

    pub fn with_backoff(mut self, factor: f64, max_interval: Duration) -> Self {
        self.backoff = factor.max(1.0);
        self.max_interval = max_interval.max(self.interval);
        self
    }

    /// Poll `check` until it returns `true` or the timeout elapses.
    ///
    /// The predicate always runs at least once. An error counts as "not yet": pages being
    /// replaced make evaluation fail for a moment. It is returned only when the final poll
    /// before the timeout also failed.
    pub async fn until<F, Fut, E>(&self, mut check: F) -> Result<bool, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, E>>,
        E: fmt::Display,
    {
        let started = Instant::now();
        let mut interval = self.interval;

        loop {
            let last_error = match check().await {
                Ok(true) => return Ok(true),
                Ok(false) => None,
                Err(e) => Some(e),
            };

            let elapsed = started.elapsed();
            if elapsed >= self.timeout {
                return match last_error {
                    Some(e) => Err(e),
                    None => Ok(false),
                };
            }
            if let Some(e) = last_error {
                tracing::debug!("Wait check failed, polling again: {}", e);
            }

            let remaining = self.timeout - elapsed;
            tokio::time::sleep(interval.min(remaining)).await;

            if self.backoff > 1.0 {
                interval = interval.mul_f64(self.backoff).min(self.max_interval);
            }
        }
    }
}

/// Fixed delay for page scripts with no observable completion; zero is a no-op
pub async fn settle(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
