//! Bounded retry with exponential backoff.
//!
//! Both the search client and the briefing synthesizer drive their provider
//! calls through the same [`RetryPolicy`] so attempt budgets behave
//! identically everywhere instead of living in ad hoc loops.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

/// A retry budget: how many attempts in total, and the base backoff delay.
///
/// Delay grows as `base_delay * 2^(attempt-1)`: with the 200ms default that
/// is 200ms, 400ms, 800ms between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Backoff before attempt `attempt + 1`, where `attempt` is 1-based.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let millis = self.base_delay.as_millis() as u64;
        Duration::from_millis(millis.saturating_mul(1 << (attempt.saturating_sub(1)).min(16)))
    }

    /// Run `op` until it succeeds, fails non-transiently, or the attempt
    /// budget is exhausted. `transient` classifies which errors are worth
    /// retrying; the final error is returned unchanged.
    pub async fn run<T, E, F, Fut, P>(&self, op_name: &str, mut op: F, transient: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= self.max_attempts || !transient(&err) {
                        tracing::warn!(
                            target: "retry",
                            op = op_name,
                            attempt,
                            max_attempts = self.max_attempts,
                            error = %err,
                            "retry.exhausted"
                        );
                        return Err(err);
                    }
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        target: "retry",
                        op = op_name,
                        attempt,
                        max_attempts = self.max_attempts,
                        backoff_ms = delay.as_millis() as u64,
                        error = %err,
                        "retry.backoff"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
