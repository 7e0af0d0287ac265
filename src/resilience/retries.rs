//! Retry logic.
//!
//! # Responsibilities
//! - Re-run a fallible async operation while its error is retryable
//! - Sleep with jittered exponential backoff between attempts
//! - Give up after `max_attempts` and return the last error

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::config::InventoryConfig;
use crate::resilience::backoff::calculate_backoff;

/// How many times, and how patiently, to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn from_inventory(config: &InventoryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent.
    pub async fn retry<T, E, F, Fut, R>(&self, what: &str, is_retryable: R, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && is_retryable(&e) => {
                    let delay = calculate_backoff(attempt, self.base_delay, self.max_delay);
                    tracing::info!(operation = what, attempt, delay = ?delay, error = %e, "Retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
