//! Retry utilities for resilient operations
//!
//! This module provides a bounded retry loop with exponential backoff used by
//! the platform requester. The delay after a failed attempt `n` (counted from 0)
//! is `base_delay_ms * backoff_multiplier^n`; no delay follows the final attempt.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,

    /// Base delay in milliseconds for exponential backoff
    pub base_delay_ms: u64,

    /// Maximum delay in milliseconds (caps exponential growth)
    pub max_delay_ms: u64,

    /// Multiplier for exponential backoff (default: 2.0)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a retry configuration with custom delays
    pub fn with_delays(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            max_delay_ms,
            backoff_multiplier: 2.0,
        }
    }

    /// Delay to wait after attempt `attempt` (0-based) has failed
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponential = self.base_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis((exponential as u64).min(self.max_delay_ms))
    }
}

/// Error returned once every attempt has failed
#[derive(Debug)]
pub struct RetriesExhausted<E> {
    /// Number of attempts made
    pub attempts: u32,

    /// Error from the final attempt
    pub last_error: E,
}

/// Execute an operation with retry logic and exponential backoff
///
/// # Returns
///
/// `Ok(T)` from the first successful attempt, or the final error together with
/// the attempt count once `max_attempts` attempts have failed.
///
/// # Example
///
/// ```no_run
/// use strata::utils::retry::{with_retry, RetryConfig};
///
/// # async fn example() {
/// let config = RetryConfig::default();
/// let result = with_retry(&config, || async { Ok::<_, std::io::Error>(42) }).await;
/// assert_eq!(result.ok(), Some(42));
/// # }
/// ```
pub async fn with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    operation: F,
) -> Result<T, RetriesExhausted<E>>
where
    E: Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(attempt = attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) => {
                warn!(
                    attempt = attempt + 1,
                    max_attempts = max_attempts,
                    error = %e,
                    "Operation failed"
                );

                if attempt + 1 >= max_attempts {
                    return Err(RetriesExhausted {
                        attempts: attempt + 1,
                        last_error: e,
                    });
                }

                let delay = config.delay_after(attempt);
                debug!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis(),
                    "Retrying operation after delay"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
