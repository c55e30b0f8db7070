//! Delayed re-attempts for operations that depend on a page still loading.
//!
//! Attempts are spaced by a fixed delay.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Attempt budget and spacing for [`with_retry`].
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    /// Wait between attempts
    pub delay: Duration,
}

impl RetryConfig {
    /// Create a retry configuration; `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Paragraph extraction on a page that may not have rendered yet:
    /// one more try after 2s.
    pub fn extraction() -> Self {
        Self::new(2, Duration::from_secs(2))
    }

    /// Wait before attempt `attempt` (0-indexed); the first attempt runs immediately.
    fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            Duration::ZERO
        } else {
            self.delay
        }
    }
}

impl Default for RetryConfig {
    /// Same as [`RetryConfig::extraction`].
    fn default() -> Self {
        Self::extraction()
    }
}

/// Run `operation` until it succeeds or `config.max_attempts` is reached.
///
/// Returns the last error when every attempt fails.
pub async fn with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = config.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        let delay = config.delay_before(attempt);
        if !delay.is_zero() {
            debug!(
                "{}: waiting {:?} before attempt {}/{}",
                operation_name,
                delay,
                attempt + 1,
                attempts
            );
            sleep(delay).await;
        }

        let error = match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(
                        "{}: succeeded on attempt {}/{}",
                        operation_name,
                        attempt + 1,
                        attempts
                    );
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        attempt += 1;
        if attempt >= attempts {
            warn!(
                "{}: giving up after {} attempts: {}",
                operation_name, attempts, error
            );
            return Err(error);
        }
        warn!("{}: attempt {}/{} failed ({})", operation_name, attempt, attempts, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_extraction_waits_two_seconds_once() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.delay_before(0), Duration::ZERO);
        assert_eq!(config.delay_before(1), Duration::from_secs(2));
    }

    #[test]
    fn test_delay_is_fixed_between_attempts() {
        let config = RetryConfig::new(4, Duration::from_millis(100));
        assert_eq!(config.delay_before(1), Duration::from_millis(100));
        assert_eq!(config.delay_before(3), Duration::from_millis(100));
    }

    #[test]
    fn test_zero_attempts_is_clamped() {
        assert_eq!(RetryConfig::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_first_success_does_not_wait() {
        let config = RetryConfig::new(3, Duration::from_secs(60));
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<&str, &str> = with_retry(&config, "test", || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("paragraphs")
        })
        .await;

        assert_eq!(result, Ok("paragraphs"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_succeeds_on_later_attempt() {
        let config = RetryConfig::new(3, Duration::from_millis(5));
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<u32, &str> = with_retry(&config, "test", || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err("not rendered yet")
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_returns_last_error() {
        let config = RetryConfig::new(2, Duration::from_millis(5));
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), String> = with_retry(&config, "test", || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Err(format!("empty #{}", n))
        })
        .await;

        assert_eq!(result, Err("empty #1".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
