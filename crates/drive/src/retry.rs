//! Exponential backoff for retriable SDK calls.

use std::future::Future;
use std::time::Duration;

use swarmdesk_sdk::SdkError;
use tracing::warn;

/// Backoff settings for retriable SDK failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Cap on any single delay.
    pub max_delay: Duration,
    pub backoff_factor: f64,
    /// Total attempts, including the first.
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
            max_attempts: 3,
        }
    }
}

impl RetryConfig {
    /// A config that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay after the given failed attempt (1-based).
    pub fn calculate_retry_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exp);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Runs `op` until it succeeds, fails with a non-retriable kind, or the
/// attempt budget is spent.
pub async fn retry_sdk<T, F, Fut>(config: &RetryConfig, what: &str, mut op: F) -> Result<T, SdkError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SdkError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                let delay = config.calculate_retry_delay(attempt);
                warn!(
                    op = what,
                    attempt,
                    kind = ?e.kind,
                    delay_ms = delay.as_millis() as u64,
                    "retriable SDK failure"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
