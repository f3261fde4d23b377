use std::future::Future;
use std::time::Duration;

use crate::core::error::{ConfigError, ToolError};

/// How the delay grows between attempts. `attempt` is the 1-based number of the
/// attempt that just failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base * 2^attempt`
    Exponential,
    /// `base * attempt`
    Linear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff,
        }
    }

    pub fn exponential(max_attempts: u32, base_delay: Duration) -> Self {
        Self::new(max_attempts, base_delay, Backoff::Exponential)
    }

    pub fn linear(max_attempts: u32, base_delay: Duration) -> Self {
        Self::new(max_attempts, base_delay, Backoff::Linear)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidRetryPolicy {
                reason: "max_attempts must be >= 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Exponential => {
                let shift = attempt.min(31);
                let multiplier = 1_u32.checked_shl(shift).unwrap_or(u32::MAX);
                self.base_delay.saturating_mul(multiplier)
            }
            Backoff::Linear => self.base_delay.saturating_mul(attempt),
        }
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or the
/// policy's attempt ceiling is reached. The closure receives the 1-based attempt
/// number. The last error is returned unchanged.
pub async fn execute_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, ToolError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ToolError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt >= max_attempts || !error.is_retryable() {
                    if attempt > 1 {
                        tracing::warn!(
                            target: "genai_toolbox::retry",
                            label,
                            attempt,
                            error = %error,
                            "giving up after retries"
                        );
                    }
                    return Err(error);
                }

                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    target: "genai_toolbox::retry",
                    label,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "retrying after transient failure"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests;
