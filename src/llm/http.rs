use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::types::PromptError;

/// Transport retry schedule: 3 retries with exponential backoff from 5s (5s, 25s, 125s).
const RETRY_BASE_DELAY_SECS: u64 = 5;
const RETRY_MULTIPLIER: u32 = 5;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: Duration::from_secs(RETRY_BASE_DELAY_SECS),
            multiplier: RETRY_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1);
        let factor = self.multiplier.checked_pow(exponent).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Send a request, retrying every non-success status and transport error.
///
/// Cancellation aborts both an in-flight send and a backoff sleep.
pub(super) async fn send_with_retry(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut make_request: impl FnMut() -> reqwest::RequestBuilder,
) -> Result<reqwest::Response, PromptError> {
    let max_attempts = policy.max_attempts();

    for attempt in 1..=max_attempts {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PromptError::Cancelled),
            result = make_request().send() => result,
        };

        let reason = match outcome {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }

                if attempt == max_attempts {
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(PromptError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }

                let _ = response.bytes().await;
                format!("status {}", status)
            }
            Err(err) => {
                if attempt == max_attempts {
                    return Err(PromptError::Transport {
                        attempts: attempt,
                        source: err,
                    });
                }
                err.to_string()
            }
        };

        let delay = policy.delay_for(attempt);
        warn!(
            "HTTP request failed ({}); retrying in {:?} (attempt {}/{})",
            reason, delay, attempt, max_attempts
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Retry backoff interrupted by cancellation");
                return Err(PromptError::Cancelled);
            }
            _ = sleep(delay) => {}
        }
    }

    unreachable!("send_with_retry should have returned within max_attempts")
}
