use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::llm::PromptError;

/// Attempts per LLM-dependent stage.
pub const RETRY_COUNT: u32 = 3;

/// Result of a bounded retry loop.
#[derive(Debug, PartialEq, Eq)]
pub enum StageOutcome<T> {
    Success(T),
    /// Every attempt failed or produced no usable value.
    Exhausted,
    Cancelled,
}

/// Run `op` up to `max_attempts` times, stopping at the first value `accept` takes.
///
/// An attempt fails when `op` errors, yields `None`, or yields a value the
/// predicate rejects. Cancellation stops the loop at once.
pub async fn retry_stage<T, F, Fut>(
    stage: &str,
    max_attempts: u32,
    cancel: &CancellationToken,
    mut op: F,
    accept: impl Fn(&T) -> bool,
) -> StageOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, PromptError>>,
{
    for attempt in 1..=max_attempts {
        if cancel.is_cancelled() {
            warn!("{} cancelled before attempt {}/{}", stage, attempt, max_attempts);
            return StageOutcome::Cancelled;
        }

        let reason = match op().await {
            Ok(Some(value)) if accept(&value) => {
                info!("{} succeeded on attempt {}/{}", stage, attempt, max_attempts);
                return StageOutcome::Success(value);
            }
            Ok(_) => "no usable value".to_string(),
            Err(e) if e.is_cancelled() => {
                warn!("{} cancelled during attempt {}/{}", stage, attempt, max_attempts);
                return StageOutcome::Cancelled;
            }
            Err(e) => e.to_string(),
        };

        if attempt < max_attempts {
            warn!(
                "{} attempt {}/{} failed ({}); retrying",
                stage, attempt, max_attempts, reason
            );
        } else {
            warn!(
                "{} attempt {}/{} failed ({}); giving up",
                stage, attempt, max_attempts, reason
            );
        }
    }

    StageOutcome::Exhausted
}
