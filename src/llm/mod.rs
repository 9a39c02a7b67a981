//! Prompt client: sends a named-agent prompt to the configured LLM provider.
//!
//! Provider selection happens per agent from [`LlmConfig`](crate::config::LlmConfig).
//! Transport failures are retried here with backoff; everything above this
//! layer sees either reply text or a [`PromptError`].

mod client;
mod http;
mod mock;
mod providers;
mod types;
#[cfg(test)]
pub(crate) mod testing;

pub use client::LlmClient;
pub use providers::Provider;
pub use types::PromptError;

use tokio_util::sync::CancellationToken;

/// Capability to run one prompt for a named agent.
#[allow(async_fn_in_trait)]
pub trait PromptClient: Send + Sync {
    async fn execute_prompt(
        &self,
        agent: &str,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, PromptError>;
}
