use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::http::{send_with_retry, RetryPolicy};
use super::mock;
use super::providers::Provider;
use super::types::PromptError;
use super::PromptClient;
use crate::config::{LlmConfig, ResolvedAgent};

/// Default request timeout in seconds. Generation replies can be long.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Default CLI version (from Cargo.toml)
const DEFAULT_VERSION: &str = env!("CARGO_PKG_VERSION");

fn build_user_agent() -> String {
    format!("codesmith/{}", DEFAULT_VERSION)
}

/// HTTP prompt client dispatching to the provider configured per agent.
pub struct LlmClient {
    config: Arc<LlmConfig>,
    client: Client,
    user_agent: String,
    policy: RetryPolicy,
}

impl LlmClient {
    pub fn new(config: Arc<LlmConfig>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            config,
            client,
            user_agent: build_user_agent(),
            policy: RetryPolicy::default(),
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn api_key(resolved: &ResolvedAgent) -> Result<String, PromptError> {
        std::env::var(&resolved.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| PromptError::MissingApiKey {
                agent: resolved.agent.clone(),
                env_var: resolved.api_key_env.clone(),
            })
    }

    async fn call_provider(
        &self,
        resolved: &ResolvedAgent,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, PromptError> {
        let api_key = Self::api_key(resolved)?;
        let template = resolved.url.as_deref().unwrap_or_default();
        let url = resolved.provider.endpoint(template, &resolved.model)?;
        let body = resolved
            .provider
            .request_body(&resolved.model, &resolved.system_prompt, prompt);

        debug!("=== LLM Request ===");
        debug!("URL: {}", url);
        debug!("Prompt length: {} chars", prompt.len());

        let response = send_with_retry(&self.policy, cancel, || {
            let request = self
                .client
                .post(url.clone())
                .header("Content-Type", "application/json")
                .header("User-Agent", &self.user_agent);
            resolved.provider.authorize(request, &api_key).json(&body)
        })
        .await?;

        debug!("=== LLM Response ===");
        debug!("Status: {}", response.status());

        let text = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PromptError::Cancelled),
            text = response.text() => text.map_err(|e| PromptError::MalformedReply(e.to_string()))?,
        };

        resolved.provider.extract_reply(&text)
    }
}

impl PromptClient for LlmClient {
    async fn execute_prompt(
        &self,
        agent: &str,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, PromptError> {
        if cancel.is_cancelled() {
            return Err(PromptError::Cancelled);
        }

        let resolved = self.config.resolve(agent)?;

        if resolved.provider == Provider::Mock {
            debug!("Mock provider answering for agent {}", agent);
            return Ok(mock::reply(agent, prompt));
        }

        info!(
            "Calling provider {} for agent {} (model={})",
            resolved.provider.as_str(),
            agent,
            resolved.model
        );

        let reply = self.call_provider(&resolved, prompt, cancel).await?;
        info!("Fetched response from {} for agent {}", resolved.provider.as_str(), agent);
        Ok(reply)
    }
}
