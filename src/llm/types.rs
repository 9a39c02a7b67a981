//! Errors and wire types for the provider APIs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;

/// Failure of one `execute_prompt` call, after transport retries.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt cancelled")]
    Cancelled,

    #[error("API key for agent {agent} not set (expected in ${env_var})")]
    MissingApiKey { agent: String, env_var: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("HTTP request failed after {attempts} attempt(s): {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed provider reply: {0}")]
    MalformedReply(String),
}

impl PromptError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PromptError::Cancelled)
    }
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RoleMessage {
    pub role: &'static str,
    pub content: String,
}

/// Azure OpenAI responses API.
#[derive(Debug, Clone, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: Vec<RoleMessage>,
}

/// OpenAI chat completions.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<RoleMessage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnthropicRequest {
    pub model: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub system: String,
    pub max_tokens: u32,
    pub messages: Vec<RoleMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeminiInstruction {
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeminiContent {
    pub role: &'static str,
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub system_instruction: GeminiInstruction,
    pub contents: Vec<GeminiContent>,
}

/// Request body for whichever provider is configured.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProviderRequest {
    Responses(ResponsesRequest),
    Gemini(GeminiRequest),
    ChatCompletion(ChatCompletionRequest),
    Anthropic(AnthropicRequest),
}

// ============================================================================
// Replies
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ResponsesReply {
    #[serde(default)]
    pub output: Vec<ResponsesOutputItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponsesOutputItem {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub content: Vec<TextBlock>,
}

/// A typed content block; `text` is absent for non-text blocks.
#[derive(Debug, Clone, Deserialize)]
pub struct TextBlock {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionReply {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatReplyMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatReplyMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicReply {
    #[serde(default)]
    pub content: Vec<TextBlock>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiReply {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiCandidate {
    pub content: GeminiReplyContent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiReplyContent {
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}
