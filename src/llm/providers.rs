//! Provider variants: request shape, authentication and reply envelope.

use reqwest::RequestBuilder;
use url::Url;

use super::types::{
    AnthropicReply, AnthropicRequest, ChatCompletionReply, ChatCompletionRequest, GeminiContent,
    GeminiInstruction, GeminiPart, GeminiReply, GeminiRequest, PromptError, ProviderRequest,
    ResponsesReply, ResponsesRequest, RoleMessage,
};
use crate::config::ConfigError;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MAX_TOKENS: u32 = 8192;

/// Placeholder substituted with the model name in endpoint templates.
const MODEL_PLACEHOLDER: &str = "{model}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Azure OpenAI responses API. No default endpoint.
    AzureOpenAi,
    Gemini,
    OpenAi,
    Anthropic,
    /// Offline deterministic replies.
    Mock,
}

impl std::str::FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "azopenai" | "azure-openai" | "azure" => Ok(Provider::AzureOpenAi),
            "gemini" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            "mock" => Ok(Provider::Mock),
            _ => Err(ConfigError::UnknownProvider {
                name: s.to_string(),
            }),
        }
    }
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::AzureOpenAi => "azopenai",
            Provider::Gemini => "gemini",
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Mock => "mock",
        }
    }

    pub fn default_endpoint(&self) -> Option<&'static str> {
        match self {
            Provider::Gemini => Some(
                "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent",
            ),
            Provider::OpenAi => Some("https://api.openai.com/v1/chat/completions"),
            Provider::Anthropic => Some("https://api.anthropic.com/v1/messages"),
            Provider::AzureOpenAi | Provider::Mock => None,
        }
    }

    /// Build the final endpoint from a template, substituting `{model}`.
    pub(super) fn endpoint(&self, template: &str, model: &str) -> Result<Url, ConfigError> {
        let raw = template.replace(MODEL_PLACEHOLDER, model);
        Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl {
            agent: self.as_str().to_string(),
            url: raw.clone(),
            source,
        })
    }

    pub(super) fn request_body(
        &self,
        model: &str,
        system_prompt: &str,
        prompt: &str,
    ) -> ProviderRequest {
        let system = RoleMessage {
            role: "system",
            content: system_prompt.to_string(),
        };
        let user = RoleMessage {
            role: "user",
            content: prompt.to_string(),
        };

        match self {
            Provider::AzureOpenAi | Provider::Mock => ProviderRequest::Responses(ResponsesRequest {
                model: model.to_string(),
                input: vec![system, user],
            }),
            Provider::OpenAi => ProviderRequest::ChatCompletion(ChatCompletionRequest {
                model: model.to_string(),
                messages: vec![system, user],
            }),
            Provider::Anthropic => ProviderRequest::Anthropic(AnthropicRequest {
                model: model.to_string(),
                system: system_prompt.to_string(),
                max_tokens: ANTHROPIC_MAX_TOKENS,
                messages: vec![user],
            }),
            Provider::Gemini => ProviderRequest::Gemini(GeminiRequest {
                system_instruction: GeminiInstruction {
                    parts: vec![GeminiPart {
                        text: system_prompt.to_string(),
                    }],
                },
                contents: vec![GeminiContent {
                    role: "user",
                    parts: vec![GeminiPart {
                        text: prompt.to_string(),
                    }],
                }],
            }),
        }
    }

    /// Attach the provider's authentication headers.
    pub(super) fn authorize(&self, request: RequestBuilder, api_key: &str) -> RequestBuilder {
        match self {
            Provider::Gemini => request.header("x-goog-api-key", api_key),
            Provider::Anthropic => request
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            Provider::AzureOpenAi | Provider::OpenAi | Provider::Mock => {
                request.header("Authorization", format!("Bearer {}", api_key))
            }
        }
    }

    /// Pull the reply text out of the provider's response envelope.
    pub(super) fn extract_reply(&self, body: &str) -> Result<String, PromptError> {
        let malformed = |e: serde_json::Error| PromptError::MalformedReply(e.to_string());

        let reply = match self {
            Provider::AzureOpenAi | Provider::Mock => {
                let reply: ResponsesReply = serde_json::from_str(body).map_err(malformed)?;
                // Reasoning items come first; the answer is the message item.
                reply
                    .output
                    .into_iter()
                    .filter(|item| item.kind.is_empty() || item.kind == "message")
                    .flat_map(|item| item.content)
                    .find_map(|block| block.text)
            }
            Provider::OpenAi => {
                let reply: ChatCompletionReply = serde_json::from_str(body).map_err(malformed)?;
                reply.choices.into_iter().next().and_then(|c| c.message.content)
            }
            Provider::Anthropic => {
                let reply: AnthropicReply = serde_json::from_str(body).map_err(malformed)?;
                let text: String = reply
                    .content
                    .into_iter()
                    .filter(|block| block.kind == "text")
                    .filter_map(|block| block.text)
                    .collect();
                Some(text).filter(|t| !t.is_empty())
            }
            Provider::Gemini => {
                let reply: GeminiReply = serde_json::from_str(body).map_err(malformed)?;
                reply.candidates.into_iter().next().map(|candidate| {
                    candidate
                        .content
                        .parts
                        .into_iter()
                        .map(|part| part.text)
                        .collect::<String>()
                })
            }
        };

        reply.ok_or_else(|| {
            PromptError::MalformedReply(format!("no reply text in {} response", self.as_str()))
        })
    }
}
