//! Per-agent LLM configuration.
//!
//! Loaded once at startup from a JSON file and shared immutably with the
//! prompt client. The file looks like:
//!
//! ```json
//! {
//!   "defaultProvider": "gemini",
//!   "agents": {
//!     "Planner": { "provider": "openai", "model": "gpt-4o", "apiKeyEnv": "OPENAI_API_KEY" }
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::agents::default_system_prompt;
use crate::llm::Provider;

/// Provider used when neither the agent nor the file names one.
pub const DEFAULT_PROVIDER: &str = "mock";

/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "CODESMITH_CONFIG";

const CONFIG_DIR: &str = ".codesmith";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown provider '{name}' (expected azopenai, gemini, openai, anthropic or mock)")]
    UnknownProvider { name: String },

    #[error("Invalid endpoint URL for agent {agent}: {url} ({source})")]
    InvalidUrl {
        agent: String,
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Provider {provider} requires an endpoint url for agent {agent}")]
    MissingUrl { agent: String, provider: String },
}

/// Raw per-agent entry. Blank fields fall back at resolution time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    pub provider: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub system_prompt: String,
    pub url: String,
}

fn default_provider_name() -> String {
    DEFAULT_PROVIDER.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    #[serde(default = "default_provider_name")]
    pub default_provider: String,
    #[serde(default)]
    pub agents: HashMap<String, AgentConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider_name(),
            agents: HashMap::new(),
        }
    }
}

/// Fully resolved settings for one agent call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAgent {
    pub agent: String,
    pub provider: Provider,
    pub model: String,
    pub api_key_env: String,
    pub system_prompt: String,
    /// Endpoint template; `None` only for the mock provider.
    pub url: Option<String>,
}

/// Config file location: explicit flag, then `CODESMITH_CONFIG`, then `~/.codesmith/config.json`.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
}

impl LlmConfig {
    /// Load and validate the configuration.
    ///
    /// A missing file is not an error: the default (mock) configuration is
    /// used instead.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = config_path(explicit) else {
            warn!("Could not determine config location; using default configuration");
            return Ok(Self::default());
        };

        if !path.exists() {
            warn!(
                "Config file {} not found; using default configuration (provider: {})",
                path.display(),
                DEFAULT_PROVIDER
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        config.validate()?;

        info!(
            "Loaded configuration from {} ({} agents, default provider: {})",
            path.display(),
            config.agents.len(),
            config.default_provider
        );
        Ok(config)
    }

    /// Check every configured provider name and endpoint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.default_provider.parse::<Provider>()?;

        let mut names: Vec<&String> = self.agents.keys().collect();
        names.sort();
        for name in names {
            let resolved = self.resolve(name)?;
            debug!(
                "Agent {} -> {} (model={})",
                name,
                resolved.provider.as_str(),
                resolved.model
            );
        }
        Ok(())
    }

    /// Resolve the effective settings for `agent`, applying every fallback.
    pub fn resolve(&self, agent: &str) -> Result<ResolvedAgent, ConfigError> {
        let entry = self.agents.get(agent).cloned().unwrap_or_default();

        let provider_name = if entry.provider.trim().is_empty() {
            self.default_provider.as_str()
        } else {
            entry.provider.as_str()
        };
        let provider: Provider = provider_name.parse()?;

        let system_prompt = if entry.system_prompt.trim().is_empty() {
            default_system_prompt(agent).to_string()
        } else {
            entry.system_prompt.clone()
        };

        let url = if entry.url.trim().is_empty() {
            provider.default_endpoint().map(str::to_string)
        } else {
            Some(entry.url.trim().to_string())
        };

        match &url {
            Some(url) => {
                Url::parse(url).map_err(|source| ConfigError::InvalidUrl {
                    agent: agent.to_string(),
                    url: url.clone(),
                    source,
                })?;
            }
            None if provider != Provider::Mock => {
                return Err(ConfigError::MissingUrl {
                    agent: agent.to_string(),
                    provider: provider.as_str().to_string(),
                });
            }
            None => {}
        }

        Ok(ResolvedAgent {
            agent: agent.to_string(),
            provider,
            model: entry.model.trim().to_string(),
            api_key_env: entry.api_key_env.trim().to_string(),
            system_prompt,
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
        "defaultProvider": "gemini",
        "agents": {
            "Planner": {
                "provider": "openai",
                "model": "gpt-4o",
                "apiKeyEnv": "OPENAI_API_KEY",
                "systemPrompt": "You plan."
            },
            "CodeGen": { "model": "gemini-2.0-flash", "apiKeyEnv": "GEMINI_KEY" }
        }
    }"#;

    #[test]
    fn test_parse_camel_case() {
        let config: LlmConfig = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(config.default_provider, "gemini");
        let planner = &config.agents["Planner"];
        assert_eq!(planner.provider, "openai");
        assert_eq!(planner.api_key_env, "OPENAI_API_KEY");
        assert_eq!(planner.system_prompt, "You plan.");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_fallbacks() {
        let config: LlmConfig = serde_json::from_str(SAMPLE).unwrap();

        let planner = config.resolve("Planner").unwrap();
        assert_eq!(planner.provider, Provider::OpenAi);
        assert_eq!(planner.system_prompt, "You plan.");
        assert_eq!(
            planner.url.as_deref(),
            Provider::OpenAi.default_endpoint()
        );

        // Blank provider falls back to the default provider.
        let codegen = config.resolve("CodeGen").unwrap();
        assert_eq!(codegen.provider, Provider::Gemini);
        assert_eq!(codegen.system_prompt, default_system_prompt("CodeGen"));

        // Unconfigured agent gets everything from defaults.
        let query = config.resolve("Query").unwrap();
        assert_eq!(query.provider, Provider::Gemini);
        assert!(query.api_key_env.is_empty());
    }

    #[test]
    fn test_default_is_mock() {
        let config = LlmConfig::default();
        let resolved = config.resolve("Planner").unwrap();
        assert_eq!(resolved.provider, Provider::Mock);
        assert!(resolved.url.is_none());

        let empty: LlmConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, config);
    }

    #[test]
    fn test_validate_rejects_bad_entries() {
        let unknown: LlmConfig =
            serde_json::from_str(r#"{"agents": {"Planner": {"provider": "llama"}}}"#).unwrap();
        assert!(matches!(
            unknown.validate(),
            Err(ConfigError::UnknownProvider { .. })
        ));

        let azure: LlmConfig =
            serde_json::from_str(r#"{"agents": {"Docs": {"provider": "azopenai"}}}"#).unwrap();
        assert!(matches!(azure.validate(), Err(ConfigError::MissingUrl { .. })));

        let bad_url: LlmConfig = serde_json::from_str(
            r#"{"agents": {"Docs": {"provider": "openai", "url": "not a url"}}}"#,
        )
        .unwrap();
        assert!(matches!(bad_url.validate(), Err(ConfigError::InvalidUrl { .. })));

        let bad_default: LlmConfig =
            serde_json::from_str(r#"{"defaultProvider": "nope"}"#).unwrap();
        assert!(bad_default.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = LlmConfig::load(Some(&path)).unwrap();
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.agents.len(), 2);

        std::fs::write(&path, "{ broken").unwrap();
        assert!(matches!(
            LlmConfig::load(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_uses_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json");
        let config = LlmConfig::load(Some(&path)).unwrap();
        assert_eq!(config, LlmConfig::default());
    }
}
