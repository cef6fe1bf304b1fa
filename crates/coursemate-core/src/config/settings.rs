//! Assistant settings

use serde::{Deserialize, Serialize};

use crate::orchestrator::{DispatchMode, MAX_TOOL_ROUNDS};
use crate::providers::{api_key_env_vars, ProviderModelConfig};
use super::error::{ConfigError, ConfigResult};

/// Settings for a course assistant
///
/// Every field has a default, so an empty file is a valid configuration.
/// API keys are never read from the file; see [`AssistantConfig::resolve_api_key`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Provider name (anthropic, openai, gemini, ollama, mock, ...)
    pub provider: String,
    /// Model identifier as used by the provider's API
    pub model: String,
    /// Custom API base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Environment variable holding the API key, overriding the provider default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Upper bound on tool-dispatch rounds per query
    pub max_tool_rounds: usize,
    /// Maximum search hits returned by the search tool
    pub max_results: usize,
    /// Conversation exchanges kept by callers that fold history
    pub max_history: usize,
    pub dispatch: DispatchMode,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_base: None,
            api_key_env: None,
            temperature: 0.0,
            max_tokens: 800,
            max_tool_rounds: MAX_TOOL_ROUNDS,
            max_results: 5,
            max_history: 2,
            dispatch: DispatchMode::Sequential,
        }
    }
}

impl AssistantConfig {
    /// Check invariants the orchestrator relies on
    pub fn validate(&self) -> ConfigResult<()> {
        if self.provider.trim().is_empty() {
            return Err(ConfigError::Invalid("provider must not be empty".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".to_string()));
        }
        if self.max_tool_rounds == 0 {
            return Err(ConfigError::Invalid("max_tool_rounds must be at least 1".to_string()));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::Invalid("max_tokens must be positive".to_string()));
        }
        if self.max_results == 0 {
            return Err(ConfigError::Invalid("max_results must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Environment variables consulted for the API key, in order
    pub fn api_key_vars(&self) -> Vec<String> {
        match &self.api_key_env {
            Some(var) => vec![var.clone()],
            None => api_key_env_vars(&self.provider),
        }
    }

    /// Look up the API key in the environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key_vars()
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.is_empty())
    }

    /// Model config for provider construction, with the API key resolved
    pub fn model_config(&self) -> ProviderModelConfig {
        let mut config = ProviderModelConfig::new(self.model.clone());
        if let Some(key) = self.resolve_api_key() {
            config = config.with_api_key(key);
        }
        if let Some(base) = &self.api_base {
            config = config.with_api_base(base.clone());
        }
        config
    }
}
