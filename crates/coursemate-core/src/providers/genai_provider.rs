//! GenaiProvider - completion engine backed by the genai crate
//!
//! Handles every genai-supported provider (Anthropic, OpenAI, Gemini, Ollama, ...).
//! Each call is a single non-streaming chat completion; no retries are made here.

use async_trait::async_trait;
use std::sync::Arc;

use crate::logging::Logger;

use super::error::{ProviderError, ProviderResult};
use super::genai_adapter::{
    create_client, from_genai_error, from_genai_response, is_keyless, to_genai_options, to_genai_request,
};
use super::traits::{CompletionRequest, CompletionResponse, Provider, ProviderModelConfig};

/// Completion engine using genai for all supported LLM APIs
pub struct GenaiProvider {
    /// Provider identifier
    provider_id: String,
    model: ProviderModelConfig,
    client: genai::Client,
    logger: Arc<dyn Logger>,
}

impl GenaiProvider {
    /// Create a new GenaiProvider.
    ///
    /// Fails when the provider needs an API key and none was supplied.
    pub fn new(
        provider_id: impl Into<String>,
        model: ProviderModelConfig,
        logger: Arc<dyn Logger>,
    ) -> ProviderResult<Self> {
        let provider_id = provider_id.into();
        if model.api_key.is_none() && !is_keyless(&provider_id) {
            return Err(ProviderError::missing_api_key(provider_id));
        }

        let client = create_client(model.api_key.clone(), model.api_base.clone());
        Ok(Self {
            provider_id,
            model,
            client,
            logger,
        })
    }

    /// Extract model name from a prefixed model string (e.g., "anthropic/claude-3" -> "claude-3")
    pub fn extract_model_name(model: &str) -> &str {
        model.split_once('/').map(|(_, name)| name).unwrap_or(model)
    }
}

#[async_trait]
impl Provider for GenaiProvider {
    fn name(&self) -> &str {
        &self.provider_id
    }

    async fn complete(&self, request: CompletionRequest) -> ProviderResult<CompletionResponse> {
        let model_name = Self::extract_model_name(&self.model.model);
        self.logger.info(&format!(
            "[GenaiProvider] complete: provider={}, model={}, messages={}, tools={}",
            self.provider_id,
            model_name,
            request.messages.len(),
            request.options.tools.as_ref().map_or(0, Vec::len)
        ));

        let chat_req = to_genai_request(&request)?;
        let genai_options = to_genai_options(&request.options);

        let response = self
            .client
            .exec_chat(model_name, chat_req, Some(&genai_options))
            .await
            .map_err(|e| {
                let err = from_genai_error(&self.provider_id, e);
                self.logger.error(&format!("[GenaiProvider] Completion failed: {}", err));
                err
            })?;

        let response = from_genai_response(&response);
        self.logger.debug(&format!(
            "[GenaiProvider] Response: stop_reason={:?}, parts={}",
            response.stop_reason,
            response.content.len()
        ));
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    #[test]
    fn test_extract_model_name() {
        assert_eq!(
            GenaiProvider::extract_model_name("anthropic/claude-sonnet-4-20250514"),
            "claude-sonnet-4-20250514"
        );
        assert_eq!(GenaiProvider::extract_model_name("gpt-4o"), "gpt-4o");
    }

    #[test]
    fn test_requires_api_key() {
        let result = GenaiProvider::new(
            "anthropic",
            ProviderModelConfig::new("claude-sonnet-4-20250514"),
            Arc::new(NoOpLogger),
        );
        assert!(matches!(result, Err(ProviderError::MissingApiKey { .. })));
    }

    #[test]
    fn test_keyless_provider() {
        let provider = GenaiProvider::new("ollama", ProviderModelConfig::new("llama3.1"), Arc::new(NoOpLogger))
            .expect("ollama needs no key");
        assert_eq!(provider.name(), "ollama");
    }
}
