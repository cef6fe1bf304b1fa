//! Completion engine implementations
//!
//! The orchestrator talks to a completion engine only through the
//! [`Provider`] trait. `GenaiProvider` covers every hosted LLM API genai
//! supports; `MockProvider` is a scriptable test double.

mod error;
mod genai_adapter;
mod genai_provider;
mod mock;
mod traits;

pub use error::{ProviderError, ProviderResult};
pub use genai_adapter::{api_key_env_vars, is_keyless};
pub use genai_provider::GenaiProvider;
pub use mock::{MockMode, MockProvider};
pub use traits::{
    ChatOptions, CompletionRequest, CompletionResponse, Provider, ProviderModelConfig, StopReason,
};

use std::sync::Arc;

use crate::config::AssistantConfig;
use crate::logging::Logger;

/// Create a provider for the configured provider ID
///
/// `mock` yields an echo `MockProvider`; everything else goes through genai.
pub fn create_provider(config: &AssistantConfig, logger: Arc<dyn Logger>) -> ProviderResult<Arc<dyn Provider>> {
    match config.provider.to_lowercase().as_str() {
        "mock" => Ok(Arc::new(MockProvider::echo(logger))),
        _ => Ok(Arc::new(GenaiProvider::new(
            config.provider.clone(),
            config.model_config(),
            logger,
        )?)),
    }
}
