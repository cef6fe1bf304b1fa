//! Completion engine errors
//!
//! Any `ProviderError` is fatal to the query it occurs in: the orchestrator
//! propagates it unchanged to the caller.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("No API key configured for '{provider}'")]
    MissingApiKey { provider: String },

    /// The completion call failed (network, auth, quota, server error)
    #[error("{provider} completion failed: {message}")]
    Upstream { provider: String, message: String },

    #[error("{provider} rate limited: {message}")]
    RateLimited { provider: String, message: String },

    /// A transcript entry could not be encoded for the engine
    #[error("Failed to encode request: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether a caller-level retry of the whole query could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::RateLimited { .. })
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ProviderError::upstream("anthropic", "overloaded");
        assert_eq!(err.to_string(), "anthropic completion failed: overloaded");
        assert!(err.is_transient());

        let err = ProviderError::missing_api_key("openai");
        assert_eq!(err.to_string(), "No API key configured for 'openai'");
        assert!(!err.is_transient());
    }
}
