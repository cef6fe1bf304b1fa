//! Completion engine trait definition

use async_trait::async_trait;

use crate::types::{ChatMessage, ContentPart, ToolCall, ToolDefinition};
use super::error::ProviderResult;

/// Which model to call and how to reach it. The key is resolved from the
/// environment before construction and never read from config files.
#[derive(Debug, Clone)]
pub struct ProviderModelConfig {
    pub model: String,
    pub api_key: Option<String>,
    /// Endpoint override, e.g. a local proxy
    pub api_base: Option<String>,
}

impl ProviderModelConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: None,
            api_base: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }
}

/// Options for a single completion call
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Tools available for the model to use. `None` withholds tools entirely.
    pub tools: Option<Vec<ToolDefinition>>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Offer tools; the model decides whether to call them
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Whether any tool definitions are offered
    pub fn offers_tools(&self) -> bool {
        self.tools.as_ref().is_some_and(|t| !t.is_empty())
    }
}

/// A single request to the completion engine
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System context (instructions plus optional prior-conversation summary)
    pub system: String,
    /// Transcript snapshot for this call
    pub messages: Vec<ChatMessage>,
    pub options: ChatOptions,
}

/// Why the completion engine stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Final answer, no further tool use requested
    Done,
    /// One or more tool invocations were requested
    ToolRequested,
}

/// Response from a single completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// Text and tool use parts, in the order the engine produced them
    pub content: Vec<ContentPart>,
    pub stop_reason: StopReason,
}

impl CompletionResponse {
    /// Plain text response
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentPart::text(text)],
            stop_reason: StopReason::Done,
        }
    }

    /// Response requesting the given tool invocations
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            content: calls.into_iter().map(ContentPart::from).collect(),
            stop_reason: StopReason::ToolRequested,
        }
    }

    /// Concatenated text parts (empty when the response only carries tool use)
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentPart::as_text)
            .collect::<Vec<_>>()
            .join("")
    }

    /// Tool invocation requests, in issue order
    pub fn requested_tool_calls(&self) -> Vec<ToolCall> {
        self.content.iter().filter_map(ContentPart::as_tool_call).collect()
    }

    pub fn requests_tools(&self) -> bool {
        self.stop_reason == StopReason::ToolRequested
    }
}

/// Provider trait for completion engines
///
/// Each call is a blocking external effect with no implicit timeout or
/// retry; those belong to the implementation's client, not to callers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider id, e.g. "anthropic" or "mock"
    fn name(&self) -> &str;

    /// Run a single completion
    async fn complete(&self, request: CompletionRequest) -> ProviderResult<CompletionResponse>;
}
