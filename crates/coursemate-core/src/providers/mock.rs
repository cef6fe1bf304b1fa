//! Mock provider for testing
//!
//! Provides deterministic, scriptable completions without network
//! dependencies and records every request it receives so tests can assert
//! on call counts, transcripts and whether tools were offered.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{ProviderError, ProviderResult};
use super::traits::{CompletionRequest, CompletionResponse, Provider};
use crate::logging::Logger;
use crate::types::{MessageRole, ToolCall};

/// Mock response mode
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Echo back the first user message
    #[default]
    Echo,
    /// Return a fixed text response
    Fixed(String),
    /// Return the scripted responses in order, failing once exhausted
    Script(Vec<CompletionResponse>),
    /// Request the same tool calls on every call, tools offered or not
    AlwaysTools(Vec<ToolCall>),
    /// Fail every call
    Error(String),
}

/// Mock completion engine for testing
pub struct MockProvider {
    mode: MockMode,
    script: Mutex<VecDeque<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
    logger: Arc<dyn Logger>,
}

impl MockProvider {
    /// Create a provider with a specific mode
    pub fn with_mode(mode: MockMode, logger: Arc<dyn Logger>) -> Self {
        let script = match &mode {
            MockMode::Script(responses) => responses.iter().cloned().collect(),
            _ => VecDeque::new(),
        };
        Self {
            mode,
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
            logger,
        }
    }

    /// Create an echo provider
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Echo, logger)
    }

    /// Create a fixed response provider
    pub fn fixed(response: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Fixed(response.into()), logger)
    }

    /// Create a provider that replays `responses` in order
    pub fn scripted(responses: Vec<CompletionResponse>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Script(responses), logger)
    }

    /// Create a provider that never stops requesting tools
    pub fn always_tools(calls: Vec<ToolCall>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::AlwaysTools(calls), logger)
    }

    /// Create an error-producing provider
    pub fn error(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Error(message.into()), logger)
    }

    /// Every request received so far, in call order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    /// Number of completion calls made so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn first_user_message(request: &CompletionRequest) -> String {
        request
            .messages
            .iter()
            .find(|m| m.role == MessageRole::User)
            .and_then(|m| m.text())
            .unwrap_or("Hello from MockProvider!")
            .to_string()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> ProviderResult<CompletionResponse> {
        let call_index = {
            let mut requests = self.requests.lock();
            requests.push(request.clone());
            requests.len() - 1
        };
        self.logger.debug(&format!(
            "MockProvider: complete call {} ({} messages, tools offered: {})",
            call_index,
            request.messages.len(),
            request.options.offers_tools()
        ));

        match &self.mode {
            MockMode::Echo => Ok(CompletionResponse::text(format!(
                "Echo: {}",
                Self::first_user_message(&request)
            ))),
            MockMode::Fixed(response) => Ok(CompletionResponse::text(response.clone())),
            MockMode::Script(_) => self.script.lock().pop_front().ok_or_else(|| {
                ProviderError::Other(format!("Mock script exhausted at call {}", call_index))
            }),
            MockMode::AlwaysTools(calls) => {
                let calls = calls
                    .iter()
                    .map(|c| ToolCall::new(format!("{}-{}", c.id, call_index), c.name.clone(), c.input.clone()))
                    .collect();
                Ok(CompletionResponse::tool_calls(calls))
            }
            MockMode::Error(message) => Err(ProviderError::Other(format!("Mock error: {}", message))),
        }
    }
}
