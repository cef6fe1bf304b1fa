//! Bounded tool-calling round loop
//!
//! One top-level query runs as an explicit state machine:
//!
//! ```text
//!   AwaitingCompletion ──(text)──────────────────────────▶ Terminal
//!        │    ▲
//!  (tool │    │ round + 1; tools withheld once
//!   use) │    │ round + 1 >= max_rounds
//!        ▼    │
//!   DispatchingTools
//! ```
//!
//! At most `max_rounds` dispatch rounds run, so a query makes at most
//! `max_rounds + 1` completion calls and the last one never offers tools.
//! Completion failures are fatal to the query. Tool failures come back from
//! the registry as text and are fed to the engine like any other result.

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::logging::Logger;
use crate::providers::{ChatOptions, CompletionRequest, CompletionResponse, Provider, ProviderResult};
use crate::tools::{Dispatch, ToolRegistry};
use crate::types::{ChatMessage, SourceRecord, ToolCall, ToolDefinition, ToolResult};


/// Upper bound on tool-dispatch rounds per query
pub const MAX_TOOL_ROUNDS: usize = 2;

pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_MAX_TOKENS: u32 = 800;

/// Instructions for a course-material assistant
pub const SYSTEM_PROMPT: &str = "You are an assistant for course materials and educational content. \
You can look things up with two tools.

Tools:
- search_course_content: questions about specific course content or detailed material
- get_course_outline: questions about a course's structure, syllabus or lesson list. \
When presenting an outline, include the course title, the course link, and each lesson's number and title.
- You may use up to two rounds of tool calls per query, for example an outline first and then a search based on it.
- Most questions need a single tool call.
- If a tool finds nothing, say so plainly.

Answering:
- Answer general knowledge questions directly without using tools.
- Give direct answers only. Do not describe your search or mention tool results.
- Be brief and educational, and use examples where they help.";

/// How the requests of one round are dispatched
///
/// Results always reach the transcript in issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// One request at a time, in issue order
    #[default]
    Sequential,
    /// All requests of a round at once, reassembled in issue order
    Concurrent,
}

/// Build the system context, folding in prior conversation when given
pub fn system_context(prompt: &str, history: Option<&str>) -> String {
    match history.map(str::trim).filter(|h| !h.is_empty()) {
        Some(history) => format!("{}\n\nPrevious conversation:\n{}", prompt, history),
        None => prompt.to_string(),
    }
}

/// Append-only conversation log for a single query
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    /// Start a transcript with the user's query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(query)],
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Owned copy handed to the completion engine
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.clone()
    }
}

/// Orchestrator states
#[derive(Debug)]
pub enum LoopState {
    AwaitingCompletion { round: usize, offer_tools: bool },
    DispatchingTools { round: usize, response: CompletionResponse },
    Terminal(String),
}

/// Result of one top-level query
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryOutcome {
    pub answer: String,
    /// Sources produced by this query's dispatches, in dispatch order
    pub sources: Vec<SourceRecord>,
    pub completion_calls: usize,
    pub tool_rounds: usize,
}

/// Drives the completion engine through bounded tool-calling rounds
pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    system_prompt: String,
    temperature: f32,
    max_tokens: u32,
    max_rounds: usize,
    dispatch_mode: DispatchMode,
    logger: Arc<dyn Logger>,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn Provider>, logger: Arc<dyn Logger>) -> Self {
        Self {
            provider,
            system_prompt: SYSTEM_PROMPT.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_rounds: MAX_TOOL_ROUNDS,
            dispatch_mode: DispatchMode::Sequential,
            logger,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set the round bound; values below one are raised to one
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn with_dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.dispatch_mode = mode;
        self
    }

    pub fn with_options(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        self.dispatch_mode
    }

    fn request(&self, system: &str, transcript: &Transcript, tools: Option<&[ToolDefinition]>) -> CompletionRequest {
        let mut options = ChatOptions::new()
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);
        if let Some(tools) = tools {
            options = options.with_tools(tools.to_vec());
        }
        CompletionRequest {
            system: system.to_string(),
            messages: transcript.snapshot(),
            options,
        }
    }

    /// Dispatch one round's requests and return their outcomes in issue order
    async fn dispatch_round(&self, registry: &ToolRegistry, calls: &[ToolCall]) -> Vec<Dispatch> {
        match self.dispatch_mode {
            DispatchMode::Sequential => {
                let mut dispatches = Vec::with_capacity(calls.len());
                for call in calls {
                    dispatches.push(registry.dispatch_call(call).await);
                }
                dispatches
            }
            DispatchMode::Concurrent => {
                let dispatches = join_all(calls.iter().map(|call| registry.execute(&call.name, &call.input))).await;
                for dispatch in &dispatches {
                    registry.record(dispatch);
                }
                dispatches
            }
        }
    }

    /// Answer `query`, letting the engine use the registry's tools.
    ///
    /// Without a registry, tool requests are not dispatched and the engine's
    /// text is returned as is.
    pub async fn run(
        &self,
        query: &str,
        history: Option<&str>,
        registry: Option<&ToolRegistry>,
    ) -> ProviderResult<QueryOutcome> {
        let system = system_context(&self.system_prompt, history);
        let definitions = registry.map(ToolRegistry::get_definitions).unwrap_or_default();

        let mut transcript = Transcript::new(query);
        let mut outcome = QueryOutcome::default();
        let mut state = LoopState::AwaitingCompletion {
            round: 0,
            offer_tools: !definitions.is_empty(),
        };

        let answer = loop {
            state = match state {
                LoopState::AwaitingCompletion { round, offer_tools } => {
                    let tools = offer_tools.then_some(definitions.as_slice());
                    let request = self.request(&system, &transcript, tools);
                    crate::log_info!(
                        self.logger,
                        "[Orchestrator] Completion call {} (round {}, tools offered: {})",
                        outcome.completion_calls + 1,
                        round,
                        offer_tools
                    );
                    outcome.completion_calls += 1;

                    let response = self.provider.complete(request).await.map_err(|e| {
                        self.logger.error(&format!("[Orchestrator] Completion failed: {}", e));
                        e
                    })?;

                    self.next_state(round, response, registry.is_some())
                }
                LoopState::DispatchingTools { round, response } => {
                    let Some(registry) = registry else {
                        // next_state never routes here without a registry
                        break response.text_content();
                    };

                    let calls = response.requested_tool_calls();
                    transcript.push(ChatMessage::assistant_parts(response.content));

                    let dispatches = self.dispatch_round(registry, &calls).await;
                    let results: Vec<ToolResult> = calls
                        .iter()
                        .zip(&dispatches)
                        .map(|(call, dispatch)| {
                            outcome.sources.extend_from_slice(dispatch.sources());
                            dispatch.to_tool_result(&call.id)
                        })
                        .collect();
                    transcript.push(ChatMessage::tool_results(results));
                    outcome.tool_rounds += 1;

                    let is_final = round + 1 >= self.max_rounds;
                    if is_final {
                        self.logger.debug("[Orchestrator] Round limit reached, withholding tools");
                    }
                    LoopState::AwaitingCompletion {
                        round: round + 1,
                        offer_tools: !is_final && !definitions.is_empty(),
                    }
                }
                LoopState::Terminal(text) => break text,
            };
        };

        crate::log_info!(
            self.logger,
            "[Orchestrator] Finished after {} completion call(s), {} tool round(s)",
            outcome.completion_calls,
            outcome.tool_rounds
        );
        outcome.answer = answer;
        Ok(outcome)
    }

    fn next_state(&self, round: usize, response: CompletionResponse, has_registry: bool) -> LoopState {
        let requested = response.requested_tool_calls().len();
        if !response.requests_tools() || requested == 0 {
            return LoopState::Terminal(response.text_content());
        }
        if !has_registry {
            self.logger.warn("[Orchestrator] Tool use requested without a registry, returning text");
            return LoopState::Terminal(response.text_content());
        }
        if round >= self.max_rounds {
            crate::log_warn!(
                self.logger,
                "[Orchestrator] Ignoring {} tool request(s) on the final call",
                requested
            );
            return LoopState::Terminal(response.text_content());
        }
        crate::log_debug!(self.logger, "[Orchestrator] Round {}: {} tool request(s)", round, requested);
        LoopState::DispatchingTools { round, response }
    }
}
