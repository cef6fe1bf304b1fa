//! Tool registry for name-indexed storage and uniform dispatch
//!
//! The ToolRegistry is the central component for:
//! - Registering tools under unique names
//! - Offering tool definitions to the completion engine
//! - Dispatching invocation requests by name
//! - Keeping each tool's sources from its most recent dispatch

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use thiserror::Error;

use super::{Tool, ToolError, ToolOutput};
use crate::logging::Logger;
use crate::types::{SourceRecord, ToolCall, ToolDefinition, ToolResult};

/// Registration-time errors. These are configuration mistakes and are
/// returned to the caller rather than logged and skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("Tool definition must have a 'name'")]
    MissingName,

    #[error("Tool '{0}' is already registered")]
    DuplicateName(String),
}

/// Outcome of dispatching one invocation request
#[derive(Debug)]
pub enum Dispatch {
    /// The tool ran; "no results" output also lands here
    Completed { tool: String, output: ToolOutput },
    /// No tool is registered under the requested name
    UnknownTool(String),
    /// The tool returned an error or panicked
    Failed { tool: String, error: ToolError },
}

impl Dispatch {
    /// Text fed back to the completion engine
    pub fn text(&self) -> String {
        match self {
            Dispatch::Completed { output, .. } => output.text.clone(),
            Dispatch::UnknownTool(name) => format!("Tool '{}' not found", name),
            Dispatch::Failed { error, .. } => format!("Tool execution error: {}", error),
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Dispatch::Completed { .. })
    }

    /// Sources produced by this dispatch
    pub fn sources(&self) -> &[SourceRecord] {
        match self {
            Dispatch::Completed { output, .. } => &output.sources,
            _ => &[],
        }
    }

    /// Tool result correlated to the originating request
    pub fn to_tool_result(&self, call_id: &str) -> ToolResult {
        if self.is_error() {
            ToolResult::error(call_id, self.text())
        } else {
            ToolResult::success(call_id, self.text())
        }
    }
}

struct RegisteredTool {
    definition: ToolDefinition,
    tool: Arc<dyn Tool>,
}

/// Tool registry shared across queries
///
/// Tools are long-lived. The per-tool source slots are the only mutable
/// state touched by dispatch; callers serving concurrent queries against one
/// registry must serialize them or rely on query-scoped sources from the
/// orchestrator instead.
pub struct ToolRegistry {
    tools: RwLock<Vec<RegisteredTool>>,
    index: RwLock<HashMap<String, usize>>,
    /// Sources from each tool's most recent dispatch, by registration index
    last_sources: Mutex<Vec<Vec<SourceRecord>>>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    /// Create an empty tool registry
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            tools: RwLock::new(Vec::new()),
            index: RwLock::new(HashMap::new()),
            last_sources: Mutex::new(Vec::new()),
            logger,
        }
    }

    /// Register a tool under its definition's name
    pub fn register(&self, tool: Arc<dyn Tool>) -> Result<(), DefinitionError> {
        let definition = tool.definition();
        let name = definition.name.trim().to_string();
        if name.is_empty() {
            self.logger.error("[ToolRegistry] Rejected tool definition without a name");
            return Err(DefinitionError::MissingName);
        }

        let mut tools = self.tools.write();
        let mut index = self.index.write();
        if index.contains_key(&name) {
            self.logger.error(&format!("[ToolRegistry] Rejected duplicate tool: {}", name));
            return Err(DefinitionError::DuplicateName(name));
        }

        index.insert(name.clone(), tools.len());
        tools.push(RegisteredTool { definition, tool });
        self.last_sources.lock().push(Vec::new());

        self.logger.info(&format!("[ToolRegistry] Registered tool: {}", name));
        Ok(())
    }

    /// Definitions for the completion engine, in registration order
    pub fn get_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.read().iter().map(|t| t.definition.clone()).collect()
    }

    /// Registered tool names, in registration order
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.read().iter().map(|t| t.definition.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.read().is_empty()
    }

    fn lookup(&self, name: &str) -> Option<(usize, Arc<dyn Tool>)> {
        let slot = *self.index.read().get(name)?;
        let tool = Arc::clone(&self.tools.read()[slot].tool);
        Some((slot, tool))
    }

    /// Run a tool without touching the source slots.
    ///
    /// Never fails: unknown names, tool errors and tool panics all come back
    /// as [`Dispatch`] variants.
    pub async fn execute(&self, name: &str, arguments: &Value) -> Dispatch {
        let Some((_, tool)) = self.lookup(name) else {
            self.logger.warn(&format!("[ToolRegistry] Tool not found: {}", name));
            return Dispatch::UnknownTool(name.to_string());
        };

        self.logger.info(&format!("[ToolRegistry] Calling tool: {}", name));

        let result = AssertUnwindSafe(tool.execute(arguments)).catch_unwind().await;
        let result = match result {
            Ok(result) => result,
            Err(panic) => Err(ToolError::Panicked(panic_message(panic.as_ref()))),
        };

        match result {
            Ok(output) => {
                self.logger.debug(&format!(
                    "[ToolRegistry] Tool {} returned {} chars, {} source(s)",
                    name,
                    output.text.len(),
                    output.sources.len()
                ));
                Dispatch::Completed {
                    tool: name.to_string(),
                    output,
                }
            }
            Err(error) => {
                self.logger.warn(&format!("[ToolRegistry] Tool {} failed: {}", name, error));
                Dispatch::Failed {
                    tool: name.to_string(),
                    error,
                }
            }
        }
    }

    /// Store a dispatch's sources in its tool's slot, replacing what the tool
    /// produced before. Failed dispatches leave the slot empty.
    pub fn record(&self, dispatch: &Dispatch) {
        let (name, sources) = match dispatch {
            Dispatch::Completed { tool, output } => (tool, output.sources.clone()),
            Dispatch::Failed { tool, .. } => (tool, Vec::new()),
            Dispatch::UnknownTool(_) => return,
        };
        if let Some(slot) = self.index.read().get(name.as_str()).copied() {
            if let Some(entry) = self.last_sources.lock().get_mut(slot) {
                *entry = sources;
            }
        }
    }

    /// Execute a tool and record its sources
    pub async fn dispatch(&self, name: &str, arguments: &Value) -> Dispatch {
        let dispatch = self.execute(name, arguments).await;
        self.record(&dispatch);
        dispatch
    }

    /// Dispatch an engine-issued invocation request
    pub async fn dispatch_call(&self, call: &ToolCall) -> Dispatch {
        self.dispatch(&call.name, &call.input).await
    }

    /// Sources from every tool's most recent dispatch, in registration order
    pub fn collect_sources(&self) -> Vec<SourceRecord> {
        self.last_sources.lock().iter().flatten().cloned().collect()
    }

    /// Clear every tool's source slot
    pub fn reset_sources(&self) {
        for slot in self.last_sources.lock().iter_mut() {
            slot.clear();
        }
    }

    /// Collect then clear, as one step
    pub fn take_sources(&self) -> Vec<SourceRecord> {
        let mut slots = self.last_sources.lock();
        let sources = slots.iter().flatten().cloned().collect();
        for slot in slots.iter_mut() {
            slot.clear();
        }
        sources
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use async_trait::async_trait;
    use serde_json::json;

    /// Test tool returning canned output
    struct StubTool {
        name: &'static str,
        label: Option<&'static str>,
    }

    #[async_trait]
    impl Tool for StubTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new(self.name, "stub")
        }

        async fn execute(&self, arguments: &Value) -> Result<ToolOutput, ToolError> {
            let text = format!("{} ran with {}", self.name, arguments);
            Ok(match self.label {
                Some(label) => ToolOutput::with_sources(text, vec![SourceRecord::new(label)]),
                None => ToolOutput::text(text),
            })
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("failing", "always fails")
        }

        async fn execute(&self, _arguments: &Value) -> Result<ToolOutput, ToolError> {
            Err(ToolError::Execution("backend unreachable".to_string()))
        }
    }

    struct PanickingTool;

    #[async_trait]
    impl Tool for PanickingTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("panicky", "panics")
        }

        async fn execute(&self, _arguments: &Value) -> Result<ToolOutput, ToolError> {
            panic!("index out of range");
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::new(Arc::new(NoOpLogger))
    }

    fn stub(name: &'static str, label: Option<&'static str>) -> Arc<dyn Tool> {
        Arc::new(StubTool { name, label })
    }

    #[test]
    fn test_register_and_get_definitions_in_order() {
        let registry = registry();
        registry.register(stub("search_course_content", None)).unwrap();
        registry.register(stub("get_course_outline", None)).unwrap();

        let names: Vec<String> = registry.get_definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["search_course_content", "get_course_outline"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_without_name_fails() {
        let logger = Arc::new(MemoryLogger::new());
        let registry = ToolRegistry::new(logger.clone());

        let err = registry.register(stub("  ", None)).unwrap_err();
        assert_eq!(err, DefinitionError::MissingName);
        assert!(err.to_string().contains("'name'"));
        assert!(registry.is_empty());
        assert_eq!(logger.messages_at(LogLevel::Error).len(), 1);
    }

    #[test]
    fn test_register_duplicate_fails() {
        let registry = registry();
        registry.register(stub("search_course_content", None)).unwrap();

        let err = registry.register(stub("search_course_content", None)).unwrap_err();
        assert_eq!(err, DefinitionError::DuplicateName("search_course_content".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let registry = registry();
        let dispatch = registry.dispatch("nonexistent_tool", &json!({"query": "x"})).await;

        assert!(matches!(dispatch, Dispatch::UnknownTool(_)));
        assert!(dispatch.text().contains("not found"));
        assert!(dispatch.is_error());
    }

    #[tokio::test]
    async fn test_dispatch_failure_becomes_text() {
        let registry = registry();
        registry.register(Arc::new(FailingTool)).unwrap();

        let dispatch = registry.dispatch("failing", &json!({})).await;
        assert_eq!(dispatch.text(), "Tool execution error: backend unreachable");
        assert!(dispatch.to_tool_result("call_1").is_error);
    }

    #[tokio::test]
    async fn test_dispatch_panic_becomes_text() {
        let registry = registry();
        registry.register(Arc::new(PanickingTool)).unwrap();

        let dispatch = registry.dispatch("panicky", &json!({})).await;
        assert!(matches!(dispatch, Dispatch::Failed { error: ToolError::Panicked(_), .. }));
        assert_eq!(dispatch.text(), "Tool execution error: tool panicked: index out of range");
    }

    #[tokio::test]
    async fn test_collect_sources_in_registration_order() {
        let registry = registry();
        registry.register(stub("first", Some("A"))).unwrap();
        registry.register(stub("second", Some("B"))).unwrap();

        // Dispatch in reverse order; collection follows registration order.
        registry.dispatch("second", &json!({})).await;
        registry.dispatch("first", &json!({})).await;

        let labels: Vec<String> = registry.collect_sources().into_iter().map(|s| s.label).collect();
        assert_eq!(labels, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_latest_dispatch_replaces_slot() {
        let registry = registry();
        registry.register(stub("first", Some("A"))).unwrap();

        registry.dispatch("first", &json!({})).await;
        registry.dispatch("first", &json!({})).await;
        assert_eq!(registry.collect_sources().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_sources() {
        let registry = registry();
        registry.register(stub("first", Some("A"))).unwrap();
        registry.dispatch("first", &json!({})).await;

        assert_eq!(registry.take_sources().len(), 1);
        assert!(registry.collect_sources().is_empty());

        registry.dispatch("first", &json!({})).await;
        registry.reset_sources();
        assert!(registry.collect_sources().is_empty());
    }

    #[tokio::test]
    async fn test_execute_does_not_record() {
        let registry = registry();
        registry.register(stub("first", Some("A"))).unwrap();

        let dispatch = registry.execute("first", &json!({})).await;
        assert_eq!(dispatch.sources().len(), 1);
        assert!(registry.collect_sources().is_empty());

        registry.record(&dispatch);
        assert_eq!(registry.collect_sources().len(), 1);
    }
}
