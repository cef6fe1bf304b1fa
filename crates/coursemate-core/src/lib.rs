//! CourseMate Core
//!
//! Tool-calling orchestration for a course-material assistant.
//! A completion engine answers questions about courses, optionally calling
//! tools that search course content or fetch a course outline first.
//!
//! ## Query flow
//!
//! The `orchestrator` module runs each query as a bounded round loop:
//! - Offer the registered tool definitions to the completion engine
//! - Dispatch any tool requests through the `ToolRegistry`, in issue order
//! - Feed the results back, withholding tools on the final call
//!
//! ```rust,ignore
//! use coursemate_core::{CourseAssistant, InMemoryCourseStore, ConsoleLogger};
//!
//! let assistant = CourseAssistant::from_config(&config, store, Arc::new(ConsoleLogger::new()))?;
//!
//! let answer = assistant.run_query("What is in lesson 2 of MCP?", None).await?;
//! let sources = assistant.collect_and_reset_sources();
//! ```

pub mod types;
pub mod logging;
pub mod config;
pub mod providers;
pub mod retrieval;
pub mod tools;
pub mod orchestrator;
pub mod assistant;

// Re-export commonly used types
pub use types::{
    ChatMessage, ContentPart, MessageRole, MessageContent,
    InputSchema, PropertySchema, ToolCall, ToolDefinition, ToolResult,
    SourceRecord,
};

pub use logging::{Logger, NoOpLogger, ConsoleLogger, MemoryLogger};

pub use config::{AssistantConfig, ConfigError, FileConfigProvider, load_config};

pub use providers::{
    Provider, ProviderError, ProviderResult, GenaiProvider, MockProvider, create_provider,
};

pub use retrieval::{BackendError, CourseStore, InMemoryCourseStore};

pub use tools::{
    Tool, ToolOutput, ToolError, ToolRegistry, Dispatch, DefinitionError,
    CourseSearchTool, CourseOutlineTool,
};

pub use orchestrator::{Orchestrator, QueryOutcome, DispatchMode, MAX_TOOL_ROUNDS};

pub use assistant::{CourseAssistant, AssistantError, CourseAnalytics, Exchange};
