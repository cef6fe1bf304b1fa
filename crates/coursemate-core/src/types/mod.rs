//! Core types for orchestration
//!
//! This module contains the transcript, tool and attribution types shared by
//! providers, tools and the orchestrator.

mod message;
mod source;
mod tool;

pub use message::{ChatMessage, ContentPart, MessageContent, MessageRole};
pub use source::SourceRecord;
pub use tool::{InputSchema, PropertySchema, ToolCall, ToolDefinition, ToolResult};
