//! Tool management module
//!
//! Tools are named capabilities the completion engine may invoke. The
//! registry holds them by name, offers their definitions to the engine,
//! dispatches invocation requests, and keeps the sources each tool produced
//! on its most recent dispatch.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  ToolRegistry                                │
//! │                                              │
//! │  - register: unique, non-empty names         │
//! │  - get_definitions: registration order       │
//! │  - dispatch: unknown names become text       │
//! │  - collect_sources / reset_sources           │
//! └──────────────────────────────────────────────┘
//!           │
//!           ▼
//! ┌──────────────────────┐  ┌──────────────────────┐
//! │ search_course_content│  │ get_course_outline   │
//! └──────────────────────┘  └──────────────────────┘
//!           │                         │
//!           └──────── CourseStore ────┘
//! ```

mod outline;
mod registry;
mod search;

pub use outline::{CourseOutlineTool, OUTLINE_TOOL_NAME};
pub use registry::{DefinitionError, Dispatch, ToolRegistry};
pub use search::{CourseSearchTool, SEARCH_TOOL_NAME};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::retrieval::BackendError;
use crate::types::{SourceRecord, ToolDefinition};

/// What a tool hands back from one execution
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolOutput {
    /// Text fed back to the completion engine
    pub text: String,
    /// Attribution for the content in `text`; empty for non-retrieval tools
    pub sources: Vec<SourceRecord>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
        }
    }

    pub fn with_sources(text: impl Into<String>, sources: Vec<SourceRecord>) -> Self {
        Self {
            text: text.into(),
            sources,
        }
    }
}

/// Tool execution failures
///
/// "No results" is never an error; tools report it as ordinary output.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Execution(String),

    #[error("{0}")]
    Backend(#[from] BackendError),

    #[error("tool panicked: {0}")]
    Panicked(String),
}

/// A named, independently invokable capability
#[async_trait]
pub trait Tool: Send + Sync {
    /// Definition offered to the completion engine. Must be pure.
    fn definition(&self) -> ToolDefinition;

    /// Run the tool with the engine-supplied arguments
    async fn execute(&self, arguments: &Value) -> Result<ToolOutput, ToolError>;
}

/// Deserialize tool arguments into a typed struct
pub fn parse_arguments<T: DeserializeOwned>(arguments: &Value) -> Result<T, ToolError> {
    T::deserialize(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Accept lesson numbers sent as integers, whole floats or numeric strings
pub(crate) fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde::Deserialize;

    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(u) = n.as_u64() {
                u32::try_from(u).map(Some).map_err(D::Error::custom)
            } else {
                match n.as_f64() {
                    Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => Ok(Some(f as u32)),
                    _ => Err(D::Error::custom(format!("expected a lesson number, got {}", n))),
                }
            }
        }
        Some(Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected a lesson number, got '{}'", s))),
        Some(other) => Err(D::Error::custom(format!("expected a lesson number, got {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Args {
        query: String,
        #[serde(default, deserialize_with = "lenient_u32")]
        lesson_number: Option<u32>,
    }

    #[test]
    fn test_parse_arguments() {
        let args: Args = parse_arguments(&json!({"query": "q", "lesson_number": 2})).unwrap();
        assert_eq!(args.query, "q");
        assert_eq!(args.lesson_number, Some(2));

        let args: Args = parse_arguments(&json!({"query": "q"})).unwrap();
        assert_eq!(args.lesson_number, None);
    }

    #[test]
    fn test_lenient_lesson_numbers() {
        let args: Args = parse_arguments(&json!({"query": "q", "lesson_number": "3"})).unwrap();
        assert_eq!(args.lesson_number, Some(3));

        let args: Args = parse_arguments(&json!({"query": "q", "lesson_number": 4.0})).unwrap();
        assert_eq!(args.lesson_number, Some(4));

        let args: Args = parse_arguments(&json!({"query": "q", "lesson_number": null})).unwrap();
        assert_eq!(args.lesson_number, None);

        assert!(parse_arguments::<Args>(&json!({"query": "q", "lesson_number": 1.5})).is_err());
    }

    #[test]
    fn test_missing_required_argument() {
        let err = parse_arguments::<Args>(&json!({"lesson_number": 1})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(msg) if msg.contains("query")));
    }
}
