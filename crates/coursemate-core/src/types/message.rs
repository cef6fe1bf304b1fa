//! Transcript message types

use serde::{Deserialize, Serialize};

use super::tool::{ToolCall, ToolResult};

/// Message role in a conversation transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    /// Results of tool invocations, sent back to the completion engine
    ToolResult,
}

/// One transcript entry. User and plain assistant turns are text; tool
/// requests and tool results are carried as parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create an assistant message carrying the engine's raw response parts
    /// (text and tool invocation requests)
    pub fn assistant_parts(parts: Vec<ContentPart>) -> Self {
        Self::with_parts(MessageRole::Assistant, parts)
    }

    /// Create a single combined tool-result message
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        let parts = results.into_iter().map(ContentPart::from).collect();
        Self::with_parts(MessageRole::ToolResult, parts)
    }

    /// Create a message with structured content parts
    pub fn with_parts(role: MessageRole, parts: Vec<ContentPart>) -> Self {
        Self {
            role,
            content: MessageContent::Parts(parts),
        }
    }

    /// Text of a plain message; `None` for part-based messages
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(s) => Some(s),
            MessageContent::Parts(_) => None,
        }
    }

    /// Structured parts of this message (empty for plain text)
    pub fn parts(&self) -> &[ContentPart] {
        match &self.content {
            MessageContent::Text(_) => &[],
            MessageContent::Parts(parts) => parts,
        }
    }

    /// Tool invocation requests carried by this message, in issue order
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.parts().iter().filter_map(ContentPart::as_tool_call).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// Part of an assistant or tool-result message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    /// Tool Invocation Request issued by the engine
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// Answer to the `ToolUse` part with the same id
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
    /// Opaque reasoning signature some engines attach to a tool-use turn.
    /// It must be replayed verbatim with the rest of the turn.
    ThoughtSignature {
        signature: String,
    },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        ContentPart::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    pub fn thought_signature(signature: impl Into<String>) -> Self {
        ContentPart::ThoughtSignature {
            signature: signature.into(),
        }
    }

    /// Get the text if this is a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Convert a tool use part into a tool call
    pub fn as_tool_call(&self) -> Option<ToolCall> {
        match self {
            ContentPart::ToolUse { id, name, input } => {
                Some(ToolCall::new(id.clone(), name.clone(), input.clone()))
            }
            _ => None,
        }
    }
}

impl From<ToolCall> for ContentPart {
    fn from(call: ToolCall) -> Self {
        ContentPart::ToolUse {
            id: call.id,
            name: call.name,
            input: call.input,
        }
    }
}

impl From<ToolResult> for ContentPart {
    fn from(result: ToolResult) -> Self {
        ContentPart::ToolResult {
            tool_use_id: result.call_id,
            content: result.content,
            is_error: result.is_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_message_creation() {
        let user = ChatMessage::user("Hello");
        assert_eq!(user.role, MessageRole::User);
        assert_eq!(user.text(), Some("Hello"));

        let asst = ChatMessage::assistant("Hi there!");
        assert_eq!(asst.role, MessageRole::Assistant);
        assert!(asst.parts().is_empty());
    }

    #[test]
    fn test_message_serialization() {
        let msg = ChatMessage::user("Hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"content\":\"Hello\""));
    }

    #[test]
    fn test_tool_result_message_keeps_order() {
        let msg = ChatMessage::tool_results(vec![
            ToolResult::success("call_a", "outline"),
            ToolResult::error("call_b", "Tool execution error: boom"),
        ]);
        assert_eq!(msg.role, MessageRole::ToolResult);

        let ids: Vec<&str> = msg
            .parts()
            .iter()
            .filter_map(|p| match p {
                ContentPart::ToolResult { tool_use_id, .. } => Some(tool_use_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec!["call_a", "call_b"]);

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"tool_result\""));
        assert!(json.contains("\"is_error\":true"));
    }

    #[test]
    fn test_assistant_tool_calls() {
        let msg = ChatMessage::assistant_parts(vec![
            ContentPart::text("Let me look that up."),
            ContentPart::tool_use("t1", "get_course_outline", json!({"course_name": "MCP"})),
            ContentPart::tool_use("t2", "search_course_content", json!({"query": "servers"})),
        ]);

        let calls = msg.tool_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "get_course_outline");
        assert_eq!(calls[1].id, "t2");
    }
}
