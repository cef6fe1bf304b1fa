//! Adapter between coursemate-core types and genai types
//!
//! The orchestrator works on its own transcript types; this module converts
//! them to genai requests and converts genai responses back.

use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions, ChatRequest, ChatResponse,
    ContentPart as GenaiPart, MessageContent as GenaiContent, Tool as GenaiTool,
    ToolCall as GenaiToolCall, ToolResponse as GenaiToolResponse,
};
use genai::resolver::{AuthData, AuthResolver, Endpoint, ServiceTargetResolver};
use genai::{Client, ModelIden, ServiceTarget};
use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::types::{ChatMessage, ContentPart, MessageContent, MessageRole, ToolCall, ToolDefinition};

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatOptions, CompletionRequest, CompletionResponse, StopReason};

// ============================================================================
// Message Conversion: coursemate -> genai
// ============================================================================

/// Convert one transcript message to the genai messages that represent it.
///
/// Tool-result messages expand to one genai tool response per result, in order.
/// An assistant message keeps every part (text, thought signatures and tool
/// calls) in the order the engine produced them.
pub fn to_genai_messages_for(msg: &ChatMessage) -> ProviderResult<Vec<GenaiMessage>> {
    let parts = match &msg.content {
        MessageContent::Text(text) => {
            return Ok(vec![match msg.role {
                MessageRole::Assistant => GenaiMessage::assistant(text.clone()),
                MessageRole::User | MessageRole::ToolResult => GenaiMessage::user(text.clone()),
            }]);
        }
        MessageContent::Parts(parts) => parts,
    };

    let mut out = Vec::new();
    match msg.role {
        MessageRole::Assistant => {
            let mut genai_parts = Vec::with_capacity(parts.len());
            for part in parts {
                match part {
                    ContentPart::Text { text } => genai_parts.push(GenaiPart::Text(text.clone())),
                    ContentPart::ToolUse { .. } => {
                        if let Some(call) = part.as_tool_call() {
                            genai_parts.push(GenaiPart::ToolCall(to_genai_tool_call(&call)?));
                        }
                    }
                    ContentPart::ThoughtSignature { signature } => {
                        genai_parts.push(GenaiPart::ThoughtSignature(signature.clone()))
                    }
                    // results never belong to an assistant turn
                    ContentPart::ToolResult { .. } => {}
                }
            }
            out.push(GenaiMessage::assistant(GenaiContent::from_parts(genai_parts)));
        }
        MessageRole::ToolResult => {
            for part in parts {
                if let ContentPart::ToolResult { tool_use_id, content, .. } = part {
                    out.push(GenaiMessage::from(GenaiToolResponse::new(
                        tool_use_id.clone(),
                        content.clone(),
                    )));
                }
            }
        }
        MessageRole::User => out.push(GenaiMessage::user(joined_text(parts))),
    }
    Ok(out)
}

/// Convert a transcript to genai messages
pub fn to_genai_messages(messages: &[ChatMessage]) -> ProviderResult<Vec<GenaiMessage>> {
    let mut out = Vec::with_capacity(messages.len());
    for msg in messages {
        out.extend(to_genai_messages_for(msg)?);
    }
    Ok(out)
}

fn joined_text(parts: &[ContentPart]) -> String {
    parts
        .iter()
        .filter_map(ContentPart::as_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert a tool call to genai's representation.
///
/// Goes through serde so optional provider-specific fields take their defaults.
pub fn to_genai_tool_call(call: &ToolCall) -> ProviderResult<GenaiToolCall> {
    let value = serde_json::json!({
        "call_id": call.id,
        "fn_name": call.name,
        "fn_arguments": call.input,
    });
    Ok(serde_json::from_value(value)?)
}

// ============================================================================
// Tool Conversion: coursemate -> genai
// ============================================================================

/// Convert a tool definition to a genai Tool
pub fn to_genai_tool(tool: &ToolDefinition) -> GenaiTool {
    GenaiTool::new(tool.name.clone())
        .with_description(tool.description.clone())
        .with_schema(tool.schema_value())
}

/// Convert tool definitions to genai tools
pub fn to_genai_tools(tools: &[ToolDefinition]) -> Vec<GenaiTool> {
    tools.iter().map(to_genai_tool).collect()
}

// ============================================================================
// Request / Options Conversion
// ============================================================================

/// Convert ChatOptions to genai ChatOptions
pub fn to_genai_options(options: &ChatOptions) -> GenaiOptions {
    let mut genai_opts = GenaiOptions::default();

    if let Some(temp) = options.temperature {
        genai_opts = genai_opts.with_temperature(temp as f64);
    }

    if let Some(max_tokens) = options.max_tokens {
        genai_opts = genai_opts.with_max_tokens(max_tokens);
    }

    genai_opts
}

/// Build a genai chat request. Tools are attached only when offered.
pub fn to_genai_request(request: &CompletionRequest) -> ProviderResult<ChatRequest> {
    let mut chat_req = ChatRequest::new(to_genai_messages(&request.messages)?).with_system(request.system.clone());

    if let Some(tools) = request.options.tools.as_ref().filter(|t| !t.is_empty()) {
        chat_req = chat_req.with_tools(to_genai_tools(tools));
    }

    Ok(chat_req)
}

// ============================================================================
// Response Conversion: genai -> coursemate
// ============================================================================

/// Convert genai ToolCall to our ToolCall
pub fn from_genai_tool_call(tc: &GenaiToolCall) -> ToolCall {
    ToolCall {
        id: tc.call_id.clone(),
        name: tc.fn_name.clone(),
        input: tc.fn_arguments.clone(),
    }
}

/// Convert a genai response, keeping its parts in order so the assistant turn
/// can be replayed intact. Any tool call in the response means tool use was
/// requested.
pub fn from_genai_response(response: &ChatResponse) -> CompletionResponse {
    from_genai_parts(response.content.parts())
}

fn from_genai_parts(parts: &[GenaiPart]) -> CompletionResponse {
    let mut content = Vec::with_capacity(parts.len());
    let mut requested = false;
    for part in parts {
        match part {
            GenaiPart::Text(text) if !text.is_empty() => content.push(ContentPart::text(text.clone())),
            GenaiPart::ToolCall(tc) => {
                requested = true;
                content.push(ContentPart::from(from_genai_tool_call(tc)));
            }
            GenaiPart::ThoughtSignature(signature) => {
                content.push(ContentPart::thought_signature(signature.clone()))
            }
            _ => {}
        }
    }

    let stop_reason = if requested {
        StopReason::ToolRequested
    } else {
        StopReason::Done
    };
    CompletionResponse { content, stop_reason }
}

// ============================================================================
// Credentials
// ============================================================================

/// Mapping from provider names to the environment variables holding their keys
static API_KEY_ENV_VARS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
    m.insert("anthropic", &["ANTHROPIC_API_KEY"]);
    m.insert("openai", &["OPENAI_API_KEY"]);
    m.insert("gemini", &["GEMINI_API_KEY", "GOOGLE_API_KEY"]);
    m.insert("google", &["GEMINI_API_KEY", "GOOGLE_API_KEY"]);
    m.insert("groq", &["GROQ_API_KEY"]);
    m.insert("deepseek", &["DEEPSEEK_API_KEY"]);
    m.insert("xai", &["XAI_API_KEY"]);
    m.insert("ollama", &[]);
    m
});

/// Environment variables consulted for a provider's API key, in order
pub fn api_key_env_vars(provider: &str) -> Vec<String> {
    let lower = provider.to_lowercase();
    match API_KEY_ENV_VARS.get(lower.as_str()) {
        Some(vars) => vars.iter().map(|v| v.to_string()).collect(),
        None => vec![format!("{}_API_KEY", provider.to_uppercase())],
    }
}

/// Whether a provider can run without an API key
pub fn is_keyless(provider: &str) -> bool {
    matches!(provider.to_lowercase().as_str(), "ollama" | "mock")
}

// ============================================================================
// Client Creation
// ============================================================================

/// Create a genai Client using an explicit API key and optional endpoint override
pub fn create_client(api_key: Option<String>, api_base: Option<String>) -> Client {
    let auth_resolver = AuthResolver::from_resolver_fn(
        move |_model_iden: ModelIden| -> genai::resolver::Result<Option<AuthData>> {
            Ok(api_key.clone().map(AuthData::from_single))
        },
    );

    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let Some(base) = api_base.as_ref() else {
                return Ok(target);
            };
            Ok(ServiceTarget {
                endpoint: Endpoint::from_owned(base.clone()),
                auth: target.auth,
                model: target.model,
            })
        },
    );

    Client::builder()
        .with_auth_resolver(auth_resolver)
        .with_service_target_resolver(target_resolver)
        .build()
}

/// Map a genai error onto the upstream completion error family
pub fn from_genai_error(provider: &str, err: genai::Error) -> ProviderError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    if lower.contains("rate limit") || lower.contains("429") {
        ProviderError::rate_limited(provider, message)
    } else {
        ProviderError::upstream(provider, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InputSchema, ToolResult};
    use serde_json::json;

    #[test]
    fn test_tool_conversion() {
        let tool = ToolDefinition::new("search_course_content", "Search course materials")
            .with_schema(InputSchema::new().required_property("query", "string", "What to search for"));

        let genai_tool = to_genai_tool(&tool);
        assert_eq!(genai_tool.name, "search_course_content");
    }

    #[test]
    fn test_tool_call_roundtrip() {
        let call = ToolCall::new("toolu_1", "get_course_outline", json!({"course_name": "MCP"}));
        let genai_call = to_genai_tool_call(&call).unwrap();
        assert_eq!(genai_call.call_id, "toolu_1");
        assert_eq!(from_genai_tool_call(&genai_call), call);
    }

    #[test]
    fn test_tool_results_expand_per_result() {
        let msg = ChatMessage::tool_results(vec![
            ToolResult::success("a", "one"),
            ToolResult::success("b", "two"),
        ]);
        assert_eq!(to_genai_messages_for(&msg).unwrap().len(), 2);
    }

    #[test]
    fn test_assistant_tool_turn_keeps_all_parts() {
        let msg = ChatMessage::assistant_parts(vec![
            ContentPart::thought_signature("sig-1"),
            ContentPart::text("Let me check the outline first."),
            ContentPart::tool_use("toolu_1", "get_course_outline", json!({"course_name": "MCP"})),
        ]);

        let genai = to_genai_messages_for(&msg).unwrap();
        assert_eq!(genai.len(), 1);
        assert_eq!(genai[0].content.texts(), vec!["Let me check the outline first."]);
        assert_eq!(genai[0].content.tool_calls().len(), 1);
        assert!(matches!(&genai[0].content.parts()[0], GenaiPart::ThoughtSignature(s) if s == "sig-1"));

        let back = from_genai_parts(genai[0].content.parts());
        assert_eq!(back.stop_reason, StopReason::ToolRequested);
        assert_eq!(back.content, msg.parts().to_vec());
    }

    #[test]
    fn test_text_only_response_is_done() {
        let response = from_genai_parts(&[GenaiPart::Text("Lesson 2 covers embeddings.".to_string())]);
        assert_eq!(response.stop_reason, StopReason::Done);
        assert_eq!(response.content, vec![ContentPart::text("Lesson 2 covers embeddings.")]);
    }

    #[test]
    fn test_request_withholds_empty_tools() {
        let request = CompletionRequest {
            system: "sys".to_string(),
            messages: vec![ChatMessage::user("hi")],
            options: ChatOptions::new().with_tools(vec![]),
        };
        let chat_req = to_genai_request(&request).unwrap();
        assert!(chat_req.tools.is_none());
    }

    #[test]
    fn test_api_key_env_vars() {
        assert_eq!(api_key_env_vars("anthropic"), vec!["ANTHROPIC_API_KEY"]);
        assert_eq!(api_key_env_vars("Gemini"), vec!["GEMINI_API_KEY", "GOOGLE_API_KEY"]);
        assert_eq!(api_key_env_vars("mistral"), vec!["MISTRAL_API_KEY"]);
        assert!(api_key_env_vars("ollama").is_empty());
        assert!(is_keyless("ollama"));
        assert!(!is_keyless("anthropic"));
    }
}
