//! Provider-neutral AI types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool call requested by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// One model invocation result: assistant text plus zero or more tool calls
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiResponse {
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl AiResponse {
    pub fn text(content: impl Into<String>) -> Self {
        AiResponse {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn with_tool_call(name: &str, arguments: Value) -> Self {
        AiResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: format!("call-{}", name),
                name: name.to_string(),
                arguments,
            }],
        }
    }
}
