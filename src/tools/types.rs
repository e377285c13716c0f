//! Shared types for the tool system

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::env;

/// Declared schema for a single tool parameter (JSON Schema subset)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertySchema>>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl PropertySchema {
    pub fn string(description: &str) -> Self {
        PropertySchema {
            schema_type: "string".to_string(),
            description: description.to_string(),
            default: None,
            items: None,
            enum_values: None,
        }
    }

    pub fn number(description: &str) -> Self {
        PropertySchema {
            schema_type: "number".to_string(),
            description: description.to_string(),
            default: None,
            items: None,
            enum_values: None,
        }
    }

    pub fn boolean(description: &str) -> Self {
        PropertySchema {
            schema_type: "boolean".to_string(),
            description: description.to_string(),
            default: None,
            items: None,
            enum_values: None,
        }
    }

    pub fn string_enum(description: &str, values: &[&str]) -> Self {
        PropertySchema {
            enum_values: Some(values.iter().map(|v| v.to_string()).collect()),
            ..Self::string(description)
        }
    }

    pub fn string_array(description: &str) -> Self {
        PropertySchema {
            schema_type: "array".to_string(),
            description: description.to_string(),
            default: None,
            items: Some(Box::new(PropertySchema::string(""))),
            enum_values: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: HashMap<String, PropertySchema>,
    pub required: Vec<String>,
}

impl ToolInputSchema {
    pub fn object(properties: HashMap<String, PropertySchema>, required: &[&str]) -> Self {
        ToolInputSchema {
            schema_type: "object".to_string(),
            properties,
            required: required.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// Tool grouping used by the prompt composer to order the tool walkthrough
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolGroup {
    Market,
    Wallet,
    Swap,
    Domain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: ToolInputSchema,
    pub group: ToolGroup,
}

/// Result of a tool execution. Adapters never raise past their boundary:
/// failures are `success = false` with a human-readable message in `content`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub success: bool,
    pub content: String,
    /// Structured side-channel payload (e.g. chart series for the client)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        ToolResult {
            success: true,
            content: content.into(),
            metadata: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ToolResult {
            success: false,
            content: message.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Per-request execution context handed to every tool
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// 1inch API key from config; env fallback keeps ad-hoc CLI runs working
    pub oneinch_api_key: Option<String>,
    /// Resolved wallet of the requesting user, when authenticated
    pub wallet_address: Option<String>,
}

impl ToolContext {
    pub fn oneinch_key(&self) -> Option<String> {
        if let Some(key) = &self.oneinch_api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        env::var("ONEINCH_API_KEY").ok().filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn input_schema_serializes_as_json_schema() {
        let mut props = HashMap::new();
        props.insert("chain".to_string(), PropertySchema::string_enum("Network", &["ethereum", "polygon"]));
        let schema = ToolInputSchema::object(props, &["chain"]);

        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["type"], "object");
        assert_eq!(value["required"][0], "chain");
        assert_eq!(value["properties"]["chain"]["type"], "string");
        assert_eq!(value["properties"]["chain"]["enum"][1], "polygon");
    }

    #[test]
    fn tool_result_constructors() {
        let ok = ToolResult::success("done").with_metadata(serde_json::json!({"k": 1}));
        assert!(ok.success);
        assert_eq!(ok.metadata.unwrap()["k"], 1);

        let err = ToolResult::error("boom");
        assert!(!err.success);
        assert_eq!(err.content, "boom");
    }
}
