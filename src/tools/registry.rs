//! Tool registry - name to implementation mapping used for dynamic dispatch

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::types::{ToolContext, ToolDefinition, ToolResult};

/// A single invocable tool. Implementations validate their own parameters
/// and must not panic or return Err past this boundary: every failure mode
/// becomes a `ToolResult` with `success = false`.
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult;
}

/// Fixed mapping from tool name to implementation, built once at startup
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        ToolRegistry {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        if self.tools.insert(name.clone(), tool).is_some() {
            log::warn!("[TOOLS] Duplicate registration for tool '{}'", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions sorted by name so prompts and provider payloads are stable
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> =
            self.tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::types::{ToolGroup, ToolInputSchema};
    use std::collections::HashMap;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "echo".to_string(),
                description: "Echo the input back".to_string(),
                input_schema: ToolInputSchema::object(HashMap::new(), &[]),
                group: ToolGroup::Market,
            }
        }

        async fn execute(&self, params: Value, _context: &ToolContext) -> ToolResult {
            ToolResult::success(params.to_string())
        }
    }

    #[tokio::test]
    async fn register_and_dispatch_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        assert_eq!(registry.len(), 1);
        assert!(registry.get("missing").is_none());

        let tool = registry.get("echo").unwrap();
        let result = tool
            .execute(serde_json::json!({"x": 1}), &ToolContext::default())
            .await;
        assert!(result.success);
        assert_eq!(result.content, r#"{"x":1}"#);
    }
}
