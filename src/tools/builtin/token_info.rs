//! Token metadata via the 1inch Token API

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::tools::chains;
use crate::tools::oneinch;
use crate::tools::registry::Tool;
use crate::tools::types::{
    PropertySchema, ToolContext, ToolDefinition, ToolGroup, ToolInputSchema, ToolResult,
};

pub struct TokenInfoTool {
    definition: ToolDefinition,
}

impl TokenInfoTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "token".to_string(),
            PropertySchema::string("Token address (0x...) or symbol (e.g. 'WETH', 'USDC')"),
        );
        properties.insert(
            "chain".to_string(),
            PropertySchema::string(
                "Blockchain network (ethereum, polygon, bsc, arbitrum, etc.). Defaults to ethereum",
            ),
        );

        TokenInfoTool {
            definition: ToolDefinition {
                name: "get_token_info".to_string(),
                description: "Get token metadata (name, symbol, decimals, logo) using the 1inch Token API. Use this to resolve decimals before interpreting raw balance amounts.".to_string(),
                input_schema: ToolInputSchema::object(properties, &["token"]),
                group: ToolGroup::Market,
            },
        }
    }
}

impl Default for TokenInfoTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct TokenInfoParams {
    token: String,
    chain: Option<String>,
}

#[async_trait]
impl Tool for TokenInfoTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: TokenInfoParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        let chain = params.chain.as_deref().unwrap_or("ethereum");
        let chain_id = match chains::chain_id(chain) {
            Some(id) => id,
            None => {
                return ToolResult::error(format!(
                    "Unsupported chain \"{}\". Supported chains: {}",
                    chain,
                    chains::supported_chain_names()
                ));
            }
        };

        let address = match chains::resolve_token(&params.token, chain_id) {
            Some(addr) => addr,
            None => {
                return ToolResult::error(format!(
                    "Unknown token \"{}\" on chain {}. Use a token address (0x...) or one of: {}",
                    params.token,
                    chain_id,
                    chains::known_symbols(chain_id)
                ));
            }
        };

        let api_key = match oneinch::require_key(context) {
            Ok(k) => k,
            Err(e) => return ToolResult::error(e),
        };

        let url = format!(
            "{}/token/v1.2/{}/custom/{}",
            oneinch::API_ROOT,
            chain_id,
            address
        );
        let info = match oneinch::get_json(&url, &api_key).await {
            Ok(v) => v,
            Err(e) => return ToolResult::error(e),
        };

        let name = info.get("name").and_then(|v| v.as_str()).unwrap_or("unknown");
        let symbol = info.get("symbol").and_then(|v| v.as_str()).unwrap_or("?");
        let decimals = info.get("decimals").and_then(|v| v.as_u64()).unwrap_or(18);
        let logo = info.get("logoURI").and_then(|v| v.as_str());

        let mut out = format!(
            "🪙 **Token Information**\n\n**Name:** {}\n**Symbol:** {}\n**Address:** {}\n**Chain:** {}\n**Decimals:** {}\n",
            name,
            symbol,
            address,
            chains::chain_name(chain_id),
            decimals
        );
        if let Some(logo) = logo {
            out.push_str(&format!("**Logo:** {}\n", logo));
        }

        ToolResult::success(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn unknown_symbol_is_a_tool_error() {
        let tool = TokenInfoTool::new();
        let result = tool
            .execute(json!({"token": "WAGMI"}), &ToolContext::default())
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Unknown token"));
    }

    #[tokio::test]
    async fn missing_token_param_is_a_tool_error() {
        let tool = TokenInfoTool::new();
        let result = tool.execute(json!({}), &ToolContext::default()).await;
        assert!(!result.success);
        assert!(result.content.contains("Invalid parameters"));
    }
}
