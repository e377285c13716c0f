//! Spot token prices via the 1inch Price API

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

pub struct PriceTool {
    definition: ToolDefinition,
}

impl PriceTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "tokens".to_string(),
            PropertySchema::string_array(
                "Token addresses or symbols to price (e.g. ['ETH', 'USDC'] or ['0x...'])",
            ),
        );
        properties.insert(
            "currency".to_string(),
            PropertySchema::string("Quote currency (e.g. USD). Defaults to USD"),
        );
        properties.insert(
            "chain".to_string(),
            PropertySchema::string(
                "Blockchain network (ethereum, polygon, bsc, arbitrum, etc.). Defaults to ethereum",
            ),
        );

        PriceTool {
            definition: ToolDefinition {
                name: "token_prices".to_string(),
                description: "Get current spot prices for tokens using the 1inch Price API. Accepts token addresses (0x...) and common symbols (ETH, USDC, etc.)".to_string(),
                input_schema: ToolInputSchema::object(properties, &["tokens"]),
                group: ToolGroup::Market,
            },
        }
    }
}

impl Default for PriceTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct PriceParams {
    tokens: Vec<String>,
    currency: Option<String>,
    chain: Option<String>,
}

#[async_trait]
impl Tool for PriceTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: PriceParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        if params.tokens.is_empty() {
            return ToolResult::error("At least one token is required");
        }

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

        // Resolve every token before spending a network call
        let mut resolved = Vec::new();
        for token in &params.tokens {
            match chains::resolve_token(token, chain_id) {
                Some(addr) => resolved.push((token.clone(), addr)),
                None => {
                    return ToolResult::error(format!(
                        "Unknown token \"{}\" on chain {}. Use a token address (0x...) or one of: {}",
                        token,
                        chain_id,
                        chains::known_symbols(chain_id)
                    ));
                }
            }
        }

        let api_key = match oneinch::require_key(context) {
            Ok(k) => k,
            Err(e) => return ToolResult::error(e),
        };

        let currency = params
            .currency
            .as_deref()
            .unwrap_or("USD")
            .to_uppercase();
        let addresses = resolved
            .iter()
            .map(|(_, addr)| addr.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}/price/v1.1/{}/{}?currency={}",
            oneinch::API_ROOT,
            chain_id,
            addresses,
            urlencoding::encode(&currency)
        );

        let prices = match oneinch::get_json(&url, &api_key).await {
            Ok(v) => v,
            Err(e) => return ToolResult::error(e),
        };

        let mut out = format!(
            "💵 **Token Prices**\n\n**Chain:** {}\n**Currency:** {}\n\n",
            chains::chain_name(chain_id),
            currency
        );

        for (input, addr) in &resolved {
            let price = prices
                .get(addr)
                .and_then(|p| p.as_str())
                .unwrap_or("unavailable");
            out.push_str(&format!("• **{}** ({}): {} {}\n", input, addr, price, currency));
        }

        out.push_str("\n⏰ **Note:** Prices are indicative spot values, not executable quotes.");

        ToolResult::success(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn requires_tokens() {
        let tool = PriceTool::new();
        let result = tool
            .execute(json!({"tokens": []}), &ToolContext::default())
            .await;
        assert!(!result.success);
        assert!(result.content.contains("At least one token"));
    }

    #[tokio::test]
    async fn rejects_unknown_symbol() {
        let tool = PriceTool::new();
        let result = tool
            .execute(
                json!({"tokens": ["NOTACOIN"], "chain": "ethereum"}),
                &ToolContext::default(),
            )
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Unknown token"));
    }
}
