//! Swap quotes via the 1inch Swap API

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

pub struct SwapQuoteTool {
    definition: ToolDefinition,
}

impl SwapQuoteTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "fromToken".to_string(),
            PropertySchema::string("Token to sell - address (0x...) or symbol (e.g. 'ETH')"),
        );
        properties.insert(
            "toToken".to_string(),
            PropertySchema::string("Token to buy - address (0x...) or symbol (e.g. 'USDC')"),
        );
        properties.insert(
            "amount".to_string(),
            PropertySchema::string(
                "Amount to sell in the token's smallest unit (wei-style integer string)",
            ),
        );
        properties.insert(
            "chain".to_string(),
            PropertySchema::string(
                "Blockchain network (ethereum, polygon, bsc, arbitrum, etc.). Defaults to ethereum",
            ),
        );
        properties.insert(
            "slippage".to_string(),
            PropertySchema::number("Maximum slippage percentage (e.g. 1 for 1%). Defaults to 1"),
        );

        SwapQuoteTool {
            definition: ToolDefinition {
                name: "oneinch_fusion_swap".to_string(),
                description: "Get real-time swap quotes and rates across supported blockchains using the 1inch aggregation API. Quotes are informational; actual execution happens through the user's wallet.".to_string(),
                input_schema: ToolInputSchema::object(
                    properties,
                    &["fromToken", "toToken", "amount"],
                ),
                group: ToolGroup::Swap,
            },
        }
    }
}

impl Default for SwapQuoteTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct SwapQuoteParams {
    #[serde(rename = "fromToken")]
    from_token: String,
    #[serde(rename = "toToken")]
    to_token: String,
    amount: String,
    chain: Option<String>,
    slippage: Option<f64>,
}

#[async_trait]
impl Tool for SwapQuoteTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: SwapQuoteParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        if params.amount.is_empty() || !params.amount.chars().all(|c| c.is_ascii_digit()) {
            return ToolResult::error(format!(
                "Invalid amount \"{}\". Provide an integer amount in the token's smallest unit",
                params.amount
            ));
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

        let src = match chains::resolve_token(&params.from_token, chain_id) {
            Some(addr) => addr,
            None => {
                return ToolResult::error(format!(
                    "Unknown fromToken \"{}\" on chain {}. Use an address (0x...) or one of: {}",
                    params.from_token,
                    chain_id,
                    chains::known_symbols(chain_id)
                ));
            }
        };
        let dst = match chains::resolve_token(&params.to_token, chain_id) {
            Some(addr) => addr,
            None => {
                return ToolResult::error(format!(
                    "Unknown toToken \"{}\" on chain {}. Use an address (0x...) or one of: {}",
                    params.to_token,
                    chain_id,
                    chains::known_symbols(chain_id)
                ));
            }
        };

        if src == dst {
            return ToolResult::error("fromToken and toToken must differ");
        }

        let api_key = match oneinch::require_key(context) {
            Ok(k) => k,
            Err(e) => return ToolResult::error(e),
        };

        let url = format!(
            "{}/swap/v6.0/{}/quote?src={}&dst={}&amount={}&includeGas=true",
            oneinch::API_ROOT,
            chain_id,
            src,
            dst,
            params.amount
        );
        let quote = match oneinch::get_json(&url, &api_key).await {
            Ok(v) => v,
            Err(e) => return ToolResult::error(e),
        };

        let dst_amount = quote
            .get("dstAmount")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        let gas = quote.get("gas").and_then(|v| v.as_u64());
        let slippage = params.slippage.unwrap_or(1.0);

        let mut out = format!(
            "🔄 **Swap Quote**\n\n**Chain:** {}\n**Sell:** {} of {} ({})\n**Buy:** {} ({})\n**Expected Output:** {} (raw)\n**Slippage Tolerance:** {}%\n",
            chains::chain_name(chain_id),
            params.amount,
            params.from_token,
            src,
            params.to_token,
            dst,
            dst_amount,
            slippage
        );
        if let Some(gas) = gas {
            out.push_str(&format!("**Estimated Gas:** {}\n", gas));
        }
        out.push_str(
            "\n⚠️ This quote is informational. Executing the swap requires wallet interaction and rates may move before execution.",
        );

        ToolResult::success(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn rejects_non_integer_amount() {
        let tool = SwapQuoteTool::new();
        let result = tool
            .execute(
                json!({"fromToken": "ETH", "toToken": "USDC", "amount": "1.5"}),
                &ToolContext::default(),
            )
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Invalid amount"));
    }

    #[tokio::test]
    async fn rejects_same_token_pair() {
        let tool = SwapQuoteTool::new();
        let result = tool
            .execute(
                json!({"fromToken": "WETH", "toToken": "ETH", "amount": "1000"}),
                &ToolContext::default(),
            )
            .await;
        // WETH and ETH resolve to the same wrapped address on mainnet
        assert!(!result.success);
        assert!(result.content.contains("must differ"));
    }
}
