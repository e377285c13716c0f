//! Wallet token balances via the 1inch Balance API

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::tools::chains::{self, NATIVE_TOKEN};
use crate::tools::oneinch;
use crate::tools::registry::Tool;
use crate::tools::types::{
    PropertySchema, ToolContext, ToolDefinition, ToolGroup, ToolInputSchema, ToolResult,
};

pub struct BalanceTool {
    definition: ToolDefinition,
}

impl BalanceTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "walletAddress".to_string(),
            PropertySchema::string("Wallet address to check balances for (0x...)"),
        );
        properties.insert(
            "chain".to_string(),
            PropertySchema::string(
                "Blockchain network (ethereum, polygon, bsc, arbitrum, optimism, etc.). Defaults to ethereum",
            ),
        );
        properties.insert(
            "showZeroBalances".to_string(),
            PropertySchema::boolean("Include tokens with zero balance. Defaults to false"),
        );

        BalanceTool {
            definition: ToolDefinition {
                name: "token_balances".to_string(),
                description: "Get token balances for a wallet address on a specific chain using the 1inch Balance API. Use this before token_prices when the user asks about the value of their holdings.".to_string(),
                input_schema: ToolInputSchema::object(properties, &["walletAddress"]),
                group: ToolGroup::Wallet,
            },
        }
    }
}

impl Default for BalanceTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct BalanceParams {
    #[serde(rename = "walletAddress")]
    wallet_address: String,
    chain: Option<String>,
    #[serde(rename = "showZeroBalances", default)]
    show_zero_balances: bool,
}

#[async_trait]
impl Tool for BalanceTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: BalanceParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        if !chains::is_valid_address(&params.wallet_address) {
            return ToolResult::error(format!(
                "Invalid wallet address: \"{}\". Must be a valid address (0x + 40 hex characters)",
                params.wallet_address
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

        let api_key = match oneinch::require_key(context) {
            Ok(k) => k,
            Err(e) => return ToolResult::error(e),
        };

        let wallet = params.wallet_address.to_lowercase();
        let url = format!(
            "{}/balance/v1.2/{}/balances/{}",
            oneinch::API_ROOT,
            chain_id,
            wallet
        );

        let balances = match oneinch::get_json(&url, &api_key).await {
            Ok(v) => v,
            Err(e) => return ToolResult::error(e),
        };

        let entries = match balances.as_object() {
            Some(map) => map,
            None => return ToolResult::error("Unexpected balance response shape"),
        };

        let mut lines = Vec::new();
        for (token, raw) in entries {
            let raw = raw.as_str().unwrap_or("0");
            if !params.show_zero_balances && raw == "0" {
                continue;
            }
            let label = if token.eq_ignore_ascii_case(NATIVE_TOKEN) {
                "native".to_string()
            } else {
                token.clone()
            };
            lines.push(format!(
                "• **{}**: {} (raw: {})",
                label,
                chains::format_token_amount(raw, 18),
                raw
            ));
        }

        let chain_name = chains::chain_name(chain_id);
        if lines.is_empty() {
            return ToolResult::success(format!(
                "💰 **Token Balances**\n\n**Wallet:** {}\n**Chain:** {}\n\nNo non-zero balances found.",
                wallet, chain_name
            ));
        }

        ToolResult::success(format!(
            "💰 **Token Balances**\n\n**Wallet:** {}\n**Chain:** {}\n**Tokens:** {}\n\n{}\n\n\
             ⚠️ Raw amounts assume 18 decimals; use get_token_info for exact token decimals.",
            wallet,
            chain_name,
            lines.len(),
            lines.join("\n")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn rejects_malformed_wallet() {
        let tool = BalanceTool::new();
        let result = tool
            .execute(json!({"walletAddress": "vitalik.eth"}), &ToolContext::default())
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Invalid wallet address"));
    }

    #[tokio::test]
    async fn rejects_unknown_chain() {
        let tool = BalanceTool::new();
        let result = tool
            .execute(
                json!({
                    "walletAddress": "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
                    "chain": "solana"
                }),
                &ToolContext::default(),
            )
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Unsupported chain"));
    }
}
