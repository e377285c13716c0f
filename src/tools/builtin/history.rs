//! Wallet transaction history via the 1inch History API

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

const DEFAULT_LIMIT: u64 = 10;
const MAX_LIMIT: u64 = 100;

pub struct HistoryTool {
    definition: ToolDefinition,
}

impl HistoryTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "address".to_string(),
            PropertySchema::string("Wallet address to fetch history for (0x...)"),
        );
        properties.insert(
            "chain".to_string(),
            PropertySchema::string(
                "Blockchain network (ethereum, polygon, bsc, arbitrum, etc.). Defaults to ethereum",
            ),
        );
        properties.insert(
            "limit".to_string(),
            PropertySchema::number("Maximum number of events to return (default: 10, max: 100)"),
        );

        HistoryTool {
            definition: ToolDefinition {
                name: "transaction_history".to_string(),
                description: "Get recent transaction history events for a wallet address using the 1inch History API".to_string(),
                input_schema: ToolInputSchema::object(properties, &["address"]),
                group: ToolGroup::Wallet,
            },
        }
    }
}

impl Default for HistoryTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    address: String,
    chain: Option<String>,
    limit: Option<u64>,
}

#[async_trait]
impl Tool for HistoryTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: HistoryParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        if !chains::is_valid_address(&params.address) {
            return ToolResult::error(format!(
                "Invalid address: \"{}\". Must be a valid address (0x + 40 hex characters)",
                params.address
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

        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let address = params.address.to_lowercase();
        let url = format!(
            "{}/history/v2.0/history/{}/events?chainId={}&limit={}",
            oneinch::API_ROOT,
            address,
            chain_id,
            limit
        );

        let history = match oneinch::get_json(&url, &api_key).await {
            Ok(v) => v,
            Err(e) => return ToolResult::error(e),
        };

        let items = history
            .get("items")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        if items.is_empty() {
            return ToolResult::success(format!(
                "📜 **Transaction History**\n\n**Wallet:** {}\n**Chain:** {}\n\nNo recent events found.",
                address,
                chains::chain_name(chain_id)
            ));
        }

        let mut out = format!(
            "📜 **Transaction History**\n\n**Wallet:** {}\n**Chain:** {}\n**Events:** {}\n\n",
            address,
            chains::chain_name(chain_id),
            items.len()
        );

        for (i, item) in items.iter().enumerate() {
            let details = item.get("details").cloned().unwrap_or(Value::Null);
            let tx_hash = details
                .get("txHash")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            let event_type = details
                .get("type")
                .and_then(|v| v.as_str())
                .unwrap_or("Transaction");
            let status = details
                .get("status")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            let timestamp = item
                .get("timeMs")
                .and_then(|v| v.as_i64())
                .map(|ms| {
                    chrono::DateTime::from_timestamp_millis(ms)
                        .map(|dt| dt.to_rfc3339())
                        .unwrap_or_else(|| ms.to_string())
                })
                .unwrap_or_else(|| "unknown".to_string());

            out.push_str(&format!(
                "**{}. {}**\n   - **Status:** {}\n   - **Tx:** {}\n   - **Time:** {}\n\n",
                i + 1,
                event_type,
                status,
                tx_hash,
                timestamp
            ));
        }

        ToolResult::success(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn rejects_invalid_address() {
        let tool = HistoryTool::new();
        let result = tool
            .execute(json!({"address": "0xnothex"}), &ToolContext::default())
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Invalid address"));
    }
}
