//! Portfolio valuation via the 1inch Portfolio API

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

pub struct PortfolioTool {
    definition: ToolDefinition,
}

impl PortfolioTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "operation".to_string(),
            PropertySchema::string_enum(
                "Operation type: 'current_value' for the portfolio value breakdown, 'profit_and_loss' for PnL over a timerange",
                &["current_value", "profit_and_loss"],
            ),
        );
        properties.insert(
            "addresses".to_string(),
            PropertySchema::string_array("Wallet addresses to analyze (0x...)"),
        );
        properties.insert(
            "chain".to_string(),
            PropertySchema::string(
                "Blockchain network (ethereum, polygon, bsc, arbitrum, etc.). Defaults to ethereum",
            ),
        );
        properties.insert(
            "timerange".to_string(),
            PropertySchema::string_enum(
                "Timerange for profit_and_loss (defaults to 1week)",
                &["1day", "1week", "1month", "1year"],
            ),
        );

        PortfolioTool {
            definition: ToolDefinition {
                name: "portfolio_analysis".to_string(),
                description: "Analyze portfolio value and profit/loss for wallet addresses using the 1inch Portfolio API".to_string(),
                input_schema: ToolInputSchema::object(properties, &["operation", "addresses"]),
                group: ToolGroup::Wallet,
            },
        }
    }
}

impl Default for PortfolioTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct PortfolioParams {
    operation: String,
    addresses: Vec<String>,
    chain: Option<String>,
    timerange: Option<String>,
}

#[async_trait]
impl Tool for PortfolioTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: PortfolioParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        if params.addresses.is_empty() {
            return ToolResult::error("At least one address is required");
        }
        let invalid: Vec<&String> = params
            .addresses
            .iter()
            .filter(|a| !chains::is_valid_address(a))
            .collect();
        if !invalid.is_empty() {
            return ToolResult::error(format!(
                "Invalid address format(s): {}",
                invalid
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
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

        let address_params = params
            .addresses
            .iter()
            .map(|a| format!("addresses={}", a.to_lowercase()))
            .collect::<Vec<_>>()
            .join("&");

        match params.operation.as_str() {
            "current_value" => {
                let url = format!(
                    "{}/portfolio/v5.0/general/current_value?{}&chain_id={}",
                    oneinch::API_ROOT,
                    address_params,
                    chain_id
                );
                let response = match oneinch::get_json(&url, &api_key).await {
                    Ok(v) => v,
                    Err(e) => return ToolResult::error(e),
                };

                let total = response
                    .get("result")
                    .and_then(|r| r.get("total"))
                    .and_then(|v| v.as_f64())
                    .unwrap_or(0.0);

                let mut out = format!(
                    "📊 **Portfolio Value**\n\n**Chain:** {}\n**Addresses:** {}\n**Total Value:** ${:.2}\n",
                    chains::chain_name(chain_id),
                    params.addresses.len(),
                    total
                );

                if let Some(by_address) = response
                    .get("result")
                    .and_then(|r| r.get("by_address"))
                    .and_then(|v| v.as_array())
                {
                    out.push('\n');
                    for entry in by_address {
                        let addr = entry
                            .get("address")
                            .and_then(|v| v.as_str())
                            .unwrap_or("unknown");
                        let value = entry
                            .get("value_usd")
                            .and_then(|v| v.as_f64())
                            .unwrap_or(0.0);
                        out.push_str(&format!("• **{}**: ${:.2}\n", addr, value));
                    }
                }

                ToolResult::success(out)
            }
            "profit_and_loss" => {
                let timerange = params.timerange.as_deref().unwrap_or("1week");
                let url = format!(
                    "{}/portfolio/v5.0/general/profit_and_loss?{}&chain_id={}&timerange={}",
                    oneinch::API_ROOT,
                    address_params,
                    chain_id,
                    timerange
                );
                let response = match oneinch::get_json(&url, &api_key).await {
                    Ok(v) => v,
                    Err(e) => return ToolResult::error(e),
                };

                let mut out = format!(
                    "📈 **Portfolio Profit & Loss**\n\n**Chain:** {}\n**Timerange:** {}\n\n",
                    chains::chain_name(chain_id),
                    timerange
                );

                if let Some(results) = response.get("result").and_then(|v| v.as_array()) {
                    for entry in results {
                        let chain = entry
                            .get("chain_id")
                            .map(|v| v.to_string())
                            .unwrap_or_else(|| "all".to_string());
                        let abs = entry
                            .get("abs_profit_usd")
                            .and_then(|v| v.as_f64())
                            .unwrap_or(0.0);
                        let roi = entry.get("roi").and_then(|v| v.as_f64()).unwrap_or(0.0);
                        out.push_str(&format!(
                            "• **Chain {}**: {}{:.2} USD (ROI {:.2}%)\n",
                            chain,
                            if abs >= 0.0 { "+" } else { "" },
                            abs,
                            roi * 100.0
                        ));
                    }
                } else {
                    out.push_str("No profit/loss data available.\n");
                }

                ToolResult::success(out)
            }
            other => ToolResult::error(format!(
                "Invalid operation \"{}\". Use 'current_value' or 'profit_and_loss'",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn requires_addresses() {
        let tool = PortfolioTool::new();
        let result = tool
            .execute(
                json!({"operation": "current_value", "addresses": []}),
                &ToolContext::default(),
            )
            .await;
        assert!(!result.success);
        assert!(result.content.contains("At least one address"));
    }

    #[tokio::test]
    async fn validates_address_format() {
        let tool = PortfolioTool::new();
        let result = tool
            .execute(
                json!({"operation": "current_value", "addresses": ["whale.eth"]}),
                &ToolContext::default(),
            )
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Invalid address format"));
    }
}
