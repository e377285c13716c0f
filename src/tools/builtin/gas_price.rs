//! EIP-1559 gas prices via the 1inch Gas Price API

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

pub struct GasPriceTool {
    definition: ToolDefinition,
}

impl GasPriceTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "chain".to_string(),
            PropertySchema::string(
                "Blockchain network (ethereum, polygon, bsc, arbitrum, optimism, etc.). Defaults to ethereum",
            ),
        );
        properties.insert(
            "includeEstimates".to_string(),
            PropertySchema::boolean(
                "Include USD cost estimates for common transaction types. Defaults to false",
            ),
        );
        properties.insert(
            "ethPrice".to_string(),
            PropertySchema::number(
                "Current native-token price in USD for cost calculations (only used with includeEstimates)",
            ),
        );

        GasPriceTool {
            definition: ToolDefinition {
                name: "gas_prices".to_string(),
                description: "Get real-time gas prices and transaction cost estimates for EIP-1559 compatible networks using the 1inch Gas Price API".to_string(),
                input_schema: ToolInputSchema::object(properties, &[]),
                group: ToolGroup::Market,
            },
        }
    }
}

impl Default for GasPriceTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct GasPriceParams {
    chain: Option<String>,
    #[serde(rename = "includeEstimates", default)]
    include_estimates: bool,
    #[serde(rename = "ethPrice")]
    eth_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct GasTier {
    #[serde(rename = "maxPriorityFeePerGas")]
    max_priority_fee_per_gas: String,
    #[serde(rename = "maxFeePerGas")]
    max_fee_per_gas: String,
}

#[derive(Debug, Deserialize)]
struct GasPrices {
    #[serde(rename = "baseFee")]
    base_fee: String,
    low: GasTier,
    medium: GasTier,
    high: GasTier,
    instant: GasTier,
}

fn format_gwei(wei: &str) -> String {
    let gwei = wei.parse::<f64>().unwrap_or(0.0) / 1e9;
    format!("{:.2}", gwei)
}

fn estimate_cost_usd(max_fee_wei: &str, gas_limit: f64, eth_price: f64) -> String {
    let max_fee_eth = max_fee_wei.parse::<f64>().unwrap_or(0.0) / 1e18;
    format!("${:.2}", max_fee_eth * gas_limit * eth_price)
}

#[async_trait]
impl Tool for GasPriceTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: GasPriceParams = match serde_json::from_value(params) {
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

        let api_key = match oneinch::require_key(context) {
            Ok(k) => k,
            Err(e) => return ToolResult::error(e),
        };

        let url = format!("{}/gas-price/v1.6/{}", oneinch::API_ROOT, chain_id);
        let gas: GasPrices = match oneinch::get_json(&url, &api_key).await {
            Ok(v) => match serde_json::from_value(v) {
                Ok(g) => g,
                Err(e) => return ToolResult::error(format!("Unexpected gas price shape: {}", e)),
            },
            Err(e) => return ToolResult::error(e),
        };

        let chain_name = chains::chain_name(chain_id);
        let mut out = format!("⛽ **Current Gas Prices**\n\n**Chain:** {} ({})\n", chain_name, chain_id);
        out.push_str(&format!("**Base Fee:** {} gwei\n\n", format_gwei(&gas.base_fee)));

        let tiers = [
            ("🐌 Low Priority", &gas.low),
            ("🚗 Medium Priority", &gas.medium),
            ("🚀 High Priority", &gas.high),
            ("⚡ Instant Priority", &gas.instant),
        ];

        for (label, tier) in &tiers {
            out.push_str(&format!("**{}**\n", label));
            out.push_str(&format!(
                "   - **Max Priority Fee:** {} gwei\n",
                format_gwei(&tier.max_priority_fee_per_gas)
            ));
            out.push_str(&format!(
                "   - **Max Fee:** {} gwei\n",
                format_gwei(&tier.max_fee_per_gas)
            ));
            if params.include_estimates {
                if let Some(price) = params.eth_price {
                    out.push_str(&format!(
                        "   - **Simple Transfer Cost:** {}\n",
                        estimate_cost_usd(&tier.max_fee_per_gas, 21_000.0, price)
                    ));
                    out.push_str(&format!(
                        "   - **Token Transfer Cost:** {}\n",
                        estimate_cost_usd(&tier.max_fee_per_gas, 65_000.0, price)
                    ));
                    out.push_str(&format!(
                        "   - **DeFi Transaction Cost:** {}\n",
                        estimate_cost_usd(&tier.max_fee_per_gas, 150_000.0, price)
                    ));
                }
            }
            out.push('\n');
        }

        out.push_str("💡 **Gas Price Guide:**\n");
        out.push_str("• **Low**: Slower transaction, lower cost (~15-30 min)\n");
        out.push_str("• **Medium**: Standard speed and cost (~3-5 min)\n");
        out.push_str("• **High**: Faster transaction, higher cost (~1-2 min)\n");
        out.push_str("• **Instant**: Fastest execution, highest cost (~30 sec)\n\n");
        out.push_str("⏰ **Note:** Gas prices fluctuate with network congestion.");

        ToolResult::success(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn rejects_unknown_chain() {
        let tool = GasPriceTool::new();
        let result = tool
            .execute(json!({"chain": "nearprotocol"}), &ToolContext::default())
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Unsupported chain"));
    }

    #[test]
    fn gwei_formatting() {
        assert_eq!(format_gwei("25000000000"), "25.00");
        assert_eq!(format_gwei("garbage"), "0.00");
    }

    #[test]
    fn usd_estimate() {
        // 100 gwei * 21000 gas * $2000 = $4.20
        assert_eq!(estimate_cost_usd("100000000000", 21_000.0, 2000.0), "$4.20");
    }
}
