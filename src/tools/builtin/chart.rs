//! Historical price charts via the 1inch Charts API
//!
//! Chart series are returned to the model as a short confirmation message;
//! the full series rides in `ToolResult.metadata` under `chart_data` so the
//! orchestrator can hand it to the client for rendering.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::tools::chains;
use crate::tools::oneinch;
use crate::tools::registry::Tool;
use crate::tools::types::{
    PropertySchema, ToolContext, ToolDefinition, ToolGroup, ToolInputSchema, ToolResult,
};

pub const CHART_TOOL_NAME: &str = "chart_data";

const LINE_PERIODS: &[&str] = &["24H", "1W", "1M", "1Y", "AllTime"];
const CANDLE_SECONDS: &[u64] = &[300, 900, 3600, 14400, 86400, 604800];

pub struct ChartTool {
    definition: ToolDefinition,
}

impl ChartTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "chartType".to_string(),
            PropertySchema::string_enum(
                "Type of chart: 'line' for a line chart or 'candle' for a candlestick chart",
                &["line", "candle"],
            ),
        );
        properties.insert(
            "token0".to_string(),
            PropertySchema::string("Base token address or symbol (e.g. '0x...' or 'WETH')"),
        );
        properties.insert(
            "token1".to_string(),
            PropertySchema::string("Quote token address or symbol (e.g. '0x...' or 'USDC')"),
        );
        properties.insert(
            "chain".to_string(),
            PropertySchema::string(
                "Blockchain network (ethereum, polygon, bsc, arbitrum, etc.). Defaults to ethereum",
            ),
        );
        properties.insert(
            "period".to_string(),
            PropertySchema::string_enum(
                "Time period for line charts (required for line charts)",
                LINE_PERIODS,
            ),
        );
        properties.insert(
            "seconds".to_string(),
            PropertySchema::number(
                "Candle interval in seconds: 300(5m), 900(15m), 3600(1h), 14400(4h), 86400(1d), 604800(1w) (required for candle charts)",
            ),
        );

        ChartTool {
            definition: ToolDefinition {
                name: CHART_TOOL_NAME.to_string(),
                description: "Get historical price chart data (line or candle) for token pairs using the 1inch Charts API. Supports token addresses (0x...) and symbols (ETH, USDC, etc.)".to_string(),
                input_schema: ToolInputSchema::object(
                    properties,
                    &["chartType", "token0", "token1"],
                ),
                group: ToolGroup::Market,
            },
        }
    }
}

impl Default for ChartTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ChartParams {
    #[serde(rename = "chartType")]
    chart_type: String,
    token0: String,
    token1: String,
    chain: Option<String>,
    period: Option<String>,
    seconds: Option<u64>,
}

fn period_display(period: &str) -> &'static str {
    match period {
        "24H" => "24 Hours",
        "1W" => "1 Week",
        "1M" => "1 Month",
        "1Y" => "1 Year",
        "AllTime" => "All Time",
        _ => "Unknown",
    }
}

fn seconds_display(seconds: u64) -> String {
    match seconds {
        300 => "5 minutes".to_string(),
        900 => "15 minutes".to_string(),
        3600 => "1 hour".to_string(),
        14400 => "4 hours".to_string(),
        86400 => "1 day".to_string(),
        604800 => "1 week".to_string(),
        other => format!("{} seconds", other),
    }
}

/// Keep the symbol the model used when it was one; otherwise show the address
fn token_display(address: &str, original: &str) -> String {
    let trimmed = original.trim();
    if trimmed.len() <= 10 && trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        trimmed.to_uppercase()
    } else {
        address.to_string()
    }
}

#[async_trait]
impl Tool for ChartTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: ChartParams = match serde_json::from_value(params) {
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

        let token0 = match chains::resolve_token(&params.token0, chain_id) {
            Some(addr) => addr,
            None => {
                return ToolResult::error(format!(
                    "Invalid token0 identifier: \"{}\". Must be a valid token address (0x...) or supported symbol. Available symbols for chain {}: {}",
                    params.token0,
                    chain_id,
                    chains::known_symbols(chain_id)
                ));
            }
        };
        let token1 = match chains::resolve_token(&params.token1, chain_id) {
            Some(addr) => addr,
            None => {
                return ToolResult::error(format!(
                    "Invalid token1 identifier: \"{}\". Must be a valid token address (0x...) or supported symbol. Available symbols for chain {}: {}",
                    params.token1,
                    chain_id,
                    chains::known_symbols(chain_id)
                ));
            }
        };

        let chain_name = chains::chain_name(chain_id);
        let token0_display = token_display(&token0, &params.token0);
        let token1_display = token_display(&token1, &params.token1);

        match params.chart_type.as_str() {
            "line" => {
                let period = match params.period.as_deref() {
                    Some(p) if LINE_PERIODS.contains(&p) => p.to_string(),
                    Some(p) => {
                        return ToolResult::error(format!(
                            "Invalid period: {}. Supported periods: {}",
                            p,
                            LINE_PERIODS.join(", ")
                        ));
                    }
                    None => {
                        return ToolResult::error(format!(
                            "Period is required for line charts. Supported periods: {}",
                            LINE_PERIODS.join(", ")
                        ));
                    }
                };

                let api_key = match oneinch::require_key(context) {
                    Ok(k) => k,
                    Err(e) => return ToolResult::error(e),
                };

                let url = format!(
                    "{}/charts/v1.0/chart/line/{}/{}/{}/{}",
                    oneinch::API_ROOT,
                    token0,
                    token1,
                    period,
                    chain_id
                );
                let response = match oneinch::get_json(&url, &api_key).await {
                    Ok(v) => v,
                    Err(e) => return ToolResult::error(e),
                };

                let data = response
                    .get("data")
                    .and_then(|v| v.as_array())
                    .cloned()
                    .unwrap_or_default();

                let message = format!(
                    "📈 **Line Chart Data Retrieved**\n\n**Token Pair:** {} / {}\n**Chain:** {}\n**Period:** {}\n**Data Points:** {}\n\n📊 Chart data has been sent to the client for rendering.",
                    token0_display,
                    token1_display,
                    chain_name,
                    period_display(&period),
                    data.len()
                );

                ToolResult::success(message).with_metadata(json!({
                    "chart_data": {
                        "type": "line",
                        "data": data,
                        "metadata": {
                            "token0": token0,
                            "token1": token1,
                            "token0Display": token0_display,
                            "token1Display": token1_display,
                            "period": period,
                            "periodDisplay": period_display(&period),
                            "chainId": chain_id,
                            "chainName": chain_name,
                        }
                    }
                }))
            }
            "candle" => {
                let seconds = match params.seconds {
                    Some(s) if CANDLE_SECONDS.contains(&s) => s,
                    Some(s) => {
                        return ToolResult::error(format!(
                            "Invalid seconds: {}. Supported seconds: {}",
                            s,
                            CANDLE_SECONDS
                                .iter()
                                .map(|s| s.to_string())
                                .collect::<Vec<_>>()
                                .join(", ")
                        ));
                    }
                    None => {
                        return ToolResult::error(
                            "Seconds parameter is required for candle charts. Supported: 300, 900, 3600, 14400, 86400, 604800",
                        );
                    }
                };

                let api_key = match oneinch::require_key(context) {
                    Ok(k) => k,
                    Err(e) => return ToolResult::error(e),
                };

                let url = format!(
                    "{}/charts/v1.0/chart/aggregated/candle/{}/{}/{}/{}",
                    oneinch::API_ROOT,
                    token0,
                    token1,
                    seconds,
                    chain_id
                );
                let response = match oneinch::get_json(&url, &api_key).await {
                    Ok(v) => v,
                    Err(e) => return ToolResult::error(e),
                };

                let data = response
                    .get("data")
                    .and_then(|v| v.as_array())
                    .cloned()
                    .unwrap_or_default();

                let message = format!(
                    "🕯️ **Candlestick Chart Data Retrieved**\n\n**Token Pair:** {} / {}\n**Chain:** {}\n**Interval:** {}\n**Candles:** {}\n\n📊 Chart data has been sent to the client for rendering.",
                    token0_display,
                    token1_display,
                    chain_name,
                    seconds_display(seconds),
                    data.len()
                );

                ToolResult::success(message).with_metadata(json!({
                    "chart_data": {
                        "type": "candle",
                        "data": data,
                        "metadata": {
                            "token0": token0,
                            "token1": token1,
                            "token0Display": token0_display,
                            "token1Display": token1_display,
                            "seconds": seconds,
                            "intervalDisplay": seconds_display(seconds),
                            "chainId": chain_id,
                            "chainName": chain_name,
                        }
                    }
                }))
            }
            other => ToolResult::error(format!(
                "Invalid chart type \"{}\". Use 'line' or 'candle'.",
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
    async fn line_chart_requires_period() {
        let tool = ChartTool::new();
        let result = tool
            .execute(
                json!({"chartType": "line", "token0": "WETH", "token1": "USDC"}),
                &ToolContext::default(),
            )
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Period is required"));
    }

    #[tokio::test]
    async fn candle_chart_validates_interval() {
        let tool = ChartTool::new();
        let result = tool
            .execute(
                json!({"chartType": "candle", "token0": "WETH", "token1": "USDC", "seconds": 42}),
                &ToolContext::default(),
            )
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Invalid seconds"));
    }

    #[tokio::test]
    async fn unknown_chart_type_is_a_tool_error() {
        let tool = ChartTool::new();
        let result = tool
            .execute(
                json!({"chartType": "scatter", "token0": "WETH", "token1": "USDC"}),
                &ToolContext::default(),
            )
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Invalid chart type"));
    }

    #[test]
    fn token_display_prefers_symbols() {
        assert_eq!(token_display("0xabc...", "weth"), "WETH");
        let addr = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";
        assert_eq!(token_display(addr, addr), addr);
    }
}
