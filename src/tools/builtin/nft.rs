//! NFT lookups via the 1inch NFT API

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
const MAX_LIMIT: u64 = 50;

pub struct NftTool {
    definition: ToolDefinition,
}

impl NftTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "address".to_string(),
            PropertySchema::string("Wallet address owning the NFTs (0x...)"),
        );
        properties.insert(
            "chains".to_string(),
            PropertySchema::string_array(
                "Networks to search (e.g. ['ethereum', 'polygon']). Defaults to ethereum",
            ),
        );
        properties.insert(
            "limit".to_string(),
            PropertySchema::number("Maximum number of NFTs to return (default: 10, max: 50)"),
        );

        NftTool {
            definition: ToolDefinition {
                name: "nft_operations".to_string(),
                description: "List NFTs owned by a wallet address using the 1inch NFT API. Image URLs in the result should be rendered as markdown images.".to_string(),
                input_schema: ToolInputSchema::object(properties, &["address"]),
                group: ToolGroup::Wallet,
            },
        }
    }
}

impl Default for NftTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct NftParams {
    address: String,
    chains: Option<Vec<String>>,
    limit: Option<u64>,
}

#[async_trait]
impl Tool for NftTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: NftParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        if !chains::is_valid_address(&params.address) {
            return ToolResult::error(format!(
                "Invalid address: \"{}\". Must be a valid address (0x + 40 hex characters)",
                params.address
            ));
        }

        let chain_names = params
            .chains
            .unwrap_or_else(|| vec!["ethereum".to_string()]);
        let mut chain_ids = Vec::new();
        for name in &chain_names {
            match chains::chain_id(name) {
                Some(id) => chain_ids.push(id.to_string()),
                None => {
                    return ToolResult::error(format!(
                        "Unsupported chain \"{}\". Supported chains: {}",
                        name,
                        chains::supported_chain_names()
                    ));
                }
            }
        }

        let api_key = match oneinch::require_key(context) {
            Ok(k) => k,
            Err(e) => return ToolResult::error(e),
        };

        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let address = params.address.to_lowercase();
        let url = format!(
            "{}/nft/v2/byaddress?address={}&chainIds={}&limit={}",
            oneinch::API_ROOT,
            address,
            chain_ids.join(","),
            limit
        );

        let response = match oneinch::get_json(&url, &api_key).await {
            Ok(v) => v,
            Err(e) => return ToolResult::error(e),
        };

        let assets = response
            .get("assets")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        if assets.is_empty() {
            return ToolResult::success(format!(
                "🖼️ **NFT Holdings**\n\n**Wallet:** {}\n\nNo NFTs found on the requested chains.",
                address
            ));
        }

        let mut out = format!(
            "🖼️ **NFT Holdings**\n\n**Wallet:** {}\n**NFTs Found:** {}\n\n",
            address,
            assets.len()
        );

        for (i, asset) in assets.iter().enumerate() {
            let name = asset
                .get("name")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .unwrap_or("Unnamed NFT");
            let collection = asset
                .get("asset_contract")
                .and_then(|c| c.get("address"))
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            let token_id = asset
                .get("token_id")
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_else(|| "?".to_string());

            out.push_str(&format!(
                "**{}. {}**\n   - **Contract:** {}\n   - **Token ID:** {}\n",
                i + 1,
                name,
                collection,
                token_id
            ));
            if let Some(image) = asset.get("image_url").and_then(|v| v.as_str()) {
                if !image.is_empty() {
                    out.push_str(&format!("   - **Image:** {}\n", image));
                }
            }
            out.push('\n');
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
        let tool = NftTool::new();
        let result = tool
            .execute(json!({"address": "bayc.eth"}), &ToolContext::default())
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Invalid address"));
    }

    #[tokio::test]
    async fn rejects_unknown_chain() {
        let tool = NftTool::new();
        let result = tool
            .execute(
                json!({
                    "address": "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
                    "chains": ["tron"]
                }),
                &ToolContext::default(),
            )
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Unsupported chain"));
    }
}
