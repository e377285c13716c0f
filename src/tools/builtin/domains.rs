//! Domain and avatar lookups via the 1inch Domains API

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

const MAX_BATCH: usize = 100;

pub struct DomainsTool {
    definition: ToolDefinition,
}

impl DomainsTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "operation".to_string(),
            PropertySchema::string_enum(
                "Operation type: 'get_provider_data' for domain/avatar info, 'reverse_lookup' to find domains for addresses",
                &["get_provider_data", "reverse_lookup"],
            ),
        );
        properties.insert(
            "addressOrDomain".to_string(),
            PropertySchema::string(
                "Address or domain for get_provider_data (e.g. 'vitalik.eth' or '0x...')",
            ),
        );
        properties.insert(
            "addresses".to_string(),
            PropertySchema::string_array(
                "Array of addresses for reverse_lookup (e.g. ['0x...', '0x...'])",
            ),
        );

        DomainsTool {
            definition: ToolDefinition {
                name: "domain_operations".to_string(),
                description: "Get domain information, avatars, and reverse lookup domains for addresses using the 1inch Domains API. Supports ENS and other domain protocols.".to_string(),
                input_schema: ToolInputSchema::object(properties, &["operation"]),
                group: ToolGroup::Domain,
            },
        }
    }
}

impl Default for DomainsTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct DomainsParams {
    operation: String,
    #[serde(rename = "addressOrDomain")]
    address_or_domain: Option<String>,
    addresses: Option<Vec<String>>,
}

fn is_valid_domain(domain: &str) -> bool {
    let parts: Vec<&str> = domain.split('.').collect();
    parts.len() >= 2
        && parts.iter().all(|p| {
            !p.is_empty()
                && p.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
}

#[async_trait]
impl Tool for DomainsTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: DomainsParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        match params.operation.as_str() {
            "get_provider_data" => {
                let query = match params.address_or_domain {
                    Some(q) => q,
                    None => {
                        return ToolResult::error(
                            "addressOrDomain parameter is required for get_provider_data",
                        );
                    }
                };

                if !chains::is_valid_address(&query) && !is_valid_domain(&query) {
                    return ToolResult::error(format!(
                        "Invalid address or domain format: {}. Must be a valid address (0x...) or domain name (e.g. vitalik.eth)",
                        query
                    ));
                }

                let api_key = match oneinch::require_key(context) {
                    Ok(k) => k,
                    Err(e) => return ToolResult::error(e),
                };

                let url = format!(
                    "{}/domains/v2.0/get-providers-data-with-avatar?addressOrDomain={}",
                    oneinch::API_ROOT,
                    urlencoding::encode(&query)
                );
                let response = match oneinch::get_json(&url, &api_key).await {
                    Ok(v) => v,
                    Err(e) => return ToolResult::error(e),
                };

                let providers = response
                    .get("result")
                    .and_then(|v| v.as_array())
                    .cloned()
                    .unwrap_or_default();

                if providers.is_empty() {
                    return ToolResult::success(format!(
                        "📭 **No Domain Data Found**\n\nNo domain information found for: {}",
                        query
                    ));
                }

                let mut out = format!(
                    "🌐 **Domain Information**\n\n**Query:** {}\n**Results Found:** {}\n\n",
                    query,
                    providers.len()
                );
                for (i, provider) in providers.iter().enumerate() {
                    let protocol = provider
                        .get("protocol")
                        .and_then(|v| v.as_str())
                        .unwrap_or("unknown");
                    let domain = provider
                        .get("domain")
                        .and_then(|v| v.as_str())
                        .unwrap_or("unknown");
                    let address = provider
                        .get("address")
                        .and_then(|v| v.as_str())
                        .unwrap_or("unknown");

                    out.push_str(&format!("**{}. {} Domain**\n", i + 1, protocol));
                    out.push_str(&format!("• **Domain:** {}\n", domain));
                    out.push_str(&format!("• **Address:** {}\n", address));
                    if let Some(avatar) = provider.get("avatar").and_then(|v| v.as_str()) {
                        if !avatar.is_empty() {
                            out.push_str(&format!("• **Avatar:** {}\n", avatar));
                        }
                    }
                    out.push('\n');
                }

                ToolResult::success(out)
            }
            "reverse_lookup" => {
                let addresses = match params.addresses {
                    Some(a) if !a.is_empty() => a,
                    _ => {
                        return ToolResult::error(
                            "addresses parameter is required for reverse_lookup and must contain at least one address",
                        );
                    }
                };

                let invalid: Vec<&String> = addresses
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
                if addresses.len() > MAX_BATCH {
                    return ToolResult::error(format!(
                        "Maximum {} addresses allowed per batch lookup",
                        MAX_BATCH
                    ));
                }

                let api_key = match oneinch::require_key(context) {
                    Ok(k) => k,
                    Err(e) => return ToolResult::error(e),
                };

                let url = format!("{}/domains/v2.0/reverse-lookup-batch", oneinch::API_ROOT);
                let response =
                    match oneinch::post_json(&url, &api_key, &json!(addresses)).await {
                        Ok(v) => v,
                        Err(e) => return ToolResult::error(e),
                    };

                let mut out = format!(
                    "🔍 **Reverse Domain Lookup**\n\n**Addresses Queried:** {}\n\n",
                    addresses.len()
                );
                let mut found = 0;
                for address in &addresses {
                    let domains = response
                        .get(address)
                        .or_else(|| response.get(address.to_lowercase().as_str()))
                        .and_then(|v| v.as_array())
                        .cloned()
                        .unwrap_or_default();
                    if domains.is_empty() {
                        continue;
                    }
                    found += 1;
                    out.push_str(&format!("**{}**\n", address));
                    for (i, entry) in domains.iter().enumerate() {
                        let domain = entry
                            .get("domain")
                            .and_then(|v| v.as_str())
                            .unwrap_or("unknown");
                        let protocol = entry
                            .get("protocol")
                            .and_then(|v| v.as_str())
                            .unwrap_or("unknown");
                        out.push_str(&format!("  {}. **{}** ({})\n", i + 1, domain, protocol));
                    }
                    out.push('\n');
                }

                if found == 0 {
                    out.push_str("❌ **No Domains Found**\n\nNone of the provided addresses have associated domain names.");
                } else {
                    out.push_str(&format!(
                        "✅ **Summary:** Found domains for {} out of {} addresses",
                        found,
                        addresses.len()
                    ));
                }

                ToolResult::success(out)
            }
            other => ToolResult::error(format!(
                "Invalid operation \"{}\". Use 'get_provider_data' or 'reverse_lookup'",
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
    async fn get_provider_data_requires_query() {
        let tool = DomainsTool::new();
        let result = tool
            .execute(json!({"operation": "get_provider_data"}), &ToolContext::default())
            .await;
        assert!(!result.success);
        assert!(result.content.contains("addressOrDomain"));
    }

    #[tokio::test]
    async fn reverse_lookup_validates_addresses() {
        let tool = DomainsTool::new();
        let result = tool
            .execute(
                json!({"operation": "reverse_lookup", "addresses": ["not-an-address"]}),
                &ToolContext::default(),
            )
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Invalid address format"));
    }

    #[tokio::test]
    async fn unknown_operation_is_a_tool_error() {
        let tool = DomainsTool::new();
        let result = tool
            .execute(json!({"operation": "resolve"}), &ToolContext::default())
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Invalid operation"));
    }

    #[test]
    fn domain_validation() {
        assert!(is_valid_domain("vitalik.eth"));
        assert!(is_valid_domain("sub.name.eth"));
        assert!(!is_valid_domain("noext"));
        assert!(!is_valid_domain(".eth"));
    }
}
