//! Thin HTTP helpers for the 1inch REST APIs used by the tool adapters

use serde_json::Value;
use std::time::Duration;

pub const API_ROOT: &str = "https://api.1inch.dev";

fn client() -> Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| format!("Failed to create HTTP client: {}", e))
}

/// GET a 1inch endpoint and parse the JSON body. Non-2xx responses come back
/// as an error string carrying status and body for the model to read.
pub async fn get_json(url: &str, api_key: &str) -> Result<Value, String> {
    let response = client()?
        .get(url)
        .bearer_auth(api_key)
        .header("accept", "application/json")
        .send()
        .await
        .map_err(|e| format!("1inch API request failed: {}", e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(format!("1inch API error: {} - {}", status, body));
    }

    response
        .json()
        .await
        .map_err(|e| format!("Failed to parse 1inch response: {}", e))
}

/// POST a JSON body to a 1inch endpoint
pub async fn post_json(url: &str, api_key: &str, body: &Value) -> Result<Value, String> {
    let response = client()?
        .post(url)
        .bearer_auth(api_key)
        .header("accept", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| format!("1inch API request failed: {}", e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(format!("1inch API error: {} - {}", status, body));
    }

    response
        .json()
        .await
        .map_err(|e| format!("Failed to parse 1inch response: {}", e))
}

/// Every adapter starts with this check so a missing key reads the same way
pub fn require_key(context: &crate::tools::types::ToolContext) -> Result<String, String> {
    context
        .oneinch_key()
        .ok_or_else(|| "No 1inch API key configured. Set ONEINCH_API_KEY.".to_string())
}
