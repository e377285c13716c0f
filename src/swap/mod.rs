//! Cross-chain swap service - REST wrapper over the 1inch Fusion+ API
//!
//! Runs in quotes-only mode: orders are prepared server-side but signed and
//! submitted by the user's wallet, so execution returns the quote payload
//! with a placeholder order hash. The monitor loop tracks orders that do get
//! placed and settles the swap row in the database.

use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::db::Database;
use crate::models::SwapStatus;

const FUSION_API_BASE: &str = "https://api.1inch.dev/fusion-plus";

/// Placeholder order hash for wallet-side execution
pub const USER_WILL_EXECUTE: &str = "user-will-execute";

/// Poll cadence and budget for the order monitor (5 minutes total)
const MONITOR_INTERVAL: Duration = Duration::from_secs(5);
const MONITOR_MAX_ATTEMPTS: u32 = 60;

#[derive(Debug, Clone)]
pub struct SwapQuoteRequest {
    pub amount: String,
    pub src_chain_id: i64,
    pub dst_chain_id: i64,
    pub src_token_address: String,
    pub dst_token_address: String,
    pub wallet_address: String,
}

#[derive(Debug, Clone)]
pub struct SwapOrder {
    pub order_hash: String,
    pub quote: Value,
    pub secrets: Value,
    pub secret_hashes: Value,
}

pub struct FusionSwapService {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FusionSwapService {
    pub fn new(api_key: &str) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(FusionSwapService {
            client,
            base_url: FUSION_API_BASE.to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn get(&self, url: &str) -> Result<Value, String> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| format!("Fusion API request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Fusion API error: {} - {}", status, body));
        }

        response
            .json()
            .await
            .map_err(|e| format!("Failed to parse Fusion response: {}", e))
    }

    /// Fetch a cross-chain quote
    pub async fn get_quote(&self, request: &SwapQuoteRequest) -> Result<Value, String> {
        let url = format!(
            "{}/quoter/v1.0/quote/receive?srcChain={}&dstChain={}&srcTokenAddress={}&dstTokenAddress={}&amount={}&walletAddress={}&enableEstimate=true",
            self.base_url,
            request.src_chain_id,
            request.dst_chain_id,
            request.src_token_address,
            request.dst_token_address,
            request.amount,
            request.wallet_address
        );

        log::info!(
            "[SWAP] Quote request: {} {} -> {} (chains {} -> {})",
            request.amount,
            request.src_token_address,
            request.dst_token_address,
            request.src_chain_id,
            request.dst_chain_id
        );

        self.get(&url).await
    }

    /// Prepare a swap for execution. Quotes-only mode: the quote is fetched
    /// and returned for the user's wallet to sign and submit.
    pub async fn execute_swap(&self, request: &SwapQuoteRequest) -> Result<SwapOrder, String> {
        let quote = self.get_quote(request).await?;

        log::info!(
            "[SWAP] Quote prepared for wallet-side execution: {}",
            quote
                .get("quoteId")
                .map(|q| q.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );

        Ok(SwapOrder {
            order_hash: USER_WILL_EXECUTE.to_string(),
            quote,
            secrets: json!([]),
            secret_hashes: json!([]),
        })
    }

    /// Current relayer-side status for a placed order
    pub async fn get_order_status(&self, order_hash: &str) -> Result<Value, String> {
        let url = format!("{}/orders/v1.0/order/status/{}", self.base_url, order_hash);
        self.get(&url).await
    }
}

/// Spawn the background monitor for a placed order. Polls every 5 seconds
/// for up to 5 minutes and settles the swap row as completed or failed.
pub fn spawn_order_monitor(
    service: Arc<FusionSwapService>,
    db: Arc<Database>,
    swap_id: String,
    order_hash: String,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(MONITOR_INTERVAL);
        // First tick fires immediately; burn it so polling starts after one interval
        ticker.tick().await;

        for attempt in 1..=MONITOR_MAX_ATTEMPTS {
            ticker.tick().await;

            match service.get_order_status(&order_hash).await {
                Ok(status) => {
                    let state = status
                        .get("status")
                        .and_then(|s| s.as_str())
                        .unwrap_or("unknown");
                    log::debug!(
                        "[SWAP_MONITOR] Order {} attempt {}: {}",
                        order_hash,
                        attempt,
                        state
                    );

                    match state {
                        "executed" => {
                            log::info!("[SWAP_MONITOR] Order {} executed", order_hash);
                            if let Err(e) =
                                db.update_swap_status(&swap_id, SwapStatus::Completed, None)
                            {
                                log::error!("[SWAP_MONITOR] Failed to mark swap {} completed: {}", swap_id, e);
                            }
                            return;
                        }
                        "expired" | "cancelled" | "refunded" => {
                            log::warn!("[SWAP_MONITOR] Order {} ended as {}", order_hash, state);
                            let details = json!({ "error": format!("Order {}", state) });
                            if let Err(e) =
                                db.update_swap_status(&swap_id, SwapStatus::Failed, Some(&details))
                            {
                                log::error!("[SWAP_MONITOR] Failed to mark swap {} failed: {}", swap_id, e);
                            }
                            return;
                        }
                        _ => {} // still pending or filling, keep polling
                    }
                }
                Err(e) => {
                    log::warn!(
                        "[SWAP_MONITOR] Status check failed for order {} (attempt {}): {}",
                        order_hash,
                        attempt,
                        e
                    );
                }
            }
        }

        log::warn!("[SWAP_MONITOR] Order {} monitoring timed out", order_hash);
        let details = json!({ "error": "Monitoring timeout" });
        if let Err(e) = db.update_swap_status(&swap_id, SwapStatus::Failed, Some(&details)) {
            log::error!("[SWAP_MONITOR] Failed to mark swap {} failed: {}", swap_id, e);
        }
    });
}
