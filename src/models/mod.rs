//! Domain models shared between the database layer and the controllers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a persisted chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(MessageRole::User),
            "assistant" => Some(MessageRole::Assistant),
            "system" => Some(MessageRole::System),
            _ => None,
        }
    }
}

/// A user synced from the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub provider_id: String,
    pub email: Option<String>,
    pub wallet_address: Option<String>,
    /// Raw linked-accounts payload from the identity provider
    pub linked_accounts: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted conversation turn, owned by a chat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub chat_id: String,
    pub user_id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// EIP-7702 smart wallet delegation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delegation {
    pub id: String,
    pub user_id: String,
    pub chain_id: i64,
    pub delegator: String,
    pub delegatee: String,
    pub nonce: String,
    pub authority: String,
    pub signature: String,
    pub status: String,
    pub transaction_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a cross-chain swap order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl SwapStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapStatus::Pending => "pending",
            SwapStatus::Processing => "processing",
            SwapStatus::Completed => "completed",
            SwapStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SwapStatus::Pending),
            "processing" => Some(SwapStatus::Processing),
            "completed" => Some(SwapStatus::Completed),
            "failed" => Some(SwapStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapTransaction {
    pub id: String,
    pub user_id: String,
    pub chat_id: Option<String>,
    pub message_id: Option<String>,
    pub src_chain_id: i64,
    pub dst_chain_id: i64,
    pub src_token_address: String,
    pub dst_token_address: String,
    pub amount: String,
    pub wallet_address: String,
    pub status: SwapStatus,
    pub order_hash: Option<String>,
    pub quote: Option<Value>,
    pub secrets: Option<Value>,
    pub secret_hashes: Option<Value>,
    pub error_details: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_role_round_trip() {
        for role in [MessageRole::User, MessageRole::Assistant, MessageRole::System] {
            assert_eq!(MessageRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(MessageRole::parse("tool"), None);
    }

    #[test]
    fn swap_status_round_trip() {
        for status in [
            SwapStatus::Pending,
            SwapStatus::Processing,
            SwapStatus::Completed,
            SwapStatus::Failed,
        ] {
            assert_eq!(SwapStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SwapStatus::parse("settled"), None);
    }
}
