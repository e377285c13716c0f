pub mod mock;
pub mod openai;
pub mod types;

pub use mock::MockAiClient;
pub use openai::OpenAiClient;
pub use types::{AiResponse, ToolCall};

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::tools::ToolDefinition;

/// Role of a model-facing conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Unified AI client over the configured provider. The mock variant keeps the
/// orchestration loop testable without network access.
pub enum AiClient {
    OpenAi(OpenAiClient),
    Mock(MockAiClient),
}

impl AiClient {
    pub fn from_config(config: &Config) -> Result<Self, String> {
        let client = OpenAiClient::new(
            &config.openai_api_key,
            config.openai_endpoint.as_deref(),
            Some(&config.openai_model),
        )?;
        Ok(AiClient::OpenAi(client))
    }

    /// Plain text generation, no tools offered
    pub async fn generate_text(&self, messages: Vec<Message>) -> Result<String, String> {
        match self {
            AiClient::OpenAi(client) => client.generate_text(messages).await,
            AiClient::Mock(client) => client.next_response(&messages).map(|r| r.content),
        }
    }

    /// Generation with the tool set offered to the model
    pub async fn generate_with_tools(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
    ) -> Result<AiResponse, String> {
        match self {
            AiClient::OpenAi(client) => client.generate_with_tools(messages, tools).await,
            AiClient::Mock(client) => client.next_response(&messages),
        }
    }
}
