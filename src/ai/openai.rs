//! OpenAI-compatible chat completions client with tool support

use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use super::types::{AiResponse, ToolCall};
use super::{Message, MessageRole};
use crate::tools::ToolDefinition;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ApiMessage>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ApiToolCall {
    id: String,
    function: ApiFunctionCall,
}

#[derive(Debug, Deserialize)]
struct ApiFunctionCall {
    name: String,
    /// JSON-encoded argument object, as the API returns it
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str, endpoint: Option<&str>, model: Option<&str>) -> Result<Self, String> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        let auth_value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| format!("Invalid API key format: {}", e))?;
        headers.insert(header::AUTHORIZATION, auth_value);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            endpoint: endpoint.unwrap_or(DEFAULT_ENDPOINT).to_string(),
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            temperature: 0.7,
        })
    }

    /// Plain text generation, no tools offered
    pub async fn generate_text(&self, messages: Vec<Message>) -> Result<String, String> {
        let response = self.complete(messages, None).await?;
        Ok(response.content)
    }

    /// Generation with the tool set offered; the model may elect zero or
    /// more tool calls
    pub async fn generate_with_tools(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
    ) -> Result<AiResponse, String> {
        let tool_payload = if tools.is_empty() {
            None
        } else {
            Some(tools.iter().map(Self::tool_to_function).collect())
        };
        self.complete(messages, tool_payload).await
    }

    async fn complete(
        &self,
        messages: Vec<Message>,
        tools: Option<Vec<Value>>,
    ) -> Result<AiResponse, String> {
        let api_messages: Vec<ApiMessage> = messages
            .into_iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    MessageRole::System => "system".to_string(),
                    MessageRole::User => "user".to_string(),
                    MessageRole::Assistant => "assistant".to_string(),
                },
                content: m.content,
            })
            .collect();

        let request = CompletionRequest {
            model: self.model.clone(),
            messages: api_messages,
            temperature: self.temperature,
            tools,
        };

        log::debug!("Sending request to chat completions API: {:?}", request.model);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("Chat completions request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if let Ok(parsed) = serde_json::from_str::<ApiErrorResponse>(&error_text) {
                return Err(format!("Chat completions error: {}", parsed.error.message));
            }
            return Err(format!(
                "Chat completions returned error status: {}, body: {}",
                status, error_text
            ));
        }

        let data: CompletionResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse chat completions response: {}", e))?;

        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| "Chat completions returned no choices".to_string())?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                let arguments = serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(Value::Object(Default::default()));
                ToolCall {
                    id: tc.id,
                    name: tc.function.name,
                    arguments,
                }
            })
            .collect();

        Ok(AiResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
        })
    }

    /// Convert a tool definition to the function-calling wire format
    fn tool_to_function(def: &ToolDefinition) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": def.name,
                "description": def.description,
                "parameters": serde_json::to_value(&def.input_schema).unwrap_or_default(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::types::{PropertySchema, ToolGroup, ToolInputSchema};
    use std::collections::HashMap;

    #[test]
    fn tool_definitions_serialize_to_function_format() {
        let mut props = HashMap::new();
        props.insert("chain".to_string(), PropertySchema::string("Network"));
        let def = ToolDefinition {
            name: "gas_prices".to_string(),
            description: "Get gas prices".to_string(),
            input_schema: ToolInputSchema::object(props, &[]),
            group: ToolGroup::Market,
        };

        let function = OpenAiClient::tool_to_function(&def);
        assert_eq!(function["type"], "function");
        assert_eq!(function["function"]["name"], "gas_prices");
        assert_eq!(function["function"]["parameters"]["type"], "object");
        assert_eq!(
            function["function"]["parameters"]["properties"]["chain"]["type"],
            "string"
        );
    }
}
