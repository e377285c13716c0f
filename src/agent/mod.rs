//! AI response generation - the tool-calling orchestration loop
//!
//! One generation call owns one loop: invoke the model, dispatch any tool
//! calls it requested, fold the results back into the conversation, and
//! repeat until the model answers in plain text or the iteration cap forces
//! a synthesis pass. Tool failures are data fed back to the model; only
//! model-invocation failures abort the loop.

pub mod memory;
pub mod postprocess;
pub mod prompt;

pub use prompt::UserContext;

use futures_util::future::join_all;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::ai::{AiClient, AiResponse, Message, ToolCall};
use crate::db::Database;
use crate::tools::builtin::chart::CHART_TOOL_NAME;
use crate::tools::{ToolContext, ToolRegistry};

/// Hard ceiling on tool iterations per generation call
pub const MAX_TOOL_ITERATIONS: usize = 5;

/// Canned reply when the loop cannot produce a real answer
pub const FALLBACK_APOLOGY: &str =
    "I apologize, but I wasn't able to work out an answer to that. Could you rephrase your request?";

/// Canned reply when the model provider itself fails
pub const PROVIDER_FAILURE_APOLOGY: &str =
    "I apologize, but I'm having trouble processing your request right now. Please try again later.";

/// What one generation call hands back to the message workflow
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools_used: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One executed tool call inside an iteration
struct ToolInvocation {
    name: String,
    summary: String,
    metadata: Option<Value>,
}

pub struct AgentEngine {
    db: Arc<Database>,
    registry: Arc<ToolRegistry>,
}

impl AgentEngine {
    pub fn new(db: Arc<Database>, registry: Arc<ToolRegistry>) -> Self {
        AgentEngine { db, registry }
    }

    /// Generate an AI response for a user message in a chat. Never returns
    /// Err: a model-provider failure becomes the canned apology with the
    /// error detail attached for the caller to log.
    pub async fn generate_response(
        &self,
        client: &AiClient,
        chat_id: &str,
        user_message: &str,
        user: Option<&UserContext>,
        tool_context: &ToolContext,
    ) -> GenerationResult {
        match self
            .run_tool_loop(client, chat_id, user_message, user, tool_context)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                log::error!("[AGENT_LOOP] Generation failed for chat {}: {}", chat_id, e);
                GenerationResult {
                    content: PROVIDER_FAILURE_APOLOGY.to_string(),
                    tools_used: None,
                    chart_data: None,
                    error: Some(e),
                }
            }
        }
    }

    async fn run_tool_loop(
        &self,
        client: &AiClient,
        chat_id: &str,
        user_message: &str,
        user: Option<&UserContext>,
        tool_context: &ToolContext,
    ) -> Result<GenerationResult, String> {
        let system_prompt = prompt::build_system_prompt(&self.registry, user);
        let mut history = memory::chat_history(&self.db, chat_id, memory::DEFAULT_HISTORY_LIMIT);
        let tools = self.registry.definitions();

        let mut current_input = user_message.to_string();
        let mut tools_used: Vec<String> = Vec::new();
        let mut accumulated_results: Vec<String> = Vec::new();
        let mut chart_data: Option<Value> = None;
        let mut iterations = 0usize;
        let mut final_answer: Option<String> = None;

        loop {
            let mut messages = Vec::with_capacity(history.len() + 2);
            messages.push(Message::system(system_prompt.clone()));
            messages.extend(history.iter().cloned());
            messages.push(Message::user(current_input.clone()));

            // Model failures propagate; the caller owns the single catch
            let response: AiResponse = client.generate_with_tools(messages, tools.clone()).await?;

            if response.tool_calls.is_empty() {
                if postprocess::contains_scaffolding(&response.content) {
                    log::warn!(
                        "[AGENT_LOOP] Model echoed internal directive in chat {} (iteration {})",
                        chat_id,
                        iterations
                    );
                    if accumulated_results.is_empty() {
                        // Nothing gathered to synthesize from
                        final_answer = Some(FALLBACK_APOLOGY.to_string());
                    }
                    // Otherwise leave final_answer unset: synthesis below
                } else {
                    final_answer = Some(response.content);
                }
                break;
            }

            log::info!(
                "[AGENT_LOOP] Iteration {}: {} tool call(s): {:?}",
                iterations + 1,
                response.tool_calls.len(),
                response.tool_calls.iter().map(|c| &c.name).collect::<Vec<_>>()
            );

            // Tool calls within one iteration carry no declared data
            // dependency; dispatch concurrently and keep request order
            let invocations = join_all(
                response
                    .tool_calls
                    .iter()
                    .map(|call| self.dispatch_tool(call, tool_context)),
            )
            .await;

            let mut iteration_summaries = Vec::with_capacity(invocations.len());
            for invocation in invocations {
                tools_used.push(invocation.name.clone());
                if chart_data.is_none() && invocation.name == CHART_TOOL_NAME {
                    // First chart payload wins; malformed payloads are ignored
                    chart_data = invocation
                        .metadata
                        .as_ref()
                        .and_then(|m| m.get("chart_data"))
                        .filter(|v| !v.is_null())
                        .cloned();
                }
                accumulated_results.push(invocation.summary.clone());
                iteration_summaries.push(invocation.summary);
            }

            // Fold this iteration into the conversation: the user's ask and
            // a synthetic assistant turn carrying the tool output
            history.push(Message::user(user_message.to_string()));
            history.push(Message::assistant(iteration_summaries.join("\n\n")));

            current_input =
                build_processing_directive(user_message, &iteration_summaries);

            iterations += 1;
            if iterations >= MAX_TOOL_ITERATIONS {
                log::warn!(
                    "[AGENT_LOOP] Iteration cap ({}) reached for chat {}",
                    MAX_TOOL_ITERATIONS,
                    chat_id
                );
                break;
            }
        }

        // Synthesis: the loop ended without a clean final answer
        if final_answer.is_none() {
            if accumulated_results.is_empty() {
                final_answer = Some(FALLBACK_APOLOGY.to_string());
            } else {
                let synthesis = client
                    .generate_text(vec![
                        Message::system(
                            "You produce clear, direct answers from gathered data. \
                             Do not mention tool results or internal processing in your reply.",
                        ),
                        Message::user(build_synthesis_prompt(user_message, &accumulated_results)),
                    ])
                    .await?;
                final_answer = Some(synthesis);
            }
        }

        let content = postprocess::clean(final_answer.as_deref().unwrap_or(FALLBACK_APOLOGY));

        let mut deduped: Vec<String> = Vec::new();
        for name in tools_used {
            if !deduped.contains(&name) {
                deduped.push(name);
            }
        }

        Ok(GenerationResult {
            content,
            tools_used: if deduped.is_empty() { None } else { Some(deduped) },
            chart_data,
            error: None,
        })
    }

    /// Execute one requested tool call. All failure modes come back as
    /// readable text: unknown names, adapter errors, everything.
    async fn dispatch_tool(&self, call: &ToolCall, context: &ToolContext) -> ToolInvocation {
        match self.registry.get(&call.name) {
            Some(tool) => {
                let result = tool.execute(call.arguments.clone(), context).await;
                let summary = if result.success {
                    format!("**Tool Result ({}):**\n{}", call.name, result.content)
                } else {
                    log::warn!("[AGENT_LOOP] Tool {} failed: {}", call.name, result.content);
                    format!("Error executing tool {}: {}", call.name, result.content)
                };
                ToolInvocation {
                    name: call.name.clone(),
                    summary,
                    metadata: result.metadata,
                }
            }
            None => {
                log::warn!("[AGENT_LOOP] Unknown tool requested: {}", call.name);
                ToolInvocation {
                    name: call.name.clone(),
                    summary: format!("Tool not found: {}", call.name),
                    metadata: None,
                }
            }
        }
    }
}

/// The next-iteration input after tool calls: restate the request, show the
/// fresh results, ask for either more tool calls or a final answer. The
/// leading marker lines double as the leak-detection fingerprint.
fn build_processing_directive(original_request: &str, results: &[String]) -> String {
    format!(
        "INTERNAL PROCESSING — do not include this section in your reply.\n\n\
         The user's original request was:\n\"{}\"\n\n\
         The following tool results were just obtained:\n\n{}\n\n\
         What additional tools should be called, if any? If none are needed, \
         produce the final answer to the user's request now, with no further \
         tool calls.",
        original_request,
        results.join("\n\n")
    )
}

/// Prompt for the post-loop synthesis call
fn build_synthesis_prompt(original_request: &str, results: &[String]) -> String {
    format!(
        "Answer this question directly and naturally: \"{}\"\n\n\
         Base your answer on the following information:\n\n{}\n\n\
         Give a complete, user-facing answer. Do not mention tool results or \
         internal processing.",
        original_request,
        results.join("\n\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiResponse, MockAiClient};
    use crate::db::sqlite::test_support::temp_db;
    use crate::tools::registry::Tool;
    use crate::tools::types::{ToolDefinition, ToolGroup, ToolInputSchema, ToolResult};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;

    struct StubTool {
        name: &'static str,
        result: ToolResult,
    }

    #[async_trait]
    impl Tool for StubTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: self.name.to_string(),
                description: "stub".to_string(),
                input_schema: ToolInputSchema::object(HashMap::new(), &[]),
                group: ToolGroup::Market,
            }
        }

        async fn execute(&self, _params: Value, _context: &ToolContext) -> ToolResult {
            self.result.clone()
        }
    }

    fn engine_with(tools: Vec<StubTool>) -> (tempfile::TempDir, AgentEngine) {
        let (dir, db) = temp_db();
        let mut registry = ToolRegistry::new();
        for tool in tools {
            registry.register(Arc::new(tool));
        }
        (dir, AgentEngine::new(Arc::new(db), Arc::new(registry)))
    }

    fn mock(script: Vec<AiResponse>) -> AiClient {
        AiClient::Mock(MockAiClient::new(script))
    }

    #[tokio::test]
    async fn plain_answer_returns_immediately() {
        let (_dir, engine) = engine_with(vec![]);
        let client = mock(vec![AiResponse::text("I can look up balances and prices.")]);

        let result = engine
            .generate_response(&client, "chat-1", "What can you do?", None, &ToolContext::default())
            .await;

        assert_eq!(result.content, "I can look up balances and prices.");
        assert!(result.tools_used.is_none());
        assert!(result.chart_data.is_none());
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn single_tool_call_then_answer() {
        let (_dir, engine) = engine_with(vec![StubTool {
            name: "token_balances",
            result: ToolResult::success("2 ETH"),
        }]);
        let client = mock(vec![
            AiResponse::with_tool_call("token_balances", json!({"walletAddress": "0xabc"})),
            AiResponse::text("You hold 2 ETH."),
        ]);

        let result = engine
            .generate_response(&client, "chat-1", "What's my ETH balance?", None, &ToolContext::default())
            .await;

        assert_eq!(result.content, "You hold 2 ETH.");
        assert_eq!(result.tools_used, Some(vec!["token_balances".to_string()]));
    }

    #[tokio::test]
    async fn loop_terminates_at_iteration_cap_with_synthesis() {
        let (_dir, engine) = engine_with(vec![StubTool {
            name: "gas_prices",
            result: ToolResult::success("12 gwei"),
        }]);
        // The model always requests a tool; the script repeats its last entry
        let mock_client = MockAiClient::new(vec![AiResponse::with_tool_call(
            "gas_prices",
            json!({}),
        )]);
        let client = AiClient::Mock(mock_client);

        let result = engine
            .generate_response(&client, "chat-1", "gas?", None, &ToolContext::default())
            .await;

        // Loop stops at the cap; exactly one synthesis invocation follows.
        let AiClient::Mock(mock_client) = &client else { unreachable!() };
        assert_eq!(mock_client.invocation_count(), MAX_TOOL_ITERATIONS + 1);
        assert!(result.error.is_none());
        assert_eq!(result.tools_used, Some(vec!["gas_prices".to_string()]));
    }

    #[tokio::test]
    async fn failing_tool_is_isolated_and_reported() {
        let (_dir, engine) = engine_with(vec![StubTool {
            name: "token_prices",
            result: ToolResult::error("upstream timeout"),
        }]);
        let client = mock(vec![
            AiResponse::with_tool_call("token_prices", json!({"tokens": ["ETH"]})),
            AiResponse::text("Price data is unavailable right now."),
        ]);

        let result = engine
            .generate_response(&client, "chat-1", "ETH price?", None, &ToolContext::default())
            .await;

        assert!(!result.content.is_empty());
        assert_eq!(result.tools_used, Some(vec!["token_prices".to_string()]));
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn unknown_tool_keeps_the_loop_alive() {
        let (_dir, engine) = engine_with(vec![]);
        let client = mock(vec![
            AiResponse::with_tool_call("time_travel", json!({})),
            AiResponse::text("That tool does not exist, but here's what I know."),
        ]);

        let result = engine
            .generate_response(&client, "chat-1", "go back in time", None, &ToolContext::default())
            .await;

        assert_eq!(result.content, "That tool does not exist, but here's what I know.");
        assert_eq!(result.tools_used, Some(vec!["time_travel".to_string()]));
    }

    #[tokio::test]
    async fn scaffolding_leak_without_results_yields_apology() {
        let (_dir, engine) = engine_with(vec![]);
        let client = mock(vec![AiResponse::text(
            "INTERNAL PROCESSING — do not include this section in your reply.",
        )]);

        let result = engine
            .generate_response(&client, "chat-1", "hello", None, &ToolContext::default())
            .await;

        assert_eq!(result.content, FALLBACK_APOLOGY);
    }

    #[tokio::test]
    async fn scaffolding_leak_with_results_triggers_synthesis() {
        let (_dir, engine) = engine_with(vec![StubTool {
            name: "gas_prices",
            result: ToolResult::success("12 gwei"),
        }]);
        let client = mock(vec![
            AiResponse::with_tool_call("gas_prices", json!({})),
            AiResponse::text("What additional tools should be called, if any?"),
            AiResponse::text("Gas is currently 12 gwei."),
        ]);

        let result = engine
            .generate_response(&client, "chat-1", "gas?", None, &ToolContext::default())
            .await;

        assert_eq!(result.content, "Gas is currently 12 gwei.");
        assert!(!postprocess::contains_scaffolding(&result.content));
    }

    /// Chart stub that returns a distinct payload on every call
    struct SequencedChartTool {
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl Tool for SequencedChartTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: CHART_TOOL_NAME.to_string(),
                description: "stub chart".to_string(),
                input_schema: ToolInputSchema::object(HashMap::new(), &[]),
                group: ToolGroup::Market,
            }
        }

        async fn execute(&self, _params: Value, _context: &ToolContext) -> ToolResult {
            let seq = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            ToolResult::success("chart ready")
                .with_metadata(json!({"chart_data": {"type": "line", "seq": seq}}))
        }
    }

    #[tokio::test]
    async fn chart_payload_is_first_wins() {
        let (_dir, db) = temp_db();
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(SequencedChartTool {
            calls: std::sync::atomic::AtomicUsize::new(0),
        }));
        let engine = AgentEngine::new(Arc::new(db), Arc::new(registry));
        let client = mock(vec![
            AiResponse {
                content: String::new(),
                tool_calls: vec![
                    ToolCall {
                        id: "c1".to_string(),
                        name: CHART_TOOL_NAME.to_string(),
                        arguments: json!({}),
                    },
                    ToolCall {
                        id: "c2".to_string(),
                        name: CHART_TOOL_NAME.to_string(),
                        arguments: json!({}),
                    },
                ],
            },
            AiResponse::text("Here is your chart."),
        ]);

        let result = engine
            .generate_response(&client, "chat-1", "chart ETH/USDC", None, &ToolContext::default())
            .await;

        let chart = result.chart_data.expect("chart payload captured");
        assert_eq!(chart["type"], "line");
        // Two chart invocations in one iteration: the first payload sticks
        assert_eq!(chart["seq"], 0);
        // Duplicate tool names collapse in the audit list
        assert_eq!(result.tools_used, Some(vec![CHART_TOOL_NAME.to_string()]));
    }

    #[tokio::test]
    async fn model_failure_becomes_apology_with_error() {
        let (_dir, engine) = engine_with(vec![]);
        let client = AiClient::Mock(MockAiClient::failing("provider is down"));

        let result = engine
            .generate_response(&client, "chat-1", "hello", None, &ToolContext::default())
            .await;

        assert_eq!(result.content, PROVIDER_FAILURE_APOLOGY);
        assert_eq!(result.error.as_deref(), Some("provider is down"));
    }

    #[tokio::test]
    async fn final_answer_never_contains_scaffolding() {
        let (_dir, engine) = engine_with(vec![StubTool {
            name: "gas_prices",
            result: ToolResult::success("12 gwei"),
        }]);
        let client = mock(vec![
            AiResponse::with_tool_call("gas_prices", json!({})),
            AiResponse::text(
                "Gas is 12 gwei.\nINTERNAL PROCESSING — do not include this section in your reply.\nmore text",
            ),
        ]);

        let result = engine
            .generate_response(&client, "chat-1", "gas?", None, &ToolContext::default())
            .await;

        // Markers after a tool round send the loop to synthesis, and the
        // post-processor scrubs whatever the synthesis call still leaks
        assert!(!postprocess::contains_scaffolding(&result.content));
    }

    #[tokio::test]
    async fn generation_proceeds_without_history() {
        // History loading from an unknown chat id returns empty and the
        // generation still succeeds
        let (_dir, engine) = engine_with(vec![]);
        let client = mock(vec![AiResponse::text("Hello!")]);

        let result = engine
            .generate_response(&client, "never-created", "hi", None, &ToolContext::default())
            .await;

        assert_eq!(result.content, "Hello!");
    }
}
