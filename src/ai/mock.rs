//! Scripted AI client for orchestrator tests
//!
//! Responses are consumed front-to-back; once the script is exhausted the
//! last response repeats, which makes "model never stops calling tools"
//! scenarios expressible with a one-entry script.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::types::AiResponse;
use super::Message;

#[derive(Debug, Default)]
pub struct MockAiClient {
    script: Mutex<Vec<AiResponse>>,
    cursor: AtomicUsize,
    invocations: AtomicUsize,
    /// When set, every invocation fails with this error
    failure: Option<String>,
}

impl MockAiClient {
    pub fn new(script: Vec<AiResponse>) -> Self {
        MockAiClient {
            script: Mutex::new(script),
            cursor: AtomicUsize::new(0),
            invocations: AtomicUsize::new(0),
            failure: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        MockAiClient {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// Total model invocations seen (tool-mode and plain combined)
    pub fn invocation_count(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    pub fn next_response(&self, _messages: &[Message]) -> Result<AiResponse, String> {
        self.invocations.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let script = self.script.lock().unwrap();
        if script.is_empty() {
            return Err("Mock script is empty".to_string());
        }
        let index = self.cursor.fetch_add(1, Ordering::SeqCst).min(script.len() - 1);
        Ok(script[index].clone())
    }
}
