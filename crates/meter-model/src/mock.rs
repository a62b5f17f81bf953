// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::adapter::{AdapterError, ChatAdapter};
use crate::types::{ChatRequest, ChatResponse, ToolCallRequest};

/// Deterministic mock adapter for tests and the pipeline's self-check.
/// Echoes the last user message back as the assistant response.
#[derive(Default)]
pub struct EchoMockAdapter;

#[async_trait]
impl ChatAdapter for EchoMockAdapter {
    fn vendor(&self) -> &str {
        "mock"
    }

    async fn list_models(&self) -> Result<Vec<String>, AdapterError> {
        Ok(vec!["mock-model".to_string()])
    }

    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, AdapterError> {
        let reply = req
            .messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, crate::types::Role::User))
            .map(|m| m.content.clone())
            .unwrap_or_else(|| "[no input]".to_string());
        Ok(ChatResponse::text_only(format!("MOCK: {reply}"), 10, 10))
    }
}

/// One scripted response: either a final text reply or a batch of tool calls.
#[derive(Debug, Clone)]
pub enum Script {
    Text(String),
    ToolCalls(Vec<ToolCallRequest>),
    Error(ScriptedError),
}

#[derive(Debug, Clone)]
pub enum ScriptedError {
    NoApiKey,
    CreditExhausted,
    Transient,
}

/// A pre-scripted adapter. Each call to `chat` pops the next script from the
/// front of the queue, letting tests drive exact multi-turn sequences
/// (including tool calls and error injection) without network access.
pub struct ScriptedMockAdapter {
    vendor: String,
    scripts: Arc<Mutex<Vec<Script>>>,
    pub requests_seen: Arc<Mutex<Vec<ChatRequest>>>,
}

impl ScriptedMockAdapter {
    pub fn new(vendor: impl Into<String>, scripts: Vec<Script>) -> Self {
        Self {
            vendor: vendor.into(),
            scripts: Arc::new(Mutex::new(scripts)),
            requests_seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn always_text(vendor: impl Into<String>, reply: impl Into<String>) -> Self {
        let r = reply.into();
        Self::new(vendor, vec![Script::Text(r)])
    }

    pub fn call_count(&self) -> usize {
        self.requests_seen.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatAdapter for ScriptedMockAdapter {
    fn vendor(&self) -> &str {
        &self.vendor
    }

    async fn list_models(&self) -> Result<Vec<String>, AdapterError> {
        Ok(vec!["scripted-mock-model".to_string()])
    }

    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, AdapterError> {
        self.requests_seen.lock().unwrap().push(req.clone());
        let mut scripts = self.scripts.lock().unwrap();
        if scripts.is_empty() {
            return Ok(ChatResponse::text_only("", 1, 0));
        }
        match scripts.remove(0) {
            Script::Text(text) => Ok(ChatResponse::text_only(text, 10, 10)),
            Script::ToolCalls(calls) => Ok(ChatResponse {
                text: String::new(),
                tokens_in: 10,
                tokens_out: 10,
                tool_calls: calls,
                raw: serde_json::Value::Null,
            }),
            Script::Error(ScriptedError::NoApiKey) => {
                Err(AdapterError::NoApiKey { vendor: self.vendor.clone() })
            }
            Script::Error(ScriptedError::CreditExhausted) => Err(AdapterError::CreditExhausted),
            Script::Error(ScriptedError::Transient) => {
                Err(AdapterError::Transient { status: 429, message: "rate limited".into() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatRequest, Message};

    #[tokio::test]
    async fn echo_mock_echoes_last_user_message() {
        let adapter = EchoMockAdapter;
        let req = ChatRequest::new("mock-model", vec![Message::user("hello world")]);
        let resp = adapter.chat(req).await.unwrap();
        assert_eq!(resp.text, "MOCK: hello world");
    }

    #[tokio::test]
    async fn scripted_adapter_pops_scripts_in_order() {
        let adapter = ScriptedMockAdapter::new(
            "mock",
            vec![Script::Text("first".into()), Script::Text("second".into())],
        );
        let req = ChatRequest::new("m", vec![Message::user("x")]);
        let r1 = adapter.chat(req.clone()).await.unwrap();
        assert_eq!(r1.text, "first");
        let r2 = adapter.chat(req).await.unwrap();
        assert_eq!(r2.text, "second");
    }

    #[tokio::test]
    async fn scripted_adapter_tool_calls_have_empty_text() {
        let adapter = ScriptedMockAdapter::new(
            "mock",
            vec![Script::ToolCalls(vec![ToolCallRequest {
                name: "write_to_file".into(),
                arguments: "{}".into(),
            }])],
        );
        let req = ChatRequest::new("m", vec![Message::user("x")]);
        let resp = adapter.chat(req).await.unwrap();
        assert!(resp.text.is_empty());
        assert_eq!(resp.tool_calls.len(), 1);
    }

    #[tokio::test]
    async fn scripted_adapter_exhausted_queue_returns_empty_text() {
        let adapter = ScriptedMockAdapter::new("mock", vec![]);
        let req = ChatRequest::new("m", vec![Message::user("x")]);
        let resp = adapter.chat(req).await.unwrap();
        assert_eq!(resp.text, "");
    }

    #[tokio::test]
    async fn scripted_adapter_injects_no_api_key_error() {
        let adapter =
            ScriptedMockAdapter::new("mock", vec![Script::Error(ScriptedError::NoApiKey)]);
        let req = ChatRequest::new("m", vec![Message::user("x")]);
        let err = adapter.chat(req).await.unwrap_err();
        assert!(matches!(err, AdapterError::NoApiKey { .. }));
    }

    #[tokio::test]
    async fn scripted_adapter_records_requests_seen() {
        let adapter = ScriptedMockAdapter::always_text("mock", "hi");
        let req = ChatRequest::new("m", vec![Message::user("track me")]);
        let _ = adapter.chat(req).await.unwrap();
        assert_eq!(adapter.call_count(), 1);
    }

    #[test]
    fn transient_error_is_transient() {
        let e = AdapterError::Transient { status: 503, message: "x".into() };
        assert!(e.is_transient());
    }

    #[test]
    fn credit_exhausted_is_not_transient() {
        assert!(!AdapterError::CreditExhausted.is_transient());
    }
}
