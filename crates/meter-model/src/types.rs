// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single message in a chat transcript. Benchmark prompts and tool
/// transcripts are plain text — no multimodal content parts, unlike a full
/// coding-agent message type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self { role: Role::System, content: text.into() }
    }
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, content: text.into() }
    }
    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: text.into() }
    }
    pub fn tool(text: impl Into<String>) -> Self {
        Self { role: Role::Tool, content: text.into() }
    }
}

/// A tool schema advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Whether/how the model should be steered toward calling a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    #[default]
    Auto,
    None,
    Required,
}

/// Reasoning-effort hint for reasoning-family models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

/// Request sent to a chat adapter.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub tools: Option<Vec<ToolSchema>>,
    pub tool_choice: Option<ToolChoice>,
    pub reasoning_effort: Option<ReasoningEffort>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: 0.7,
            max_tokens: 1024,
            tools: None,
            tool_choice: None,
            reasoning_effort: None,
        }
    }
}

/// A single tool invocation requested by the model, normalized into the
/// canonical `{name, arguments}` shape regardless of provider wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    /// JSON-encoded argument object.
    pub arguments: String,
}

/// Response returned by a chat adapter.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub text: String,
    pub tokens_in: u32,
    pub tokens_out: u32,
    pub tool_calls: Vec<ToolCallRequest>,
    pub raw: serde_json::Value,
}

impl ChatResponse {
    pub fn text_only(text: impl Into<String>, tokens_in: u32, tokens_out: u32) -> Self {
        Self {
            text: text.into(),
            tokens_in,
            tokens_out,
            tool_calls: Vec::new(),
            raw: serde_json::Value::Null,
        }
    }
}
