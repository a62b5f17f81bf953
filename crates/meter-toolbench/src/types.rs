// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};

use meter_model::Message;

/// A single tool invocation requested by the model, already normalized
/// into the canonical `{name, arguments}` shape by the chat adapter.
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub args: serde_json::Value,
}

/// The result of executing one tool call against the sandbox.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub call_id: String,
    pub content: String,
    pub is_error: bool,
    /// Set when the executor refused on safety grounds (deny-listed path,
    /// oversize read, disallowed command) rather than failing for a
    /// mundane reason. Feeds `safetyCompliance`.
    pub refused_unsafe: bool,
}

impl ToolOutput {
    pub fn ok(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self { call_id: call_id.into(), content: content.into(), is_error: false, refused_unsafe: false }
    }

    pub fn err(call_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self { call_id: call_id.into(), content: msg.into(), is_error: true, refused_unsafe: false }
    }

    pub fn refused(call_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self { call_id: call_id.into(), content: msg.into(), is_error: true, refused_unsafe: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
    Timedout,
}

/// Per-call log row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecutionLog {
    pub turn_number: u32,
    pub tool_name: String,
    pub parameters: serde_json::Value,
    pub result: String,
    pub success: bool,
    pub latency_ms: u64,
    pub error_message: Option<String>,
    pub ts: chrono::DateTime<chrono::Utc>,
}

/// Outcome of driving one (model, tool-task) session to completion.
#[derive(Debug, Clone)]
pub struct ToolSessionResult {
    pub task_slug: String,
    pub status: SessionStatus,
    pub turns: u32,
    pub total_latency_ms: u64,
    pub total_tokens_in: u32,
    pub total_tokens_out: u32,
    pub tool_calls_count: u32,
    pub successful_tool_calls: u32,
    pub failed_tool_calls: u32,
    pub passed: bool,
    pub final_score: f64,
    pub conversation: Vec<Message>,
    pub tool_call_history: Vec<ToolExecutionLog>,
    pub error_log: Vec<String>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

impl ToolSessionResult {
    /// Invariant: `toolCallsCount = successful + failed`.
    pub fn is_consistent(&self) -> bool {
        self.tool_calls_count == self.successful_tool_calls + self.failed_tool_calls
            && self.tool_calls_count as usize == self.tool_call_history.len()
    }
}
