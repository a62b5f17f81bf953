// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Drives one (model, tool-task) pair end to end. The turn loop is a
//! plain cooperative loop with a deadline — no nested task spawning.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{info, warn};

use meter_model::{ChatAdapter, ChatRequest, ChatResponse, Message, ToolChoice};
use meter_sandbox::{SandboxConfig, SandboxManager};
use meter_tasks::ToolTask;

use crate::metrics::{self, MetricsInput, ToolMetrics};
use crate::registry::ToolRegistry;
use crate::success;
use crate::types::{SessionStatus, ToolCall, ToolExecutionLog, ToolSessionResult};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("adapter error: {0}")]
    Adapter(#[from] meter_model::AdapterError),
    #[error("sandbox error: {0}")]
    Sandbox(#[from] meter_sandbox::SandboxError),
}

pub struct ToolSessionEngine {
    registry: Arc<ToolRegistry>,
    sandbox: Arc<SandboxManager>,
}

impl ToolSessionEngine {
    pub fn new(registry: Arc<ToolRegistry>, sandbox: Arc<SandboxManager>) -> Self {
        Self { registry, sandbox }
    }

    pub async fn run(
        &self,
        adapter: &dyn ChatAdapter,
        model: &str,
        task: &ToolTask,
    ) -> Result<ToolSessionResult, SessionError> {
        let deadline = Instant::now() + Duration::from_millis(task.timeout_ms);

        let sandbox_config = SandboxConfig { timeout_ms: task.timeout_ms, ..task.sandbox_config.clone() };
        let sandbox_id = match self.sandbox.create(sandbox_config).await {
            Ok(id) => id,
            Err(e) => {
                return Ok(failed_result(task, SessionStatus::Failed, vec![e.to_string()]));
            }
        };

        let result = self.run_inner(adapter, model, task, &sandbox_id, deadline).await;

        // Every exit path destroys the sandbox before the session is
        // finalized.
        if let Err(e) = self.sandbox.destroy(&sandbox_id).await {
            warn!(sandbox = %sandbox_id, error = %e, "destroy failed during session teardown");
        }

        result
    }

    async fn run_inner(
        &self,
        adapter: &dyn ChatAdapter,
        model: &str,
        task: &ToolTask,
        sandbox_id: &str,
        deadline: Instant,
    ) -> Result<ToolSessionResult, SessionError> {
        for file in &task.initial_files {
            self.sandbox.write_file(sandbox_id, &file.path, &file.content).await?;
        }

        let mut messages = vec![Message::system(&task.system_prompt), Message::user(&task.initial_message)];
        let tool_schemas = self.registry.schemas();

        let mut current_turn: u32 = 0;
        let mut total_latency_ms: u64 = 0;
        let mut total_tokens_in: u32 = 0;
        let mut total_tokens_out: u32 = 0;
        let mut history: Vec<ToolExecutionLog> = Vec::new();
        let mut calls_by_turn: Vec<Vec<ToolCall>> = Vec::new();
        let mut dangerous_calls: u32 = 0;
        let mut error_log: Vec<String> = Vec::new();
        let mut passed = false;

        let status = 'turns: loop {
            if current_turn >= task.max_turns {
                break 'turns SessionStatus::Failed;
            }
            if Instant::now() >= deadline {
                break 'turns SessionStatus::Timedout;
            }
            current_turn += 1;

            let req = ChatRequest {
                model: model.to_string(),
                messages: messages.clone(),
                temperature: 0.2,
                max_tokens: 2000,
                tools: Some(tool_schemas.clone()),
                tool_choice: Some(ToolChoice::Auto),
                reasoning_effort: None,
            };

            let started = Instant::now();
            let resp: ChatResponse = match adapter.chat(req).await {
                Ok(resp) => resp,
                Err(e) => {
                    error_log.push(e.to_string());
                    // CreditExhausted propagates so the caller (scheduler)
                    // can synthesize a non-sentinel marker.
                    if matches!(e, meter_model::AdapterError::CreditExhausted) {
                        return Err(e.into());
                    }
                    break 'turns SessionStatus::Failed;
                }
            };
            total_latency_ms += started.elapsed().as_millis() as u64;
            total_tokens_in += resp.tokens_in;
            total_tokens_out += resp.tokens_out;

            if !resp.text.trim().is_empty() {
                messages.push(Message::assistant(&resp.text));
            }

            if resp.tool_calls.is_empty() {
                break 'turns SessionStatus::Completed;
            }

            let mut turn_calls = Vec::new();
            let mut summary = String::new();
            for tc in &resp.tool_calls {
                let args: Value = serde_json::from_str(&tc.arguments).unwrap_or(Value::Null);
                let call = ToolCall { id: format!("{}-{}", current_turn, history.len()), name: tc.name.clone(), args };

                let call_started = Instant::now();
                let output = self.registry.execute(&self.sandbox, sandbox_id, &call).await;
                let latency_ms = call_started.elapsed().as_millis() as u64;

                if output.refused_unsafe {
                    dangerous_calls += 1;
                }
                history.push(ToolExecutionLog {
                    turn_number: current_turn,
                    tool_name: call.name.clone(),
                    parameters: call.args.clone(),
                    result: output.content.clone(),
                    success: !output.is_error,
                    latency_ms,
                    error_message: if output.is_error { Some(output.content.clone()) } else { None },
                    ts: chrono::Utc::now(),
                });

                summary.push_str(&format!("[{}] {}\n", call.name, output.content));
                turn_calls.push(call);
            }
            calls_by_turn.push(turn_calls);
            messages.push(Message::user(format!("Tool results:\n{summary}")));

            if success::check(&self.sandbox, sandbox_id, &task.success_criteria).await {
                passed = true;
                break 'turns SessionStatus::Completed;
            }
        };

        if status == SessionStatus::Completed && !passed {
            passed = success::check(&self.sandbox, sandbox_id, &task.success_criteria).await;
        }

        let successful = history.iter().filter(|h| h.success).count() as u32;
        let failed = history.iter().filter(|h| !h.success).count() as u32;

        let metrics_input = MetricsInput {
            expected_tools: &task.expected_tools,
            history: &history,
            calls_by_turn: &calls_by_turn,
            messages: &messages,
            passed,
            max_turns: task.max_turns,
            current_turn,
            registry_size: self.registry.len(),
            dangerous_calls,
        };
        let metrics: ToolMetrics = metrics::compute(&metrics_input);
        let final_score = metrics::stupid_score(&metrics);

        info!(task = %task.slug, model = %model, turns = current_turn, passed, final_score, "tool session finished");

        Ok(ToolSessionResult {
            task_slug: task.slug.clone(),
            status,
            turns: current_turn,
            total_latency_ms,
            total_tokens_in,
            total_tokens_out,
            tool_calls_count: successful + failed,
            successful_tool_calls: successful,
            failed_tool_calls: failed,
            passed,
            final_score,
            conversation: messages,
            tool_call_history: history,
            error_log,
            completed_at: chrono::Utc::now(),
        })
    }
}

fn failed_result(task: &ToolTask, status: SessionStatus, error_log: Vec<String>) -> ToolSessionResult {
    ToolSessionResult {
        task_slug: task.slug.clone(),
        status,
        turns: 0,
        total_latency_ms: 0,
        total_tokens_in: 0,
        total_tokens_out: 0,
        tool_calls_count: 0,
        successful_tool_calls: 0,
        failed_tool_calls: 0,
        passed: false,
        final_score: 0.0,
        conversation: vec![],
        tool_call_history: vec![],
        error_log,
        completed_at: chrono::Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meter_model::{Script, ScriptedError, ScriptedMockAdapter};
    use meter_model::ToolCallRequest;
    use meter_sandbox::fake::FakeRuntime;
    use meter_tasks::tool_task_by_slug;

    fn engine_with(responses: Vec<meter_sandbox::RawOutput>) -> ToolSessionEngine {
        let fake = Arc::new(FakeRuntime::with_responses(responses));
        let sandbox = Arc::new(SandboxManager::new(fake));
        let registry = Arc::new(ToolRegistry::default());
        ToolSessionEngine::new(registry, sandbox)
    }

    #[tokio::test]
    async fn scenario_s3_file_operations_easy_succeeds() {
        let task = tool_task_by_slug("file_operations_easy").unwrap();
        // create, write_to_file exec, read_file exec (success check), read_file exec again
        let engine = engine_with(vec![
            FakeRuntime::ok(""),                  // create
            FakeRuntime::ok(""),                  // write_to_file
            FakeRuntime::ok("Hello, World!"),     // read_file tool call
            FakeRuntime::ok("Hello, World!"),     // success::check read
            FakeRuntime::ok(""),                  // destroy
        ]);
        let adapter = ScriptedMockAdapter::new(
            "mock",
            vec![
                Script::ToolCalls(vec![
                    ToolCallRequest {
                        name: "write_to_file".to_string(),
                        arguments: serde_json::json!({"path": "hello.txt", "content": "Hello, World!"}).to_string(),
                    },
                    ToolCallRequest {
                        name: "read_file".to_string(),
                        arguments: serde_json::json!({"path": "hello.txt"}).to_string(),
                    },
                ]),
                Script::Text("Done.".to_string()),
            ],
        );

        let result = engine.run(&adapter, "mock-model", task).await.unwrap();
        assert!(result.passed);
        assert_eq!(result.status, SessionStatus::Completed);
        assert!(result.is_consistent());
        assert!(result.final_score >= 90.0);
    }

    #[tokio::test]
    async fn no_tool_calls_ends_session_immediately() {
        let task = tool_task_by_slug("file_operations_easy").unwrap();
        let engine = engine_with(vec![FakeRuntime::ok(""), FakeRuntime::ok("")]);
        let adapter = ScriptedMockAdapter::always_text("mock", "I refuse to do anything.");
        let result = engine.run(&adapter, "mock-model", task).await.unwrap();
        assert_eq!(result.status, SessionStatus::Completed);
        assert!(!result.passed);
        assert_eq!(result.tool_calls_count, 0);
    }

    #[tokio::test]
    async fn max_turns_exhausted_marks_failed() {
        let task = tool_task_by_slug("file_operations_easy").unwrap();
        let mut responses = vec![FakeRuntime::ok("")];
        for _ in 0..task.max_turns {
            responses.push(FakeRuntime::ok("not yet"));
        }
        responses.push(FakeRuntime::ok(""));
        let engine = engine_with(responses);
        let scripts = (0..task.max_turns)
            .map(|_| {
                Script::ToolCalls(vec![ToolCallRequest {
                    name: "read_file".to_string(),
                    arguments: serde_json::json!({"path": "hello.txt"}).to_string(),
                }])
            })
            .collect();
        let adapter = ScriptedMockAdapter::new("mock", scripts);
        let result = engine.run(&adapter, "mock-model", task).await.unwrap();
        assert_eq!(result.status, SessionStatus::Failed);
        assert!(!result.passed);
    }

    #[tokio::test]
    async fn credit_exhausted_propagates() {
        let task = tool_task_by_slug("file_operations_easy").unwrap();
        let engine = engine_with(vec![FakeRuntime::ok(""), FakeRuntime::ok("")]);
        let adapter = ScriptedMockAdapter::new("mock", vec![Script::Error(ScriptedError::CreditExhausted)]);
        let err = engine.run(&adapter, "mock-model", task).await.unwrap_err();
        assert!(matches!(err, SessionError::Adapter(meter_model::AdapterError::CreditExhausted)));
    }
}
