// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use meter_model::ToolSchema;
use meter_sandbox::SandboxManager;

use crate::builtin::{ReadFileTool, RunCommandTool, WriteToFileTool};
use crate::tool::Tool;
use crate::types::{ToolCall, ToolOutput};

/// Per-call ceiling, regardless of executor: every tool call is capped at
/// 60 seconds.
pub const MAX_CALL_DURATION: Duration = Duration::from_secs(60);

/// Central registry of tool executors available to a tool-calling session.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        let mut registry = Self { tools: HashMap::new() };
        registry.register(WriteToFileTool);
        registry.register(ReadFileTool);
        registry.register(RunCommandTool);
        registry
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self
            .tools
            .values()
            .map(|t| ToolSchema {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Dispatch a call to its executor, with the 60 s ceiling enforced here
    /// so no individual tool needs to remember to apply it.
    pub async fn execute(&self, sandbox: &SandboxManager, sandbox_id: &str, call: &ToolCall) -> ToolOutput {
        let Some(tool) = self.get(&call.name) else {
            return ToolOutput::err(&call.id, format!("unknown tool: {}", call.name));
        };
        match tokio::time::timeout(MAX_CALL_DURATION, tool.execute(sandbox, sandbox_id, call)).await {
            Ok(output) => output,
            Err(_) => ToolOutput::err(&call.id, format!("tool '{}' timed out after 60s", call.name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_the_three_builtins() {
        let registry = ToolRegistry::default();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.names(), vec!["read_file", "run_command", "write_to_file"]);
    }

    #[test]
    fn schemas_are_sorted_by_name() {
        let registry = ToolRegistry::default();
        let names: Vec<String> = registry.schemas().into_iter().map(|s| s.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[tokio::test]
    async fn execute_unknown_tool_returns_error() {
        let registry = ToolRegistry::new();
        let fake = std::sync::Arc::new(meter_sandbox::fake::FakeRuntime::with_responses(vec![]));
        let mgr = SandboxManager::new(fake);
        let call = ToolCall { id: "1".into(), name: "nope".into(), args: serde_json::json!({}) };
        let out = registry.execute(&mgr, "sandbox-1", &call).await;
        assert!(out.is_error);
    }
}
