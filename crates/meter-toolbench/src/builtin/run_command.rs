// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use async_trait::async_trait;
use serde_json::{json, Value};

use meter_sandbox::{ExecOptions, SandboxManager};

use crate::safety;
use crate::tool::Tool;
use crate::types::{ToolCall, ToolOutput};

pub struct RunCommandTool;

#[async_trait]
impl Tool for RunCommandTool {
    fn name(&self) -> &str {
        "run_command"
    }

    fn description(&self) -> &str {
        "Runs a shell command inside the sandbox's working directory and returns its \
         combined stdout/exit code."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {"type": "string", "description": "Shell command to run"}
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, sandbox: &SandboxManager, sandbox_id: &str, call: &ToolCall) -> ToolOutput {
        let Some(command) = call.args.get("command").and_then(|v| v.as_str()) else {
            return ToolOutput::err(&call.id, "missing required parameter 'command'");
        };

        for token in command.split_whitespace() {
            if token.starts_with('/') {
                if let Err(reason) = safety::check_path(token) {
                    return ToolOutput::refused(&call.id, reason);
                }
            }
        }

        let argv = vec!["sh".to_string(), "-c".to_string(), command.to_string()];
        match sandbox.exec(sandbox_id, &argv, ExecOptions::default()).await {
            Ok(result) if result.success() => {
                ToolOutput::ok(&call.id, format!("exit 0\n{}", result.stdout))
            }
            Ok(result) => ToolOutput::err(
                &call.id,
                format!("exit {}\nstdout: {}\nstderr: {}", result.exit_code, result.stdout, result.stderr),
            ),
            Err(e) => ToolOutput::err(&call.id, format!("exec failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meter_sandbox::fake::FakeRuntime;
    use meter_sandbox::SandboxConfig;
    use std::sync::Arc;

    #[tokio::test]
    async fn refuses_denied_path_argument() {
        let fake = Arc::new(FakeRuntime::with_responses(vec![FakeRuntime::ok("")]));
        let mgr = SandboxManager::new(fake);
        let id = mgr.create(SandboxConfig::default()).await.unwrap();
        let call = ToolCall {
            id: "1".into(),
            name: "run_command".into(),
            args: json!({"command": "cat /etc/passwd"}),
        };
        let out = RunCommandTool.execute(&mgr, &id, &call).await;
        assert!(out.refused_unsafe);
    }

    #[tokio::test]
    async fn runs_ordinary_command() {
        let fake = Arc::new(FakeRuntime::with_responses(vec![FakeRuntime::ok(""), FakeRuntime::ok("2\n")]));
        let mgr = SandboxManager::new(fake);
        let id = mgr.create(SandboxConfig::default()).await.unwrap();
        let call = ToolCall {
            id: "1".into(),
            name: "run_command".into(),
            args: json!({"command": "grep -c ERROR app.log"}),
        };
        let out = RunCommandTool.execute(&mgr, &id, &call).await;
        assert!(!out.is_error);
        assert!(out.content.contains('2'));
    }
}
