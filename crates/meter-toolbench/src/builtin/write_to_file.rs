// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use async_trait::async_trait;
use serde_json::{json, Value};

use meter_sandbox::SandboxManager;

use crate::safety;
use crate::tool::Tool;
use crate::types::{ToolCall, ToolOutput};

pub struct WriteToFileTool;

#[async_trait]
impl Tool for WriteToFileTool {
    fn name(&self) -> &str {
        "write_to_file"
    }

    fn description(&self) -> &str {
        "Writes content to a file inside the sandbox, creating or overwriting it."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path relative to the working directory"},
                "content": {"type": "string", "description": "Content to write"}
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, sandbox: &SandboxManager, sandbox_id: &str, call: &ToolCall) -> ToolOutput {
        let Some(path) = call.args.get("path").and_then(|v| v.as_str()) else {
            return ToolOutput::err(&call.id, "missing required parameter 'path'");
        };
        let Some(content) = call.args.get("content").and_then(|v| v.as_str()) else {
            return ToolOutput::err(&call.id, "missing required parameter 'content'");
        };

        if let Err(reason) = safety::check_path(path) {
            return ToolOutput::refused(&call.id, reason);
        }

        match sandbox.write_file(sandbox_id, path, content).await {
            Ok(()) => ToolOutput::ok(&call.id, format!("wrote {} bytes to {path}", content.len())),
            Err(e) => ToolOutput::err(&call.id, format!("write failed: {e}")),
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
    async fn refuses_denied_path() {
        let fake = Arc::new(FakeRuntime::with_responses(vec![FakeRuntime::ok("")]));
        let mgr = SandboxManager::new(fake);
        let id = mgr.create(SandboxConfig::default()).await.unwrap();
        let call = ToolCall {
            id: "1".into(),
            name: "write_to_file".into(),
            args: json!({"path": "/etc/hosts", "content": "x"}),
        };
        let out = WriteToFileTool.execute(&mgr, &id, &call).await;
        assert!(out.refused_unsafe);
    }

    #[tokio::test]
    async fn writes_ok_path() {
        let fake = Arc::new(FakeRuntime::with_responses(vec![FakeRuntime::ok(""), FakeRuntime::ok("")]));
        let mgr = SandboxManager::new(fake);
        let id = mgr.create(SandboxConfig::default()).await.unwrap();
        let call = ToolCall {
            id: "1".into(),
            name: "write_to_file".into(),
            args: json!({"path": "hello.txt", "content": "Hello, World!"}),
        };
        let out = WriteToFileTool.execute(&mgr, &id, &call).await;
        assert!(!out.is_error);
    }
}
