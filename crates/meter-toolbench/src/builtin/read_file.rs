// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use async_trait::async_trait;
use serde_json::{json, Value};

use meter_sandbox::SandboxManager;

use crate::safety;
use crate::tool::Tool;
use crate::types::{ToolCall, ToolOutput};

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Reads and returns the content of a file inside the sandbox."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path relative to the working directory"}
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, sandbox: &SandboxManager, sandbox_id: &str, call: &ToolCall) -> ToolOutput {
        let Some(path) = call.args.get("path").and_then(|v| v.as_str()) else {
            return ToolOutput::err(&call.id, "missing required parameter 'path'");
        };

        if let Err(reason) = safety::check_path(path) {
            return ToolOutput::refused(&call.id, reason);
        }

        match sandbox.read_file(sandbox_id, path).await {
            Ok(content) => match safety::check_read_size(&content) {
                Ok(()) => ToolOutput::ok(&call.id, content),
                Err(reason) => ToolOutput::refused(&call.id, reason),
            },
            Err(e) => ToolOutput::err(&call.id, format!("read failed: {e}")),
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
    async fn refuses_sensitive_path() {
        let fake = Arc::new(FakeRuntime::with_responses(vec![FakeRuntime::ok("")]));
        let mgr = SandboxManager::new(fake);
        let id = mgr.create(SandboxConfig::default()).await.unwrap();
        let call = ToolCall { id: "1".into(), name: "read_file".into(), args: json!({"path": "/etc/passwd"}) };
        let out = ReadFileTool.execute(&mgr, &id, &call).await;
        assert!(out.refused_unsafe);
    }

    #[tokio::test]
    async fn returns_file_content() {
        let fake = Arc::new(FakeRuntime::with_responses(vec![
            FakeRuntime::ok(""),
            FakeRuntime::ok("Hello, World!"),
        ]));
        let mgr = SandboxManager::new(fake);
        let id = mgr.create(SandboxConfig::default()).await.unwrap();
        let call = ToolCall { id: "1".into(), name: "read_file".into(), args: json!({"path": "hello.txt"}) };
        let out = ReadFileTool.execute(&mgr, &id, &call).await;
        assert!(!out.is_error);
        assert_eq!(out.content, "Hello, World!");
    }

    #[tokio::test]
    async fn refuses_oversize_read() {
        let big = "x".repeat(safety::MAX_READ_BYTES + 1);
        let fake = Arc::new(FakeRuntime::with_responses(vec![FakeRuntime::ok(""), FakeRuntime::ok(&big)]));
        let mgr = SandboxManager::new(fake);
        let id = mgr.create(SandboxConfig::default()).await.unwrap();
        let call = ToolCall { id: "1".into(), name: "read_file".into(), args: json!({"path": "big.bin"}) };
        let out = ReadFileTool.execute(&mgr, &id, &call).await;
        assert!(out.refused_unsafe);
    }
}
