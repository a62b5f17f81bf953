// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use async_trait::async_trait;

use meter_sandbox::SandboxManager;

use crate::types::{ToolCall, ToolOutput};

/// Trait every builtin executor implements. Unlike a general coding-agent
/// tool, every executor here operates exclusively against a sandbox
/// handle — there is no local-filesystem or host-process path; the
/// session holds only an id into the sandbox manager's map.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> serde_json::Value;

    async fn execute(&self, sandbox: &SandboxManager, sandbox_id: &str, call: &ToolCall) -> ToolOutput;
}
