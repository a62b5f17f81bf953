// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for one ephemeral sandbox.
///
/// Security defaults baked in by the manager regardless of what the caller
/// asks for: read-only root filesystem, dropped privileges, isolated
/// network unless `network_access = true`, bounded memory/CPU, writable
/// tmpfs at `working_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    pub image: String,
    pub working_dir: String,
    pub timeout_ms: u64,
    pub memory_limit_mb: u64,
    pub cpu_limit: f32,
    pub network_access: bool,
    pub mount_paths: Vec<String>,
    pub environment: HashMap<String, String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            image: "python:3.11-slim".to_string(),
            working_dir: "/workspace".to_string(),
            timeout_ms: 30_000,
            memory_limit_mb: 512,
            cpu_limit: 1.0,
            network_access: false,
            mount_paths: Vec::new(),
            environment: HashMap::new(),
        }
    }
}

impl SandboxConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Sandbox lifecycle state. `Error` is terminal; `destroy` is permitted
/// from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SandboxStatus {
    Creating,
    Running,
    Stopped,
    Error,
}

/// In-process record tracked by the sandbox manager's live map.
#[derive(Debug, Clone)]
pub struct SandboxRecord {
    pub id: String,
    pub status: SandboxStatus,
    pub working_dir: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub config: SandboxConfig,
}

/// Options for a single `exec` call, layered on top of the sandbox's own
/// timeout. Enforces a per-call timeout independent of the session
/// timeout.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    pub timeout_ms: Option<u64>,
    pub working_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("sandbox {0} is not running")]
    NotRunning(String),
    #[error("sandbox {0} not found")]
    NotFound(String),
    #[error("failed to create sandbox: {0}")]
    CreateFailed(String),
    #[error("failed to exec in sandbox: {0}")]
    ExecFailed(String),
    #[error("exec timed out after {0:?}")]
    Timeout(Duration),
    #[error("io error: {0}")]
    Io(String),
}
