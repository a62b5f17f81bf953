// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Pluggable process backend. The manager talks to this trait rather than
//! shelling out directly, so the state-machine and protocol logic can be
//! unit-tested without a real container runtime installed.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::types::SandboxError;

#[derive(Debug, Clone, Default)]
pub struct RawOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Run a host command (e.g. `docker run ...`) and wait for completion,
    /// killing it if `timeout` elapses.
    async fn run(&self, argv: &[String], timeout: Duration) -> Result<RawOutput, SandboxError>;

    /// Like `run`, but pipes `stdin_data` to the child's stdin before
    /// closing it. Used for the here-document file-write protocol.
    async fn run_with_stdin(
        &self,
        argv: &[String],
        stdin_data: &[u8],
        timeout: Duration,
    ) -> Result<RawOutput, SandboxError>;
}

/// Shells out to the `docker` CLI. Kept deliberately thin: one subprocess
/// per call, SIGKILL on timeout, no persistent connection to a daemon API.
pub struct DockerRuntime {
    pub binary: String,
}

impl Default for DockerRuntime {
    fn default() -> Self {
        Self { binary: "docker".to_string() }
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn run(&self, argv: &[String], timeout: Duration) -> Result<RawOutput, SandboxError> {
        run_command(&self.binary, argv, None, timeout).await
    }

    async fn run_with_stdin(
        &self,
        argv: &[String],
        stdin_data: &[u8],
        timeout: Duration,
    ) -> Result<RawOutput, SandboxError> {
        run_command(&self.binary, argv, Some(stdin_data), timeout).await
    }
}

async fn run_command(
    binary: &str,
    argv: &[String],
    stdin_data: Option<&[u8]>,
    timeout: Duration,
) -> Result<RawOutput, SandboxError> {
    let mut cmd = Command::new(binary);
    cmd.args(argv)
        .stdin(if stdin_data.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| SandboxError::Io(e.to_string()))?;

    if let Some(data) = stdin_data {
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(data)
                .await
                .map_err(|e| SandboxError::Io(e.to_string()))?;
            // Dropping closes the pipe so `cat`/shell readers see EOF.
        }
    }

    let output = tokio::time::timeout(timeout, child.wait_with_output()).await;
    match output {
        Ok(Ok(out)) => Ok(RawOutput {
            stdout: out.stdout,
            stderr: out.stderr,
            exit_code: out.status.code().unwrap_or(-1),
        }),
        Ok(Err(e)) => Err(SandboxError::ExecFailed(e.to_string())),
        Err(_) => Err(SandboxError::Timeout(timeout)),
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod fake {
    use super::*;
    use std::sync::Mutex;

    /// Records every invocation and returns canned outputs in order, so
    /// manager-level tests can assert protocol shape without a real
    /// container runtime.
    #[derive(Default)]
    pub struct FakeRuntime {
        pub calls: Mutex<Vec<Vec<String>>>,
        pub responses: Mutex<Vec<RawOutput>>,
    }

    impl FakeRuntime {
        pub fn with_responses(responses: Vec<RawOutput>) -> Self {
            Self { calls: Mutex::new(Vec::new()), responses: Mutex::new(responses) }
        }

        pub fn ok(stdout: &str) -> RawOutput {
            RawOutput { stdout: stdout.as_bytes().to_vec(), stderr: Vec::new(), exit_code: 0 }
        }
    }

    #[async_trait]
    impl ContainerRuntime for FakeRuntime {
        async fn run(&self, argv: &[String], _timeout: Duration) -> Result<RawOutput, SandboxError> {
            self.calls.lock().unwrap().push(argv.to_vec());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(RawOutput::default())
            } else {
                Ok(responses.remove(0))
            }
        }

        async fn run_with_stdin(
            &self,
            argv: &[String],
            _stdin_data: &[u8],
            _timeout: Duration,
        ) -> Result<RawOutput, SandboxError> {
            self.calls.lock().unwrap().push(argv.to_vec());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(RawOutput::default())
            } else {
                Ok(responses.remove(0))
            }
        }
    }
}
