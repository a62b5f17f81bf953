// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::runtime::ContainerRuntime;
use crate::types::{
    ExecOptions, ExecResult, SandboxConfig, SandboxError, SandboxRecord, SandboxStatus,
};

/// Creates, execs in, and destroys ephemeral isolated containers.
///
/// Owns the in-memory map of live sandboxes. Mutations (create, destroy,
/// cleanup) are serialized: the map lock is held only for the bookkeeping
/// step, never across the subprocess call itself, so sandboxes can be
/// created/destroyed concurrently.
pub struct SandboxManager {
    runtime: Arc<dyn ContainerRuntime>,
    sandboxes: Mutex<HashMap<String, SandboxRecord>>,
}

impl SandboxManager {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime, sandboxes: Mutex::new(HashMap::new()) }
    }

    pub fn docker(binary: impl Into<String>) -> Self {
        Self::new(Arc::new(crate::runtime::DockerRuntime { binary: binary.into() }))
    }

    /// Create and start a sandbox, returning its id.
    pub async fn create(&self, config: SandboxConfig) -> Result<String, SandboxError> {
        let id = format!("meter-{}", uuid::Uuid::new_v4());
        {
            let mut map = self.sandboxes.lock().await;
            map.insert(
                id.clone(),
                SandboxRecord {
                    id: id.clone(),
                    status: SandboxStatus::Creating,
                    working_dir: config.working_dir.clone(),
                    created_at: chrono::Utc::now(),
                    config: config.clone(),
                },
            );
        }

        let argv = build_run_argv(&id, &config);
        let result = self.runtime.run(&argv, config.timeout()).await;

        let mut map = self.sandboxes.lock().await;
        match result {
            Ok(out) if out.exit_code == 0 => {
                if let Some(rec) = map.get_mut(&id) {
                    rec.status = SandboxStatus::Running;
                }
                debug!(sandbox = %id, image = %config.image, "sandbox running");
                Ok(id)
            }
            Ok(out) => {
                if let Some(rec) = map.get_mut(&id) {
                    rec.status = SandboxStatus::Error;
                }
                Err(SandboxError::CreateFailed(String::from_utf8_lossy(&out.stderr).to_string()))
            }
            Err(e) => {
                if let Some(rec) = map.get_mut(&id) {
                    rec.status = SandboxStatus::Error;
                }
                Err(SandboxError::CreateFailed(e.to_string()))
            }
        }
    }

    async fn running_config(&self, id: &str) -> Result<SandboxConfig, SandboxError> {
        let map = self.sandboxes.lock().await;
        match map.get(id) {
            Some(rec) if rec.status == SandboxStatus::Running => Ok(rec.config.clone()),
            Some(_) => Err(SandboxError::NotRunning(id.to_string())),
            None => Err(SandboxError::NotFound(id.to_string())),
        }
    }

    /// Execute a command inside a running sandbox. The per-call timeout
    /// defaults to the sandbox's own timeout but may be overridden
    /// independently.
    pub async fn exec(
        &self,
        id: &str,
        argv: &[String],
        opts: ExecOptions,
    ) -> Result<ExecResult, SandboxError> {
        let config = self.running_config(id).await?;
        let timeout = Duration::from_millis(opts.timeout_ms.unwrap_or(config.timeout_ms));
        let workdir = opts.working_dir.as_deref().unwrap_or(&config.working_dir);

        let mut full_argv = vec!["exec".to_string(), "-w".to_string(), workdir.to_string()];
        full_argv.push(id.to_string());
        full_argv.extend(argv.iter().cloned());

        let out = self.runtime.run(&full_argv, timeout).await?;
        Ok(ExecResult {
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
            exit_code: out.exit_code,
        })
    }

    /// Write `content` verbatim via a here-document, avoiding any need to
    /// shell-escape the content itself.
    pub async fn write_file(
        &self,
        id: &str,
        path: &str,
        content: &str,
    ) -> Result<(), SandboxError> {
        let config = self.running_config(id).await?;
        let delim = unique_delimiter(content);
        let script = format!("cat > '{path}' <<'{delim}'\n");
        let mut stdin_data = script.into_bytes();
        stdin_data.extend_from_slice(content.as_bytes());
        if !content.ends_with('\n') {
            stdin_data.push(b'\n');
        }
        stdin_data.extend_from_slice(delim.as_bytes());
        stdin_data.push(b'\n');

        let argv = vec![
            "exec".to_string(),
            "-i".to_string(),
            id.to_string(),
            "sh".to_string(),
        ];
        let out = self
            .runtime
            .run_with_stdin(&argv, &stdin_data, config.timeout())
            .await?;
        if out.exit_code != 0 {
            return Err(SandboxError::ExecFailed(String::from_utf8_lossy(&out.stderr).to_string()));
        }
        Ok(())
    }

    /// Stream file content back via a `cat` exec; never a host bind-mount
    /// copy.
    pub async fn read_file(&self, id: &str, path: &str) -> Result<String, SandboxError> {
        let result = self.exec(id, &["cat".to_string(), path.to_string()], ExecOptions::default()).await?;
        if !result.success() {
            return Err(SandboxError::ExecFailed(result.stderr));
        }
        Ok(result.stdout)
    }

    /// Idempotent: succeeds even if the sandbox is already gone.
    pub async fn destroy(&self, id: &str) -> Result<(), SandboxError> {
        let argv = vec!["rm".to_string(), "-f".to_string(), id.to_string()];
        // Ignore the subprocess result entirely — removal of an
        // already-gone container is success by definition.
        let _ = self.runtime.run(&argv, Duration::from_secs(10)).await;
        let mut map = self.sandboxes.lock().await;
        if let Some(rec) = map.get_mut(id) {
            rec.status = SandboxStatus::Stopped;
        }
        Ok(())
    }

    /// Guardrail sweep: destroy every sandbox older than its configured
    /// `max_age`, regardless of status.
    pub async fn cleanup_expired(&self, max_age: Duration) -> usize {
        let now = chrono::Utc::now();
        let stale: Vec<String> = {
            let map = self.sandboxes.lock().await;
            map.values()
                .filter(|rec| {
                    rec.status != SandboxStatus::Stopped
                        && now.signed_duration_since(rec.created_at).num_seconds()
                            > max_age.as_secs() as i64
                })
                .map(|rec| rec.id.clone())
                .collect()
        };
        for id in &stale {
            if let Err(e) = self.destroy(id).await {
                warn!(sandbox = %id, error = %e, "cleanup_expired destroy failed");
            }
        }
        stale.len()
    }

    pub async fn status(&self, id: &str) -> Option<SandboxStatus> {
        self.sandboxes.lock().await.get(id).map(|r| r.status)
    }

    pub async fn live_count(&self) -> usize {
        self.sandboxes
            .lock()
            .await
            .values()
            .filter(|r| r.status == SandboxStatus::Running)
            .count()
    }
}

fn build_run_argv(id: &str, config: &SandboxConfig) -> Vec<String> {
    let mut argv = vec![
        "run".to_string(),
        "-d".to_string(),
        "--name".to_string(),
        id.to_string(),
        "--workdir".to_string(),
        config.working_dir.clone(),
        "--memory".to_string(),
        format!("{}m", config.memory_limit_mb),
        "--cpus".to_string(),
        format!("{}", config.cpu_limit),
        "--read-only".to_string(),
        "--tmpfs".to_string(),
        format!("{}:rw", config.working_dir),
        "--cap-drop".to_string(),
        "ALL".to_string(),
        "--security-opt".to_string(),
        "no-new-privileges".to_string(),
    ];

    if !config.network_access {
        argv.push("--network".to_string());
        argv.push("none".to_string());
    }

    for (k, v) in &config.environment {
        argv.push("-e".to_string());
        argv.push(format!("{k}={v}"));
    }

    for mount in &config.mount_paths {
        argv.push("-v".to_string());
        argv.push(format!("{mount}:{mount}:ro"));
    }

    argv.push(config.image.clone());
    argv.push("sleep".to_string());
    argv.push("infinity".to_string());
    argv
}

/// Pick a here-doc delimiter guaranteed not to appear as a line in `content`.
fn unique_delimiter(content: &str) -> String {
    loop {
        let suffix: u64 = rand::thread_rng().gen();
        let candidate = format!("METER_EOF_{suffix:016x}");
        if !content.lines().any(|l| l == candidate) {
            return candidate;
        }
    }
}
