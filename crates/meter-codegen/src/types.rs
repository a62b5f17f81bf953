// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use meter_scoring::{AxisMetrics, StupidScore, Suite};

#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("adapter error: {0}")]
    Adapter(#[from] meter_model::AdapterError),
    #[error("sandbox error: {0}")]
    Sandbox(#[from] meter_sandbox::SandboxError),
}

/// One (task, trial) attempt, win or lose. `metrics` is `None` when the
/// model never produced a usable response after all local retries.
#[derive(Debug, Clone)]
pub struct TrialRecord {
    pub trial_number: u32,
    pub ts: DateTime<Utc>,
    pub attempts: u32,
    pub tokens_in: u32,
    pub tokens_out: u32,
    pub latency_ms: u64,
    pub code: Option<String>,
    pub artifact_hash: Option<String>,
    pub metrics: Option<AxisMetrics>,
}

impl TrialRecord {
    pub fn succeeded(&self) -> bool {
        self.metrics.is_some()
    }
}

/// All trials run for one task, collapsed to a single axis vector via
/// per-axis median across the successful trials.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub task_slug: String,
    pub trials: Vec<TrialRecord>,
    pub collapsed: Option<AxisMetrics>,
}

impl TaskOutcome {
    pub fn succeeded(&self) -> bool {
        self.collapsed.is_some()
    }
}

/// The outcome of one model's tick of a code-gen suite.
#[derive(Debug, Clone)]
pub struct CodegenSuiteResult {
    pub model: String,
    pub vendor: String,
    pub suite: Suite,
    pub stupid_score: StupidScore,
    pub axes: AxisMetrics,
    pub note: Option<String>,
    pub tasks: Vec<TaskOutcome>,
}
