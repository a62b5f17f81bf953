// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Root configuration, merged from YAML layers then overridden by
/// environment variables for anything secret or deployment-specific.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub suites: SuitesConfig,
    #[serde(default)]
    pub sandbox: SandboxDefaults,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub codegen: CodegenConfig,
    #[serde(default)]
    pub toolbench: ToolBenchConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub fleet: FleetConfig,
}

/// Cron cadences for the three scheduler tickers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuitesConfig {
    /// Every 20 minutes at :00/:20/:40.
    pub hourly_cron: String,
    /// Daily at 03:00.
    pub deep_cron: String,
    /// Daily at 04:00.
    pub tooling_cron: String,
    /// Skip a (model, task) pair in the tool suite if a session exists
    /// within this many hours.
    pub tooling_recency_skip_hours: i64,
    /// Per-suite watchdog: kill a tick that runs longer than this.
    pub watchdog_secs: u64,
}

impl Default for SuitesConfig {
    fn default() -> Self {
        Self {
            hourly_cron: "0 0,20,40 * * * *".to_string(),
            deep_cron: "0 0 3 * * *".to_string(),
            tooling_cron: "0 0 4 * * *".to_string(),
            tooling_recency_skip_hours: 20,
            watchdog_secs: 3600,
        }
    }
}

/// Defaults applied to every sandbox unless a task overrides them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxDefaults {
    pub image: String,
    pub memory_limit_mb: u64,
    pub cpu_limit: f32,
    pub timeout_ms: u64,
    pub network_access: bool,
    /// Age after which `cleanup_expired` destroys an orphaned sandbox.
    pub max_age_secs: u64,
}

impl Default for SandboxDefaults {
    fn default() -> Self {
        Self {
            image: "python:3.11-slim".to_string(),
            memory_limit_mb: 512,
            cpu_limit: 1.0,
            timeout_ms: 30_000,
            network_access: false,
            max_age_secs: 3600,
        }
    }
}

/// Dashboard cache tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory for the file tier. `None` resolves via `METER_CACHE_DIR` or
    /// the platform cache dir at runtime.
    pub dir: Option<std::path::PathBuf>,
    pub ttl_secs: u64,
    pub schema_version: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { dir: None, ttl_secs: 300, schema_version: 1 }
    }
}

/// Code-gen suite tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    pub tasks_per_tick: usize,
    pub trials_per_task: usize,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
    /// Minimum token budget granted to reasoning-family models.
    pub reasoning_min_tokens: u32,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            tasks_per_tick: 7,
            trials_per_task: 3,
            jitter_min_ms: 200,
            jitter_max_ms: 400,
            reasoning_min_tokens: 8000,
        }
    }
}

/// Tool-calling suite tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolBenchConfig {
    /// Bounded worker-pool concurrency for a tool-suite tick.
    pub concurrency: usize,
}

impl Default for ToolBenchConfig {
    fn default() -> Self {
        Self { concurrency: 3 }
    }
}

/// Persistence layer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the sqlite database file. `None` uses an in-memory store
    /// (test default) or `METER_DB_PATH` if set.
    pub path: Option<std::path::PathBuf>,
    /// Maximum historical scores read for a baseline.
    pub baseline_window: usize,
    /// Minimum samples required to declare `hasBaseline = true`.
    #[serde(default = "default_baseline_min_samples")]
    pub baseline_min_samples: usize,
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

fn default_baseline_min_samples() -> usize {
    10
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            baseline_window: 50,
            baseline_min_samples: 10,
            wal_mode: true,
        }
    }
}

/// One benchmarked model entry. The fleet itself is configuration, not a
/// runtime discovery process — an operator adds a row here to start
/// tracking a model; the store records it on first score write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    pub vendor: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_true")]
    pub show_in_rankings: bool,
    #[serde(default)]
    pub supports_tool_calling: bool,
}

/// The fleet of models the scheduler iterates every tick, sharded by
/// vendor for code-gen parallelism.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub models: Vec<ModelEntry>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self { models: Vec::new() }
    }
}

impl FleetConfig {
    /// Models grouped by vendor, preserving first-seen vendor order — the
    /// shape the scheduler's per-vendor fan-out iterates over.
    pub fn by_vendor(&self) -> Vec<(String, Vec<&ModelEntry>)> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: std::collections::HashMap<String, Vec<&ModelEntry>> = std::collections::HashMap::new();
        for m in &self.models {
            if !groups.contains_key(&m.vendor) {
                order.push(m.vendor.clone());
            }
            groups.entry(m.vendor.clone()).or_default().push(m);
        }
        order.into_iter().map(|v| { let entries = groups.remove(&v).unwrap_or_default(); (v, entries) }).collect()
    }
}

#[cfg(test)]
mod fleet_tests {
    use super::*;

    #[test]
    fn by_vendor_groups_and_preserves_first_seen_order() {
        let fleet = FleetConfig {
            models: vec![
                ModelEntry { name: "gpt-4o".into(), vendor: "openai".into(), version: None, notes: None, show_in_rankings: true, supports_tool_calling: true },
                ModelEntry { name: "claude".into(), vendor: "anthropic".into(), version: None, notes: None, show_in_rankings: true, supports_tool_calling: true },
                ModelEntry { name: "gpt-4o-mini".into(), vendor: "openai".into(), version: None, notes: None, show_in_rankings: true, supports_tool_calling: false },
            ],
        };
        let groups = fleet.by_vendor();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "openai");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "anthropic");
    }
}
