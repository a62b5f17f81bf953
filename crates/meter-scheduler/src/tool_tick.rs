// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! One tool-calling suite tick: recency skip per (model, task), drained
//! through a bounded worker pool.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use meter_config::{FleetConfig, ToolBenchConfig};
use meter_model::AdapterError;
use meter_sandbox::SandboxManager;
use meter_store::Store;
use meter_tasks::{ToolTask, TOOL_TASKS};
use meter_toolbench::{SessionStatus, SessionError, ToolRegistry, ToolSessionEngine, ToolSessionResult};

use crate::adapters::AdapterFactory;

pub async fn run_tool_tick(
    fleet: &FleetConfig,
    config: &ToolBenchConfig,
    recency_skip_hours: i64,
    sandbox: Arc<SandboxManager>,
    store: Arc<Store>,
    adapters: Arc<dyn AdapterFactory>,
) {
    let registry = Arc::new(ToolRegistry::default());
    let engine = Arc::new(ToolSessionEngine::new(registry, sandbox));
    let semaphore = Arc::new(tokio::sync::Semaphore::new(config.concurrency.max(1)));

    let mut handles = Vec::new();
    for model in fleet.models.iter().filter(|m| m.supports_tool_calling) {
        let api_key_present = meter_config::api_key(&model.vendor).is_some();
        if !api_key_present {
            info!(model = %model.name, "skipping tool suite, no API key configured");
            continue;
        }

        for task in TOOL_TASKS.iter() {
            let last_run = store.last_tool_session_at(&model.name, &task.slug).await.unwrap_or(None);
            if let Some(last_run) = last_run {
                let age_hours = Utc::now().signed_duration_since(last_run).num_hours();
                if age_hours < recency_skip_hours {
                    continue;
                }
            }

            let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
            let engine = engine.clone();
            let store = store.clone();
            let adapters = adapters.clone();
            let model_name = model.name.clone();
            let vendor = model.vendor.clone();
            let task = task.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let adapter = adapters.build(&vendor);
                match engine.run(adapter.as_ref(), &model_name, &task).await {
                    Ok(result) => {
                        if let Err(e) = store.record_tool_session(&model_name, &vendor, &result).await {
                            warn!(model = %model_name, error = %e, "failed to persist tool session");
                        }
                        info!(model = %model_name, task = %task.slug, passed = result.passed, "tool session complete");
                    }
                    Err(e) => {
                        warn!(model = %model_name, task = %task.slug, error = %e, "tool session failed");
                        let marker = credit_exhausted_marker(&task, &e);
                        if let Err(store_err) = store.record_tool_session(&model_name, &vendor, &marker).await {
                            warn!(model = %model_name, error = %store_err, "failed to persist failed tool session");
                        }
                    }
                }
            }));
        }
    }

    for handle in handles {
        if let Err(e) = handle.await {
            warn!(error = %e, "tool session worker panicked");
        }
    }
}

/// Builds a zero-activity failed session row so a credit-exhausted (or any
/// other pre-turn) adapter error still leaves a trace in the session
/// history instead of only a log line.
fn credit_exhausted_marker(task: &ToolTask, error: &SessionError) -> ToolSessionResult {
    let note = if matches!(error, SessionError::Adapter(AdapterError::CreditExhausted)) {
        "credit exhausted".to_string()
    } else {
        error.to_string()
    };
    ToolSessionResult {
        task_slug: task.slug.clone(),
        status: SessionStatus::Failed,
        turns: 0,
        total_latency_ms: 0,
        total_tokens_in: 0,
        total_tokens_out: 0,
        tool_calls_count: 0,
        successful_tool_calls: 0,
        failed_tool_calls: 0,
        passed: false,
        final_score: 0.0,
        conversation: vec![],
        tool_call_history: vec![],
        error_log: vec![note],
        completed_at: chrono::Utc::now(),
    }
}
