// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! One code-gen suite tick across the whole fleet: sharded by vendor,
//! concurrent across vendors, serial with jittered sleep within a vendor.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use meter_codegen::{AggregatorConfig, CodegenAggregator, TrialRunner};
use meter_config::{CodegenConfig, FleetConfig};
use meter_sandbox::SandboxManager;
use meter_scoring::Suite;
use meter_store::Store;
use meter_tasks::CODE_TASKS;

use crate::adapters::AdapterFactory;

pub async fn run_codegen_tick(
    suite: Suite,
    fleet: &FleetConfig,
    config: &CodegenConfig,
    sandbox: Arc<SandboxManager>,
    store: Arc<Store>,
    adapters: Arc<dyn AdapterFactory>,
) {
    let batch_ts = chrono::Utc::now();
    let tasks: Vec<&meter_tasks::CodeTask> = CODE_TASKS.iter().collect();

    let mut handles = Vec::new();
    for (vendor, models) in fleet.by_vendor() {
        let sandbox = sandbox.clone();
        let store = store.clone();
        let adapters = adapters.clone();
        let config = AggregatorConfig {
            tasks_per_tick: config.tasks_per_tick,
            trials_per_task: config.trials_per_task,
            jitter_min_ms: config.jitter_min_ms,
            jitter_max_ms: config.jitter_max_ms,
        };
        let reasoning_min_tokens = config.reasoning_min_tokens;
        let sandbox_image = sandbox_image_default();
        let models: Vec<_> = models.into_iter().cloned().collect();
        let tasks: Vec<meter_tasks::CodeTask> = tasks.iter().map(|t| (*t).clone()).collect();

        handles.push(tokio::spawn(async move {
            let adapter = adapters.build(&vendor);
            let trial_runner = TrialRunner::new(sandbox_image, reasoning_min_tokens);
            let aggregator = CodegenAggregator::new(trial_runner, config);
            let task_refs: Vec<&meter_tasks::CodeTask> = tasks.iter().collect();

            for (i, model) in models.iter().enumerate() {
                if i > 0 {
                    let jitter = rand::thread_rng().gen_range(200..=800);
                    tokio::time::sleep(Duration::from_millis(jitter)).await;
                }

                let api_key_present = meter_config::api_key(&vendor).is_some();
                let baseline = match store.baseline_for(&model.name, suite, 50, 10).await {
                    Ok(b) => b,
                    Err(e) => {
                        warn!(model = %model.name, error = %e, "failed to load baseline, using default");
                        meter_scoring::compute_baseline(&[], 10)
                    }
                };

                let result = aggregator
                    .run_for_model(adapter.as_ref(), &sandbox, &model.name, &vendor, suite, api_key_present, baseline, &task_refs)
                    .await;

                if let Err(e) = store.record_codegen_tick(suite, batch_ts, &result).await {
                    warn!(model = %model.name, error = %e, "failed to persist codegen tick result");
                }
                info!(model = %model.name, vendor = %vendor, suite = %suite, score = result.stupid_score.raw(), "codegen tick complete");
            }
        }));
    }

    for handle in handles {
        if let Err(e) = handle.await {
            warn!(error = %e, "vendor codegen worker panicked");
        }
    }
}

fn sandbox_image_default() -> String {
    "python:3.11-slim".to_string()
}
