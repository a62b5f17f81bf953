// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Per-model code-gen suite tick: canary check, task sampling, trial
//! fan-out, failed-task retry phase, and suite-level score aggregation.

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;

use meter_model::{ChatAdapter, ChatRequest, Message};
use meter_sandbox::SandboxManager;
use meter_scoring::{harsh_score, AxisMetrics, Baseline, Sentinel, StupidScore, Suite};
use meter_tasks::CodeTask;

use crate::trial::TrialRunner;
use crate::types::{CodegenSuiteResult, TaskOutcome, TrialRecord};

pub struct AggregatorConfig {
    pub tasks_per_tick: usize,
    pub trials_per_task: usize,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
}

pub struct CodegenAggregator {
    trial_runner: TrialRunner,
    config: AggregatorConfig,
}

impl CodegenAggregator {
    pub fn new(trial_runner: TrialRunner, config: AggregatorConfig) -> Self {
        Self { trial_runner, config }
    }

    /// One small chat round validating credentials and basic liveness.
    async fn canary(&self, adapter: &dyn ChatAdapter, model: &str) -> bool {
        let req = ChatRequest {
            model: model.to_string(),
            messages: vec![Message::user("Reply with the single word: ready")],
            temperature: 0.0,
            max_tokens: 16,
            tools: None,
            tool_choice: None,
            reasoning_effort: None,
        };
        matches!(adapter.chat(req).await, Ok(resp) if !resp.text.trim().is_empty())
    }

    fn sentinel_result(model: &str, vendor: &str, suite: Suite, sentinel: Sentinel) -> CodegenSuiteResult {
        CodegenSuiteResult {
            model: model.to_string(),
            vendor: vendor.to_string(),
            suite,
            stupid_score: StupidScore::Sentinel(sentinel),
            axes: AxisMetrics::SENTINEL,
            note: Some(sentinel.note(vendor)),
            tasks: Vec::new(),
        }
    }

    async fn run_task(
        &self,
        adapter: &dyn ChatAdapter,
        sandbox: &SandboxManager,
        model: &str,
        task: &CodeTask,
        boosted: bool,
    ) -> TaskOutcome {
        let mut records = Vec::with_capacity(self.config.trials_per_task);
        for trial_number in 0..self.config.trials_per_task as u32 {
            if trial_number > 0 {
                let jitter = rand::thread_rng().gen_range(self.config.jitter_min_ms..=self.config.jitter_max_ms);
                tokio::time::sleep(std::time::Duration::from_millis(jitter)).await;
            }
            let session_id = format!("{model}-{}", task.slug);
            let outcome = self
                .trial_runner
                .run_trial(adapter, sandbox, model, task, &session_id, trial_number, boosted)
                .await;
            records.push(match outcome {
                Ok(Some(o)) => TrialRecord {
                    trial_number,
                    ts: Utc::now(),
                    attempts: o.attempts,
                    tokens_in: o.tokens_in,
                    tokens_out: o.tokens_out,
                    latency_ms: o.latency_ms,
                    code: Some(o.code),
                    artifact_hash: None,
                    metrics: Some(o.metrics),
                },
                Ok(None) => empty_trial_record(trial_number),
                Err(_) => empty_trial_record(trial_number),
            });
        }

        let successes: Vec<AxisMetrics> = records.iter().filter_map(|r| r.metrics).collect();
        let collapsed = if successes.is_empty() {
            None
        } else {
            let mut median = AxisMetrics::median(&successes);
            let all_correctness: Vec<f64> = records.iter().map(|r| r.metrics.map(|m| m.correctness).unwrap_or(0.0)).collect();
            median.stability = stability_from_correctness_spread(&all_correctness);
            Some(median)
        };

        TaskOutcome { task_slug: task.slug.clone(), trials: records, collapsed }
    }

    /// Run the suite once for a single model. `history` is the model+suite's
    /// recent non-sentinel axis history, used to compute the baseline.
    pub async fn run_for_model(
        &self,
        adapter: &dyn ChatAdapter,
        sandbox: &SandboxManager,
        model: &str,
        vendor: &str,
        suite: Suite,
        api_key_present: bool,
        baseline: Baseline,
        tasks: &[&CodeTask],
    ) -> CodegenSuiteResult {
        if !api_key_present {
            return Self::sentinel_result(model, vendor, suite, Sentinel::NoApiKey);
        }
        if !self.canary(adapter, model).await {
            return Self::sentinel_result(model, vendor, suite, Sentinel::AdapterValidationFailed);
        }

        let mut pool: Vec<&CodeTask> = tasks.to_vec();
        pool.shuffle(&mut rand::thread_rng());
        let selected: Vec<&CodeTask> = pool.into_iter().take(self.config.tasks_per_tick).collect();
        let selected_count = selected.len();

        let mut outcomes = Vec::with_capacity(selected_count);
        for task in &selected {
            outcomes.push(self.run_task(adapter, sandbox, model, task, false).await);
        }

        for i in 0..outcomes.len() {
            if !outcomes[i].succeeded() {
                let task = selected[i];
                outcomes[i] = self.run_task(adapter, sandbox, model, task, true).await;
            }
        }

        let successful: Vec<AxisMetrics> = outcomes.iter().filter_map(|o| o.collapsed).collect();
        if successful.is_empty() {
            return Self::sentinel_result(model, vendor, suite, Sentinel::AllTasksFailed);
        }

        let mut axes = AxisMetrics::mean(&successful);
        axes.stability = axes.stability.min(0.95);

        let mut score = harsh_score(&axes, &baseline);

        let failure_penalty = (12.0 * (1.0 - successful.len() as f64 / selected_count.max(1) as f64)).round();
        score -= failure_penalty;

        let mut note = None;
        if !baseline.has_baseline {
            score -= 2.0;
            note = Some(format!(
                "Calibrating ({}/{} samples)",
                baseline.sample_count,
                baseline.sample_count.max(10)
            ));
        }
        score = score.clamp(0.0, 100.0);

        CodegenSuiteResult {
            model: model.to_string(),
            vendor: vendor.to_string(),
            suite,
            stupid_score: StupidScore::Numeric(score),
            axes,
            note,
            tasks: outcomes,
        }
    }
}

fn empty_trial_record(trial_number: u32) -> TrialRecord {
    TrialRecord {
        trial_number,
        ts: Utc::now(),
        attempts: 0,
        tokens_in: 0,
        tokens_out: 0,
        latency_ms: 0,
        code: None,
        artifact_hash: None,
        metrics: None,
    }
}

/// Stability axis derived from the spread of `correctness` across every
/// attempted trial for a task, not just the successful ones.
fn stability_from_correctness_spread(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 1.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    let sigma = variance.sqrt();
    (1.0 - sigma / 0.3).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stability_is_perfect_when_correctness_never_varies() {
        assert_eq!(stability_from_correctness_spread(&[0.9, 0.9, 0.9]), 1.0);
    }

    #[test]
    fn stability_drops_as_correctness_spread_widens() {
        let tight = stability_from_correctness_spread(&[0.9, 0.88, 0.91]);
        let wide = stability_from_correctness_spread(&[0.1, 0.9, 0.2]);
        assert!(tight > wide);
    }

    #[test]
    fn single_trial_is_trivially_stable() {
        assert_eq!(stability_from_correctness_spread(&[0.5]), 1.0);
    }

    #[tokio::test]
    async fn end_to_end_tick_scores_a_single_successful_task() {
        use std::sync::Arc;

        use meter_model::{Script, ScriptedMockAdapter};
        use meter_sandbox::fake::FakeRuntime;
        use meter_sandbox::SandboxManager;
        use meter_tasks::code_task_by_slug;

        let task = code_task_by_slug("py/is_palindrome").unwrap();

        let fake = Arc::new(FakeRuntime::with_responses(vec![
            FakeRuntime::ok(""),     // create
            FakeRuntime::ok(""),     // write solution.py
            FakeRuntime::ok(""),     // write pass_a.py
            FakeRuntime::ok("OK"),   // exec pass_a.py
            FakeRuntime::ok(""),     // write pass_b.py
            FakeRuntime::ok("4/4"),  // exec pass_b.py
            FakeRuntime::ok(""),     // destroy
        ]));
        let sandbox = SandboxManager::new(fake);

        let adapter = ScriptedMockAdapter::new(
            "mock",
            vec![
                Script::Text("ready".to_string()),
                Script::Text("```python\ndef is_palindrome(s):\n    return s.lower() == s.lower()[::-1]\n```".to_string()),
            ],
        );

        let trial_runner = TrialRunner::new("python:3.11-slim", 8000);
        let aggregator = CodegenAggregator::new(
            trial_runner,
            AggregatorConfig { tasks_per_tick: 1, trials_per_task: 1, jitter_min_ms: 0, jitter_max_ms: 0 },
        );
        let baseline = Baseline {
            mean: AxisMetrics::uniform(0.6),
            sigma: AxisMetrics::uniform(0.15),
            has_baseline: true,
            sample_count: 20,
        };

        let result = aggregator
            .run_for_model(&adapter, &sandbox, "mock-model", "mock", Suite::Hourly, true, baseline, &[task])
            .await;

        assert!(!result.stupid_score.is_sentinel());
        assert_eq!(result.tasks.len(), 1);
        assert!(result.tasks[0].succeeded());
        assert!(result.axes.correctness > 0.9);
    }

    #[tokio::test]
    async fn missing_api_key_yields_no_api_key_sentinel() {
        use meter_model::EchoMockAdapter;
        use meter_sandbox::{fake::FakeRuntime, SandboxManager};
        use meter_tasks::code_task_by_slug;

        let task = code_task_by_slug("py/is_palindrome").unwrap();
        let sandbox = SandboxManager::new(std::sync::Arc::new(FakeRuntime::with_responses(vec![])));
        let adapter = EchoMockAdapter;
        let trial_runner = TrialRunner::new("python:3.11-slim", 8000);
        let aggregator = CodegenAggregator::new(
            trial_runner,
            AggregatorConfig { tasks_per_tick: 1, trials_per_task: 1, jitter_min_ms: 0, jitter_max_ms: 0 },
        );
        let baseline = Baseline { mean: AxisMetrics::uniform(0.5), sigma: AxisMetrics::uniform(0.15), has_baseline: false, sample_count: 0 };

        let result = aggregator
            .run_for_model(&adapter, &sandbox, "mock-model", "mock", Suite::Hourly, false, baseline, &[task])
            .await;

        assert_eq!(result.stupid_score, StupidScore::Sentinel(Sentinel::NoApiKey));
        assert!(result.axes.is_sentinel());
    }
}
