// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Drives one (model, task, trial) attempt end to end: budget selection,
//! prompt salting, adapter invocation with backoff, code extraction, and
//! sandboxed evaluation.

use std::time::{Duration, Instant};

use meter_model::{ChatAdapter, ChatRequest, Message};
use meter_sandbox::SandboxManager;
use meter_scoring::AxisMetrics;
use meter_tasks::CodeTask;

use crate::budget::select_budget;
use crate::evaluator;
use crate::extract::extract_code;
use crate::prompt::{salted_prompt, select_system_message};
use crate::types::CodegenError;

/// One successful attempt's measurements, ready to fold into a `TrialRecord`.
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub attempts: u32,
    pub latency_ms: u64,
    pub tokens_in: u32,
    pub tokens_out: u32,
    pub code: String,
    pub metrics: AxisMetrics,
}

pub struct TrialRunner {
    pub sandbox_image: String,
    pub reasoning_min_tokens: u32,
    /// Extra multiplier applied to the token budget on a boosted (retry
    /// phase) run — stacked on top of the per-attempt escalation.
    pub boost_multiplier: f32,
}

impl TrialRunner {
    pub fn new(sandbox_image: impl Into<String>, reasoning_min_tokens: u32) -> Self {
        Self { sandbox_image: sandbox_image.into(), reasoning_min_tokens, boost_multiplier: 1.0 }
    }

    /// Runs one trial. Returns `Ok(None)` when the model produced nothing
    /// usable after retries — a normal, non-exceptional outcome the caller
    /// folds into `TrialRecord { metrics: None, .. }` rather than an error.
    pub async fn run_trial(
        &self,
        adapter: &dyn ChatAdapter,
        sandbox: &SandboxManager,
        model: &str,
        task: &CodeTask,
        session_id: &str,
        trial_number: u32,
        boosted: bool,
    ) -> Result<Option<TrialOutcome>, CodegenError> {
        let mut attempt = 0u32;
        loop {
            let mut budget = select_budget(model, task.max_tokens, attempt, self.reasoning_min_tokens);
            if boosted {
                budget.max_tokens = ((budget.max_tokens as f32) * self.boost_multiplier) as u32;
            }

            let system_message = select_system_message(attempt);
            let mut prompt = task.prompt.clone();
            if boosted {
                prompt.push_str("\n\nNote: take extra care — a prior attempt at this exact task failed every test case.");
            }
            let user_prompt = salted_prompt(&prompt, session_id, trial_number, attempt);

            let req = ChatRequest {
                model: model.to_string(),
                messages: vec![Message::system(system_message), Message::user(user_prompt)],
                temperature: budget.temperature,
                max_tokens: budget.max_tokens,
                tools: None,
                tool_choice: None,
                reasoning_effort: budget.reasoning_effort,
            };

            let started = Instant::now();
            let resp = call_with_backoff(adapter, req).await?;
            let latency_ms = started.elapsed().as_millis() as u64;

            let code = extract_code(&resp.text);
            if resp.text.trim().is_empty() || code.trim().is_empty() {
                if attempt < 2 {
                    attempt += 1;
                    continue;
                }
                return Ok(None);
            }

            let mut metrics = evaluator::evaluate(sandbox, &self.sandbox_image, task, &code).await?;
            metrics.efficiency = efficiency_from_latency(latency_ms);

            return Ok(Some(TrialOutcome {
                attempts: attempt + 1,
                latency_ms,
                tokens_in: resp.tokens_in,
                tokens_out: resp.tokens_out,
                code,
                metrics,
            }));
        }
    }
}

/// `clip(pow(min(1, 1000/latency_ms), 0.85), 0, 0.92)`.
fn efficiency_from_latency(latency_ms: u64) -> f64 {
    const REFERENCE_MS: f64 = 1000.0;
    let ratio = (REFERENCE_MS / (latency_ms.max(1) as f64)).min(1.0);
    ratio.powf(0.85).clamp(0.0, 0.92)
}

async fn call_with_backoff(adapter: &dyn ChatAdapter, req: ChatRequest) -> Result<meter_model::ChatResponse, CodegenError> {
    let mut delay = Duration::from_millis(500);
    for attempt in 0..=2 {
        match adapter.chat(req.clone()).await {
            Ok(resp) => return Ok(resp),
            Err(e) if e.is_transient() && attempt < 2 => {
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => return Err(e.into()),
        }
    }
    unreachable!("loop always returns on its final iteration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn efficiency_caps_at_092_for_very_fast_responses() {
        assert!((efficiency_from_latency(1) - 0.92).abs() < 1e-9);
    }

    #[test]
    fn efficiency_decreases_as_latency_grows() {
        let fast = efficiency_from_latency(500);
        let slow = efficiency_from_latency(5000);
        assert!(fast > slow);
    }

    #[test]
    fn efficiency_never_negative() {
        assert!(efficiency_from_latency(u64::MAX) >= 0.0);
    }
}
