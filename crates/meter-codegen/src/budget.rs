// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Token budget and sampling temperature selection, including the
//! retry-escalation ladder.

use meter_model::{is_reasoning_model, ReasoningEffort};

#[derive(Debug, Clone, Copy)]
pub struct Budget {
    pub max_tokens: u32,
    pub temperature: f32,
    pub reasoning_effort: Option<ReasoningEffort>,
}

/// `attempt` is the local retry counter within a single trial (0 = first
/// try). Reasoning-family models get an expanded floor; every retry
/// multiplies the base budget (~3x on the first retry, ~4x from the second
/// on) and nudges temperature up so a retry isn't just replaying the same
/// sample.
pub fn select_budget(model: &str, task_max_tokens: u32, attempt: u32, reasoning_min_tokens: u32) -> Budget {
    let reasoning = is_reasoning_model(model);
    let mut max_tokens = if reasoning { task_max_tokens.max(reasoning_min_tokens) } else { task_max_tokens };

    let escalation: f32 = match attempt {
        0 => 1.0,
        1 => 3.0,
        _ => 4.0,
    };
    max_tokens = ((max_tokens as f32) * escalation) as u32;

    let temperature = (0.7 + 0.1 * attempt as f32).min(1.0);
    let reasoning_effort = if reasoning { Some(ReasoningEffort::Low) } else { None };

    Budget { max_tokens, temperature, reasoning_effort }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_reasoning_model_uses_task_budget_on_first_attempt() {
        let b = select_budget("gpt-4o-mini", 500, 0, 8000);
        assert_eq!(b.max_tokens, 500);
        assert!(b.reasoning_effort.is_none());
    }

    #[test]
    fn reasoning_model_gets_the_expanded_floor() {
        let b = select_budget("o1-preview", 500, 0, 8000);
        assert_eq!(b.max_tokens, 8000);
        assert!(b.reasoning_effort.is_some());
    }

    #[test]
    fn retries_escalate_the_budget() {
        let first = select_budget("gpt-4o-mini", 500, 0, 8000).max_tokens;
        let retry1 = select_budget("gpt-4o-mini", 500, 1, 8000).max_tokens;
        let retry2 = select_budget("gpt-4o-mini", 500, 2, 8000).max_tokens;
        assert!(retry1 > first);
        assert!(retry2 > retry1);
    }

    #[test]
    fn temperature_never_exceeds_one() {
        let b = select_budget("gpt-4o-mini", 500, 10, 8000);
        assert!(b.temperature <= 1.0);
    }
}
