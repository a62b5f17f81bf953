// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! System-message pool rotation and per-attempt prompt salting.

use rand::Rng;
use sha2::{Digest, Sha256};

const SYSTEM_PROMPTS: &[&str] = &[
    "You are an expert Python engineer. Respond with a single fenced ```python code block containing only the requested function or class, with no surrounding explanation.",
    "Write idiomatic, correct Python. Return exactly one fenced ```python code block with the complete solution and nothing else.",
    "You write clean, correct Python. Answer with one fenced ```python code block containing only the implementation — no commentary before or after it.",
];

const RETRY_SYSTEM_PROMPTS: &[&str] = &[
    "Your previous attempt at this task did not pass. Read the problem statement again carefully, then answer with a single fenced ```python code block containing a complete, correct solution and nothing else.",
    "The prior solution failed. Reconsider edge cases and return one fenced ```python code block with a corrected implementation, no explanation.",
    "That attempt was rejected. Respond only with a fenced ```python code block holding a working solution for the exact symbol requested.",
];

/// Picks a system-message variant. Retry attempts draw from a disjoint pool
/// so a caching or sticky-session provider can't just replay the earlier
/// failure.
pub fn select_system_message(attempt: u32) -> &'static str {
    let pool: &[&str] = if attempt == 0 { SYSTEM_PROMPTS } else { RETRY_SYSTEM_PROMPTS };
    let idx = rand::thread_rng().gen_range(0..pool.len());
    pool[idx]
}

/// A short, deterministic nonce derived from the session id, trial number,
/// and retry attempt — appended to the user prompt as a no-op comment so
/// repeated attempts at the same task don't collide on a provider-side
/// response cache.
pub fn build_nonce(session_id: &str, trial_number: u32, attempt: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    hasher.update(trial_number.to_le_bytes());
    hasher.update(attempt.to_le_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..6])
}

pub fn salted_prompt(base_prompt: &str, session_id: &str, trial_number: u32, attempt: u32) -> String {
    let nonce = build_nonce(session_id, trial_number, attempt);
    format!("{base_prompt}\n\n# request:{nonce}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_is_deterministic_for_the_same_inputs() {
        assert_eq!(build_nonce("s1", 2, 1), build_nonce("s1", 2, 1));
    }

    #[test]
    fn nonce_differs_when_any_input_changes() {
        let base = build_nonce("s1", 0, 0);
        assert_ne!(base, build_nonce("s2", 0, 0));
        assert_ne!(base, build_nonce("s1", 1, 0));
        assert_ne!(base, build_nonce("s1", 0, 1));
    }

    #[test]
    fn retry_attempts_draw_from_a_disjoint_pool() {
        let first_pass: std::collections::HashSet<&str> = SYSTEM_PROMPTS.iter().copied().collect();
        for _ in 0..20 {
            assert!(!first_pass.contains(select_system_message(1)));
        }
    }

    #[test]
    fn salted_prompt_carries_the_base_prompt_verbatim() {
        let salted = salted_prompt("Write a function.", "sess", 0, 0);
        assert!(salted.starts_with("Write a function."));
        assert!(salted.contains("# request:"));
    }
}
