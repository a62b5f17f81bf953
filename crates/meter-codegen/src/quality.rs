// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Static code-quality heuristics, contributing up to `0.75` of the
//! `codeQuality` axis — never a full `1.0`, since a purely textual
//! heuristic can't certify real quality.

const BANNED_PATTERNS: &[&str] = &["eval(", "exec(", "os.system", "__import__", "globals()["];
const CONTROL_FLOW: &[&str] = &["if ", "for ", "while ", "try:"];
const TYPE_HINTS: &[&str] = &["->", ": int", ": str", ": float", ": bool", ": list", ": dict"];

pub fn code_quality(source: &str) -> f64 {
    let len = source.len();
    let mut score = 0.0_f64;

    if (20..=2000).contains(&len) {
        score += 0.15;
    }
    if !BANNED_PATTERNS.iter().any(|p| source.contains(p)) {
        score += 0.15;
    }
    if source.contains("def ") || source.contains("class ") {
        score += 0.1;
    }
    if CONTROL_FLOW.iter().any(|p| source.contains(p)) {
        score += 0.1;
    }
    if source.contains("\"\"\"") || source.contains("'''") {
        score += 0.1;
    }
    if TYPE_HINTS.iter().any(|p| source.contains(p)) {
        score += 0.1;
    }
    if has_meaningful_comment(source) {
        score += 0.05;
    }
    if source.contains("return") {
        score += 0.1;
    }

    if source.contains("global ") {
        score -= 0.05;
    }
    if source.contains("lambda") {
        score -= 0.03;
    }
    if len > 2000 {
        score -= 0.1;
    }

    score.clamp(0.0, 0.75)
}

fn has_meaningful_comment(source: &str) -> bool {
    source.lines().any(|line| {
        let trimmed = line.trim_start();
        trimmed.starts_with('#') && trimmed.trim_start_matches('#').trim().split_whitespace().count() >= 3
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_exceeds_the_075_ceiling() {
        let source = "def solve(x: int) -> int:\n    \"\"\"doc\"\"\"\n    # this is a meaningful comment here\n    if x > 0:\n        return x\n    return -x\n";
        assert!(code_quality(source) <= 0.75);
    }

    #[test]
    fn bare_one_liner_scores_low() {
        let source = "x=1";
        assert!(code_quality(source) < 0.3);
    }

    #[test]
    fn dangerous_calls_are_penalized() {
        let clean = "def f(x):\n    return x\n";
        let dirty = "def f(x):\n    return eval(x)\n";
        assert!(code_quality(dirty) < code_quality(clean));
    }

    #[test]
    fn oversized_source_is_penalized() {
        let huge = format!("def f():\n    return {}\n", "1+".repeat(1500));
        assert!(code_quality(&huge) < 0.5);
    }
}
