// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Pulls a Python solution out of a model's free-text response.

use once_cell::sync::Lazy;
use regex::Regex;

static FENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```([A-Za-z0-9_+-]*)\n(.*?)```").unwrap());

/// Prefers the longest fenced block tagged with a language; falls back to
/// stripping everything before the first top-level `def`/`class` if no
/// tagged block is present.
pub fn extract_code(text: &str) -> String {
    if let Some(code) = longest_tagged_block(text) {
        return code;
    }
    strip_to_symbol(text)
}

fn longest_tagged_block(text: &str) -> Option<String> {
    FENCE_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let lang = caps.get(1)?.as_str();
            if lang.is_empty() {
                return None;
            }
            Some(caps.get(2)?.as_str().trim().to_string())
        })
        .max_by_key(|s| s.len())
}

fn strip_to_symbol(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("def ") || trimmed.starts_with("class ") {
            return lines[i..].join("\n");
        }
    }
    text.trim().to_string()
}
