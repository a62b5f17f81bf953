// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Dashboard cache key: `(period, sortBy, analyticsPeriod)` plus schema
//! version and build id, collapsed to a short SHA-1 digest for the
//! on-disk filename.

use sha1::{Digest, Sha1};

/// The query dimensions a dashboard read is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub period: String,
    pub sort_by: String,
    pub analytics_period: String,
}

impl CacheKey {
    pub fn new(period: impl Into<String>, sort_by: impl Into<String>, analytics_period: impl Into<String>) -> Self {
        Self { period: period.into(), sort_by: sort_by.into(), analytics_period: analytics_period.into() }
    }

    /// ASCII-safe canonical string; used as the memory-tier key directly
    /// and folded into the file-tier digest. Disallowed characters are
    /// replaced with `_`.
    pub fn canonical(&self) -> String {
        sanitize(&format!("{}|{}|{}", self.period, self.sort_by, self.analytics_period))
    }

    /// Short hex digest used as the file tier's filename stem.
    pub fn digest(&self, schema_version: u32, build_id: &str) -> String {
        let mut hasher = Sha1::new();
        hasher.update(self.canonical().as_bytes());
        hasher.update(b"|");
        hasher.update(schema_version.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(build_id.as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '|' || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_replaces_unsafe_characters() {
        let key = CacheKey::new("7d", "score desc", "weekly/trend");
        assert!(!key.canonical().contains(' '));
        assert!(!key.canonical().contains('/'));
    }

    #[test]
    fn digest_changes_with_schema_version() {
        let key = CacheKey::new("7d", "score", "weekly");
        assert_ne!(key.digest(1, "dev"), key.digest(2, "dev"));
    }

    #[test]
    fn digest_changes_with_build_id() {
        let key = CacheKey::new("7d", "score", "weekly");
        assert_ne!(key.digest(1, "dev"), key.digest(1, "abc123"));
    }

    #[test]
    fn digest_is_stable_for_same_inputs() {
        let key = CacheKey::new("7d", "score", "weekly");
        assert_eq!(key.digest(1, "dev"), key.digest(1, "dev"));
    }
}
