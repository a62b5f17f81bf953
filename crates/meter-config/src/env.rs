// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Environment-variable contract.
//!
//! Secrets and deployment knobs are read from the environment rather than
//! config files, so they never land in version-controlled YAML.

/// Name of the environment variable that holds the API key for `vendor`.
///
/// Follows the `<VENDOR>_API_KEY` convention, with the documented exception
/// that the Google vendor tag uses `GEMINI_API_KEY` instead of
/// `GOOGLE_API_KEY`.
pub fn api_key_env_var(vendor: &str) -> String {
    match vendor.to_ascii_lowercase().as_str() {
        "google" => "GEMINI_API_KEY".to_string(),
        other => format!("{}_API_KEY", other.to_ascii_uppercase()),
    }
}

/// Read the API key for `vendor` from the environment, if set and non-empty.
pub fn api_key(vendor: &str) -> Option<String> {
    std::env::var(api_key_env_var(vendor))
        .ok()
        .filter(|s| !s.is_empty())
}

/// Optional override for the dashboard cache's file-tier directory.
pub fn cache_dir_override() -> Option<std::path::PathBuf> {
    std::env::var("METER_CACHE_DIR").ok().map(std::path::PathBuf::from)
}

/// Build identifier used to invalidate the dashboard cache across
/// deployments.
pub fn build_id() -> String {
    std::env::var("METER_BUILD_ID").unwrap_or_else(|_| "dev".to_string())
}

/// Whether verbose performance logging (per-call latency breakdowns) is
/// enabled. Off by default.
pub fn perf_logging_enabled() -> bool {
    matches!(
        std::env::var("METER_PERF_LOG").as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn api_key_env_var_uppercases_vendor() {
        assert_eq!(api_key_env_var("openai"), "OPENAI_API_KEY");
        assert_eq!(api_key_env_var("anthropic"), "ANTHROPIC_API_KEY");
    }

    #[test]
    fn api_key_env_var_google_uses_gemini_key() {
        assert_eq!(api_key_env_var("google"), "GEMINI_API_KEY");
    }

    #[test]
    fn api_key_reads_from_process_env() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::set_var("TESTVENDOR_API_KEY", "sk-test-123");
        assert_eq!(api_key("testvendor").as_deref(), Some("sk-test-123"));
        std::env::remove_var("TESTVENDOR_API_KEY");
    }

    #[test]
    fn api_key_missing_returns_none() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::remove_var("ABSENTVENDOR_API_KEY");
        assert_eq!(api_key("absentvendor"), None);
    }

    #[test]
    fn api_key_empty_string_treated_as_missing() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::set_var("EMPTYVENDOR_API_KEY", "");
        assert_eq!(api_key("emptyvendor"), None);
        std::env::remove_var("EMPTYVENDOR_API_KEY");
    }

    #[test]
    fn build_id_defaults_to_dev() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::remove_var("METER_BUILD_ID");
        assert_eq!(build_id(), "dev");
    }

    #[test]
    fn perf_logging_disabled_by_default() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::remove_var("METER_PERF_LOG");
        assert!(!perf_logging_enabled());
    }
}
