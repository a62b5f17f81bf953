// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Vendor registry: the closed set of provider tags a `Model.vendor` may
//! hold, and the `<VENDOR>_API_KEY` env-var convention that goes with
//! each.

/// Metadata describing a registered vendor.
#[derive(Debug, Clone, Copy)]
pub struct VendorMeta {
    pub id: &'static str,
    pub name: &'static str,
    pub default_api_key_env: &'static str,
}

/// Closed set of supported vendors. Adding a vendor means adding a row here
/// plus an adapter implementation — `Model.vendor` values outside this list
/// are rejected at ingestion.
pub static VENDORS: &[VendorMeta] = &[
    VendorMeta { id: "openai", name: "OpenAI", default_api_key_env: "OPENAI_API_KEY" },
    VendorMeta { id: "anthropic", name: "Anthropic", default_api_key_env: "ANTHROPIC_API_KEY" },
    VendorMeta { id: "google", name: "Google Gemini", default_api_key_env: "GEMINI_API_KEY" },
    VendorMeta { id: "cohere", name: "Cohere", default_api_key_env: "COHERE_API_KEY" },
    VendorMeta { id: "groq", name: "Groq", default_api_key_env: "GROQ_API_KEY" },
    VendorMeta { id: "together", name: "Together AI", default_api_key_env: "TOGETHER_API_KEY" },
    VendorMeta { id: "openrouter", name: "OpenRouter", default_api_key_env: "OPENROUTER_API_KEY" },
    VendorMeta { id: "deepseek", name: "DeepSeek", default_api_key_env: "DEEPSEEK_API_KEY" },
    VendorMeta { id: "mistral", name: "Mistral", default_api_key_env: "MISTRAL_API_KEY" },
    VendorMeta { id: "xai", name: "xAI", default_api_key_env: "XAI_API_KEY" },
];

pub fn lookup(vendor: &str) -> Option<&'static VendorMeta> {
    VENDORS.iter().find(|v| v.id.eq_ignore_ascii_case(vendor))
}

pub fn is_known_vendor(vendor: &str) -> bool {
    lookup(vendor).is_some()
}

/// Substring markers that identify a "reasoning family" model — these
/// receive an expanded token budget and a reasoning-effort hint.
const REASONING_MARKERS: &[&str] = &["o1", "o3", "o4", "reasoning", "thinking", "r1", "qwq"];

pub fn is_reasoning_model(model_name: &str) -> bool {
    let lower = model_name.to_ascii_lowercase();
    REASONING_MARKERS.iter().any(|m| lower.contains(m))
}
