// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use async_trait::async_trait;
use thiserror::Error;

use crate::types::{ChatRequest, ChatResponse};

/// Error taxonomy surfaced by a chat adapter.
///
/// Adapters surface provider errors with HTTP-like status where possible;
/// retry is a caller concern (trial runner / session engine), never done
/// inside the adapter itself.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("no API key configured for vendor {vendor}")]
    NoApiKey { vendor: String },

    #[error("adapter validation failed: {0}")]
    ValidationFailed(String),

    #[error("provider credit exhausted")]
    CreditExhausted,

    #[error("transient provider error (status {status}): {message}")]
    Transient { status: u16, message: String },

    #[error("provider error (status {status}): {message}")]
    Provider { status: u16, message: String },

    #[error("adapter error: {0}")]
    Other(String),
}

impl AdapterError {
    /// `true` for 429/5xx-class errors callers should retry with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, AdapterError::Transient { .. })
    }
}

/// Capability set exposed by every provider adapter.
///
/// One adapter instance talks to exactly one provider/model. Retry,
/// backoff, and prompt-salting are all caller concerns — the adapter is a
/// thin, uniform translation layer to the provider's wire format.
#[async_trait]
pub trait ChatAdapter: Send + Sync {
    /// Vendor tag this adapter serves (must be in [`crate::registry::VENDORS`]).
    fn vendor(&self) -> &str;

    /// List model identifiers available from this provider.
    async fn list_models(&self) -> Result<Vec<String>, AdapterError>;

    /// Send one chat completion request and return the full response.
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, AdapterError>;
}
