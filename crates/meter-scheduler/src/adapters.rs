// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Vendor adapter lookup. Per-provider REST wiring lives outside this
//! crate — the orchestrator only needs *some* `ChatAdapter` per vendor, so
//! callers inject the factory rather than the scheduler constructing real
//! provider clients itself.

use std::sync::Arc;

use meter_model::{ChatAdapter, EchoMockAdapter};

/// Resolves a vendor id to a chat adapter. Production wiring supplies a
/// real per-provider REST client here; tests and the bundled CLI demo mode
/// use [`EchoAdapterFactory`].
pub trait AdapterFactory: Send + Sync {
    fn build(&self, vendor: &str) -> Arc<dyn ChatAdapter>;
}

/// Placeholder factory returning the echo mock for every vendor. Useful
/// for `cache warm`/dry-run style invocations and for tests; a real
/// deployment supplies its own [`AdapterFactory`] wired to provider SDKs.
pub struct EchoAdapterFactory;

impl AdapterFactory for EchoAdapterFactory {
    fn build(&self, _vendor: &str) -> Arc<dyn ChatAdapter> {
        Arc::new(EchoMockAdapter)
    }
}
