// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Cron-driven scheduler tying the code-gen and tool-calling suites to
//! cadence, non-overlap, recency skip, and cache invalidation.

mod adapters;
mod codegen_tick;
mod scheduler;
mod tool_tick;

pub use adapters::{AdapterFactory, EchoAdapterFactory};
pub use scheduler::Scheduler;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use meter_cache::DashboardCache;
    use meter_config::Config;
    use meter_sandbox::{fake::FakeRuntime, SandboxManager};
    use meter_scoring::Suite;
    use meter_store::Store;

    use super::*;

    fn test_scheduler() -> Scheduler {
        let sandbox = Arc::new(SandboxManager::new(Arc::new(FakeRuntime::with_responses(vec![]))));
        let store = Arc::new(Store::in_memory().unwrap());
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(DashboardCache::new(dir.into_path(), std::time::Duration::from_secs(300), 1, "dev"));
        Scheduler::new(Config::default(), sandbox, store, cache, Arc::new(EchoAdapterFactory))
    }

    #[tokio::test]
    async fn codegen_tick_with_empty_fleet_completes_immediately() {
        let scheduler = test_scheduler();
        scheduler.tick_codegen(Suite::Hourly).await;
    }

    #[tokio::test]
    async fn tooling_tick_with_empty_fleet_completes_immediately() {
        let scheduler = test_scheduler();
        scheduler.tick_tooling().await;
    }
}
