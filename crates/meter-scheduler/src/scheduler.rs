// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The cron-driven scheduler: three independent tickers, each with its own
//! non-overlap guard, running to completion or to its watchdog deadline
//! without ever stopping the other two.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cron::Schedule;
use tracing::{error, info, warn};

use meter_cache::DashboardCache;
use meter_config::Config;
use meter_runtime::{GuardFlag, GuardScope};
use meter_sandbox::SandboxManager;
use meter_scoring::Suite;
use meter_store::Store;

use crate::adapters::AdapterFactory;
use crate::codegen_tick::run_codegen_tick;
use crate::tool_tick::run_tool_tick;

pub struct Scheduler {
    config: Config,
    sandbox: Arc<SandboxManager>,
    store: Arc<Store>,
    cache: Arc<DashboardCache>,
    adapters: Arc<dyn AdapterFactory>,
    hourly_guard: GuardFlag,
    deep_guard: GuardFlag,
    tooling_guard: GuardFlag,
}

impl Scheduler {
    pub fn new(
        config: Config,
        sandbox: Arc<SandboxManager>,
        store: Arc<Store>,
        cache: Arc<DashboardCache>,
        adapters: Arc<dyn AdapterFactory>,
    ) -> Self {
        Self {
            config,
            sandbox,
            store,
            cache,
            adapters,
            hourly_guard: GuardFlag::new(),
            deep_guard: GuardFlag::new(),
            tooling_guard: GuardFlag::new(),
        }
    }

    /// Runs one code-gen tick immediately, ignoring the cron cadence —
    /// used by the CLI's `run <suite>` one-shot subcommand and by the
    /// scheduler loop's own tickers.
    pub async fn tick_codegen(&self, suite: Suite) {
        let guard = match suite {
            Suite::Hourly => &self.hourly_guard,
            Suite::Deep => &self.deep_guard,
            Suite::Tooling => unreachable!("tooling suite uses tick_tooling"),
        };
        let Some(_scope) = GuardScope::acquire(guard) else {
            info!(suite = %suite, "tick already running, skipping");
            return;
        };

        let watchdog = Duration::from_secs(self.config.suites.watchdog_secs);
        let fut = run_codegen_tick(
            suite,
            &self.config.fleet,
            &self.config.codegen,
            self.sandbox.clone(),
            self.store.clone(),
            self.adapters.clone(),
        );
        if tokio::time::timeout(watchdog, fut).await.is_err() {
            error!(suite = %suite, "tick exceeded watchdog deadline");
        }

        if let Err(e) = self.cache.purge_all() {
            warn!(suite = %suite, error = %e, "failed to invalidate dashboard cache after tick");
        }
    }

    pub async fn tick_tooling(&self) {
        let Some(_scope) = GuardScope::acquire(&self.tooling_guard) else {
            info!(suite = "tooling", "tick already running, skipping");
            return;
        };

        let watchdog = Duration::from_secs(self.config.suites.watchdog_secs);
        let fut = run_tool_tick(
            &self.config.fleet,
            &self.config.toolbench,
            self.config.suites.tooling_recency_skip_hours,
            self.sandbox.clone(),
            self.store.clone(),
            self.adapters.clone(),
        );
        if tokio::time::timeout(watchdog, fut).await.is_err() {
            error!(suite = "tooling", "tick exceeded watchdog deadline");
        }

        if let Err(e) = self.cache.purge_all() {
            warn!(suite = "tooling", error = %e, "failed to invalidate dashboard cache after tick");
        }
    }

    /// Spawns the three cron-driven tickers and returns immediately; each
    /// runs until the process exits. A crash inside one tick is caught by
    /// `tokio::spawn`'s panic boundary and never stops the other tickers
    /// or future ticks of the same suite.
    pub fn spawn_forever(self: Arc<Self>) {
        spawn_ticker(self.clone(), self.config.suites.hourly_cron.clone(), TickKind::Hourly);
        spawn_ticker(self.clone(), self.config.suites.deep_cron.clone(), TickKind::Deep);
        spawn_ticker(self.clone(), self.config.suites.tooling_cron.clone(), TickKind::Tooling);
        spawn_cleanup_sweep(self);
    }
}

/// Periodic orphan-sandbox sweep. Nothing else calls `cleanupExpired`, so
/// the scheduler owns it — runs at half the configured max age, floored at
/// a minute so a small `max_age_secs` in tests doesn't spin.
fn spawn_cleanup_sweep(scheduler: Arc<Scheduler>) {
    let max_age = Duration::from_secs(scheduler.config.sandbox.max_age_secs);
    let interval = (max_age / 2).max(Duration::from_secs(60));
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let destroyed = scheduler.sandbox.cleanup_expired(max_age).await;
            if destroyed > 0 {
                info!(count = destroyed, "cleanup sweep destroyed orphaned sandboxes");
            }
        }
    });
}

#[derive(Clone, Copy)]
enum TickKind {
    Hourly,
    Deep,
    Tooling,
}

fn spawn_ticker(scheduler: Arc<Scheduler>, cron_expr: String, kind: TickKind) {
    tokio::spawn(async move {
        let schedule = match Schedule::from_str(&cron_expr) {
            Ok(s) => s,
            Err(e) => {
                error!(cron = %cron_expr, error = %e, "invalid cron expression, ticker disabled");
                return;
            }
        };

        loop {
            let Some(next) = schedule.upcoming(Utc).next() else {
                error!("cron schedule produced no future fire time, ticker exiting");
                return;
            };
            let delay = (next - Utc::now()).to_std().unwrap_or(Duration::from_secs(1));
            tokio::time::sleep(delay).await;

            let scheduler = scheduler.clone();
            let handle = tokio::spawn(async move {
                match kind {
                    TickKind::Hourly => scheduler.tick_codegen(Suite::Hourly).await,
                    TickKind::Deep => scheduler.tick_codegen(Suite::Deep).await,
                    TickKind::Tooling => scheduler.tick_tooling().await,
                }
            });
            if let Err(e) = handle.await {
                warn!(error = %e, "suite tick panicked, continuing to next scheduled fire");
            }
        }
    });
}
