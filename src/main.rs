// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{CacheCommands, Cli, Commands};
use meter_cache::DashboardCache;
use meter_config::Config;
use meter_sandbox::SandboxManager;
use meter_scheduler::{EchoAdapterFactory, Scheduler};
use meter_store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Commands::ShowConfig = &cli.command {
        let config = meter_config::load(cli.config.as_deref())?;
        println!("{}", serde_yaml::to_string(&config).unwrap_or_default());
        return Ok(());
    }

    if let Commands::ListProviders { json } = &cli.command {
        return list_providers_cmd(*json);
    }

    let config = meter_config::load(cli.config.as_deref())
        .context("loading configuration")?;

    match cli.command {
        Commands::Run { suite } => run_once(config, suite.as_suite()).await,
        Commands::Serve => serve(config).await,
        Commands::ListModels { json } => list_models_cmd(&config, json).await,
        Commands::Cache { command } => cache_cmd(&config, command),
        Commands::ListProviders { .. } | Commands::ShowConfig => unreachable!("handled above"),
    }
}

/// Builds the shared singletons (sandbox manager, store, cache) a suite
/// tick or the daemon loop needs — kept in one place so `run` and `serve`
/// construct them identically.
fn build_runtime(config: &Config) -> anyhow::Result<(Arc<SandboxManager>, Arc<Store>, Arc<DashboardCache>)> {
    let sandbox = Arc::new(SandboxManager::docker(
        std::env::var("STUPIDMETER_DOCKER_BIN").unwrap_or_else(|_| "docker".to_string()),
    ));

    let store = match store_path(config) {
        Some(path) => Arc::new(Store::open(&path, config.store.wal_mode).with_context(|| {
            format!("opening benchmark store at {}", path.display())
        })?),
        None => Arc::new(Store::in_memory().context("opening in-memory benchmark store")?),
    };

    let cache_dir = meter_config::cache_dir_override()
        .or_else(|| config.cache.dir.clone())
        .or_else(|| dirs::cache_dir().map(|d| d.join("stupidmeter")))
        .unwrap_or_else(|| std::path::PathBuf::from(".stupidmeter-cache"));
    let cache = Arc::new(DashboardCache::new(
        cache_dir,
        std::time::Duration::from_secs(config.cache.ttl_secs),
        config.cache.schema_version,
        meter_config::build_id(),
    ));

    Ok((sandbox, store, cache))
}

fn store_path(config: &Config) -> Option<std::path::PathBuf> {
    std::env::var("METER_DB_PATH").ok().map(std::path::PathBuf::from).or_else(|| config.store.path.clone())
}

/// `run <suite>`: fire one tick immediately and exit. Real provider HTTP
/// wiring lives outside this core, so provider calls go through
/// [`EchoAdapterFactory`] unless a real factory is injected by an external
/// caller embedding this binary's library crates directly.
async fn run_once(config: Config, suite: meter_scoring::Suite) -> anyhow::Result<()> {
    let (sandbox, store, cache) = build_runtime(&config)?;
    let scheduler = Scheduler::new(config, sandbox, store, cache, Arc::new(EchoAdapterFactory));

    match suite {
        meter_scoring::Suite::Tooling => scheduler.tick_tooling().await,
        other => scheduler.tick_codegen(other).await,
    }
    Ok(())
}

/// `serve`: start the cron-driven scheduler daemon and block forever.
async fn serve(config: Config) -> anyhow::Result<()> {
    let (sandbox, store, cache) = build_runtime(&config)?;
    let scheduler = Arc::new(Scheduler::new(config, sandbox, store, cache, Arc::new(EchoAdapterFactory)));
    scheduler.spawn_forever();

    tracing::info!("stupidmeter scheduler started");
    tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;
    tracing::info!("stupidmeter scheduler shutting down");
    Ok(())
}

async fn list_models_cmd(config: &Config, as_json: bool) -> anyhow::Result<()> {
    let (_, store, _) = build_runtime(config)?;
    let models = store.list_models().await.context("listing models")?;

    if as_json {
        #[derive(serde::Serialize)]
        struct ModelJson<'a> {
            name: &'a str,
            vendor: &'a str,
            show_in_rankings: bool,
            supports_tool_calling: bool,
        }
        let rows: Vec<ModelJson> = models
            .iter()
            .map(|m| ModelJson {
                name: &m.name,
                vendor: &m.vendor,
                show_in_rankings: m.show_in_rankings,
                supports_tool_calling: m.supports_tool_calling,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if models.is_empty() {
        println!("No models tracked yet — models are inserted on first score write.");
        return Ok(());
    }

    let name_w = models.iter().map(|m| m.name.len()).max().unwrap_or(10).max(10);
    let vendor_w = models.iter().map(|m| m.vendor.len()).max().unwrap_or(8).max(8);
    println!("{:<name_w$}  {:<vendor_w$}  RANKED  TOOLS", "NAME", "VENDOR");
    println!("{}", "-".repeat(name_w + vendor_w + 20));
    for m in &models {
        println!(
            "{:<name_w$}  {:<vendor_w$}  {:<6}  {}",
            m.name,
            m.vendor,
            if m.show_in_rankings { "yes" } else { "no" },
            if m.supports_tool_calling { "yes" } else { "no" },
        );
    }
    println!("\nTotal: {} model(s)", models.len());
    Ok(())
}

fn list_providers_cmd(as_json: bool) -> anyhow::Result<()> {
    let vendors = meter_model::VENDORS;

    if as_json {
        #[derive(serde::Serialize)]
        struct VendorJson {
            id: &'static str,
            name: &'static str,
            api_key_env: &'static str,
        }
        let rows: Vec<VendorJson> = vendors
            .iter()
            .map(|v| VendorJson { id: v.id, name: v.name, api_key_env: v.default_api_key_env })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let id_w = vendors.iter().map(|v| v.id.len()).max().unwrap_or(10).max(10);
    let name_w = vendors.iter().map(|v| v.name.len()).max().unwrap_or(8).max(8);
    println!("{:<id_w$}  {:<name_w$}  API KEY ENV", "ID", "NAME");
    println!("{}", "-".repeat(id_w + name_w + 30));
    for v in vendors {
        let configured = meter_config::api_key(v.id).is_some();
        let marker = if configured { "set" } else { "unset" };
        println!("{:<id_w$}  {:<name_w$}  {} ({marker})", v.id, v.name, v.default_api_key_env);
    }
    println!("\nTotal: {} provider(s)", vendors.len());
    Ok(())
}

fn cache_cmd(config: &Config, command: CacheCommands) -> anyhow::Result<()> {
    let cache_dir = meter_config::cache_dir_override()
        .or_else(|| config.cache.dir.clone())
        .or_else(|| dirs::cache_dir().map(|d| d.join("stupidmeter")))
        .unwrap_or_else(|| std::path::PathBuf::from(".stupidmeter-cache"));
    let cache = DashboardCache::new(
        cache_dir,
        std::time::Duration::from_secs(config.cache.ttl_secs),
        config.cache.schema_version,
        meter_config::build_id(),
    );

    match command {
        CacheCommands::Purge => {
            cache.purge_all().context("purging dashboard cache")?;
            println!("Dashboard cache purged.");
            Ok(())
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
