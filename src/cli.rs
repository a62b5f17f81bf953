// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use meter_scoring::Suite;

/// Continuous, multi-provider LLM benchmark orchestrator.
///
/// Runs the code-generation and tool-calling suites against a configured
/// fleet of models, either once (`run`) or forever on cron cadence
/// (`serve`). The HTTP dashboard API, per-provider SDK wiring, and the
/// frontend are out of scope for this binary — it is the local operator
/// surface, not the external API.
#[derive(Parser, Debug)]
#[command(name = "stupidmeter", version, about)]
pub struct Cli {
    /// Path to a YAML config file, merged on top of the discovered layers
    /// (/etc, XDG config dir, ./.stupidmeter.yaml).
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). Respects RUST_LOG if set.
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one suite tick immediately and exit.
    Run {
        /// Which suite to run.
        #[arg(value_enum)]
        suite: SuiteArg,
    },

    /// Start the scheduler daemon: spawns the three cron-driven tickers
    /// and blocks until terminated.
    Serve,

    /// List the registered provider vendors and their API key env vars.
    ListProviders {
        /// Emit machine-readable JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// List models tracked by the persistence layer (seen in at least one
    /// score write so far).
    ListModels {
        /// Emit machine-readable JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Inspect or purge the dashboard cache.
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Print the merged configuration and exit.
    ShowConfig,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Delete every cached entry (memory + file tiers).
    Purge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SuiteArg {
    Hourly,
    Deep,
    Tooling,
}

impl SuiteArg {
    pub fn as_suite(self) -> Suite {
        match self {
            SuiteArg::Hourly => Suite::Hourly,
            SuiteArg::Deep => Suite::Deep,
            SuiteArg::Tooling => Suite::Tooling,
        }
    }
}
