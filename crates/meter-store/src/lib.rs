// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! SQLite-backed persistence layer. One `Connection` behind a
//! `tokio::sync::Mutex` — callers may hold the guard across an await
//! point, which only a `tokio` mutex (not a `std` one) can do soundly.

mod codegen;
pub mod hash;
mod models;
mod schema;
mod toolbench;

pub use codegen::{record_codegen_result, recent_axis_history, ScoreRecord};
pub use models::{ensure_model, list_models, ModelRecord};
pub use toolbench::{last_tool_session_at, record_tool_session};

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tokio::sync::Mutex;

use meter_codegen::CodegenSuiteResult;
use meter_scoring::{AxisMetrics, Suite};
use meter_toolbench::ToolSessionResult;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Handle to the benchmark history database. Cheap to clone — the
/// connection lives behind an `Arc`.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Opens (creating if absent) the database file at `path`, applies
    /// `PRAGMA journal_mode=WAL` when requested, and runs schema init.
    pub fn open(path: impl AsRef<Path>, wal_mode: bool) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn, wal_mode)
    }

    /// In-memory database, for tests and for a `path: None` config.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, false)
    }

    fn init(conn: Connection, wal_mode: bool) -> Result<Self, StoreError> {
        if wal_mode {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }
        schema::init(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Inserts the model row on first sight, then writes every trial and
    /// the suite score.
    pub async fn record_codegen_tick(
        &self,
        suite: Suite,
        batch_ts: DateTime<Utc>,
        result: &CodegenSuiteResult,
    ) -> Result<i64, StoreError> {
        let mut conn = self.conn.lock().await;
        ensure_model(&conn, &result.model, &result.vendor, false)?;
        Ok(record_codegen_result(&mut conn, suite, batch_ts, result)?)
    }

    /// Reads the baseline history and computes the baseline for a
    /// (model, suite) pair in one call.
    pub async fn baseline_for(
        &self,
        model: &str,
        suite: Suite,
        window: usize,
        min_samples: usize,
    ) -> Result<meter_scoring::Baseline, StoreError> {
        let conn = self.conn.lock().await;
        let history = recent_axis_history(&conn, model, suite, window)?;
        Ok(meter_scoring::compute_baseline(&history, min_samples))
    }

    pub async fn latest_scores(&self, suite: Option<Suite>) -> Result<Vec<ScoreRecord>, StoreError> {
        let conn = self.conn.lock().await;
        Ok(codegen::latest_scores(&conn, suite)?)
    }

    /// Inserts the model row on first sight, then the session + its tool
    /// execution log.
    pub async fn record_tool_session(
        &self,
        model: &str,
        vendor: &str,
        result: &ToolSessionResult,
    ) -> Result<i64, StoreError> {
        let mut conn = self.conn.lock().await;
        ensure_model(&conn, model, vendor, true)?;
        Ok(record_tool_session(&mut conn, model, vendor, result)?)
    }

    /// `None` when this (model, task) has never completed a session — the
    /// scheduler then always runs it.
    pub async fn last_tool_session_at(
        &self,
        model: &str,
        task_slug: &str,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let conn = self.conn.lock().await;
        Ok(last_tool_session_at(&conn, model, task_slug)?)
    }

    pub async fn list_models(&self) -> Result<Vec<ModelRecord>, StoreError> {
        let conn = self.conn.lock().await;
        Ok(list_models(&conn)?)
    }
}

/// Convenience used by tests elsewhere in the workspace that need a
/// default-shaped sentinel axis vector without depending on meter-scoring
/// directly.
pub fn sentinel_axes() -> AxisMetrics {
    AxisMetrics::SENTINEL
}
