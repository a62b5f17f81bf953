// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Plain `CREATE TABLE IF NOT EXISTS` schema init — no migration
//! framework, matching the simplicity of a single-`Connection` store.
//!
//! Table shapes mirror the domain entities directly: `models`, `runs`
//! (one row per code-gen trial), `metrics` (a run's seven-axis vector),
//! `scores` (the append-only per-model/suite/tick snapshot),
//! `tool_sessions`, and `tool_executions`.

use rusqlite::Connection;

pub fn init(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS models (
            name                  TEXT PRIMARY KEY,
            vendor                TEXT NOT NULL,
            version               TEXT,
            notes                 TEXT,
            show_in_rankings      INTEGER NOT NULL DEFAULT 1,
            supports_tool_calling INTEGER NOT NULL DEFAULT 0,
            created_at            TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS runs (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            model         TEXT NOT NULL,
            vendor        TEXT NOT NULL,
            task_slug     TEXT NOT NULL,
            batch_ts      TEXT NOT NULL,
            ts            TEXT NOT NULL,
            temp_seed     REAL NOT NULL,
            tokens_in     INTEGER NOT NULL,
            tokens_out    INTEGER NOT NULL,
            latency_ms    INTEGER NOT NULL,
            attempts      INTEGER NOT NULL,
            passed        INTEGER NOT NULL,
            artifact_hash TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_runs_model_task ON runs (model, task_slug, ts DESC);

        CREATE TABLE IF NOT EXISTS metrics (
            run_id       INTEGER PRIMARY KEY REFERENCES runs(id),
            correctness  REAL NOT NULL,
            complexity   REAL NOT NULL,
            code_quality REAL NOT NULL,
            efficiency   REAL NOT NULL,
            stability    REAL NOT NULL,
            edge_cases   REAL NOT NULL,
            debugging    REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS scores (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            model        TEXT NOT NULL,
            vendor       TEXT NOT NULL,
            suite        TEXT NOT NULL,
            batch_ts     TEXT NOT NULL,
            ts           TEXT NOT NULL,
            stupid_score REAL NOT NULL,
            axes         TEXT NOT NULL,
            cusum        REAL,
            note         TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_scores_model_suite_ts ON scores (model, suite, ts DESC);

        CREATE TABLE IF NOT EXISTS tool_sessions (
            id                    INTEGER PRIMARY KEY AUTOINCREMENT,
            model                 TEXT NOT NULL,
            vendor                TEXT NOT NULL,
            task_slug             TEXT NOT NULL,
            status                TEXT NOT NULL,
            sandbox_id            TEXT,
            turns                 INTEGER NOT NULL DEFAULT 0,
            total_latency_ms      INTEGER NOT NULL DEFAULT 0,
            total_tokens_in       INTEGER NOT NULL DEFAULT 0,
            total_tokens_out      INTEGER NOT NULL DEFAULT 0,
            tool_calls_count      INTEGER NOT NULL DEFAULT 0,
            successful_tool_calls INTEGER NOT NULL DEFAULT 0,
            failed_tool_calls     INTEGER NOT NULL DEFAULT 0,
            passed                INTEGER NOT NULL DEFAULT 0,
            final_score           REAL NOT NULL DEFAULT 0,
            conversation_data     TEXT,
            error_log             TEXT,
            started_at            TEXT NOT NULL,
            completed_at          TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_tool_sessions_model_task ON tool_sessions (model, task_slug, started_at DESC);

        CREATE TABLE IF NOT EXISTS tool_executions (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id    INTEGER NOT NULL REFERENCES tool_sessions(id),
            turn_number   INTEGER NOT NULL,
            tool_name     TEXT NOT NULL,
            parameters    TEXT NOT NULL,
            result        TEXT NOT NULL,
            success       INTEGER NOT NULL,
            latency_ms    INTEGER NOT NULL,
            error_message TEXT,
            ts            TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_tool_executions_session ON tool_executions (session_id, turn_number);
        "#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init(&conn).unwrap();
        init(&conn).unwrap();
    }
}
