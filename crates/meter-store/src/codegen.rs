// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Persists a code-gen suite tick: one `runs` + `metrics` row per trial
//! that produced a usable code attempt, one `scores` row for the
//! suite-level snapshot.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use meter_codegen::CodegenSuiteResult;
use meter_scoring::{AxisMetrics, StupidScore, Suite};

use crate::hash::short_hash;

#[derive(Debug, Clone)]
pub struct ScoreRecord {
    pub model: String,
    pub vendor: String,
    pub suite: Suite,
    pub batch_ts: DateTime<Utc>,
    pub ts: DateTime<Utc>,
    pub stupid_score: StupidScore,
    pub axes: AxisMetrics,
    pub cusum: Option<f64>,
    pub note: Option<String>,
}

/// Writes every successful trial's `runs`+`metrics` row, then the
/// suite-level `scores` snapshot. Returns the new score row id.
pub fn record_codegen_result(
    conn: &mut Connection,
    suite: Suite,
    batch_ts: DateTime<Utc>,
    result: &CodegenSuiteResult,
) -> rusqlite::Result<i64> {
    let tx = conn.transaction()?;

    for task in &result.tasks {
        for trial in &task.trials {
            let code_hash = trial.code.as_deref().map(short_hash);
            tx.execute(
                "INSERT INTO runs (model, vendor, task_slug, batch_ts, ts, temp_seed, tokens_in, tokens_out, latency_ms, attempts, passed, artifact_hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    result.model,
                    result.vendor,
                    task.task_slug,
                    batch_ts.to_rfc3339(),
                    trial.ts.to_rfc3339(),
                    0.7_f64,
                    trial.tokens_in,
                    trial.tokens_out,
                    trial.latency_ms as i64,
                    trial.attempts,
                    trial.succeeded(),
                    code_hash,
                ],
            )?;
            if let Some(metrics) = trial.metrics {
                let run_id = tx.last_insert_rowid();
                insert_metrics(&tx, run_id, &metrics)?;
            }
        }
    }

    let axes_json = serde_json::to_string(&result.axes).expect("AxisMetrics always serializes");
    let ts = Utc::now();
    tx.execute(
        "INSERT INTO scores (model, vendor, suite, batch_ts, ts, stupid_score, axes, cusum, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8)",
        params![
            result.model,
            result.vendor,
            suite.as_str(),
            batch_ts.to_rfc3339(),
            ts.to_rfc3339(),
            result.stupid_score.raw(),
            axes_json,
            result.note,
        ],
    )?;
    let score_id = tx.last_insert_rowid();
    tx.commit()?;
    Ok(score_id)
}

fn insert_metrics(tx: &rusqlite::Transaction<'_>, run_id: i64, m: &AxisMetrics) -> rusqlite::Result<()> {
    tx.execute(
        "INSERT INTO metrics (run_id, correctness, complexity, code_quality, efficiency, stability, edge_cases, debugging)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![run_id, m.correctness, m.complexity, m.code_quality, m.efficiency, m.stability, m.edge_cases, m.debugging],
    )?;
    Ok(())
}

/// Recent non-sentinel axis vectors for a (model, suite) pair, newest-first,
/// capped at `limit`. Sentinel rows are excluded in SQL before `LIMIT` is
/// applied, so a run of sentinel scores can't starve the baseline window.
pub fn recent_axis_history(
    conn: &Connection,
    model: &str,
    suite: Suite,
    limit: usize,
) -> rusqlite::Result<Vec<AxisMetrics>> {
    let mut stmt = conn.prepare(
        "SELECT axes, stupid_score FROM scores
         WHERE model = ?1 AND suite = ?2 AND stupid_score >= 0
         ORDER BY ts DESC LIMIT ?3",
    )?;
    let rows = stmt.query_map(params![model, suite.as_str(), limit as i64], |r| {
        let axes_json: String = r.get(0)?;
        let raw: f64 = r.get(1)?;
        Ok((axes_json, raw))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (axes_json, raw) = row?;
        debug_assert!(!StupidScore::from_raw(raw).is_sentinel(), "sentinel row leaked past the SQL filter");
        if let Ok(axes) = serde_json::from_str::<AxisMetrics>(&axes_json) {
            out.push(axes);
        }
    }
    Ok(out)
}

/// Most recent score per model, optionally filtered to one suite — the
/// query the dashboard cache fills on a miss.
pub fn latest_scores(conn: &Connection, suite: Option<Suite>) -> rusqlite::Result<Vec<ScoreRecord>> {
    let sql = match suite {
        Some(_) => {
            "SELECT model, vendor, suite, batch_ts, ts, stupid_score, axes, cusum, note FROM scores s1
             WHERE suite = ?1 AND ts = (SELECT MAX(ts) FROM scores s2 WHERE s2.model = s1.model AND s2.suite = s1.suite)
             ORDER BY model"
        }
        None => {
            "SELECT model, vendor, suite, batch_ts, ts, stupid_score, axes, cusum, note FROM scores s1
             WHERE ts = (SELECT MAX(ts) FROM scores s2 WHERE s2.model = s1.model AND s2.suite = s1.suite)
             ORDER BY model, suite"
        }
    };
    let mut stmt = conn.prepare(sql)?;
    let map_row = |r: &rusqlite::Row| -> rusqlite::Result<ScoreRecord> {
        let suite_str: String = r.get(2)?;
        let batch_ts: String = r.get(3)?;
        let ts: String = r.get(4)?;
        let raw: f64 = r.get(5)?;
        let axes_json: String = r.get(6)?;
        Ok(ScoreRecord {
            model: r.get(0)?,
            vendor: r.get(1)?,
            suite: parse_suite(&suite_str),
            batch_ts: parse_ts(&batch_ts),
            ts: parse_ts(&ts),
            stupid_score: StupidScore::from_raw(raw),
            axes: serde_json::from_str(&axes_json).unwrap_or(AxisMetrics::SENTINEL),
            cusum: r.get(7)?,
            note: r.get(8)?,
        })
    };

    let rows = if let Some(suite) = suite {
        stmt.query_map(params![suite.as_str()], map_row)?.collect::<rusqlite::Result<Vec<_>>>()?
    } else {
        stmt.query_map([], map_row)?.collect::<rusqlite::Result<Vec<_>>>()?
    };
    Ok(rows)
}

fn parse_suite(s: &str) -> Suite {
    match s {
        "deep" => Suite::Deep,
        "tooling" => Suite::Tooling,
        _ => Suite::Hourly,
    }
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)).unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use meter_codegen::TaskOutcome;
    use meter_scoring::Sentinel;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::schema::init(&conn).unwrap();
        conn
    }

    fn sample_result(stupid_score: StupidScore, axes: AxisMetrics) -> CodegenSuiteResult {
        CodegenSuiteResult {
            model: "gpt-4o".to_string(),
            vendor: "openai".to_string(),
            suite: Suite::Hourly,
            stupid_score,
            axes,
            note: None,
            tasks: vec![TaskOutcome { task_slug: "py/is_palindrome".to_string(), trials: vec![], collapsed: Some(axes) }],
        }
    }

    #[test]
    fn record_then_read_back_latest_score() {
        let mut conn = conn();
        let result = sample_result(StupidScore::Numeric(72.0), AxisMetrics::uniform(0.8));
        record_codegen_result(&mut conn, Suite::Hourly, Utc::now(), &result).unwrap();

        let latest = latest_scores(&conn, Some(Suite::Hourly)).unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].stupid_score, StupidScore::Numeric(72.0));
    }

    #[test]
    fn sentinel_scores_excluded_from_baseline_history() {
        let mut conn = conn();
        let sentinel = sample_result(StupidScore::Sentinel(Sentinel::AllTasksFailed), AxisMetrics::SENTINEL);
        record_codegen_result(&mut conn, Suite::Hourly, Utc::now(), &sentinel).unwrap();
        let numeric = sample_result(StupidScore::Numeric(80.0), AxisMetrics::uniform(0.9));
        record_codegen_result(&mut conn, Suite::Hourly, Utc::now(), &numeric).unwrap();

        let history = recent_axis_history(&conn, "gpt-4o", Suite::Hourly, 50).unwrap();
        assert_eq!(history.len(), 1);
        assert!((history[0].correctness - 0.9).abs() < 1e-9);
    }

    #[test]
    fn history_is_capped_at_requested_limit() {
        let mut conn = conn();
        for i in 0..5 {
            let result = sample_result(StupidScore::Numeric(50.0 + i as f64), AxisMetrics::uniform(0.5));
            record_codegen_result(&mut conn, Suite::Hourly, Utc::now(), &result).unwrap();
        }
        let history = recent_axis_history(&conn, "gpt-4o", Suite::Hourly, 3).unwrap();
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn sentinel_rows_interleaved_with_recent_scores_dont_starve_the_window() {
        let mut conn = conn();
        // Oldest-first: 2 numeric, then 3 sentinel, then 2 numeric (most recent).
        for _ in 0..2 {
            let result = sample_result(StupidScore::Numeric(40.0), AxisMetrics::uniform(0.4));
            record_codegen_result(&mut conn, Suite::Hourly, Utc::now(), &result).unwrap();
        }
        for _ in 0..3 {
            let sentinel = sample_result(StupidScore::Sentinel(Sentinel::AdapterValidationFailed), AxisMetrics::SENTINEL);
            record_codegen_result(&mut conn, Suite::Hourly, Utc::now(), &sentinel).unwrap();
        }
        for _ in 0..2 {
            let result = sample_result(StupidScore::Numeric(90.0), AxisMetrics::uniform(0.9));
            record_codegen_result(&mut conn, Suite::Hourly, Utc::now(), &result).unwrap();
        }

        // A naive "ORDER BY ts DESC LIMIT 3, then filter sentinels" would
        // return only the 2 trailing numeric rows. Filtering in SQL before
        // LIMIT must still surface all 4 numeric rows up to the cap.
        let history = recent_axis_history(&conn, "gpt-4o", Suite::Hourly, 3).unwrap();
        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|a| a.correctness > 0.0));
    }
}
