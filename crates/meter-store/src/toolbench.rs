// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Persists a tool-calling session (`ToolSession`/`ToolExecution` rows)
//! and answers the scheduler's recency-skip query for the tooling suite.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use meter_toolbench::{SessionStatus, ToolSessionResult};

fn status_str(status: &SessionStatus) -> &'static str {
    match status {
        SessionStatus::Running => "running",
        SessionStatus::Completed => "completed",
        SessionStatus::Failed => "failed",
        SessionStatus::Timedout => "timedout",
    }
}

/// Writes the session row plus one row per logged tool call. Returns the
/// new session id.
pub fn record_tool_session(
    conn: &mut Connection,
    model: &str,
    vendor: &str,
    result: &ToolSessionResult,
) -> rusqlite::Result<i64> {
    let tx = conn.transaction()?;

    let conversation_json = serde_json::to_string(&result.conversation).unwrap_or_default();
    let error_log_json = serde_json::to_string(&result.error_log).unwrap_or_default();
    let started_at = result.completed_at - chrono::Duration::milliseconds(result.total_latency_ms as i64);

    tx.execute(
        "INSERT INTO tool_sessions (model, vendor, task_slug, status, sandbox_id, turns, total_latency_ms,
            total_tokens_in, total_tokens_out, tool_calls_count, successful_tool_calls, failed_tool_calls,
            passed, final_score, conversation_data, error_log, started_at, completed_at)
         VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            model,
            vendor,
            result.task_slug,
            status_str(&result.status),
            result.turns,
            result.total_latency_ms as i64,
            result.total_tokens_in,
            result.total_tokens_out,
            result.tool_calls_count,
            result.successful_tool_calls,
            result.failed_tool_calls,
            result.passed,
            result.final_score,
            conversation_json,
            error_log_json,
            started_at.to_rfc3339(),
            result.completed_at.to_rfc3339(),
        ],
    )?;
    let session_id = tx.last_insert_rowid();

    for call in &result.tool_call_history {
        let params_json = serde_json::to_string(&call.parameters).unwrap_or_default();
        tx.execute(
            "INSERT INTO tool_executions (session_id, turn_number, tool_name, parameters, result, success, latency_ms, error_message, ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                session_id,
                call.turn_number,
                call.tool_name,
                params_json,
                call.result,
                call.success,
                call.latency_ms as i64,
                call.error_message,
                call.ts.to_rfc3339(),
            ],
        )?;
    }

    tx.commit()?;
    Ok(session_id)
}

/// Timestamp of the most recent completed session for this (model, task),
/// if any — the scheduler skips re-running a task within the recency
/// window.
pub fn last_tool_session_at(
    conn: &Connection,
    model: &str,
    task_slug: &str,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let ts: Option<String> = conn
        .query_row(
            "SELECT completed_at FROM tool_sessions WHERE model = ?1 AND task_slug = ?2 AND completed_at IS NOT NULL
             ORDER BY completed_at DESC LIMIT 1",
            params![model, task_slug],
            |r| r.get(0),
        )
        .optional()?;
    Ok(ts.and_then(|s| DateTime::parse_from_rfc3339(&s).ok().map(|dt| dt.with_timezone(&Utc))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use meter_model::Message;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::schema::init(&conn).unwrap();
        conn
    }

    fn sample_result(status: SessionStatus) -> ToolSessionResult {
        ToolSessionResult {
            task_slug: "s3/file-ops".to_string(),
            status,
            turns: 4,
            total_latency_ms: 3200,
            total_tokens_in: 512,
            total_tokens_out: 128,
            tool_calls_count: 2,
            successful_tool_calls: 2,
            failed_tool_calls: 0,
            passed: true,
            final_score: 88.5,
            conversation: vec![Message::user("do the task")],
            tool_call_history: vec![],
            error_log: vec![],
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn record_then_read_back_recency() {
        let mut conn = conn();
        let result = sample_result(SessionStatus::Completed);
        record_tool_session(&mut conn, "gpt-4o", "openai", &result).unwrap();

        let last = last_tool_session_at(&conn, "gpt-4o", "s3/file-ops").unwrap();
        assert!(last.is_some());
    }

    #[test]
    fn recency_is_none_for_unseen_task() {
        let conn = conn();
        assert!(last_tool_session_at(&conn, "gpt-4o", "nonexistent").unwrap().is_none());
    }
}
