// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The `Model` entity: long-lived, inserted on discovery — the first time
//! a score is ever written for a (model, vendor) pair.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

#[derive(Debug, Clone, PartialEq)]
pub struct ModelRecord {
    pub name: String,
    pub vendor: String,
    pub version: Option<String>,
    pub notes: Option<String>,
    pub show_in_rankings: bool,
    pub supports_tool_calling: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert a model row the first time it's seen; a pre-existing row is left
/// untouched.
pub fn ensure_model(
    conn: &Connection,
    name: &str,
    vendor: &str,
    supports_tool_calling: bool,
) -> rusqlite::Result<()> {
    let exists: Option<i64> =
        conn.query_row("SELECT 1 FROM models WHERE name = ?1", params![name], |r| r.get(0)).optional()?;
    if exists.is_some() {
        return Ok(());
    }
    conn.execute(
        "INSERT INTO models (name, vendor, version, notes, show_in_rankings, supports_tool_calling, created_at)
         VALUES (?1, ?2, NULL, NULL, 1, ?3, ?4)",
        params![name, vendor, supports_tool_calling, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

pub fn list_models(conn: &Connection) -> rusqlite::Result<Vec<ModelRecord>> {
    let mut stmt = conn.prepare(
        "SELECT name, vendor, version, notes, show_in_rankings, supports_tool_calling, created_at FROM models ORDER BY name",
    )?;
    let rows = stmt.query_map([], |r| {
        let created_at: String = r.get(6)?;
        Ok(ModelRecord {
            name: r.get(0)?,
            vendor: r.get(1)?,
            version: r.get(2)?,
            notes: r.get(3)?,
            show_in_rankings: r.get::<_, i64>(4)? != 0,
            supports_tool_calling: r.get::<_, i64>(5)? != 0,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    })?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::init(&conn).unwrap();
        conn
    }

    #[test]
    fn ensure_model_is_idempotent() {
        let conn = conn();
        ensure_model(&conn, "gpt-4o", "openai", true).unwrap();
        ensure_model(&conn, "gpt-4o", "openai", true).unwrap();
        assert_eq!(list_models(&conn).unwrap().len(), 1);
    }

    #[test]
    fn list_models_returns_inserted_rows() {
        let conn = conn();
        ensure_model(&conn, "gpt-4o", "openai", true).unwrap();
        ensure_model(&conn, "claude-sonnet", "anthropic", true).unwrap();
        let models = list_models(&conn).unwrap();
        assert_eq!(models.len(), 2);
        assert!(models.iter().any(|m| m.name == "gpt-4o" && m.vendor == "openai"));
    }
}
