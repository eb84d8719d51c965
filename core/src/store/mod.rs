//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The materializer calls store methods, it never executes SQL directly.

use crate::{
    error::RotaResult,
    event::{GenerationLogEntry, GenerationRunRecord},
};
use rusqlite::{params, types::Type, Connection, OptionalExtension};

mod roster;
mod schedule;
mod shift;

pub struct RosterStore {
    conn: Connection,
}

impl RosterStore {
    pub fn open(path: &str) -> RotaResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> RotaResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order. Safe to run on every start.
    pub fn migrate(&self) -> RotaResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    /// Raw SQL for tests that need to break the store on purpose.
    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> RotaResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    // ── Generation runs ────────────────────────────────────────

    pub fn insert_generation_run(&self, run: &GenerationRunRecord) -> RotaResult<()> {
        self.conn.execute(
            "INSERT INTO generation_run (
                run_id, target, start_date, end_date, success,
                generated_count, skipped_count, failed_count, message
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                run.run_id,
                run.target,
                run.start_date,
                run.end_date,
                run.success,
                run.generated_count,
                run.skipped_count,
                run.failed_count,
                run.message,
            ],
        )?;
        Ok(())
    }

    pub fn get_generation_run(&self, run_id: &str) -> RotaResult<Option<GenerationRunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT run_id, target, start_date, end_date, success,
                        generated_count, skipped_count, failed_count, message
                 FROM generation_run WHERE run_id = ?1",
                params![run_id],
                |row| {
                    Ok(GenerationRunRecord {
                        run_id:          row.get(0)?,
                        target:          row.get(1)?,
                        start_date:      row.get(2)?,
                        end_date:        row.get(3)?,
                        success:         row.get(4)?,
                        generated_count: row.get(5)?,
                        skipped_count:   row.get(6)?,
                        failed_count:    row.get(7)?,
                        message:         row.get(8)?,
                    })
                },
            )
            .optional()?;
        Ok(run)
    }

    // ── Generation log ─────────────────────────────────────────

    pub fn append_generation_event(&self, entry: &GenerationLogEntry) -> RotaResult<()> {
        self.conn.execute(
            "INSERT INTO generation_log (run_id, employee_id, event_type, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![entry.run_id, entry.employee_id, entry.event_type, entry.payload],
        )?;
        Ok(())
    }

    pub fn generation_events(&self, run_id: &str) -> RotaResult<Vec<GenerationLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, employee_id, event_type, payload
             FROM generation_log WHERE run_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id], |row| {
                Ok(GenerationLogEntry {
                    id:          Some(row.get(0)?),
                    run_id:      row.get(1)?,
                    employee_id: row.get(2)?,
                    event_type:  row.get(3)?,
                    payload:     row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

/// Decode a JSON text column, reporting failures as a column conversion error.
fn json_column<T: serde::de::DeserializeOwned>(
    idx: usize,
    text: &str,
) -> rusqlite::Result<T> {
    serde_json::from_str(text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Decode an enum stored by name.
fn named_column<T>(idx: usize, text: &str, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    parse(text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown value '{text}'").into(),
        )
    })
}
