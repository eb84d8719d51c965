use super::{json_column, named_column, RosterStore};
use crate::{
    error::RotaResult,
    shift::{ShiftRecord, ShiftSource, ShiftType},
};
use chrono::NaiveDate;
use rusqlite::{params, Row};

fn shift_from_row(row: &Row<'_>) -> rusqlite::Result<ShiftRecord> {
    let shift_type: String = row.get(3)?;
    let source: String = row.get(8)?;
    let metadata: Option<String> = row.get(9)?;
    Ok(ShiftRecord {
        shift_id:      row.get(0)?,
        employee_id:   row.get(1)?,
        shift_date:    row.get(2)?,
        shift_type:    named_column(3, &shift_type, ShiftType::parse)?,
        start_time:    row.get(4)?,
        end_time:      row.get(5)?,
        position_id:   row.get(6)?,
        work_group_id: row.get(7)?,
        source:        named_column(8, &source, ShiftSource::parse)?,
        provenance:    metadata.as_deref().map(|m| json_column(9, m)).transpose()?,
    })
}

impl RosterStore {
    // ── Shift records ──────────────────────────────────────────

    /// Whether any shift, automatic or manual, exists for the employee on `date`.
    pub fn shift_exists(&self, employee_id: &str, date: NaiveDate) -> RotaResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM shift_record WHERE employee_id = ?1 AND shift_date = ?2
             )",
            params![employee_id, date],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Insert a shift unless the per-day uniqueness index already holds
    /// one. Returns `false` when the row was ignored as a duplicate.
    pub fn insert_shift(&self, s: &ShiftRecord) -> RotaResult<bool> {
        let metadata = s.provenance.as_ref().map(serde_json::to_string).transpose()?;
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO shift_record (
                shift_id, employee_id, shift_date, shift_type, start_time, end_time,
                position_id, work_group_id, source, source_metadata
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                s.shift_id,
                s.employee_id,
                s.shift_date,
                s.shift_type.as_str(),
                s.start_time,
                s.end_time,
                s.position_id,
                s.work_group_id,
                s.source.as_str(),
                metadata,
            ],
        )?;
        Ok(changed == 1)
    }

    /// Shifts for one employee within `start..=end`, ordered by date.
    pub fn shifts_for_employee(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RotaResult<Vec<ShiftRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT shift_id, employee_id, shift_date, shift_type, start_time, end_time,
                    position_id, work_group_id, source, source_metadata
             FROM shift_record
             WHERE employee_id = ?1 AND shift_date >= ?2 AND shift_date <= ?3
             ORDER BY shift_date ASC, start_time ASC",
        )?;
        let rows = stmt.query_map(params![employee_id, start, end], shift_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn shift_count(&self, employee_id: &str) -> RotaResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM shift_record WHERE employee_id = ?1",
            params![employee_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
