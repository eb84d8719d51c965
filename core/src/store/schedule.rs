use super::{json_column, RosterStore};
use crate::{error::RotaResult, schedule::ScheduleDefinition};
use rusqlite::{params, OptionalExtension, Row};

fn schedule_from_row(row: &Row<'_>) -> rusqlite::Result<ScheduleDefinition> {
    let data: String = row.get(5)?;
    Ok(ScheduleDefinition {
        schedule_id:       row.get(0)?,
        position_id:       row.get(1)?,
        work_group_id:     row.get(2)?,
        calendar_week_tag: row.get(3)?,
        is_active:         row.get(4)?,
        data:              json_column(5, &data)?,
    })
}

impl RosterStore {
    // ── Schedule definitions ───────────────────────────────────

    pub fn insert_schedule(&self, s: &ScheduleDefinition) -> RotaResult<()> {
        self.conn.execute(
            "INSERT INTO schedule_definition (
                schedule_id, position_id, work_group_id, calendar_week_tag,
                is_annual_plan, is_active, schedule_data
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                s.schedule_id,
                s.position_id,
                s.work_group_id,
                s.calendar_week_tag,
                s.is_annual_plan(),
                s.is_active,
                serde_json::to_string(&s.data)?,
            ],
        )?;
        Ok(())
    }

    pub fn get_schedule(&self, schedule_id: &str) -> RotaResult<Option<ScheduleDefinition>> {
        let schedule = self
            .conn
            .query_row(
                "SELECT schedule_id, position_id, work_group_id, calendar_week_tag,
                        is_active, schedule_data
                 FROM schedule_definition WHERE schedule_id = ?1",
                params![schedule_id],
                schedule_from_row,
            )
            .optional()?;
        Ok(schedule)
    }

    /// Active definitions for a position: the position-wide ones plus
    /// those of `work_group_id` when given.
    pub fn active_schedules_for(
        &self,
        position_id: &str,
        work_group_id: Option<&str>,
    ) -> RotaResult<Vec<ScheduleDefinition>> {
        let mut stmt = self.conn.prepare(
            "SELECT schedule_id, position_id, work_group_id, calendar_week_tag,
                    is_active, schedule_data
             FROM schedule_definition
             WHERE position_id = ?1 AND is_active = 1
               AND (work_group_id IS NULL OR work_group_id = ?2)
             ORDER BY is_annual_plan DESC, schedule_id ASC",
        )?;
        let rows = stmt.query_map(params![position_id, work_group_id], schedule_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
