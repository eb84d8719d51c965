use super::RosterStore;
use crate::{
    error::RotaResult,
    roster::{Assignment, Position, WorkGroup},
};
use rusqlite::{params, OptionalExtension, Row};

fn assignment_from_row(row: &Row<'_>) -> rusqlite::Result<Assignment> {
    Ok(Assignment {
        employee_id:             row.get(0)?,
        position_id:             row.get(1)?,
        work_group_id:           row.get(2)?,
        reference_date:          row.get(3)?,
        reference_rotation_week: row.get(4)?,
        is_active:               row.get(5)?,
    })
}

impl RosterStore {
    // ── Position ───────────────────────────────────────────────

    pub fn insert_position(&self, p: &Position) -> RotaResult<()> {
        self.conn.execute(
            "INSERT INTO position (position_id, name, cycle_length) VALUES (?1, ?2, ?3)",
            params![p.position_id, p.name, p.cycle_length],
        )?;
        Ok(())
    }

    pub fn get_position(&self, position_id: &str) -> RotaResult<Option<Position>> {
        let position = self
            .conn
            .query_row(
                "SELECT position_id, name, cycle_length FROM position WHERE position_id = ?1",
                params![position_id],
                |row| {
                    Ok(Position {
                        position_id:  row.get(0)?,
                        name:         row.get(1)?,
                        cycle_length: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(position)
    }

    // ── Work group ─────────────────────────────────────────────

    pub fn insert_work_group(&self, wg: &WorkGroup) -> RotaResult<()> {
        self.conn.execute(
            "INSERT INTO work_group (work_group_id, position_id, name, default_rotation_week)
             VALUES (?1, ?2, ?3, ?4)",
            params![wg.work_group_id, wg.position_id, wg.name, wg.default_rotation_week],
        )?;
        Ok(())
    }

    pub fn get_work_group(&self, work_group_id: &str) -> RotaResult<Option<WorkGroup>> {
        let work_group = self
            .conn
            .query_row(
                "SELECT work_group_id, position_id, name, default_rotation_week
                 FROM work_group WHERE work_group_id = ?1",
                params![work_group_id],
                |row| {
                    Ok(WorkGroup {
                        work_group_id:         row.get(0)?,
                        position_id:           row.get(1)?,
                        name:                  row.get(2)?,
                        default_rotation_week: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(work_group)
    }

    // ── Assignment ─────────────────────────────────────────────

    pub fn insert_assignment(&self, a: &Assignment) -> RotaResult<()> {
        self.conn.execute(
            "INSERT INTO assignment (
                employee_id, position_id, work_group_id,
                reference_date, reference_rotation_week, is_active
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                a.employee_id,
                a.position_id,
                a.work_group_id,
                a.reference_date,
                a.reference_rotation_week,
                a.is_active,
            ],
        )?;
        Ok(())
    }

    /// The employee's current assignment; the most recently recorded one
    /// wins if onboarding left several active rows behind.
    pub fn active_assignment(&self, employee_id: &str) -> RotaResult<Option<Assignment>> {
        let assignment = self
            .conn
            .query_row(
                "SELECT employee_id, position_id, work_group_id,
                        reference_date, reference_rotation_week, is_active
                 FROM assignment
                 WHERE employee_id = ?1 AND is_active = 1
                 ORDER BY id DESC LIMIT 1",
                params![employee_id],
                assignment_from_row,
            )
            .optional()?;
        Ok(assignment)
    }

    /// Active assignments for a position, narrowed to one work group when
    /// given. Ordered by employee id.
    pub fn active_assignments_for(
        &self,
        position_id: &str,
        work_group_id: Option<&str>,
    ) -> RotaResult<Vec<Assignment>> {
        let mut stmt = self.conn.prepare(
            "SELECT employee_id, position_id, work_group_id,
                    reference_date, reference_rotation_week, is_active
             FROM assignment
             WHERE position_id = ?1 AND is_active = 1
               AND (?2 IS NULL OR work_group_id = ?2)
             ORDER BY employee_id ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![position_id, work_group_id], assignment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
