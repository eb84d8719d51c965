//! Positions, work groups and the assignments binding employees to them.
//!
//! All three are read-only inputs: they are created by onboarding and
//! import flows and never mutated by the materializer.

use crate::types::{EmployeeId, PositionId, RotationWeek, WorkGroupId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub position_id:  PositionId,
    pub name:         String,
    /// Number of distinct rotation weeks before the pattern repeats.
    pub cycle_length: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkGroup {
    pub work_group_id:         WorkGroupId,
    pub position_id:           PositionId,
    pub name:                  String,
    pub default_rotation_week: RotationWeek,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub employee_id:             EmployeeId,
    pub position_id:             PositionId,
    #[serde(default)]
    pub work_group_id:           Option<WorkGroupId>,
    #[serde(default)]
    pub reference_date:          Option<NaiveDate>,
    #[serde(default)]
    pub reference_rotation_week: Option<RotationWeek>,
    #[serde(default = "active_by_default")]
    pub is_active:               bool,
}

fn active_by_default() -> bool {
    true
}

/// A known (date, rotation week) pair from which every other date's
/// rotation week is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferencePoint {
    pub date:          NaiveDate,
    pub rotation_week: RotationWeek,
}

impl Assignment {
    /// The personal reference point when both halves are recorded,
    /// otherwise the work group's default week anchored at `today`.
    pub fn reference_point(
        &self,
        work_group: Option<&WorkGroup>,
        today: NaiveDate,
    ) -> Option<ReferencePoint> {
        match (self.reference_date, self.reference_rotation_week) {
            (Some(date), Some(rotation_week)) => Some(ReferencePoint { date, rotation_week }),
            _ => work_group.map(|wg| ReferencePoint {
                date: today,
                rotation_week: wg.default_rotation_week,
            }),
        }
    }
}
