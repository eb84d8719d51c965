//! Materialized shift records.

use crate::{
    config::GeneratorConfig,
    types::{EmployeeId, PositionId, RotationWeek, RunId, ScheduleId, WorkGroupId},
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftType {
    Morning,
    Afternoon,
    Night,
}

impl ShiftType {
    /// Classify by start hour: `[morning, afternoon)` is a morning shift,
    /// `[afternoon, night)` an afternoon shift, everything else night.
    pub fn classify(start: NaiveTime, config: &GeneratorConfig) -> Self {
        let hour = start.hour();
        if (config.morning_start_hour..config.afternoon_start_hour).contains(&hour) {
            Self::Morning
        } else if (config.afternoon_start_hour..config.night_start_hour).contains(&hour) {
            Self::Afternoon
        } else {
            Self::Night
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning   => "morning",
            Self::Afternoon => "afternoon",
            Self::Night     => "night",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "morning"   => Some(Self::Morning),
            "afternoon" => Some(Self::Afternoon),
            "night"     => Some(Self::Night),
            _ => None,
        }
    }
}

/// Who created a shift. The materializer only ever writes `Auto` rows
/// and never touches `Manual` ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftSource {
    Auto,
    Manual,
}

impl ShiftSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto   => "auto",
            Self::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "auto"   => Some(Self::Auto),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// How an automatic shift came to be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftProvenance {
    pub rotation_week:     RotationWeek,
    pub calendar_week_tag: String,
    pub generated_at:      NaiveDateTime,
    pub schedule_id:       ScheduleId,
    pub run_id:            RunId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftRecord {
    pub shift_id:      String,
    pub employee_id:   EmployeeId,
    pub shift_date:    NaiveDate,
    pub shift_type:    ShiftType,
    pub start_time:    NaiveTime,
    pub end_time:      NaiveTime,
    pub position_id:   PositionId,
    pub work_group_id: Option<WorkGroupId>,
    pub source:        ShiftSource,
    pub provenance:    Option<ShiftProvenance>,
}

impl ShiftRecord {
    /// A manually entered shift, as the user-facing shift editor creates it.
    pub fn manual(
        employee_id: &str,
        position_id: &str,
        shift_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        config: &GeneratorConfig,
    ) -> Self {
        Self {
            shift_id: uuid::Uuid::new_v4().to_string(),
            employee_id: employee_id.to_string(),
            shift_date,
            shift_type: ShiftType::classify(start_time, config),
            start_time,
            end_time,
            position_id: position_id.to_string(),
            work_group_id: None,
            source: ShiftSource::Manual,
            provenance: None,
        }
    }
}
