//! Generation log: what a materializer pass did, date by date.
//!
//! Every event is persisted to `generation_log` as a JSON payload next to
//! its run id, so a pass can be audited after the fact.

use crate::types::{EmployeeId, RotationWeek, RunId, ScheduleId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Variants are append-only; stored payloads must stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationEvent {
    ShiftGenerated {
        employee_id:   EmployeeId,
        date:          NaiveDate,
        shift_id:      String,
        rotation_week: RotationWeek,
        schedule_id:   ScheduleId,
    },
    /// A shift already existed for the date and was left untouched.
    ShiftSkipped {
        employee_id: EmployeeId,
        date:        NaiveDate,
    },
    DateFailed {
        employee_id: EmployeeId,
        date:        NaiveDate,
        reason:      String,
    },
    EmployeeFailed {
        employee_id: EmployeeId,
        reason:      String,
    },
    RunCompleted {
        success:         bool,
        generated_count: u32,
        skipped_count:   u32,
        failed_count:    u32,
    },
}

impl GenerationEvent {
    /// Stable name for the `event_type` column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ShiftGenerated { .. } => "shift_generated",
            Self::ShiftSkipped { .. }   => "shift_skipped",
            Self::DateFailed { .. }     => "date_failed",
            Self::EmployeeFailed { .. } => "employee_failed",
            Self::RunCompleted { .. }   => "run_completed",
        }
    }

    pub fn employee_id(&self) -> Option<&str> {
        match self {
            Self::ShiftGenerated { employee_id, .. }
            | Self::ShiftSkipped { employee_id, .. }
            | Self::DateFailed { employee_id, .. }
            | Self::EmployeeFailed { employee_id, .. } => Some(employee_id),
            Self::RunCompleted { .. } => None,
        }
    }
}

/// The log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationLogEntry {
    pub id:          Option<i64>,
    pub run_id:      RunId,
    pub employee_id: Option<EmployeeId>,
    pub event_type:  String,
    pub payload:     String, // JSON-serialized GenerationEvent
}

impl GenerationLogEntry {
    pub fn new(run_id: &str, event: &GenerationEvent) -> serde_json::Result<Self> {
        Ok(Self {
            id:          None,
            run_id:      run_id.to_string(),
            employee_id: event.employee_id().map(String::from),
            event_type:  event.type_name().to_string(),
            payload:     serde_json::to_string(event)?,
        })
    }

    pub fn event(&self) -> serde_json::Result<GenerationEvent> {
        serde_json::from_str(&self.payload)
    }
}

/// Summary row for one materializer pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRunRecord {
    pub run_id:          RunId,
    pub target:          String,
    pub start_date:      NaiveDate,
    pub end_date:        NaiveDate,
    pub success:         bool,
    pub generated_count: u32,
    pub skipped_count:   u32,
    pub failed_count:    u32,
    pub message:         String,
}
