use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RotaError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No active assignment for employee '{employee_id}'")]
    AssignmentNotFound { employee_id: String },

    #[error("Schedule '{schedule_id}' not found")]
    ScheduleNotFound { schedule_id: String },

    #[error("No active schedule for position '{position_id}' (work group: {work_group_id:?})")]
    NoMatchingSchedule {
        position_id: String,
        work_group_id: Option<String>,
    },

    #[error("Employee '{employee_id}' has no reference rotation week and no work group default")]
    MissingReference { employee_id: String },

    #[error("Invalid date range: {end} is before {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RotaError {
    /// Configuration problems that abort a pass and are never retried.
    /// Everything else is an infrastructure failure.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::AssignmentNotFound { .. }
                | Self::ScheduleNotFound { .. }
                | Self::NoMatchingSchedule { .. }
                | Self::MissingReference { .. }
                | Self::InvalidDateRange { .. }
        )
    }
}

pub type RotaResult<T> = Result<T, RotaError>;
