//! Shared primitive types used across the rota core.

/// A stable employee identifier, as issued by the onboarding flow.
pub type EmployeeId = String;

pub type PositionId = String;

pub type WorkGroupId = String;

pub type ScheduleId = String;

/// Identifier of one materializer pass.
pub type RunId = String;

/// A 1-based week number inside a position's repeating rotation.
pub type RotationWeek = u32;
