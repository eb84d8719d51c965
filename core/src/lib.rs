//! Shift-rotation core: resolves which rotation week applies on a date
//! and materializes shift records from imported schedules.

pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod materializer;
pub mod roster;
pub mod rotation;
pub mod schedule;
pub mod shift;
pub mod store;
pub mod types;
