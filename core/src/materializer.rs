//! Shift materializer: turns rotation schedules into shift records.
//!
//! For every date in an inclusive range the materializer resolves the
//! employee's rotation week, looks up the schedule template for that
//! weekday and inserts an automatic shift unless one already exists.
//!
//! RULES:
//!   - Dates are processed in ascending order, one day at a time.
//!   - Existing shifts (manual or automatic) are never modified.
//!   - A store failure on one date is logged and the loop continues.
//!   - Structural problems (no assignment, no schedule, no reference
//!     week, bad range) fail the employee or the pass, never the process.
//!   - A store failure while loading roster data aborts the pass.
//!   - Each insert commits on its own, so an interrupted pass leaves only
//!     whole records behind and a rerun fills the gaps.

use crate::{
    clock::Clock,
    config::GeneratorConfig,
    error::{RotaError, RotaResult},
    event::{GenerationEvent, GenerationLogEntry, GenerationRunRecord},
    roster::{Assignment, ReferencePoint},
    rotation::{calendar_week_tag, resolve_rotation_week, DayOfWeek},
    schedule::{ScheduleSet, TemplateLookup},
    shift::{ShiftProvenance, ShiftRecord, ShiftSource, ShiftType},
    store::RosterStore,
    types::{EmployeeId, RotationWeek, RunId, ScheduleId},
};
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Who a pass generates shifts for.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationTarget {
    Employee(EmployeeId),
    Employees(Vec<EmployeeId>),
    /// Every active assignment of the schedule's position (and work
    /// group, when the schedule has one), using only that schedule.
    Schedule(ScheduleId),
}

impl GenerationTarget {
    fn describe(&self) -> String {
        match self {
            Self::Employee(id)   => format!("employee:{id}"),
            Self::Employees(ids) => format!("employees:{}", ids.join(",")),
            Self::Schedule(id)   => format!("schedule:{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub target:     GenerationTarget,
    pub start_date: Option<NaiveDate>,
    pub end_date:   Option<NaiveDate>,
}

impl GenerationRequest {
    pub fn new(target: GenerationTarget) -> Self {
        Self { target, start_date: None, end_date: None }
    }

    pub fn for_employee(employee_id: &str) -> Self {
        Self::new(GenerationTarget::Employee(employee_id.to_string()))
    }

    pub fn for_schedule(schedule_id: &str) -> Self {
        Self::new(GenerationTarget::Schedule(schedule_id.to_string()))
    }

    pub fn between(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeOutcome {
    pub employee_id:            EmployeeId,
    pub success:                bool,
    pub generated_count:        u32,
    pub skipped_count:          u32,
    /// Working dates whose existence check or insert failed.
    pub failed_count:           u32,
    pub day_off_count:          u32,
    /// Dates with no template entry, or an unusable one. Treated as days off.
    pub missing_template_count: u32,
    pub message:                String,
}

impl EmployeeOutcome {
    fn failed(employee_id: &str, err: &RotaError) -> Self {
        Self {
            employee_id: employee_id.to_string(),
            success: false,
            message: err.to_string(),
            ..Default::default()
        }
    }

    fn summary(&self) -> String {
        format!(
            "{} generated, {} skipped, {} failed, {} days off, {} without template",
            self.generated_count,
            self.skipped_count,
            self.failed_count,
            self.day_off_count,
            self.missing_template_count,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub run_id:                 RunId,
    pub success:                bool,
    pub generated_count:        u32,
    pub skipped_count:          u32,
    pub failed_count:           u32,
    pub missing_template_count: u32,
    /// The pass stopped early on request; counts cover the work done.
    pub interrupted:            bool,
    pub start_date:             Option<NaiveDate>,
    pub end_date:               Option<NaiveDate>,
    pub message:                String,
    pub employees:              Vec<EmployeeOutcome>,
}

enum DateOutcome {
    Generated(String),
    Skipped,
}

/// What one employee's pass works against.
struct EmployeePlan {
    cycle_length: u32,
    reference:    ReferencePoint,
    schedules:    ScheduleSet,
}

pub struct ShiftMaterializer<'a> {
    store:     &'a RosterStore,
    config:    &'a GeneratorConfig,
    clock:     Clock,
    interrupt: Option<Arc<AtomicBool>>,
}

impl<'a> ShiftMaterializer<'a> {
    pub fn new(store: &'a RosterStore, config: &'a GeneratorConfig, clock: Clock) -> Self {
        Self { store, config, clock, interrupt: None }
    }

    /// Stop between two dates once `flag` is set.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Single entry point. Never fails: every problem is reported in the
    /// returned result.
    pub fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        let run_id: RunId = format!("gen-{}", uuid::Uuid::new_v4());
        let (start, end) = self.resolve_range(request);

        let mut result = GenerationResult {
            run_id: run_id.clone(),
            start_date: Some(start),
            end_date: Some(end),
            ..Default::default()
        };

        if end < start {
            let err = RotaError::InvalidDateRange { start, end };
            result.message = err.to_string();
        } else {
            let mut outcomes = Vec::new();
            let run = self.run_target(&run_id, &request.target, start, end, &mut outcomes);
            result.interrupted = self.interrupted();
            aggregate(&mut result, outcomes);
            if let Err(err) = run {
                if err.is_structural() {
                    log::warn!("generation {run_id}: {err}");
                } else {
                    log::error!("generation {run_id}: aborted: {err}");
                }
                result.success = false;
                result.message = err.to_string();
            }
        }

        self.record_run(&request.target, &result);
        log::info!(
            "generation {}: success={} generated={} skipped={} failed={}",
            result.run_id,
            result.success,
            result.generated_count,
            result.skipped_count,
            result.failed_count,
        );
        result
    }

    /// Convenience wrapper for the single-employee path.
    pub fn generate_for_employee(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> GenerationResult {
        self.generate(&GenerationRequest::for_employee(employee_id).between(start, end))
    }

    /// Missing bounds default to today and `default_range_days` after the start.
    fn resolve_range(&self, request: &GenerationRequest) -> (NaiveDate, NaiveDate) {
        let start = request.start_date.unwrap_or_else(|| self.clock.today());
        let end = request
            .end_date
            .unwrap_or_else(|| {
                start
                    .checked_add_signed(Duration::days(i64::from(self.config.default_range_days)))
                    .unwrap_or(NaiveDate::MAX)
            });
        (start, end)
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Errors returned here abort the whole pass. Outcomes of employees
    /// finished before the abort are kept in `outcomes`.
    fn run_target(
        &self,
        run_id: &str,
        target: &GenerationTarget,
        start: NaiveDate,
        end: NaiveDate,
        outcomes: &mut Vec<EmployeeOutcome>,
    ) -> RotaResult<()> {
        match target {
            GenerationTarget::Employee(employee_id) => {
                outcomes.push(self.materialize_employee(run_id, employee_id, start, end)?);
            }
            GenerationTarget::Employees(employee_ids) => {
                for employee_id in employee_ids {
                    if self.interrupted() {
                        break;
                    }
                    outcomes.push(self.materialize_employee(run_id, employee_id, start, end)?);
                }
            }
            GenerationTarget::Schedule(schedule_id) => {
                let schedule = self
                    .store
                    .get_schedule(schedule_id)?
                    .ok_or_else(|| RotaError::ScheduleNotFound {
                        schedule_id: schedule_id.clone(),
                    })?;
                let assignments = self
                    .store
                    .active_assignments_for(&schedule.position_id, schedule.work_group_id.as_deref())?;
                log::debug!(
                    "generation {run_id}: schedule {schedule_id} covers {} assignment(s)",
                    assignments.len()
                );
                for assignment in &assignments {
                    if self.interrupted() {
                        break;
                    }
                    let schedules = ScheduleSet::new(
                        vec![schedule.clone()],
                        assignment.work_group_id.as_deref(),
                    );
                    let outcome = match self.plan_for(assignment, Some(schedules)) {
                        Ok(plan) => self.materialize(run_id, assignment, &plan, start, end),
                        Err(err) if err.is_structural() => {
                            self.employee_failed(run_id, &assignment.employee_id, &err)
                        }
                        Err(err) => return Err(err),
                    };
                    outcomes.push(outcome);
                }
            }
        }
        Ok(())
    }

    /// Structural failures stay with this employee; a store failure while
    /// loading the assignment or its plan aborts the pass.
    fn materialize_employee(
        &self,
        run_id: &str,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RotaResult<EmployeeOutcome> {
        let prepared = self
            .store
            .active_assignment(employee_id)
            .and_then(|found| {
                found.ok_or_else(|| RotaError::AssignmentNotFound {
                    employee_id: employee_id.to_string(),
                })
            })
            .and_then(|assignment| {
                let plan = self.plan_for(&assignment, None)?;
                Ok((assignment, plan))
            });
        match prepared {
            Ok((assignment, plan)) => Ok(self.materialize(run_id, &assignment, &plan, start, end)),
            Err(err) if err.is_structural() => Ok(self.employee_failed(run_id, employee_id, &err)),
            Err(err) => Err(err),
        }
    }

    fn employee_failed(&self, run_id: &str, employee_id: &str, err: &RotaError) -> EmployeeOutcome {
        log::warn!("generation {run_id}: employee {employee_id} skipped: {err}");
        self.record_event(
            run_id,
            &GenerationEvent::EmployeeFailed {
                employee_id: employee_id.to_string(),
                reason: err.to_string(),
            },
        );
        EmployeeOutcome::failed(employee_id, err)
    }

    /// Load the position, reference point and schedules for one assignment.
    /// `schedules` overrides the position's active definitions.
    fn plan_for(
        &self,
        assignment: &Assignment,
        schedules: Option<ScheduleSet>,
    ) -> RotaResult<EmployeePlan> {
        let cycle_length = match self.store.get_position(&assignment.position_id)? {
            Some(position) => position.cycle_length,
            None => {
                log::warn!(
                    "position {} not found, using fallback cycle length {}",
                    assignment.position_id,
                    self.config.fallback_cycle_length
                );
                self.config.fallback_cycle_length
            }
        };

        let work_group = match assignment.work_group_id.as_deref() {
            Some(id) => self.store.get_work_group(id)?,
            None => None,
        };
        let reference = assignment
            .reference_point(work_group.as_ref(), self.clock.today())
            .ok_or_else(|| RotaError::MissingReference {
                employee_id: assignment.employee_id.clone(),
            })?;

        let schedules = match schedules {
            Some(set) => set,
            None => ScheduleSet::new(
                self.store.active_schedules_for(
                    &assignment.position_id,
                    assignment.work_group_id.as_deref(),
                )?,
                assignment.work_group_id.as_deref(),
            ),
        };
        if schedules.is_empty() {
            return Err(RotaError::NoMatchingSchedule {
                position_id: assignment.position_id.clone(),
                work_group_id: assignment.work_group_id.clone(),
            });
        }

        Ok(EmployeePlan { cycle_length, reference, schedules })
    }

    /// Walk `start..=end` for one employee.
    fn materialize(
        &self,
        run_id: &str,
        assignment: &Assignment,
        plan: &EmployeePlan,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EmployeeOutcome {
        let employee_id = assignment.employee_id.as_str();
        let mut outcome = EmployeeOutcome {
            employee_id: employee_id.to_string(),
            ..Default::default()
        };
        let mut attempted = 0u32;
        let mut stopped_at = None;

        for date in start.iter_days().take_while(|d| *d <= end) {
            if self.interrupted() {
                stopped_at = Some(date);
                break;
            }

            let rotation_week = resolve_rotation_week(
                plan.reference.rotation_week,
                plan.reference.date,
                date,
                plan.cycle_length,
            );
            let tag = calendar_week_tag(date);
            let (lookup, definition) = plan.schedules.lookup(&tag, rotation_week, DayOfWeek::of(date));

            let (start_time, end_time) = match lookup {
                TemplateLookup::Working { start, end } => (start, end),
                TemplateLookup::DayOff => {
                    outcome.day_off_count += 1;
                    continue;
                }
                TemplateLookup::Missing => {
                    outcome.missing_template_count += 1;
                    continue;
                }
                TemplateLookup::Malformed => {
                    log::warn!(
                        "employee {employee_id}: unusable template for {date} (week {rotation_week}, {tag}), treated as day off"
                    );
                    outcome.missing_template_count += 1;
                    continue;
                }
            };
            let schedule_id = definition.map(|d| d.schedule_id.clone()).unwrap_or_default();

            attempted += 1;
            let slot = ShiftSlot {
                date,
                rotation_week,
                calendar_week_tag: tag,
                schedule_id,
                start_time,
                end_time,
            };
            match self.materialize_date(run_id, assignment, slot) {
                Ok(DateOutcome::Generated(shift_id)) => {
                    outcome.generated_count += 1;
                    log::debug!("employee {employee_id}: generated shift {shift_id} on {date}");
                }
                Ok(DateOutcome::Skipped) => {
                    outcome.skipped_count += 1;
                    self.record_event(
                        run_id,
                        &GenerationEvent::ShiftSkipped {
                            employee_id: employee_id.to_string(),
                            date,
                        },
                    );
                }
                Err(err) => {
                    outcome.failed_count += 1;
                    log::warn!("employee {employee_id}: could not materialize {date}: {err}");
                    self.record_event(
                        run_id,
                        &GenerationEvent::DateFailed {
                            employee_id: employee_id.to_string(),
                            date,
                            reason: err.to_string(),
                        },
                    );
                }
            }
        }

        outcome.success = attempted == 0 || outcome.failed_count < attempted;
        outcome.message = match stopped_at {
            Some(date) => format!("{} (interrupted before {date})", outcome.summary()),
            None if !outcome.success => format!("{} (every working date failed)", outcome.summary()),
            None => outcome.summary(),
        };
        outcome
    }

    /// Check-then-insert for one date. The insert itself ignores a
    /// duplicate, so a concurrent pass that wins the race still ends in
    /// a skip rather than a second row.
    fn materialize_date(
        &self,
        run_id: &str,
        assignment: &Assignment,
        slot: ShiftSlot,
    ) -> RotaResult<DateOutcome> {
        if self.store.shift_exists(&assignment.employee_id, slot.date)? {
            return Ok(DateOutcome::Skipped);
        }

        let record = ShiftRecord {
            shift_id:      uuid::Uuid::new_v4().to_string(),
            employee_id:   assignment.employee_id.clone(),
            shift_date:    slot.date,
            shift_type:    ShiftType::classify(slot.start_time, self.config),
            start_time:    slot.start_time,
            end_time:      slot.end_time,
            position_id:   assignment.position_id.clone(),
            work_group_id: assignment.work_group_id.clone(),
            source:        ShiftSource::Auto,
            provenance:    Some(ShiftProvenance {
                rotation_week:     slot.rotation_week,
                calendar_week_tag: slot.calendar_week_tag,
                generated_at:      self.clock.now(),
                schedule_id:       slot.schedule_id.clone(),
                run_id:            run_id.to_string(),
            }),
        };

        if !self.store.insert_shift(&record)? {
            return Ok(DateOutcome::Skipped);
        }
        self.record_event(
            run_id,
            &GenerationEvent::ShiftGenerated {
                employee_id:   record.employee_id.clone(),
                date:          record.shift_date,
                shift_id:      record.shift_id.clone(),
                rotation_week: slot.rotation_week,
                schedule_id:   slot.schedule_id,
            },
        );
        Ok(DateOutcome::Generated(record.shift_id))
    }

    /// Audit writes never change the outcome of a pass.
    fn record_event(&self, run_id: &str, event: &GenerationEvent) {
        let written = GenerationLogEntry::new(run_id, event)
            .map_err(RotaError::from)
            .and_then(|entry| self.store.append_generation_event(&entry));
        if let Err(err) = written {
            log::warn!("generation {run_id}: could not log {}: {err}", event.type_name());
        }
    }

    fn record_run(&self, target: &GenerationTarget, result: &GenerationResult) {
        self.record_event(
            &result.run_id,
            &GenerationEvent::RunCompleted {
                success:         result.success,
                generated_count: result.generated_count,
                skipped_count:   result.skipped_count,
                failed_count:    result.failed_count,
            },
        );
        let (Some(start_date), Some(end_date)) = (result.start_date, result.end_date) else {
            return;
        };
        let run = GenerationRunRecord {
            run_id:          result.run_id.clone(),
            target:          target.describe(),
            start_date,
            end_date,
            success:         result.success,
            generated_count: result.generated_count,
            skipped_count:   result.skipped_count,
            failed_count:    result.failed_count,
            message:         result.message.clone(),
        };
        if let Err(err) = self.store.insert_generation_run(&run) {
            log::warn!("generation {}: could not record run: {err}", result.run_id);
        }
    }
}

fn aggregate(result: &mut GenerationResult, outcomes: Vec<EmployeeOutcome>) {
    for o in &outcomes {
        result.generated_count += o.generated_count;
        result.skipped_count += o.skipped_count;
        result.failed_count += o.failed_count;
        result.missing_template_count += o.missing_template_count;
    }
    result.success = outcomes.is_empty() || outcomes.iter().any(|o| o.success);

    let failures: Vec<String> = outcomes
        .iter()
        .filter(|o| !o.success)
        .map(|o| format!("{}: {}", o.employee_id, o.message))
        .collect();
    let mut message = match outcomes.as_slice() {
        [] => "no active assignments to generate for".to_string(),
        [single] => single.message.clone(),
        many => format!(
            "{} employee(s): {} generated, {} skipped, {} failed",
            many.len(),
            result.generated_count,
            result.skipped_count,
            result.failed_count,
        ),
    };
    if outcomes.len() > 1 && !failures.is_empty() {
        message.push_str(&format!("; failures: {}", failures.join("; ")));
    }
    if result.interrupted && outcomes.len() != 1 {
        message.push_str(" (interrupted)");
    }
    result.message = message;
    result.employees = outcomes;
}

/// One working date, resolved and ready to insert.
struct ShiftSlot {
    date:              NaiveDate,
    rotation_week:     RotationWeek,
    calendar_week_tag: String,
    schedule_id:       ScheduleId,
    start_time:        NaiveTime,
    end_time:          NaiveTime,
}
