//! Store round trips and the per-day uniqueness rule for automatic shifts.

use chrono::{NaiveDate, NaiveTime};
use rotaplan_core::{
    config::GeneratorConfig,
    roster::{Assignment, Position, WorkGroup},
    schedule::{ScheduleDefinition, TemplateLookup},
    rotation::DayOfWeek,
    shift::{ShiftProvenance, ShiftRecord, ShiftSource, ShiftType},
    store::RosterStore,
};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn store() -> RosterStore {
    let store = RosterStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

fn auto_shift(employee_id: &str, date: NaiveDate) -> ShiftRecord {
    ShiftRecord {
        shift_id: uuid::Uuid::new_v4().to_string(),
        employee_id: employee_id.into(),
        shift_date: date,
        shift_type: ShiftType::Night,
        start_time: hm(22, 0),
        end_time: hm(6, 0),
        position_id: "driver".into(),
        work_group_id: Some("wg-1".into()),
        source: ShiftSource::Auto,
        provenance: Some(ShiftProvenance {
            rotation_week: 3,
            calendar_week_tag: "KW10".into(),
            generated_at: ymd(2024, 3, 1).and_hms_opt(7, 30, 0).unwrap(),
            schedule_id: "sched-1".into(),
            run_id: "gen-test".into(),
        }),
    }
}

#[test]
fn migrate_is_repeatable() {
    let store = store();
    store.migrate().expect("second migration");
}

#[test]
fn positions_and_work_groups_round_trip() {
    let store = store();
    let position = Position { position_id: "driver".into(), name: "Fahrer".into(), cycle_length: 6 };
    let group = WorkGroup {
        work_group_id: "wg-1".into(),
        position_id: "driver".into(),
        name: "Tour Nord".into(),
        default_rotation_week: 4,
    };
    store.insert_position(&position).unwrap();
    store.insert_work_group(&group).unwrap();

    assert_eq!(store.get_position("driver").unwrap(), Some(position));
    assert_eq!(store.get_work_group("wg-1").unwrap(), Some(group));
    assert_eq!(store.get_position("pilot").unwrap(), None);
}

#[test]
fn latest_active_assignment_wins() {
    let store = store();
    let mut old = Assignment {
        employee_id: "e-7".into(),
        position_id: "driver".into(),
        work_group_id: None,
        reference_date: Some(ymd(2023, 1, 2)),
        reference_rotation_week: Some(1),
        is_active: true,
    };
    store.insert_assignment(&old).unwrap();
    old.position_id = "sorter".into();
    old.reference_date = None;
    old.reference_rotation_week = None;
    store.insert_assignment(&old).unwrap();
    let mut retired = old.clone();
    retired.position_id = "retired".into();
    retired.is_active = false;
    store.insert_assignment(&retired).unwrap();

    let current = store.active_assignment("e-7").unwrap().expect("assignment");
    assert_eq!(current.position_id, "sorter");
    assert_eq!(current.reference_date, None);
    assert!(store.active_assignment("e-8").unwrap().is_none());
}

#[test]
fn assignments_filter_by_work_group() {
    let store = store();
    for (employee, wg, active) in [("b", Some("wg-1"), true), ("a", Some("wg-2"), true), ("c", Some("wg-1"), false)] {
        store
            .insert_assignment(&Assignment {
                employee_id: employee.into(),
                position_id: "driver".into(),
                work_group_id: wg.map(String::from),
                reference_date: None,
                reference_rotation_week: None,
                is_active: active,
            })
            .unwrap();
    }

    let all: Vec<_> = store
        .active_assignments_for("driver", None)
        .unwrap()
        .into_iter()
        .map(|a| a.employee_id)
        .collect();
    assert_eq!(all, vec!["a", "b"]);

    let wg1: Vec<_> = store
        .active_assignments_for("driver", Some("wg-1"))
        .unwrap()
        .into_iter()
        .map(|a| a.employee_id)
        .collect();
    assert_eq!(wg1, vec!["b"]);
}

#[test]
fn schedules_round_trip_and_filter() {
    let store = store();
    let data = serde_json::from_str(
        r#"{ "annual": { "calendar_weeks": { "KW10": { "3": {
            "friday": { "start": "05:30", "end": "13:30" }
        } } } } }"#,
    )
    .unwrap();
    let annual = ScheduleDefinition {
        schedule_id: "sched-1".into(),
        position_id: "driver".into(),
        work_group_id: Some("wg-1".into()),
        calendar_week_tag: Some("KW01".into()),
        is_active: true,
        data,
    };
    store.insert_schedule(&annual).unwrap();
    let mut inactive = annual.clone();
    inactive.schedule_id = "sched-old".into();
    inactive.is_active = false;
    store.insert_schedule(&inactive).unwrap();

    let loaded = store.get_schedule("sched-1").unwrap().expect("schedule");
    assert_eq!(loaded, annual);
    assert_eq!(
        loaded.lookup("KW10", 3, DayOfWeek::Friday),
        TemplateLookup::Working { start: hm(5, 30), end: hm(13, 30) }
    );

    let for_group = store.active_schedules_for("driver", Some("wg-1")).unwrap();
    assert_eq!(for_group.len(), 1);
    assert!(store.active_schedules_for("driver", Some("wg-2")).unwrap().is_empty());
    assert!(store.active_schedules_for("driver", None).unwrap().is_empty());
}

#[test]
fn second_automatic_shift_on_a_day_is_ignored() {
    let store = store();
    let first = auto_shift("e-1", ymd(2024, 3, 4));
    assert!(store.insert_shift(&first).unwrap());
    assert!(!store.insert_shift(&auto_shift("e-1", ymd(2024, 3, 4))).unwrap());
    assert!(store.insert_shift(&auto_shift("e-2", ymd(2024, 3, 4))).unwrap());

    let stored = store.shifts_for_employee("e-1", ymd(2024, 3, 1), ymd(2024, 3, 31)).unwrap();
    assert_eq!(stored, vec![first]);
}

#[test]
fn manual_shifts_are_not_bound_by_the_automatic_limit() {
    let store = store();
    let config = GeneratorConfig::default();
    assert!(store.insert_shift(&auto_shift("e-1", ymd(2024, 3, 4))).unwrap());
    let manual = ShiftRecord::manual("e-1", "driver", ymd(2024, 3, 4), hm(15, 0), hm(18, 0), &config);
    assert!(store.insert_shift(&manual).unwrap());

    assert!(store.shift_exists("e-1", ymd(2024, 3, 4)).unwrap());
    assert!(!store.shift_exists("e-1", ymd(2024, 3, 5)).unwrap());
    assert_eq!(store.shift_count("e-1").unwrap(), 2);

    let stored = store.shifts_for_employee("e-1", ymd(2024, 3, 4), ymd(2024, 3, 4)).unwrap();
    assert_eq!(stored[0].source, ShiftSource::Manual);
    assert_eq!(stored[0].shift_type, ShiftType::Afternoon);
    assert_eq!(stored[1].source, ShiftSource::Auto);
}
