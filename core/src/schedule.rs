//! Imported schedule definitions and template lookup.
//!
//! A definition maps (rotation week, weekday) to a shift template. Annual
//! plans add an outer calendar-week key (`KW01`..`KW53`) so the pattern
//! can vary across the year. Lookups return a `TemplateLookup` so that a
//! missing entry, an explicit day off and a malformed entry stay distinct.

use crate::{
    rotation::DayOfWeek,
    types::{PositionId, RotationWeek, ScheduleId, WorkGroupId},
};
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One cell of a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTemplate", into = "RawTemplate")]
pub enum ShiftTemplate {
    DayOff,
    Shift { start: NaiveTime, end: NaiveTime },
    /// Not marked as a day off, but a start or end time is missing or
    /// unreadable.
    Incomplete {
        start: Option<NaiveTime>,
        end:   Option<NaiveTime>,
    },
}

/// Wire form of a template as produced by the schedule import.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawTemplate {
    #[serde(default, alias = "is_day_off", skip_serializing_if = "std::ops::Not::not")]
    day_off: bool,
    #[serde(default, alias = "start_time", skip_serializing_if = "Option::is_none")]
    start: Option<String>,
    #[serde(default, alias = "end_time", skip_serializing_if = "Option::is_none")]
    end: Option<String>,
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

fn format_time(time: NaiveTime) -> String {
    if time.second() == 0 {
        time.format("%H:%M").to_string()
    } else {
        time.format("%H:%M:%S").to_string()
    }
}

impl From<RawTemplate> for ShiftTemplate {
    fn from(raw: RawTemplate) -> Self {
        if raw.day_off {
            return Self::DayOff;
        }
        let start = raw.start.as_deref().and_then(parse_time);
        let end = raw.end.as_deref().and_then(parse_time);
        match (start, end) {
            (Some(start), Some(end)) => Self::Shift { start, end },
            (start, end) => Self::Incomplete { start, end },
        }
    }
}

impl From<ShiftTemplate> for RawTemplate {
    fn from(template: ShiftTemplate) -> Self {
        match template {
            ShiftTemplate::DayOff => RawTemplate {
                day_off: true,
                ..Default::default()
            },
            ShiftTemplate::Shift { start, end } => RawTemplate {
                day_off: false,
                start: Some(format_time(start)),
                end: Some(format_time(end)),
            },
            ShiftTemplate::Incomplete { start, end } => RawTemplate {
                day_off: false,
                start: start.map(format_time),
                end: end.map(format_time),
            },
        }
    }
}

pub type WeekPattern = BTreeMap<DayOfWeek, ShiftTemplate>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleData {
    /// Static pattern keyed by rotation week.
    Group {
        weeks: BTreeMap<RotationWeek, WeekPattern>,
    },
    /// Full-year plan keyed by calendar-week tag, then rotation week.
    Annual {
        calendar_weeks: BTreeMap<String, BTreeMap<RotationWeek, WeekPattern>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDefinition {
    pub schedule_id:       ScheduleId,
    pub position_id:       PositionId,
    #[serde(default)]
    pub work_group_id:     Option<WorkGroupId>,
    /// Calendar week the import was taken from, informational.
    #[serde(default)]
    pub calendar_week_tag: Option<String>,
    #[serde(default = "active_by_default")]
    pub is_active:         bool,
    pub data:              ScheduleData,
}

fn active_by_default() -> bool {
    true
}

/// Outcome of looking up one date in a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateLookup {
    Working { start: NaiveTime, end: NaiveTime },
    DayOff,
    /// No entry at all for the key.
    Missing,
    /// An entry exists but is unusable (see `ShiftTemplate::Incomplete`).
    Malformed,
}

impl ScheduleDefinition {
    pub fn is_annual_plan(&self) -> bool {
        matches!(self.data, ScheduleData::Annual { .. })
    }

    pub fn lookup(
        &self,
        calendar_week_tag: &str,
        rotation_week: RotationWeek,
        day: DayOfWeek,
    ) -> TemplateLookup {
        let pattern = match &self.data {
            ScheduleData::Group { weeks } => weeks.get(&rotation_week),
            ScheduleData::Annual { calendar_weeks } => calendar_weeks
                .get(calendar_week_tag)
                .and_then(|weeks| weeks.get(&rotation_week)),
        };
        match pattern.and_then(|p| p.get(&day)) {
            None => TemplateLookup::Missing,
            Some(ShiftTemplate::DayOff) => TemplateLookup::DayOff,
            Some(ShiftTemplate::Shift { start, end }) => TemplateLookup::Working {
                start: *start,
                end: *end,
            },
            Some(ShiftTemplate::Incomplete { .. }) => TemplateLookup::Malformed,
        }
    }
}

/// The active definitions that apply to one assignment, in lookup order.
#[derive(Debug, Clone, Default)]
pub struct ScheduleSet {
    definitions: Vec<ScheduleDefinition>,
}

impl ScheduleSet {
    /// Keep active definitions that are position-wide or belong to
    /// `work_group_id`. Annual plans are consulted before group
    /// schedules, and work-group specific definitions before
    /// position-wide ones.
    pub fn new(definitions: Vec<ScheduleDefinition>, work_group_id: Option<&str>) -> Self {
        let mut definitions: Vec<_> = definitions
            .into_iter()
            .filter(|d| d.is_active)
            .filter(|d| match d.work_group_id.as_deref() {
                None => true,
                Some(wg) => Some(wg) == work_group_id,
            })
            .collect();
        definitions.sort_by_key(|d| (!d.is_annual_plan(), d.work_group_id.is_none()));
        Self { definitions }
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// First definition with an entry for the key. An explicit day off
    /// counts as an entry and stops the search.
    pub fn lookup(
        &self,
        calendar_week_tag: &str,
        rotation_week: RotationWeek,
        day: DayOfWeek,
    ) -> (TemplateLookup, Option<&ScheduleDefinition>) {
        self.definitions
            .iter()
            .find_map(|def| match def.lookup(calendar_week_tag, rotation_week, day) {
                TemplateLookup::Missing => None,
                found => Some((found, Some(def))),
            })
            .unwrap_or((TemplateLookup::Missing, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn group(id: &str, wg: Option<&str>, json: &str) -> ScheduleDefinition {
        ScheduleDefinition {
            schedule_id: id.into(),
            position_id: "p-1".into(),
            work_group_id: wg.map(String::from),
            calendar_week_tag: None,
            is_active: true,
            data: serde_json::from_str(json).unwrap(),
        }
    }

    #[test]
    fn templates_parse_into_explicit_cases() {
        let pattern: WeekPattern = serde_json::from_str(
            r#"{
                "monday":    { "start": "06:00", "end": "14:00" },
                "tuesday":   { "day_off": true },
                "wednesday": { "start_time": "22:00:00", "end_time": "06:00:00" },
                "thursday":  { "start": "14:00" },
                "friday":    { "start": "late", "end": "22:00" }
            }"#,
        )
        .unwrap();

        assert_eq!(pattern[&DayOfWeek::Monday], ShiftTemplate::Shift { start: hm(6, 0), end: hm(14, 0) });
        assert_eq!(pattern[&DayOfWeek::Tuesday], ShiftTemplate::DayOff);
        assert_eq!(pattern[&DayOfWeek::Wednesday], ShiftTemplate::Shift { start: hm(22, 0), end: hm(6, 0) });
        assert_eq!(
            pattern[&DayOfWeek::Thursday],
            ShiftTemplate::Incomplete { start: Some(hm(14, 0)), end: None }
        );
        assert_eq!(
            pattern[&DayOfWeek::Friday],
            ShiftTemplate::Incomplete { start: None, end: Some(hm(22, 0)) }
        );
        assert!(!pattern.contains_key(&DayOfWeek::Saturday));
    }

    #[test]
    fn templates_serialize_back_to_import_form() {
        let json = serde_json::to_string(&ShiftTemplate::Shift { start: hm(6, 0), end: hm(14, 30) }).unwrap();
        assert_eq!(json, r#"{"start":"06:00","end":"14:30"}"#);
        let json = serde_json::to_string(&ShiftTemplate::DayOff).unwrap();
        assert_eq!(json, r#"{"day_off":true}"#);
    }

    #[test]
    fn group_lookup_distinguishes_missing_from_day_off() {
        let def = group(
            "s-1",
            None,
            r#"{ "group": { "weeks": {
                "1": { "monday": { "start": "06:00", "end": "14:00" }, "sunday": { "day_off": true } }
            } } }"#,
        );
        assert_eq!(
            def.lookup("KW01", 1, DayOfWeek::Monday),
            TemplateLookup::Working { start: hm(6, 0), end: hm(14, 0) }
        );
        assert_eq!(def.lookup("KW01", 1, DayOfWeek::Sunday), TemplateLookup::DayOff);
        assert_eq!(def.lookup("KW01", 1, DayOfWeek::Tuesday), TemplateLookup::Missing);
        assert_eq!(def.lookup("KW01", 2, DayOfWeek::Monday), TemplateLookup::Missing);
        assert!(!def.is_annual_plan());
    }

    #[test]
    fn annual_lookup_uses_calendar_week_tag() {
        let def = group(
            "s-annual",
            None,
            r#"{ "annual": { "calendar_weeks": {
                "KW02": { "1": { "monday": { "start": "14:00", "end": "22:00" } } }
            } } }"#,
        );
        assert!(def.is_annual_plan());
        assert_eq!(
            def.lookup("KW02", 1, DayOfWeek::Monday),
            TemplateLookup::Working { start: hm(14, 0), end: hm(22, 0) }
        );
        assert_eq!(def.lookup("KW03", 1, DayOfWeek::Monday), TemplateLookup::Missing);
    }

    #[test]
    fn set_prefers_annual_then_work_group_specific() {
        let wide = group(
            "wide",
            None,
            r#"{ "group": { "weeks": { "1": {
                "monday": { "start": "06:00", "end": "14:00" },
                "tuesday": { "start": "06:00", "end": "14:00" }
            } } } }"#,
        );
        let specific = group(
            "specific",
            Some("wg-a"),
            r#"{ "group": { "weeks": { "1": { "monday": { "day_off": true } } } } }"#,
        );
        let other_group = group(
            "other",
            Some("wg-b"),
            r#"{ "group": { "weeks": { "1": { "tuesday": { "day_off": true } } } } }"#,
        );
        let annual = group(
            "annual",
            None,
            r#"{ "annual": { "calendar_weeks": { "KW05": { "1": {
                "monday": { "start": "22:00", "end": "06:00" }
            } } } } }"#,
        );

        let set = ScheduleSet::new(vec![wide, specific, other_group, annual], Some("wg-a"));
        assert_eq!(set.len(), 3);

        let (found, def) = set.lookup("KW05", 1, DayOfWeek::Monday);
        assert_eq!(found, TemplateLookup::Working { start: hm(22, 0), end: hm(6, 0) });
        assert_eq!(def.map(|d| d.schedule_id.as_str()), Some("annual"));

        let (found, def) = set.lookup("KW06", 1, DayOfWeek::Monday);
        assert_eq!(found, TemplateLookup::DayOff);
        assert_eq!(def.map(|d| d.schedule_id.as_str()), Some("specific"));

        let (found, def) = set.lookup("KW06", 1, DayOfWeek::Tuesday);
        assert_eq!(found, TemplateLookup::Working { start: hm(6, 0), end: hm(14, 0) });
        assert_eq!(def.map(|d| d.schedule_id.as_str()), Some("wide"));

        let (found, def) = set.lookup("KW06", 1, DayOfWeek::Friday);
        assert_eq!(found, TemplateLookup::Missing);
        assert!(def.is_none());
    }

    #[test]
    fn inactive_definitions_are_ignored() {
        let mut def = group("s-1", None, r#"{ "group": { "weeks": {} } }"#);
        def.is_active = false;
        assert!(ScheduleSet::new(vec![def], None).is_empty());
    }
}
