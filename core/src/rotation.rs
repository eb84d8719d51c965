//! Rotation resolver: which week of a repeating pattern applies on a date.
//!
//! Weeks are counted on a continuous Monday-based index so that the
//! distance between two dates never wraps at a year boundary.
//!
//! ```text
//!      January 1970
//!  Mo Tu We Th Fr Sa Su
//!  29 30 31  1  2  3  4   <- week index 0 (starts Monday 1969-12-29)
//!   5  6  7  8  9 10 11   <- week index 1
//!  12 13 14 15 16 17 18   <- week index 2
//! ```

use crate::types::RotationWeek;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Monday of week index 0.
const WEEK_BASE: (i32, u32, u32) = (1969, 12, 29);

/// Number of Monday-started weeks between the base Monday and `date`.
/// Negative for dates before 1969-12-29.
pub fn continuous_week_index(date: NaiveDate) -> i64 {
    let (y, m, d) = WEEK_BASE;
    // WEEK_BASE is a valid date; the fallback is never taken.
    let base = NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN);
    (date - base).num_days().div_euclid(7)
}

/// Signed ISO calendar-week distance from `from` to `to`.
pub fn calendar_week_distance(from: NaiveDate, to: NaiveDate) -> i64 {
    continuous_week_index(to) - continuous_week_index(from)
}

/// Rotation week that applies on `target`, given that `ref_week` applied
/// during the calendar week of `ref_date`.
///
/// The result is always in `1..=cycle_length`. A zero cycle length means
/// the position does not rotate: `ref_week` applies on every date.
pub fn resolve_rotation_week(
    ref_week: RotationWeek,
    ref_date: NaiveDate,
    target: NaiveDate,
    cycle_length: u32,
) -> RotationWeek {
    if cycle_length == 0 {
        return ref_week;
    }
    let cycle = i64::from(cycle_length);
    let distance = calendar_week_distance(ref_date, target);
    let rotated = (i64::from(ref_week) - 1 + distance).rem_euclid(cycle) + 1;
    rotated as RotationWeek
}

/// Annual-plan key for the ISO calendar week containing `date`, e.g. `KW07`.
pub fn calendar_week_tag(date: NaiveDate) -> String {
    format!("KW{:02}", date.iso_week().week())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    #[serde(alias = "mon", alias = "montag")]
    Monday,
    #[serde(alias = "tue", alias = "dienstag")]
    Tuesday,
    #[serde(alias = "wed", alias = "mittwoch")]
    Wednesday,
    #[serde(alias = "thu", alias = "donnerstag")]
    Thursday,
    #[serde(alias = "fri", alias = "freitag")]
    Friday,
    #[serde(alias = "sat", alias = "samstag")]
    Saturday,
    #[serde(alias = "sun", alias = "sonntag")]
    Sunday,
}

impl DayOfWeek {
    pub fn of(date: NaiveDate) -> Self {
        date.weekday().into()
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
            Weekday::Sun => Self::Sunday,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Monday of ISO week `week` in 2024 (2024-01-01 is a Monday, ISO W1).
    fn iso_2024(week: u32) -> NaiveDate {
        NaiveDate::from_isoywd_opt(2024, week, Weekday::Mon).unwrap()
    }

    #[test]
    fn week_index_starts_at_base_monday() {
        assert_eq!(continuous_week_index(ymd(1969, 12, 29)), 0);
        assert_eq!(continuous_week_index(ymd(1970, 1, 4)), 0);
        assert_eq!(continuous_week_index(ymd(1970, 1, 5)), 1);
        assert_eq!(continuous_week_index(ymd(1969, 12, 28)), -1);
    }

    #[test]
    fn full_cycle_returns_to_reference_week() {
        assert_eq!(resolve_rotation_week(1, iso_2024(1), iso_2024(16), 15), 1);
        assert_eq!(resolve_rotation_week(1, iso_2024(1), iso_2024(15), 15), 15);
    }

    #[test]
    fn negative_distance_wraps_backward() {
        let target = iso_2024(1) - chrono::Duration::weeks(2);
        assert_eq!(resolve_rotation_week(1, iso_2024(1), target, 15), 14);
    }

    #[test]
    fn same_calendar_week_keeps_reference() {
        // Reference on a Wednesday, target on the Sunday of the same week.
        assert_eq!(resolve_rotation_week(4, ymd(2024, 1, 3), ymd(2024, 1, 7), 6), 4);
        assert_eq!(resolve_rotation_week(4, ymd(2024, 1, 3), ymd(2024, 1, 8), 6), 5);
    }

    #[test]
    fn year_boundary_does_not_wrap() {
        // 2020 has 53 ISO weeks; 2020-12-28 is W53, 2021-01-04 is W1.
        assert_eq!(calendar_week_distance(ymd(2020, 12, 28), ymd(2021, 1, 4)), 1);
        assert_eq!(resolve_rotation_week(3, ymd(2020, 12, 28), ymd(2021, 1, 4), 4), 4);
        assert_eq!(resolve_rotation_week(3, ymd(2021, 1, 4), ymd(2020, 12, 28), 4), 2);
    }

    #[test]
    fn zero_cycle_length_does_not_rotate() {
        assert_eq!(resolve_rotation_week(3, iso_2024(1), iso_2024(10), 0), 3);
        assert_eq!(resolve_rotation_week(3, iso_2024(1), iso_2024(1) - chrono::Duration::weeks(3), 0), 3);
    }

    #[test]
    fn single_week_cycle_always_resolves_to_week_one() {
        assert_eq!(resolve_rotation_week(1, iso_2024(1), iso_2024(10), 1), 1);
        assert_eq!(resolve_rotation_week(1, iso_2024(5), iso_2024(2), 1), 1);
    }

    #[test]
    fn result_is_always_in_range() {
        let reference = ymd(2023, 6, 15);
        for offset in -400..400 {
            let target = reference + chrono::Duration::days(offset);
            let week = resolve_rotation_week(2, reference, target, 7);
            assert!((1..=7).contains(&week), "week {week} out of range at offset {offset}");
        }
    }

    #[test]
    fn calendar_week_tags_are_zero_padded() {
        assert_eq!(calendar_week_tag(ymd(2024, 1, 1)), "KW01");
        assert_eq!(calendar_week_tag(ymd(2024, 12, 30)), "KW01");
        assert_eq!(calendar_week_tag(ymd(2020, 12, 31)), "KW53");
        assert_eq!(calendar_week_tag(ymd(2024, 2, 14)), "KW07");
    }

    #[test]
    fn weekday_names_accept_aliases() {
        let day: DayOfWeek = serde_json::from_str(r#""montag""#).unwrap();
        assert_eq!(day, DayOfWeek::Monday);
        let day: DayOfWeek = serde_json::from_str(r#""fri""#).unwrap();
        assert_eq!(day, DayOfWeek::Friday);
        assert_eq!(DayOfWeek::of(ymd(2024, 1, 7)), DayOfWeek::Sunday);
    }
}
