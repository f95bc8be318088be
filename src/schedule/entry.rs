//! Storable schedule entries.
//!
//! The registry persists schedules as one or more `"HH:MM"` time ranges plus
//! an RRULE string and the override flag. Conversions to and from the parsed
//! [`Schedule`] form validate the ranges (start before end, no overlaps).

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::rrule::{Freq, Rule};
use super::time::parse_time_of_day;
use super::{Schedule, TimeWindow};

/// The storable form of a time range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// "HH:MM"
    pub from: String,
    /// "HH:MM"
    pub to: String,
}

/// The storable form of a schedule: time ranges plus exactly one recurrence
/// rule. Single dates and date ranges are RRULEs with `DTSTART` (and `COUNT`
/// or `UNTIL`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub ranges: Vec<TimeRange>,
    /// RFC 5545 RRULE string. Empty only for transient editor state.
    #[serde(default)]
    pub rrule: String,
    /// When true, replaces all previous windows for matching days.
    #[serde(rename = "override", default, skip_serializing_if = "is_false")]
    pub override_windows: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// The default working schedule: Mon-Fri 9am-5pm.
pub fn default_schedules() -> Vec<ScheduleEntry> {
    vec![ScheduleEntry {
        ranges: vec![TimeRange {
            from: "09:00".to_string(),
            to: "17:00".to_string(),
        }],
        rrule: "RRULE:FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR".to_string(),
        override_windows: false,
    }]
}

impl ScheduleEntry {
    /// Convert a parsed [`Schedule`] into its storable form. A concrete date
    /// becomes `DTSTART` + `COUNT=1`; a date range `DTSTART` + `UNTIL`.
    pub fn from_schedule(schedule: &Schedule) -> Self {
        let ranges = schedule
            .ranges
            .iter()
            .map(|r| TimeRange {
                from: r.from.to_string(),
                to: r.to.to_string(),
            })
            .collect();

        let rrule = match (&schedule.rrule, schedule.date) {
            (Some(rule), _) => rule.to_string(),
            (None, Some(date)) => single_date_rule(date).to_string(),
            (None, None) => String::new(),
        };

        Self {
            ranges,
            rrule,
            override_windows: false,
        }
    }

    /// Parse the storable form back into a [`Schedule`], validating ranges.
    pub fn to_schedule(&self) -> Result<Schedule> {
        if self.ranges.is_empty() {
            return Err(Error::Validation("schedule entry has no time ranges".into()));
        }

        let windows = parse_windows(&self.ranges)?;
        validate_no_overlap(&windows)?;

        let rrule = if self.rrule.is_empty() {
            None
        } else {
            Some(Rule::parse(&self.rrule)?)
        };

        Ok(Schedule {
            ranges: windows,
            rrule,
            date: None,
        })
    }
}

/// Build the `DTSTART` + `COUNT=1` rule for a one-off date.
pub fn single_date_rule(date: NaiveDate) -> Rule {
    let mut rule = Rule::new(Freq::Daily);
    rule.count = Some(1);
    rule.dtstart = Some(date.and_time(NaiveTime::default()));
    rule
}

/// Build the `DTSTART` + `UNTIL` rule for an inclusive date range.
pub fn date_range_rule(start: NaiveDate, end: NaiveDate) -> Rule {
    let mut rule = Rule::new(Freq::Daily);
    rule.dtstart = Some(start.and_time(NaiveTime::default()));
    rule.until = Some(end.and_time(NaiveTime::default()));
    rule
}

/// Validate a list of stored ranges for interactive input: each parses,
/// start is strictly before end, and no two ranges overlap.
pub fn validate_ranges(ranges: &[TimeRange]) -> Result<()> {
    let windows = parse_windows(ranges)?;
    validate_no_overlap(&windows)
}

fn parse_windows(ranges: &[TimeRange]) -> Result<Vec<TimeWindow>> {
    let mut windows = Vec::with_capacity(ranges.len());
    for range in ranges {
        let from = parse_time_of_day(&range.from)
            .map_err(|e| Error::Validation(format!("invalid from time '{}': {e}", range.from)))?;
        let to = parse_time_of_day(&range.to)
            .map_err(|e| Error::Validation(format!("invalid to time '{}': {e}", range.to)))?;
        if from >= to {
            return Err(Error::Validation(format!(
                "start time {} must be before end time {}",
                range.from, range.to
            )));
        }
        windows.push(TimeWindow { from, to });
    }
    Ok(windows)
}

fn validate_no_overlap(windows: &[TimeWindow]) -> Result<()> {
    if windows.len() < 2 {
        return Ok(());
    }

    let mut sorted = windows.to_vec();
    sorted.sort_by_key(|w| w.from);

    for pair in sorted.windows(2) {
        if pair[1].from < pair[0].to {
            return Err(Error::Validation(format!(
                "time ranges overlap: {}-{} and {}-{}",
                pair[0].from, pair[0].to, pair[1].from, pair[1].to
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::parse_schedule;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 4).unwrap()
    }

    #[test]
    fn round_trip_recurring() {
        let parsed = parse_schedule("from 9am to 5pm every weekday", today()).unwrap();
        let stored = ScheduleEntry::from_schedule(&parsed);
        assert_eq!(stored.ranges[0].from, "09:00");
        assert_eq!(stored.ranges[0].to, "17:00");
        assert_eq!(stored.rrule, "RRULE:FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR");

        let back = stored.to_schedule().unwrap();
        assert_eq!(back.ranges, parsed.ranges);
        assert_eq!(back.rrule, parsed.rrule);
    }

    #[test]
    fn one_off_date_becomes_count_one() {
        let parsed = parse_schedule("from 8am to 12pm on 2026-03-01", today()).unwrap();
        let stored = ScheduleEntry::from_schedule(&parsed);
        assert_eq!(
            stored.rrule,
            "DTSTART:20260301T000000Z\nRRULE:FREQ=DAILY;COUNT=1"
        );

        // Semantics survive the round trip: exactly one occurrence, on the date.
        let back = stored.to_schedule().unwrap();
        let rule = back.rrule.unwrap();
        let from = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        assert_eq!(rule.between(from, to), vec![NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()]);
    }

    #[test]
    fn serde_shape() {
        let entry = default_schedules().remove(0);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"from\":\"09:00\""));
        assert!(!json.contains("override"), "override omitted when false");

        let mut with_override = entry.clone();
        with_override.override_windows = true;
        let json = serde_json::to_string(&with_override).unwrap();
        assert!(json.contains("\"override\":true"));

        let parsed: ScheduleEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, with_override);
    }

    #[test]
    fn validation_catches_bad_ranges() {
        assert!(validate_ranges(&[TimeRange {
            from: "17:00".into(),
            to: "09:00".into()
        }])
        .is_err());

        assert!(validate_ranges(&[
            TimeRange { from: "09:00".into(), to: "12:00".into() },
            TimeRange { from: "11:00".into(), to: "15:00".into() },
        ])
        .is_err());

        assert!(validate_ranges(&[
            TimeRange { from: "09:00".into(), to: "12:00".into() },
            TimeRange { from: "13:00".into(), to: "17:00".into() },
        ])
        .is_ok());
    }

    #[test]
    fn empty_ranges_rejected() {
        let entry = ScheduleEntry {
            ranges: vec![],
            rrule: "RRULE:FREQ=DAILY".into(),
            override_windows: false,
        };
        assert!(entry.to_schedule().is_err());
    }
}
