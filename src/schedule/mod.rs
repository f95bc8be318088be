//! Working-hours schedules.
//!
//! A schedule is one or more clock-time ranges plus a recurrence: either an
//! RFC 5545 style rule (`every weekday`, `FREQ=WEEKLY;BYDAY=MO,WE`) or a
//! concrete date. Stored entries always carry the recurrence as an RRULE
//! string; one-off dates become `DTSTART` + `COUNT=1` and date ranges
//! `DTSTART` + `UNTIL`. Expansion turns entries into per-day windows.

use std::fmt;

use chrono::NaiveDate;

use crate::error::{Error, Result};

mod date;
mod entry;
mod expand;
mod format;
mod recurrence;
mod rrule;
mod time;

pub use date::parse_date;
pub use entry::{
    date_range_rule, default_schedules, single_date_rule, validate_ranges, ScheduleEntry,
    TimeRange,
};
pub use expand::expand_schedules;
pub use format::{
    format_day_schedule, format_rrule, format_rrule_date_info, format_schedule_entry,
    format_time_range,
};
pub use recurrence::parse_recurrence;
pub use rrule::{Freq, Rule};
pub use time::parse_time_of_day;

/// A clock time without a date component, minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self { hour, minute })
    }

    /// Minutes since midnight.
    pub fn minutes_from_midnight(&self) -> i64 {
        i64::from(self.hour) * 60 + i64::from(self.minute)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// A working time range within a single day. Start is strictly before end;
/// overnight ranges are rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: TimeOfDay,
    pub to: TimeOfDay,
}

impl TimeWindow {
    /// Duration of the window in minutes.
    pub fn minutes(&self) -> i64 {
        self.to.minutes_from_midnight() - self.from.minutes_from_midnight()
    }
}

/// All working windows for a specific date, sorted by start time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub windows: Vec<TimeWindow>,
}

impl DaySchedule {
    /// Total scheduled minutes for this day.
    pub fn scheduled_minutes(&self) -> i64 {
        self.windows.iter().map(TimeWindow::minutes).sum()
    }
}

/// The parsed form of a schedule input. `rrule` and `date` are mutually
/// exclusive; a bare time range has neither (valid only while editing).
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub ranges: Vec<TimeWindow>,
    pub rrule: Option<Rule>,
    pub date: Option<NaiveDate>,
}

/// Parse a natural language schedule string of the form
/// `from <time> to <time> [date|recurrence]`, resolving relative dates
/// against `today`.
pub fn parse_schedule(input: &str, today: NaiveDate) -> Result<Schedule> {
    let normalized = input.trim().to_lowercase();

    let rest = normalized
        .strip_prefix("from ")
        .ok_or_else(|| Error::Validation(format!(
            "expected 'from <time> to <time>', got '{normalized}'"
        )))?;

    let to_idx = rest.find(" to ").ok_or_else(|| {
        Error::Validation(format!("expected 'to <time>' in '{normalized}'"))
    })?;

    let from_str = rest[..to_idx].trim();
    let after_to = rest[to_idx + " to ".len()..].trim();

    let from = parse_time_of_day(from_str)
        .map_err(|e| Error::Validation(format!("invalid start time '{from_str}': {e}")))?;

    // The first whitespace-separated token after "to" is the end time; the
    // rest classifies as a date or a recurrence.
    let (to_str, remainder) = match after_to.split_once(' ') {
        Some((head, tail)) => (head, tail.trim()),
        None => (after_to, ""),
    };

    let to = parse_time_of_day(to_str)
        .map_err(|e| Error::Validation(format!("invalid end time '{to_str}': {e}")))?;

    if from >= to {
        return Err(Error::Validation(format!(
            "start time {from} must be before end time {to}"
        )));
    }

    let mut schedule = Schedule {
        ranges: vec![TimeWindow { from, to }],
        rrule: None,
        date: None,
    };

    if remainder.is_empty() {
        return Ok(schedule);
    }

    if recurrence::is_raw_rrule(remainder) || recurrence::is_natural_recurrence(remainder) {
        let rule = parse_recurrence(remainder)
            .map_err(|e| Error::Validation(format!("invalid recurrence: {e}")))?;
        schedule.rrule = Some(rule);
    } else {
        let date = parse_date(remainder, today)
            .map_err(|e| Error::Validation(format!("invalid date: {e}")))?;
        schedule.date = Some(date);
    }

    Ok(schedule)
}
