//! Clock-time parsing.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

use super::TimeOfDay;

fn patterns() -> &'static [(Regex, Kind)] {
    static PATTERNS: OnceLock<Vec<(Regex, Kind)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            // 9:30am, 9.30pm
            (
                Regex::new(r"^(\d{1,2})[:.](\d{2})\s*(am|pm)$").unwrap(),
                Kind::TwelveHour,
            ),
            // 9am, 12pm
            (
                Regex::new(r"^(\d{1,2})\s*(am|pm)$").unwrap(),
                Kind::TwelveHourBare,
            ),
            // 14:00, 09.30
            (
                Regex::new(r"^(\d{1,2})[:.](\d{2})$").unwrap(),
                Kind::TwentyFourHour,
            ),
        ]
    })
}

#[derive(Clone, Copy)]
enum Kind {
    TwelveHour,
    TwelveHourBare,
    TwentyFourHour,
}

/// Parse a clock-time string into a [`TimeOfDay`].
///
/// Supported forms: `9:30am`, `9.30am`, `9am`, `14:00`, `14.00` (case
/// insensitive).
pub fn parse_time_of_day(input: &str) -> Result<TimeOfDay> {
    let s = input.trim().to_lowercase();

    for (re, kind) in patterns() {
        let Some(caps) = re.captures(&s) else {
            continue;
        };
        return match kind {
            Kind::TwelveHour => twelve_hour(&caps[1], &caps[2], &caps[3]),
            Kind::TwelveHourBare => twelve_hour(&caps[1], "0", &caps[2]),
            Kind::TwentyFourHour => twenty_four_hour(&caps[1], &caps[2]),
        };
    }

    Err(Error::Validation(format!("unrecognized time format '{s}'")))
}

fn twelve_hour(hour: &str, minute: &str, ampm: &str) -> Result<TimeOfDay> {
    let hour: u32 = hour
        .parse()
        .map_err(|_| Error::Validation(format!("invalid hour '{hour}'")))?;
    let minute: u32 = minute
        .parse()
        .map_err(|_| Error::Validation(format!("invalid minute '{minute}'")))?;

    if !(1..=12).contains(&hour) {
        return Err(Error::Validation(format!(
            "hour {hour} out of range for 12-hour format"
        )));
    }

    let hour = match (ampm, hour) {
        ("am", 12) => 0,
        ("am", h) => h,
        ("pm", 12) => 12,
        (_, h) => h + 12,
    };

    TimeOfDay::new(hour, minute)
        .ok_or_else(|| Error::Validation(format!("minute {minute} out of range")))
}

fn twenty_four_hour(hour: &str, minute: &str) -> Result<TimeOfDay> {
    let hour: u32 = hour
        .parse()
        .map_err(|_| Error::Validation(format!("invalid hour '{hour}'")))?;
    let minute: u32 = minute
        .parse()
        .map_err(|_| Error::Validation(format!("invalid minute '{minute}'")))?;

    TimeOfDay::new(hour, minute).ok_or_else(|| {
        Error::Validation(format!("time {hour:02}:{minute:02} out of range"))
    })
}
