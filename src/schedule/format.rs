//! Human-readable schedule formatting.

use chrono::{NaiveDateTime, Weekday};

use super::rrule::Rule;
use super::{DaySchedule, ScheduleEntry};

/// Format two "HH:MM" strings as "9:00 AM - 5:00 PM".
pub fn format_time_range(from: &str, to: &str) -> String {
    format!("{} - {}", format_12h(from), format_12h(to))
}

/// Describe an RRULE string in plain words ("every weekday", "every 3
/// weeks"). Falls back to the raw string for rules with no short name.
pub fn format_rrule(rrule: &str) -> String {
    let Ok(rule) = Rule::parse(rrule) else {
        return rrule.to_string();
    };

    match rule.freq {
        super::Freq::Daily => {
            if rule.interval > 1 {
                format!("every {} days", rule.interval)
            } else {
                "every day".to_string()
            }
        }
        super::Freq::Weekly => {
            if !rule.by_day.is_empty() {
                if is_weekdays(&rule.by_day) {
                    return "every weekday".to_string();
                }
                if is_weekends(&rule.by_day) {
                    return "every weekend".to_string();
                }
                let names: Vec<&str> = rule.by_day.iter().map(|d| day_name(*d)).collect();
                return format!("every {}", names.join(", "));
            }
            if rule.interval > 1 {
                format!("every {} weeks", rule.interval)
            } else {
                "every week".to_string()
            }
        }
    }
}

/// Extract date context from an RRULE string: "on Feb 15" for single dates
/// (`DTSTART` + `COUNT=1`), "Feb 10 - Feb 12" for date ranges (`DTSTART` +
/// `UNTIL`). Empty for unbounded recurring rules.
pub fn format_rrule_date_info(rrule: &str) -> String {
    let Ok(rule) = Rule::parse(rrule) else {
        return String::new();
    };
    let Some(dtstart) = rule.dtstart else {
        return String::new();
    };

    if rule.count == Some(1) {
        return format!("on {}", format_month_day(dtstart));
    }

    if let Some(until) = rule.until {
        return format!("{} - {}", format_month_day(dtstart), format_month_day(until));
    }

    String::new()
}

/// One human-readable line for a stored schedule entry.
pub fn format_schedule_entry(entry: &ScheduleEntry) -> String {
    let ranges: Vec<String> = entry
        .ranges
        .iter()
        .map(|r| format_time_range(&r.from, &r.to))
        .collect();
    let time_part = ranges.join(" + ");

    let mut line = if entry.rrule.is_empty() {
        time_part
    } else {
        let date_info = format_rrule_date_info(&entry.rrule);
        if date_info.is_empty() {
            format!("{time_part}, {}", format_rrule(&entry.rrule))
        } else {
            format!("{time_part}, {date_info}")
        }
    };

    if entry.override_windows {
        line.push_str(" (override)");
    }
    line
}

/// Format a day schedule as "Mon Feb  2:  9:00 AM - 5:00 PM".
pub fn format_day_schedule(day: &DaySchedule) -> String {
    let windows: Vec<String> = day
        .windows
        .iter()
        .map(|w| format_time_range(&w.from.to_string(), &w.to.to_string()))
        .collect();
    format!("{}:  {}", day.date.format("%a %b %e"), windows.join(", "))
}

fn format_month_day(dt: NaiveDateTime) -> String {
    dt.format("%b %-d").to_string()
}

fn format_12h(hhmm: &str) -> String {
    let Some((h, m)) = hhmm.split_once(':') else {
        return hhmm.to_string();
    };
    let Ok(hour) = h.parse::<u32>() else {
        return hhmm.to_string();
    };

    let (display, suffix) = match hour {
        0 => (12, "AM"),
        12 => (12, "PM"),
        h if h > 12 => (h - 12, "PM"),
        h => (h, "AM"),
    };

    format!("{display}:{m} {suffix}")
}

fn is_weekdays(days: &[Weekday]) -> bool {
    days.len() == 5
        && [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
            .iter()
            .all(|d| days.contains(d))
}

fn is_weekends(days: &[Weekday]) -> bool {
    days.len() == 2 && days.contains(&Weekday::Sat) && days.contains(&Weekday::Sun)
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
