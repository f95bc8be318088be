//! Natural-language recurrence vocabulary.

use std::sync::OnceLock;

use chrono::Weekday;
use regex::Regex;

use crate::error::{Error, Result};

use super::rrule::{Freq, Rule};

/// True if the string looks like a raw RRULE (with or without prefix).
pub(crate) fn is_raw_rrule(s: &str) -> bool {
    let lower = s.to_lowercase();
    lower.starts_with("freq=") || lower.starts_with("rrule:") || lower.starts_with("dtstart:")
}

/// True if the string starts with a recurrence keyword.
pub(crate) fn is_natural_recurrence(s: &str) -> bool {
    s.starts_with("every ") || matches!(s, "daily" | "weekdays" | "weekends")
}

fn every_n_weeks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^every (\d+) weeks?$").unwrap())
}

/// Parse a natural language or raw RRULE recurrence string.
pub fn parse_recurrence(input: &str) -> Result<Rule> {
    let s = input.trim().to_lowercase();

    if is_raw_rrule(&s) {
        let raw = s.to_uppercase();
        return Rule::parse(raw.strip_prefix("RRULE:").unwrap_or(&raw));
    }

    match s.as_str() {
        "every day" | "daily" => return Ok(Rule::new(Freq::Daily)),
        "every weekday" | "weekdays" => {
            let mut rule = Rule::new(Freq::Weekly);
            rule.by_day = vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ];
            return Ok(rule);
        }
        "every weekend" | "weekends" => {
            let mut rule = Rule::new(Freq::Weekly);
            rule.by_day = vec![Weekday::Sat, Weekday::Sun];
            return Ok(rule);
        }
        "every other week" | "every second week" => {
            let mut rule = Rule::new(Freq::Weekly);
            rule.interval = 2;
            return Ok(rule);
        }
        _ => {}
    }

    if let Some(caps) = every_n_weeks().captures(&s) {
        let n: u32 = caps[1]
            .parse()
            .map_err(|_| Error::Validation(format!("invalid week count in '{s}'")))?;
        if n == 0 {
            return Err(Error::Validation("week interval must be positive".into()));
        }
        let mut rule = Rule::new(Freq::Weekly);
        rule.interval = n;
        return Ok(rule);
    }

    if let Some(day_name) = s.strip_prefix("every ") {
        if let Some(weekday) = natural_weekday(day_name) {
            let mut rule = Rule::new(Freq::Weekly);
            rule.by_day = vec![weekday];
            return Ok(rule);
        }
    }

    Err(Error::Validation(format!("unrecognized recurrence '{s}'")))
}

fn natural_weekday(s: &str) -> Option<Weekday> {
    match s {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_forms() {
        for input in ["every day", "daily", "EVERY DAY"] {
            let rule = parse_recurrence(input).unwrap();
            assert_eq!(rule.freq, Freq::Daily);
            assert_eq!(rule.interval, 1);
        }
    }

    #[test]
    fn weekday_and_weekend() {
        assert_eq!(parse_recurrence("every weekday").unwrap().by_day.len(), 5);
        assert_eq!(parse_recurrence("weekends").unwrap().by_day.len(), 2);
    }

    #[test]
    fn single_weekday() {
        let rule = parse_recurrence("every monday").unwrap();
        assert_eq!(rule.by_day, vec![Weekday::Mon]);
    }

    #[test]
    fn week_intervals() {
        assert_eq!(parse_recurrence("every other week").unwrap().interval, 2);
        assert_eq!(parse_recurrence("every second week").unwrap().interval, 2);
        assert_eq!(parse_recurrence("every 3 weeks").unwrap().interval, 3);
        assert!(parse_recurrence("every 0 weeks").is_err());
    }

    #[test]
    fn raw_passthrough() {
        let rule = parse_recurrence("rrule:freq=weekly;byday=mo,we").unwrap();
        assert_eq!(rule.by_day, vec![Weekday::Mon, Weekday::Wed]);
    }

    #[test]
    fn rejects_unknown() {
        assert!(parse_recurrence("every fortnight").is_err());
        assert!(parse_recurrence("sometimes").is_err());
    }
}
