//! Date-expression parsing.
//!
//! Accepts relative forms (`today`, `tomorrow`, weekday names with an
//! optional `next ` prefix), and absolute forms `YYYY-MM-DD`, `Jan 2`,
//! `January 2, 2026`, `2 Jan`, `2 January 2026`. Forms without a year use
//! the current year. A leading `on ` is stripped.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::error::{Error, Result};

/// Parse a date expression, resolving relative forms against `today`.
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let s = input.trim().to_lowercase();
    let s = s.strip_prefix("on ").unwrap_or(&s).trim();

    match s {
        "today" => return Ok(today),
        "tomorrow" => {
            return today
                .checked_add_days(Days::new(1))
                .ok_or_else(|| Error::Validation("date out of range".into()))
        }
        _ => {}
    }

    // Weekday names, with or without "next ". A same-weekday match always
    // resolves to the following week.
    let cleaned = s.strip_prefix("next ").unwrap_or(s);
    if let Some(weekday) = parse_weekday(cleaned) {
        return Ok(next_weekday(today, weekday));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Some(date) = parse_month_day(s, today.year()) {
        return Ok(date);
    }

    Err(Error::Validation(format!("unrecognized date '{s}'")))
}

fn parse_weekday(s: &str) -> Option<Weekday> {
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

/// Next occurrence of `weekday` strictly after `today`.
fn next_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let mut ahead = i64::from(weekday.num_days_from_monday())
        - i64::from(today.weekday().num_days_from_monday());
    if ahead <= 0 {
        ahead += 7;
    }
    today + chrono::Duration::days(ahead)
}

/// Parse `Jan 2`, `January 2 2026`, `2 Jan`, `2 January, 2026` and friends.
fn parse_month_day(s: &str, default_year: i32) -> Option<NaiveDate> {
    let tokens: Vec<&str> = s
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.len() < 2 || tokens.len() > 3 {
        return None;
    }

    let (month, day) = if let Some(m) = parse_month(tokens[0]) {
        (m, tokens[1].parse::<u32>().ok()?)
    } else if let Some(m) = parse_month(tokens[1]) {
        (m, tokens[0].parse::<u32>().ok()?)
    } else {
        return None;
    };

    let year = match tokens.get(2) {
        Some(t) => t.parse::<i32>().ok()?,
        None => default_year,
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_month(s: &str) -> Option<u32> {
    let idx = MONTHS.iter().position(|&(full, abbrev)| s == full || s == abbrev)?;
    Some(idx as u32 + 1)
}

const MONTHS: [(&str, &str); 12] = [
    ("january", "jan"),
    ("february", "feb"),
    ("march", "mar"),
    ("april", "apr"),
    ("may", "may"),
    ("june", "jun"),
    ("july", "jul"),
    ("august", "aug"),
    ("september", "sep"),
    ("october", "oct"),
    ("november", "nov"),
    ("december", "dec"),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2026-02-04 is a Wednesday.
    fn today() -> NaiveDate {
        date(2026, 2, 4)
    }

    #[test]
    fn relative_forms() {
        assert_eq!(parse_date("today", today()).unwrap(), today());
        assert_eq!(parse_date("tomorrow", today()).unwrap(), date(2026, 2, 5));
    }

    #[test]
    fn weekday_names() {
        assert_eq!(parse_date("friday", today()).unwrap(), date(2026, 2, 6));
        assert_eq!(parse_date("monday", today()).unwrap(), date(2026, 2, 9));
        // Same weekday as today skips to next week.
        assert_eq!(parse_date("wednesday", today()).unwrap(), date(2026, 2, 11));
        assert_eq!(parse_date("next wednesday", today()).unwrap(), date(2026, 2, 11));
        assert_eq!(parse_date("next Friday", today()).unwrap(), date(2026, 2, 6));
    }

    #[test]
    fn absolute_forms() {
        assert_eq!(parse_date("2026-03-15", today()).unwrap(), date(2026, 3, 15));
        assert_eq!(parse_date("Jan 2", today()).unwrap(), date(2026, 1, 2));
        assert_eq!(parse_date("January 2", today()).unwrap(), date(2026, 1, 2));
        assert_eq!(parse_date("jan 2 2025", today()).unwrap(), date(2025, 1, 2));
        assert_eq!(parse_date("2 Jan", today()).unwrap(), date(2026, 1, 2));
        assert_eq!(parse_date("2 January, 2025", today()).unwrap(), date(2025, 1, 2));
    }

    #[test]
    fn on_prefix() {
        assert_eq!(parse_date("on monday", today()).unwrap(), date(2026, 2, 9));
        assert_eq!(parse_date("on 2026-03-15", today()).unwrap(), date(2026, 3, 15));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_date("yesterday", today()).is_err());
        assert!(parse_date("2026-13-01", today()).is_err());
        assert!(parse_date("Febtember 2", today()).is_err());
        assert!(parse_date("", today()).is_err());
    }
}
