//! RFC 5545 recurrence subset.
//!
//! Schedules only ever produce daily or weekly rules, optionally bounded by
//! `DTSTART`, `UNTIL`, or `COUNT`, with `BYDAY` weekday filters and an
//! `INTERVAL`. Week start is fixed to Monday (the RFC default). The
//! canonical string form round-trips losslessly:
//!
//! ```text
//! DTSTART:20260102T000000Z
//! RRULE:FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE;UNTIL=20260301T000000Z
//! ```

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freq {
    Daily,
    Weekly,
}

impl fmt::Display for Freq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Freq::Daily => write!(f, "DAILY"),
            Freq::Weekly => write!(f, "WEEKLY"),
        }
    }
}

/// A parsed recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub freq: Freq,
    pub interval: u32,
    pub by_day: Vec<Weekday>,
    pub count: Option<u32>,
    pub until: Option<NaiveDateTime>,
    pub dtstart: Option<NaiveDateTime>,
}

impl Rule {
    pub fn new(freq: Freq) -> Self {
        Self {
            freq,
            interval: 1,
            by_day: Vec::new(),
            count: None,
            until: None,
            dtstart: None,
        }
    }

    /// Parse a rule string: an optional `DTSTART:` line followed by the
    /// `RRULE:`-prefixed (or bare) parameter list.
    pub fn parse(input: &str) -> Result<Self> {
        let mut dtstart = None;
        let mut params_line = None;

        for line in input.split(['\n', ' ']) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let upper = line.to_uppercase();
            if let Some(value) = upper.strip_prefix("DTSTART:") {
                dtstart = Some(parse_stamp(value)?);
            } else {
                let bare = upper.strip_prefix("RRULE:").unwrap_or(&upper);
                params_line = Some(bare.to_string());
            }
        }

        let params_line = params_line
            .ok_or_else(|| Error::Validation(format!("invalid RRULE '{input}'")))?;

        let mut rule = Rule {
            freq: Freq::Daily,
            interval: 1,
            by_day: Vec::new(),
            count: None,
            until: None,
            dtstart,
        };
        let mut saw_freq = false;

        for segment in params_line.split(';') {
            let Some((key, value)) = segment.split_once('=') else {
                return Err(Error::Validation(format!(
                    "invalid RRULE segment '{segment}'"
                )));
            };
            match key {
                "FREQ" => {
                    rule.freq = match value {
                        "DAILY" => Freq::Daily,
                        "WEEKLY" => Freq::Weekly,
                        other => {
                            return Err(Error::Validation(format!(
                                "unsupported FREQ '{other}'"
                            )))
                        }
                    };
                    saw_freq = true;
                }
                "INTERVAL" => {
                    rule.interval = value.parse().map_err(|_| {
                        Error::Validation(format!("invalid INTERVAL '{value}'"))
                    })?;
                    if rule.interval == 0 {
                        return Err(Error::Validation("INTERVAL must be positive".into()));
                    }
                }
                "BYDAY" => {
                    for day in value.split(',') {
                        rule.by_day.push(parse_byday(day)?);
                    }
                }
                "COUNT" => {
                    rule.count = Some(value.parse().map_err(|_| {
                        Error::Validation(format!("invalid COUNT '{value}'"))
                    })?);
                }
                "UNTIL" => {
                    rule.until = Some(parse_stamp(value)?);
                }
                "DTSTART" => {
                    // Tolerated inside the parameter list as well.
                    rule.dtstart = Some(parse_stamp(value)?);
                }
                "WKST" => {
                    if value != "MO" {
                        return Err(Error::Validation(format!(
                            "unsupported WKST '{value}'"
                        )));
                    }
                }
                other => {
                    return Err(Error::Validation(format!(
                        "unsupported RRULE part '{other}'"
                    )))
                }
            }
        }

        if !saw_freq {
            return Err(Error::Validation(format!(
                "RRULE '{input}' is missing FREQ"
            )));
        }

        Ok(rule)
    }

    /// All occurrence dates within `[from, to]`, both ends inclusive.
    ///
    /// When the rule has no `DTSTART` the recurrence is anchored at `from`
    /// ("unbounded recurrence since time began"); bounded rules keep their
    /// own anchor, and `COUNT` counts occurrences from that anchor even when
    /// they fall before `from`.
    pub fn between(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        let anchor = self.dtstart.map(|dt| dt.date()).unwrap_or(from);
        let until = self.until.map(|dt| dt.date());

        let mut end = to;
        if let Some(u) = until {
            end = end.min(u);
        }
        if end < anchor {
            return Vec::new();
        }

        let mut occurrences = Vec::new();
        let mut emitted: u32 = 0;
        let mut day = anchor;

        while day <= end {
            if self.matches(anchor, day) {
                emitted += 1;
                if day >= from {
                    occurrences.push(day);
                }
                if let Some(count) = self.count {
                    if emitted >= count {
                        break;
                    }
                }
            }
            day += Duration::days(1);
        }

        occurrences
    }

    fn matches(&self, anchor: NaiveDate, day: NaiveDate) -> bool {
        match self.freq {
            Freq::Daily => {
                let elapsed = (day - anchor).num_days();
                elapsed % i64::from(self.interval) == 0
            }
            Freq::Weekly => {
                let on_day = if self.by_day.is_empty() {
                    day.weekday() == anchor.weekday()
                } else {
                    self.by_day.contains(&day.weekday())
                };
                if !on_day {
                    return false;
                }
                let weeks = (week_start(day) - week_start(anchor)).num_days() / 7;
                weeks % i64::from(self.interval) == 0
            }
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(dtstart) = self.dtstart {
            writeln!(f, "DTSTART:{}", format_stamp(dtstart))?;
        }
        write!(f, "RRULE:FREQ={}", self.freq)?;
        if self.interval > 1 {
            write!(f, ";INTERVAL={}", self.interval)?;
        }
        if !self.by_day.is_empty() {
            let days: Vec<&str> = self.by_day.iter().map(|d| byday_abbrev(*d)).collect();
            write!(f, ";BYDAY={}", days.join(","))?;
        }
        if let Some(until) = self.until {
            write!(f, ";UNTIL={}", format_stamp(until))?;
        }
        if let Some(count) = self.count {
            write!(f, ";COUNT={count}")?;
        }
        Ok(())
    }
}

/// Monday of the week containing `day`.
fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

fn parse_stamp(value: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%SZ") {
        return Ok(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y%m%d") {
        return Ok(d.and_time(NaiveTime::default()));
    }
    Err(Error::Validation(format!("invalid RRULE timestamp '{value}'")))
}

fn format_stamp(dt: NaiveDateTime) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

fn parse_byday(value: &str) -> Result<Weekday> {
    match value {
        "MO" => Ok(Weekday::Mon),
        "TU" => Ok(Weekday::Tue),
        "WE" => Ok(Weekday::Wed),
        "TH" => Ok(Weekday::Thu),
        "FR" => Ok(Weekday::Fri),
        "SA" => Ok(Weekday::Sat),
        "SU" => Ok(Weekday::Sun),
        other => Err(Error::Validation(format!("invalid BYDAY value '{other}'"))),
    }
}

pub(crate) fn byday_abbrev(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}
