//! `hourgit generate` - materialise checkout-attributed time into editable
//! log entries, leaving a generated-day marker per affected date so the
//! attribution engine does not double-count.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone, Utc};

use crate::entry::{
    format_minutes, GeneratedDayEntry, LogEntry, Store, SOURCE_GENERATE, TYPE_GENERATED_DAY,
    TYPE_LOG,
};
use crate::error::{Error, Result};
use crate::id;
use crate::project::Registry;
use crate::prompt::Prompter;
use crate::schedule::expand_schedules;
use crate::timetrack::{build_checkout_attribution, days_in_month};

use super::{home_dir, repo_dir, resolve_project_context};

pub struct GenerateOptions {
    pub today: bool,
    pub week: bool,
    pub month: bool,
    pub date: Option<String>,
    pub project: Option<String>,
}

/// One preview line: the entry that would be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    pub date: NaiveDate,
    pub branch: String,
    pub minutes: i64,
}

pub fn run(options: &GenerateOptions, prompter: &mut dyn Prompter) -> Result<()> {
    let home = home_dir()?;
    let repo = repo_dir();
    let now = Local::now();
    run_generate(&home, repo.as_deref(), options, prompter, &now)
}

pub fn run_generate<Tz: TimeZone>(
    home: &Path,
    repo: Option<&Path>,
    options: &GenerateOptions,
    prompter: &mut dyn Prompter,
    now: &DateTime<Tz>,
) -> Result<()> {
    let project = resolve_project_context(home, repo, options.project.as_deref())?;

    let (from, to) = resolve_date_range(options, prompter, now)?;

    let registry = Registry::load(home)?;
    let schedules = registry.schedules_for(&project.id);

    // Expand over the whole months the range touches.
    let range_start = NaiveDate::from_ymd_opt(from.year(), from.month(), 1)
        .ok_or_else(|| Error::Validation("invalid date range".to_string()))?;
    let range_end = NaiveDate::from_ymd_opt(to.year(), to.month(), days_in_month(to.year(), to.month()))
        .ok_or_else(|| Error::Validation("invalid date range".to_string()))?;
    let day_schedules = expand_schedules(&schedules, range_start, range_end)?;

    let store = Store::new(home);
    let checkouts = store.read_all_checkouts(&project.slug)?;

    // Overlap with already-generated days requires explicit consent.
    let existing = store.read_all_generated_days(&project.slug)?;
    let requested: HashSet<String> = date_range(from, to)
        .into_iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();
    let overlap: HashSet<String> = existing
        .iter()
        .filter(|g| requested.contains(&g.date))
        .map(|g| g.date.clone())
        .collect();

    if !overlap.is_empty() {
        println!(
            "Warning: {} day(s) in this range have already been generated.",
            overlap.len()
        );
        if !prompter.confirm("Overwrite existing generated entries?")? {
            return Ok(());
        }
        delete_generated_entries(&store, &project.slug, &overlap)?;
        store.delete_generated_days_by_date(&project.slug, &overlap)?;
    }

    let entries = build_pending_entries(&checkouts, &day_schedules, from, to, now);

    if entries.is_empty() {
        println!("No checkout time to generate for the selected range.");
        return Ok(());
    }

    println!("Entries to generate:");
    println!();
    for e in &entries {
        println!("  {}  {}  {}", e.date, e.branch, format_minutes(e.minutes));
    }
    println!();

    if !prompter.confirm(&format!("Create {} entries?", entries.len()))? {
        return Ok(());
    }

    let mut created = 0usize;
    let mut marked: BTreeSet<NaiveDate> = BTreeSet::new();
    let nine_am = chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default();

    for pending in &entries {
        store.write_log(
            &project.slug,
            &LogEntry {
                id: id::id_fresh("generate"),
                kind: TYPE_LOG.to_string(),
                start: Utc.from_utc_datetime(&pending.date.and_time(nine_am)),
                minutes: pending.minutes,
                message: pending.branch.clone(),
                task: pending.branch.clone(),
                source: SOURCE_GENERATE.to_string(),
                created_at: now.with_timezone(&Utc),
            },
        )?;
        created += 1;

        if marked.insert(pending.date) {
            store.write_generated_day(
                &project.slug,
                &GeneratedDayEntry {
                    id: id::id_fresh("generated_day"),
                    kind: TYPE_GENERATED_DAY.to_string(),
                    date: pending.date.format("%Y-%m-%d").to_string(),
                },
            )?;
        }
    }

    println!(
        "Generated {created} entries across {} days for project '{}'.",
        marked.len(),
        project.name
    );

    Ok(())
}

/// Resolve the date range from flags or an interactive selection. The range
/// flags are mutually exclusive.
fn resolve_date_range<Tz: TimeZone>(
    options: &GenerateOptions,
    prompter: &mut dyn Prompter,
    now: &DateTime<Tz>,
) -> Result<(NaiveDate, NaiveDate)> {
    let flag_count = usize::from(options.today)
        + usize::from(options.week)
        + usize::from(options.month)
        + usize::from(options.date.is_some());
    if flag_count > 1 {
        return Err(Error::Validation(
            "only one of --today, --week, --month, or --date can be specified".to_string(),
        ));
    }

    let today = now.naive_local().date();

    if options.today {
        return Ok((today, today));
    }
    if options.week {
        return Ok(week_of(today));
    }
    if options.month {
        return Ok(month_of(today));
    }
    if let Some(date) = &options.date {
        let d = parse_specific_date(date)?;
        return Ok((d, d));
    }

    // Interactive mode.
    let choice = prompter.select(
        "Generate for which timeframe?",
        &["Today", "This week (Mon-Sun)", "Specific date", "This month"],
    )?;
    match choice {
        0 => Ok((today, today)),
        1 => Ok(week_of(today)),
        2 => {
            let input = prompter.prompt("Date (YYYY-MM-DD)")?;
            let d = parse_specific_date(&input)?;
            Ok((d, d))
        }
        _ => Ok(month_of(today)),
    }
}

fn parse_specific_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        Error::Validation(format!("invalid date format, expected YYYY-MM-DD: '{input}'"))
    })
}

/// Monday-Sunday week containing `day`.
fn week_of(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = day - Duration::days(i64::from(day.weekday().num_days_from_monday()));
    (monday, monday + Duration::days(6))
}

fn month_of(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = NaiveDate::from_ymd_opt(day.year(), day.month(), 1).unwrap_or(day);
    let last = NaiveDate::from_ymd_opt(
        day.year(),
        day.month(),
        days_in_month(day.year(), day.month()),
    )
    .unwrap_or(day);
    (first, last)
}

fn date_range(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut d = from;
    while d <= to {
        dates.push(d);
        d += Duration::days(1);
    }
    dates
}

/// Checkout attribution for every month the range touches, restricted to
/// the requested dates, sorted by date then branch.
pub fn build_pending_entries<Tz: TimeZone>(
    checkouts: &[crate::entry::CheckoutEntry],
    day_schedules: &[crate::schedule::DaySchedule],
    from: NaiveDate,
    to: NaiveDate,
    now: &DateTime<Tz>,
) -> Vec<PendingEntry> {
    let mut months = BTreeSet::new();
    for d in date_range(from, to) {
        months.insert((d.year(), d.month()));
    }

    let mut result = Vec::new();
    for (year, month) in months {
        let bucket = build_checkout_attribution(checkouts, day_schedules, year, month, now);
        for (branch, day_map) in bucket {
            for (day, minutes) in day_map {
                if minutes <= 0 {
                    continue;
                }
                let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
                    continue;
                };
                if date < from || date > to {
                    continue;
                }
                result.push(PendingEntry {
                    date,
                    branch: branch.clone(),
                    minutes,
                });
            }
        }
    }

    result.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.branch.cmp(&b.branch)));
    result
}

/// Delete `source=generate` log entries falling on the given dates.
fn delete_generated_entries(store: &Store, slug: &str, dates: &HashSet<String>) -> Result<()> {
    for entry in store.read_all_logs(slug)? {
        if entry.source != SOURCE_GENERATE {
            continue;
        }
        if dates.contains(&entry.start.format("%Y-%m-%d").to_string()) {
            store.delete(slug, &entry.id)?;
        }
    }
    Ok(())
}
