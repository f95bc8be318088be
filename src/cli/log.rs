//! `hourgit log` - manual time logging, plus the schedule warning checks
//! shared with `edit`.

use std::path::Path;

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Timelike, Utc};

use crate::entry::{format_minutes, parse_duration, LogEntry, Store, TYPE_LOG};
use crate::error::{Error, Result};
use crate::id;
use crate::project::{Project, Registry};
use crate::prompt::Prompter;
use crate::schedule::{
    self, expand_schedules, format_time_range, parse_time_of_day, TimeWindow,
};
use crate::timetrack::at_local;

use super::{home_dir, repo_dir, resolve_project_context};

pub struct LogOptions {
    pub message: Option<String>,
    pub duration: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<String>,
    pub task: Option<String>,
    pub project: Option<String>,
}

pub fn run(options: &LogOptions, prompter: &mut dyn Prompter) -> Result<()> {
    let home = home_dir()?;
    let repo = repo_dir();
    let now = Local::now();
    run_log(&home, repo.as_deref(), options, prompter, &now)
}

pub fn run_log<Tz: TimeZone>(
    home: &Path,
    repo: Option<&Path>,
    options: &LogOptions,
    prompter: &mut dyn Prompter,
    now: &DateTime<Tz>,
) -> Result<()> {
    let project = resolve_project_context(home, repo, options.project.as_deref())?;

    let has_duration = options.duration.is_some();
    let has_from = options.from.is_some();
    let has_to = options.to.is_some();

    if has_duration && (has_from || has_to) {
        return Err(Error::Validation(
            "--duration and --from/--to are mutually exclusive".to_string(),
        ));
    }

    // Resolve the date; prompt for it only in fully interactive runs.
    let mut date_flag = options.date.clone().unwrap_or_default();
    if date_flag.is_empty()
        && !has_duration
        && !has_from
        && !has_to
        && options.message.is_none()
    {
        date_flag = prompter.prompt("Date (YYYY-MM-DD, default: today)")?;
    }
    let base_date = resolve_base_date(&date_flag, now)?;

    // Resolve the time mode.
    let mut use_duration = has_duration;
    if !has_duration && !has_from && !has_to {
        let mode = prompter.select(
            "How do you want to log time?",
            &["Duration (e.g. 3h30m)", "Time range (e.g. 9am to 5pm)"],
        )?;
        use_duration = mode == 0;
    }

    let (start, minutes) = if use_duration {
        let duration = match &options.duration {
            Some(d) => d.clone(),
            None => prompter.prompt("Duration (e.g. 30m, 3h, 3h30m)")?,
        };
        let minutes = parse_duration(&duration)?;
        // Anchor the entry so it ends now (local wall clock) on the chosen date.
        let tz = now.timezone();
        let end = at_local(&tz, base_date.year(), base_date.month(), base_date.day(),
            now.hour(), now.minute(), 0)
            .ok_or_else(|| Error::Validation("invalid date".to_string()))?;
        let start = end.with_timezone(&Utc) - chrono::Duration::minutes(minutes);
        (start, minutes)
    } else {
        let from = match &options.from {
            Some(f) => f.clone(),
            None => prompter.prompt("From (e.g. 9am, 14:00)")?,
        };
        let to = match &options.to {
            Some(t) => t.clone(),
            None => prompter.prompt("To (e.g. 5pm, 17:00)")?,
        };
        parse_from_to(&from, &to, base_date, &now.timezone())?
    };

    if minutes > 24 * 60 {
        return Err(Error::Validation(
            "cannot log more than 24h in a single entry".to_string(),
        ));
    }

    if !check_schedule_warnings(home, &project, start, minutes, "", prompter)? {
        println!("cancelled");
        return Ok(());
    }

    if !check_submit_warning(home, &project.slug, base_date, prompter)? {
        println!("cancelled");
        return Ok(());
    }

    let message = match &options.message {
        Some(m) => m.clone(),
        None => prompter.prompt("Message")?,
    };
    if message.is_empty() {
        return Err(Error::Validation("message is required".to_string()));
    }

    let entry = LogEntry {
        id: id::id_fresh("log"),
        kind: TYPE_LOG.to_string(),
        start,
        minutes,
        message,
        task: options.task.clone().unwrap_or_default(),
        source: String::new(),
        created_at: now.with_timezone(&Utc),
    };

    Store::new(home).write_log(&project.slug, &entry)?;

    println!(
        "logged {} for project '{}' ({})",
        format_minutes(entry.minutes),
        project.name,
        entry.id
    );

    Ok(())
}

/// Resolve a `--date` value against `now`. Empty means today. Accepts the
/// full date vocabulary (`today`, weekday names, `YYYY-MM-DD`, ...).
pub(crate) fn resolve_base_date<Tz: TimeZone>(
    date_flag: &str,
    now: &DateTime<Tz>,
) -> Result<NaiveDate> {
    let today = now.naive_local().date();
    if date_flag.is_empty() {
        return Ok(today);
    }
    schedule::parse_date(date_flag, today)
}

/// Parse a from/to clock-time pair on `date`, in the given timezone.
/// Returns the UTC start and the duration in minutes.
pub(crate) fn parse_from_to<Tz: TimeZone>(
    from: &str,
    to: &str,
    date: NaiveDate,
    tz: &Tz,
) -> Result<(DateTime<Utc>, i64)> {
    let from_tod = parse_time_of_day(from)
        .map_err(|e| Error::Validation(format!("invalid --from time: {e}")))?;
    let to_tod = parse_time_of_day(to)
        .map_err(|e| Error::Validation(format!("invalid --to time: {e}")))?;

    if from_tod >= to_tod {
        return Err(Error::Validation(format!(
            "--from ({from_tod}) must be before --to ({to_tod})"
        )));
    }

    let start = at_local(tz, date.year(), date.month(), date.day(), from_tod.hour, from_tod.minute, 0)
        .ok_or_else(|| Error::Validation("invalid date".to_string()))?;
    let end = at_local(tz, date.year(), date.month(), date.day(), to_tod.hour, to_tod.minute, 0)
        .ok_or_else(|| Error::Validation("invalid date".to_string()))?;

    let start = start.with_timezone(&Utc);
    let end = end.with_timezone(&Utc);
    Ok((start, (end - start).num_minutes()))
}

/// The three graded schedule checks before writing an entry: a day with no
/// scheduled hours, an entry outside the windows, and an entry exceeding the
/// remaining budget. `exclude_id` keeps an edited entry's own old value out
/// of the budget sum. Returns false when the user declines.
pub(crate) fn check_schedule_warnings(
    home: &Path,
    project: &Project,
    start: DateTime<Utc>,
    minutes: i64,
    exclude_id: &str,
    prompter: &mut dyn Prompter,
) -> Result<bool> {
    let (windows, scheduled_minutes) = day_schedule_windows(home, project, start)?;

    if scheduled_minutes == 0 {
        println!("Warning: this day has no scheduled working hours.");
        return prompter.confirm("Continue anyway?");
    }

    if !check_bounds_warning(&windows, start, minutes, prompter)? {
        return Ok(false);
    }

    check_budget_warning(home, project, start, minutes, scheduled_minutes, exclude_id, prompter)
}

/// Windows and total scheduled minutes for the (UTC) day containing `start`.
fn day_schedule_windows(
    home: &Path,
    project: &Project,
    start: DateTime<Utc>,
) -> Result<(Vec<TimeWindow>, i64)> {
    let registry = Registry::load(home)?;
    let schedules = registry.schedules_for(&project.id);

    let day = start.date_naive();
    let expanded = expand_schedules(&schedules, day, day)?;

    let windows = expanded
        .into_iter()
        .find(|ds| ds.date == day)
        .map(|ds| ds.windows)
        .unwrap_or_default();

    let scheduled: i64 = windows.iter().map(TimeWindow::minutes).sum();
    Ok((windows, scheduled))
}

fn check_bounds_warning(
    windows: &[TimeWindow],
    start: DateTime<Utc>,
    minutes: i64,
    prompter: &mut dyn Prompter,
) -> Result<bool> {
    let entry_from = i64::from(start.hour()) * 60 + i64::from(start.minute());
    let entry_to = entry_from + minutes;

    let mut overlap = 0;
    for w in windows {
        let w_from = w.from.minutes_from_midnight();
        let w_to = w.to.minutes_from_midnight();
        let o = entry_to.min(w_to) - entry_from.max(w_from);
        if o > 0 {
            overlap += o;
        }
    }

    let summary: Vec<String> = windows
        .iter()
        .map(|w| format_time_range(&w.from.to_string(), &w.to.to_string()))
        .collect();
    let summary = summary.join(", ");

    if overlap == 0 {
        println!("Warning: this entry falls outside your scheduled hours ({summary}).");
    } else if overlap < minutes {
        println!("Warning: this entry partially falls outside your scheduled hours ({summary}).");
    } else {
        return Ok(true);
    }

    prompter.confirm("Continue anyway?")
}

fn check_budget_warning(
    home: &Path,
    project: &Project,
    start: DateTime<Utc>,
    minutes: i64,
    scheduled_minutes: i64,
    exclude_id: &str,
    prompter: &mut dyn Prompter,
) -> Result<bool> {
    let store = Store::new(home);
    let entries = store.read_all_logs(&project.slug)?;

    let day = start.date_naive();
    let logged: i64 = entries
        .iter()
        .filter(|e| e.id != exclude_id)
        .filter(|e| e.start.date_naive() == day)
        .map(|e| e.minutes)
        .sum();

    let remaining = scheduled_minutes - logged;
    if minutes <= remaining {
        return Ok(true);
    }

    if remaining <= 0 {
        println!(
            "Warning: you have already logged your full schedule for this day ({} scheduled, {} logged).",
            format_minutes(scheduled_minutes),
            format_minutes(logged)
        );
    } else {
        println!(
            "Warning: you are about to log {}, but only {} remains in this day's schedule ({} scheduled, {} already logged).",
            format_minutes(minutes),
            format_minutes(remaining),
            format_minutes(scheduled_minutes),
            format_minutes(logged)
        );
    }

    prompter.confirm("Continue anyway?")
}

/// Warn when the touched date falls inside a previously submitted period.
/// Returns false when the user declines.
pub(crate) fn check_submit_warning(
    home: &Path,
    slug: &str,
    date: NaiveDate,
    prompter: &mut dyn Prompter,
) -> Result<bool> {
    let store = Store::new(home);
    let submits = store.read_all_submits(slug)?;

    for submit in submits {
        let from = submit.from.date_naive();
        let to = submit.to.date_naive();
        if date >= from && date <= to {
            println!(
                "Warning: {date} falls within a submitted period ({from} to {to})."
            );
            return prompter.confirm("Modify it anyway?");
        }
    }

    Ok(true)
}
