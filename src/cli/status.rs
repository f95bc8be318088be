//! `hourgit status` - one-screen summary of the current tracking state.

use std::path::Path;

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Utc};

use crate::entry::{format_minutes, Store};
use crate::error::Result;
use crate::git;
use crate::project::Registry;
use crate::schedule::{expand_schedules, format_time_range, TimeOfDay, TimeWindow};
use crate::timetrack::{build_report, days_in_month};

use super::{home_dir, repo_dir, resolve_project_context};

pub fn run(project_flag: Option<&str>) -> Result<()> {
    let home = home_dir()?;
    let repo = repo_dir();
    let now = Local::now();

    let branch = repo
        .as_deref()
        .and_then(|dir| git::open_repo(Some(dir)).ok())
        .and_then(|repo| git::current_branch(&repo).ok());

    for line in status_lines(&home, repo.as_deref(), project_flag, branch.as_deref(), &now)? {
        println!("{line}");
    }
    Ok(())
}

pub fn status_lines<Tz: TimeZone>(
    home: &Path,
    repo: Option<&Path>,
    project_flag: Option<&str>,
    branch: Option<&str>,
    now: &DateTime<Tz>,
) -> Result<Vec<String>> {
    let project = resolve_project_context(home, repo, project_flag)?;
    let registry = Registry::load(home)?;
    let store = Store::new(home);

    let mut lines = Vec::new();
    lines.push(format!("Project:  {}", project.name));

    if let Some(branch) = branch {
        if !branch.is_empty() {
            lines.push(format!("Branch:   {branch}"));
        }
    }

    let checkouts = store.read_all_checkouts(&project.slug)?;
    if let Some(last) = checkouts.iter().max_by_key(|c| c.timestamp) {
        let ago = now.with_timezone(&Utc) - last.timestamp;
        lines.push(format!("Checked out:  {} ago", format_ago(ago.num_minutes())));
    }

    let schedules = registry.schedules_for(&project.id);
    let today = now.naive_local().date();
    let day_schedules = expand_schedules(&schedules, today, today)?;
    let today_windows: Vec<TimeWindow> = day_schedules
        .into_iter()
        .find(|ds| ds.date == today)
        .map(|ds| ds.windows)
        .unwrap_or_default();

    if today_windows.is_empty() {
        lines.push(String::new());
        lines.push("Today:    not a working day".to_string());
        return Ok(lines);
    }

    // Today's logged-plus-attributed minutes come from the full month report.
    let logs = store.read_all_logs(&project.slug)?;
    let generated: Vec<String> = store
        .read_all_generated_days(&project.slug)?
        .into_iter()
        .map(|g| g.date)
        .collect();

    let year = today.year();
    let month = today.month();
    let month_start = chrono::NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(today);
    let month_end = chrono::NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))
        .unwrap_or(today);
    let month_schedules = expand_schedules(&schedules, month_start, month_end)?;

    let report = build_report(&checkouts, &logs, &month_schedules, year, month, now, &generated);

    let today_minutes: i64 = report
        .rows
        .iter()
        .filter_map(|row| row.days.get(&today.day()))
        .sum();

    let scheduled: i64 = today_windows.iter().map(TimeWindow::minutes).sum();
    let remaining = (scheduled - today_minutes).max(0);

    lines.push(String::new());
    lines.push(format!(
        "Today:    {} logged · {} remaining",
        format_minutes(today_minutes),
        format_minutes(remaining)
    ));

    let windows: Vec<String> = today_windows
        .iter()
        .map(|w| format_time_range(&w.from.to_string(), &w.to.to_string()))
        .collect();
    lines.push(format!("Schedule: {}", windows.join(", ")));

    match active_window(now, &today_windows) {
        Some(until) => {
            let until = format_time_range(&until.to_string(), &until.to_string());
            let until = until.split(" - ").next().unwrap_or("").to_string();
            lines.push(format!("Tracking: active (until {until})"));
        }
        None => {
            lines.push("Tracking: inactive (no scheduled hours remaining)".to_string());
        }
    }

    Ok(lines)
}

fn format_ago(minutes: i64) -> String {
    let minutes = minutes.max(0);
    if minutes < 1 {
        return "just now".to_string();
    }
    let hours = minutes / 60;
    let mins = minutes % 60;
    match (hours, mins) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// If `now` falls inside a window, the window's end time.
fn active_window<Tz: TimeZone>(now: &DateTime<Tz>, windows: &[TimeWindow]) -> Option<TimeOfDay> {
    let local = now.naive_local();
    let now_minutes = i64::from(local.hour()) * 60 + i64::from(local.minute());
    windows
        .iter()
        .find(|w| {
            now_minutes >= w.from.minutes_from_midnight() && now_minutes < w.to.minutes_from_midnight()
        })
        .map(|w| w.to)
}
