//! `hourgit config` - per-project schedule management, including the
//! interactive schedule editor shared with `defaults`.

use std::path::Path;

use chrono::{Datelike, Duration, Local, NaiveDate};

use crate::error::{Error, Result};
use crate::project::{self, Registry};
use crate::prompt::{Prompter, StdinPrompter};
use crate::schedule::{
    date_range_rule, expand_schedules, format_day_schedule, format_schedule_entry, parse_date,
    parse_recurrence, parse_time_of_day, single_date_rule, validate_ranges, ScheduleEntry,
    TimeRange,
};
use crate::timetrack::days_in_month;

use super::{home_dir, repo_dir, resolve_project_context, ConfigCommands};

pub fn run(command: ConfigCommands) -> Result<()> {
    let home = home_dir()?;
    let repo = repo_dir();
    let repo = repo.as_deref();

    match command {
        ConfigCommands::Get { project } => get(&home, repo, project.as_deref()),
        ConfigCommands::Set { project } => {
            set(&home, repo, project.as_deref(), &mut StdinPrompter)
        }
        ConfigCommands::Reset { project } => reset(&home, repo, project.as_deref()),
        ConfigCommands::Report { project } => report(&home, repo, project.as_deref()),
    }
}

fn get(home: &Path, repo: Option<&Path>, project_flag: Option<&str>) -> Result<()> {
    let project = resolve_project_context(home, repo, project_flag)?;
    let registry = Registry::load(home)?;

    let own = registry
        .find_by_id(&project.id)
        .map(|p| !p.schedules.is_empty())
        .unwrap_or(false);
    let schedules = registry.schedules_for(&project.id);

    println!(
        "Schedule for '{}'{}:",
        project.name,
        if own { "" } else { " (defaults)" }
    );
    for entry in &schedules {
        println!("  {}", format_schedule_entry(entry));
    }
    Ok(())
}

pub fn set(
    home: &Path,
    repo: Option<&Path>,
    project_flag: Option<&str>,
    prompter: &mut dyn Prompter,
) -> Result<()> {
    let project = resolve_project_context(home, repo, project_flag)?;
    let registry = Registry::load(home)?;
    let current = registry.schedules_for(&project.id);

    println!("Editing schedule for '{}'", project.name);
    let today = Local::now().date_naive();
    let edited = edit_schedules(current, today, prompter)?;

    project::set_schedules(home, &project.id, edited)?;
    println!("schedule for '{}' saved", project.name);
    Ok(())
}

fn reset(home: &Path, repo: Option<&Path>, project_flag: Option<&str>) -> Result<()> {
    let project = resolve_project_context(home, repo, project_flag)?;
    project::set_schedules(home, &project.id, Vec::new())?;
    println!("schedule for '{}' reset to defaults", project.name);
    Ok(())
}

fn report(home: &Path, repo: Option<&Path>, project_flag: Option<&str>) -> Result<()> {
    let project = resolve_project_context(home, repo, project_flag)?;
    let registry = Registry::load(home)?;
    let schedules = registry.schedules_for(&project.id);

    let today = Local::now().date_naive();
    for line in schedule_report_lines(&schedules, today)? {
        println!("{line}");
    }
    Ok(())
}

/// One line per scheduled day of the month containing `today`.
pub(crate) fn schedule_report_lines(
    schedules: &[ScheduleEntry],
    today: NaiveDate,
) -> Result<Vec<String>> {
    let year = today.year();
    let month = today.month();
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::Validation("invalid date".to_string()))?;
    let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))
        .ok_or_else(|| Error::Validation("invalid date".to_string()))?;

    let days = expand_schedules(schedules, first, last)?;
    if days.is_empty() {
        return Ok(vec!["no scheduled days this month".to_string()]);
    }
    Ok(days.iter().map(format_day_schedule).collect())
}

// =============================================================================
// Interactive editor
// =============================================================================

/// The add/edit/delete/quit loop over a schedule list. Returns the edited
/// list when the user quits.
pub(crate) fn edit_schedules(
    mut schedules: Vec<ScheduleEntry>,
    today: NaiveDate,
    prompter: &mut dyn Prompter,
) -> Result<Vec<ScheduleEntry>> {
    loop {
        if schedules.is_empty() {
            println!("  (no schedules)");
        } else {
            for (i, entry) in schedules.iter().enumerate() {
                println!("  {}. {}", i + 1, format_schedule_entry(entry));
            }
        }

        let action = prompter.prompt("[a]dd  [e]dit N  [d]elete N  [q]uit")?;
        let action = action.trim().to_lowercase();

        if action == "q" || action == "quit" {
            return Ok(schedules);
        }

        if action == "a" || action == "add" {
            match build_schedule_entry(today, prompter) {
                Ok(mut entry) => {
                    if entries_overlap(&schedules, &entry, today)
                        && prompter.confirm(
                            "This schedule overlaps with existing entries. Override them for matching days?",
                        )?
                    {
                        entry.override_windows = true;
                    }
                    schedules.push(entry);
                }
                Err(e) => println!("error: {e}"),
            }
            continue;
        }

        if let Some(rest) = action.strip_prefix("e ").or_else(|| action.strip_prefix("edit ")) {
            match parse_index(rest, schedules.len()) {
                Ok(idx) => match build_schedule_entry(today, prompter) {
                    Ok(mut entry) => {
                        let mut others = schedules.clone();
                        others.remove(idx);
                        if entries_overlap(&others, &entry, today)
                            && prompter.confirm(
                                "This schedule overlaps with existing entries. Override them for matching days?",
                            )?
                        {
                            entry.override_windows = true;
                        }
                        schedules[idx] = entry;
                    }
                    Err(e) => println!("error: {e}"),
                },
                Err(e) => println!("error: {e}"),
            }
            continue;
        }

        if let Some(rest) = action.strip_prefix("d ").or_else(|| action.strip_prefix("delete ")) {
            match parse_index(rest, schedules.len()) {
                Ok(idx) => {
                    schedules.remove(idx);
                }
                Err(e) => println!("error: {e}"),
            }
            continue;
        }

        println!("unknown action, use [a]dd, [e]dit N, [d]elete N, or [q]uit");
    }
}

fn parse_index(input: &str, len: usize) -> Result<usize> {
    let n: usize = input
        .trim()
        .parse()
        .map_err(|_| Error::InvalidArgument(format!("invalid index '{}'", input.trim())))?;
    if n < 1 || n > len {
        return Err(Error::InvalidArgument(format!("index {n} out of range")));
    }
    Ok(n - 1)
}

/// Step-by-step builder for one schedule entry: kind, recurrence or dates,
/// then one or more time ranges.
fn build_schedule_entry(today: NaiveDate, prompter: &mut dyn Prompter) -> Result<ScheduleEntry> {
    let kind = prompter.select(
        "Schedule type",
        &["Recurring", "One-off date", "Date range"],
    )?;

    let rrule = match kind {
        0 => {
            let input =
                prompter.prompt("Recurrence (e.g. every weekday, every monday, every 2 weeks)")?;
            parse_recurrence(&input)?.to_string()
        }
        1 => {
            let input = prompter.prompt("Date")?;
            single_date_rule(parse_date(&input, today)?).to_string()
        }
        _ => {
            let start = parse_date(&prompter.prompt("Start date")?, today)?;
            let end = parse_date(&prompter.prompt("End date")?, today)?;
            if start >= end {
                return Err(Error::Validation(
                    "start date must be before end date".to_string(),
                ));
            }
            date_range_rule(start, end).to_string()
        }
    };

    let mut ranges = Vec::new();
    loop {
        let from = prompter.prompt("From time (e.g. 9am, 14:00)")?;
        let to = prompter.prompt("To time (e.g. 5pm, 17:00)")?;

        let from_tod = parse_time_of_day(&from)?;
        let to_tod = parse_time_of_day(&to)?;
        ranges.push(TimeRange {
            from: from_tod.to_string(),
            to: to_tod.to_string(),
        });
        validate_ranges(&ranges)?;

        if !prompter.confirm("Add another time range?")? {
            break;
        }
    }

    Ok(ScheduleEntry {
        ranges,
        rrule,
        override_windows: false,
    })
}

/// True when the new entry produces windows on any date an existing entry
/// already covers, sampled over the eight weeks from `today`.
fn entries_overlap(existing: &[ScheduleEntry], new: &ScheduleEntry, today: NaiveDate) -> bool {
    let horizon = today + Duration::weeks(8);

    let Ok(new_days) = expand_schedules(std::slice::from_ref(new), today, horizon) else {
        return false;
    };
    let Ok(existing_days) = expand_schedules(existing, today, horizon) else {
        return false;
    };

    let existing_dates: std::collections::HashSet<NaiveDate> =
        existing_days.into_iter().map(|d| d.date).collect();
    new_days.iter().any(|d| existing_dates.contains(&d.date))
}
