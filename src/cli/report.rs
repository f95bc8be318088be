//! `hourgit report` - the interactive monthly table and the PDF export.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone, Weekday};

use crate::entry::{format_minutes, Store};
use crate::error::{Error, Result};
use crate::pdf;
use crate::project::{Project, Registry};
use crate::schedule::expand_schedules;
use crate::timetrack::{
    build_detailed_report, build_export_data, days_in_month, DetailedReportData,
};
use crate::ui::report_table;

use super::{home_dir, repo_dir, resolve_project_context};

pub struct ReportOptions {
    pub month: Option<u32>,
    pub week: Option<u32>,
    pub year: Option<i32>,
    pub project: Option<String>,
    pub export: Option<String>,
    pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub(crate) struct ReportInputs {
    pub project: Project,
    pub checkouts: Vec<crate::entry::CheckoutEntry>,
    pub logs: Vec<crate::entry::LogEntry>,
    pub schedules: Vec<crate::schedule::DaySchedule>,
    pub generated_days: Vec<String>,
    pub year: i32,
    pub month: u32,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

pub fn run(options: &ReportOptions) -> Result<()> {
    let home = home_dir()?;
    let repo = repo_dir();
    let now = Local::now();

    let inputs = load_report_inputs(&home, repo.as_deref(), options, &now)?;

    if let Some(format) = &options.export {
        if format != "pdf" {
            return Err(Error::InvalidArgument(format!(
                "unsupported export format '{format}'"
            )));
        }

        let data = build_export_data(
            &inputs.checkouts,
            &inputs.logs,
            &inputs.schedules,
            inputs.year,
            inputs.month,
            &now,
            &inputs.generated_days,
            &inputs.project.name,
        );

        if data.days.is_empty() {
            println!("No time entries for {}.", month_label(inputs.year, inputs.month));
            return Ok(());
        }

        let path = options.output.clone().unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}-{}-{:02}.pdf",
                inputs.project.slug, inputs.year, inputs.month
            ))
        });

        pdf::render_timesheet(&data, &path)?;
        println!("Exported report to {}", path.display());
        return Ok(());
    }

    let data = build_detailed_report(
        &inputs.checkouts,
        &inputs.logs,
        &inputs.schedules,
        inputs.from,
        inputs.to,
        &now,
    );

    if data.rows.is_empty() {
        println!("No time entries for {}.", month_label(inputs.year, inputs.month));
        return Ok(());
    }

    if is_tty() {
        report_table::run(&home, &inputs.project.slug, data)
    } else {
        for line in plain_table_lines(&data) {
            println!("{line}");
        }
        Ok(())
    }
}

fn is_tty() -> bool {
    use crossterm::tty::IsTty;
    std::io::stdout().is_tty()
}

fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_else(|| format!("{year}-{month:02}"))
}

/// Resolve the reporting period and load everything both report paths need.
pub(crate) fn load_report_inputs<Tz: TimeZone>(
    home: &Path,
    repo: Option<&Path>,
    options: &ReportOptions,
    now: &DateTime<Tz>,
) -> Result<ReportInputs> {
    let project = resolve_project_context(home, repo, options.project.as_deref())?;

    let today = now.naive_local().date();
    let year = match options.year {
        Some(y) if y > 0 => y,
        Some(y) => {
            return Err(Error::Validation(format!(
                "invalid --year value '{y}' (expected a positive number)"
            )))
        }
        None => today.year(),
    };

    let (from, to) = if let Some(week) = options.week {
        if options.month.is_some() {
            return Err(Error::Validation(
                "--week and --month are mutually exclusive".to_string(),
            ));
        }
        week_range(year, week)?
    } else {
        let month = match options.month {
            Some(m) if (1..=12).contains(&m) => m,
            Some(m) => {
                return Err(Error::Validation(format!(
                    "invalid --month value '{m}' (expected 1-12)"
                )))
            }
            None => today.month(),
        };
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Error::Validation("invalid month".to_string()))?;
        let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))
            .ok_or_else(|| Error::Validation("invalid month".to_string()))?;
        (first, last)
    };

    // The month grid is the month containing the period start.
    let year = from.year();
    let month = from.month();

    let registry = Registry::load(home)?;
    let schedules = registry.schedules_for(&project.id);
    let month_first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::Validation("invalid month".to_string()))?;
    let month_last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))
        .ok_or_else(|| Error::Validation("invalid month".to_string()))?;
    let day_schedules = expand_schedules(&schedules, month_first, month_last)?;

    let store = Store::new(home);
    let logs = store.read_all_logs(&project.slug)?;
    let checkouts = store.read_all_checkouts(&project.slug)?;
    let generated_days = store
        .read_all_generated_days(&project.slug)?
        .into_iter()
        .map(|g| g.date)
        .collect();

    Ok(ReportInputs {
        project,
        checkouts,
        logs,
        schedules: day_schedules,
        generated_days,
        year,
        month,
        from,
        to,
    })
}

/// Monday-Sunday range of the given ISO week number in `year`.
fn week_range(year: i32, week: u32) -> Result<(NaiveDate, NaiveDate)> {
    let monday = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).ok_or_else(|| {
        Error::Validation(format!("invalid --week value '{week}' for {year}"))
    })?;
    Ok((monday, monday + Duration::days(6)))
}

/// Fallback rendering for non-interactive terminals.
pub(crate) fn plain_table_lines(data: &DetailedReportData) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} ({} - {})",
        month_label(data.year, data.month),
        data.from,
        data.to
    ));

    for row in &data.rows {
        lines.push(format!("{}  {}", row.name, format_minutes(row.total_minutes)));
        let mut days: Vec<_> = row.days.iter().collect();
        days.sort_by_key(|(day, _)| **day);
        for (day, cell) in days {
            lines.push(format!(
                "  {:02}: {}",
                day,
                format_minutes(cell.total_minutes)
            ));
        }
    }

    let total: i64 = data.rows.iter().map(|r| r.total_minutes).sum();
    lines.push(format!("total  {}", format_minutes(total)));
    lines
}
