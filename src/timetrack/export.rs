//! Export data for PDF timesheets.
//!
//! The same attribution pipeline as the monthly report, but preserving
//! individual entries grouped by day and task, with per-day and grand
//! totals. Checkout attribution on non-generated days produces one synthetic
//! entry per branch per day.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::entry::{CheckoutEntry, LogEntry};
use crate::schedule::DaySchedule;

use super::{
    build_checkout_bucket, build_schedule_lookup, days_in_month, deduct_schedule_overrun,
    generated_day_set,
};

/// A single time entry in the export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub start: DateTime<Utc>,
    pub minutes: i64,
    pub message: String,
}

/// Entries under one task name with a subtotal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTaskGroup {
    pub task: String,
    pub entries: Vec<ExportEntry>,
    pub total_minutes: i64,
}

/// All task groups for a single day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDay {
    pub date: NaiveDate,
    pub groups: Vec<ExportTaskGroup>,
    pub total_minutes: i64,
}

/// The complete export for a month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportData {
    pub project_name: String,
    pub year: i32,
    pub month: u32,
    pub days: Vec<ExportDay>,
    pub total_minutes: i64,
}

/// Display form of a branch name: the last `/`-separated segment, so
/// `feature/ENG-641/foo` renders as `foo`.
pub fn clean_branch_for_display(branch: &str) -> &str {
    branch.rsplit('/').next().unwrap_or(branch)
}

/// Build detailed export data for one month.
pub fn build_export_data<Tz: TimeZone>(
    checkouts: &[CheckoutEntry],
    logs: &[LogEntry],
    day_schedules: &[DaySchedule],
    year: i32,
    month: u32,
    now: &DateTime<Tz>,
    generated_days: &[String],
    project_name: &str,
) -> ExportData {
    let total_days = days_in_month(year, month);
    let generated_set = generated_day_set(generated_days, year, month);

    let (schedule_windows, scheduled_mins) = build_schedule_lookup(day_schedules, year, month);
    let mut checkout_bucket =
        build_checkout_bucket(checkouts, year, month, total_days, &schedule_windows, now);

    for day in &generated_set {
        for day_map in checkout_bucket.values_mut() {
            day_map.remove(day);
        }
    }

    let mut log_mins_by_day: HashMap<u32, i64> = HashMap::new();
    for log in logs {
        if log.start.year() == year && log.start.month() == month {
            *log_mins_by_day.entry(log.start.day()).or_insert(0) += log.minutes;
        }
    }

    deduct_schedule_overrun(
        &mut checkout_bucket,
        &log_mins_by_day,
        &scheduled_mins,
        total_days,
        &generated_set,
    );

    // day -> task -> entries
    let mut day_groups: BTreeMap<u32, BTreeMap<String, Vec<ExportEntry>>> = BTreeMap::new();

    for log in logs {
        if log.start.year() != year || log.start.month() != month {
            continue;
        }
        day_groups
            .entry(log.start.day())
            .or_default()
            .entry(log.task_key().to_string())
            .or_default()
            .push(ExportEntry {
                start: log.start,
                minutes: log.minutes,
                message: log.message.clone(),
            });
    }

    let nine_am = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default();
    for (branch, day_map) in &checkout_bucket {
        let display = clean_branch_for_display(branch).to_string();
        for (&day, &mins) in day_map {
            if mins <= 0 {
                continue;
            }
            let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
                continue;
            };
            day_groups
                .entry(day)
                .or_default()
                .entry(display.clone())
                .or_default()
                .push(ExportEntry {
                    start: Utc.from_utc_datetime(&date.and_time(nine_am)),
                    minutes: mins,
                    message: display.clone(),
                });
        }
    }

    let mut days = Vec::new();
    for (day, tasks) in day_groups {
        let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
            continue;
        };

        // BTreeMap iteration keeps tasks alphabetical within the day.
        let mut groups = Vec::new();
        for (task, mut entries) in tasks {
            let total: i64 = entries.iter().map(|e| e.minutes).sum();
            if total <= 0 {
                continue;
            }
            entries.sort_by_key(|e| e.start);
            groups.push(ExportTaskGroup {
                task,
                entries,
                total_minutes: total,
            });
        }

        if groups.is_empty() {
            continue;
        }

        let day_total = groups.iter().map(|g| g.total_minutes).sum();
        days.push(ExportDay {
            date,
            groups,
            total_minutes: day_total,
        });
    }

    let grand_total = days.iter().map(|d| d.total_minutes).sum();

    ExportData {
        project_name: project_name.to_string(),
        year,
        month,
        days,
        total_minutes: grand_total,
    }
}
