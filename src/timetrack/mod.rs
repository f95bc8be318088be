//! The time-attribution core.
//!
//! Combines checkout events, manual log entries, and expanded day schedules
//! into per-task per-day minute totals. Checkout ranges are clipped to the
//! schedule windows of each day, the open range is capped at `now`, days
//! already materialised by `generate` are zeroed, and a proportional
//! deduction keeps each day's checkout total within the scheduled minutes
//! that manual logs have not already claimed.
//!
//! Schedule windows are local clock times: they are interpreted in the
//! timezone of `now`, which is why the builders are generic over
//! [`chrono::TimeZone`]. Checkout timestamps are UTC throughout.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, TimeZone, Utc};

use crate::entry::{CheckoutEntry, LogEntry, SOURCE_CHECKOUT_GENERATED};
use crate::schedule::{DaySchedule, TimeWindow};

mod export;

pub use export::{
    build_export_data, clean_branch_for_display, ExportData, ExportDay, ExportEntry,
    ExportTaskGroup,
};

/// Aggregated time for a single task (branch or manual log key).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub name: String,
    pub total_minutes: i64,
    /// day-of-month -> minutes
    pub days: HashMap<u32, i64>,
}

/// The complete report for a month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportData {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    pub rows: Vec<TaskRow>,
}

/// A single entry within a report cell. `persisted` is false for synthetic
/// checkout-derived entries that exist only in memory until the user edits
/// or submits them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEntry {
    pub id: String,
    pub start: DateTime<Utc>,
    pub minutes: i64,
    pub message: String,
    pub task: String,
    pub source: String,
    pub persisted: bool,
    /// The backing record for persisted entries; `None` for in-memory ones.
    pub entry: Option<LogEntry>,
}

/// All entries for one (task, day) cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellData {
    pub entries: Vec<CellEntry>,
    pub total_minutes: i64,
}

/// Entry-level time data for a single task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailedTaskRow {
    pub name: String,
    pub total_minutes: i64,
    pub days: HashMap<u32, CellData>,
}

/// The entry-level report for a date range within one month. This is what
/// the interactive table edits and submits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailedReportData {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub rows: Vec<DetailedTaskRow>,
    /// Days-of-month that have any scheduled working hours.
    pub scheduled_days: HashSet<u32>,
}

/// Strip the `remotes/` prefix from branch names.
fn clean_branch_name(name: &str) -> &str {
    name.strip_prefix("remotes/").unwrap_or(name)
}

/// Number of days in the given month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month >= 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

/// Build the monthly report.
///
/// `generated_days` holds "YYYY-MM-DD" dates whose checkout attribution has
/// already been turned into editable log entries by `generate`; those days
/// contribute no checkout time.
pub fn build_report<Tz: TimeZone>(
    checkouts: &[CheckoutEntry],
    logs: &[LogEntry],
    day_schedules: &[DaySchedule],
    year: i32,
    month: u32,
    now: &DateTime<Tz>,
    generated_days: &[String],
) -> ReportData {
    let total_days = days_in_month(year, month);
    let generated_set = generated_day_set(generated_days, year, month);

    let (schedule_windows, scheduled_mins) = build_schedule_lookup(day_schedules, year, month);
    let (log_bucket, log_mins_by_day) = build_log_bucket(logs, year, month);
    let mut checkout_bucket =
        build_checkout_bucket(checkouts, year, month, total_days, &schedule_windows, now);

    for day in &generated_set {
        for day_map in checkout_bucket.values_mut() {
            day_map.remove(day);
        }
    }

    deduct_schedule_overrun(
        &mut checkout_bucket,
        &log_mins_by_day,
        &scheduled_mins,
        total_days,
        &generated_set,
    );

    ReportData {
        year,
        month,
        days_in_month: total_days,
        rows: merge_and_sort_rows(checkout_bucket, log_bucket),
    }
}

/// Raw checkout minutes per branch per day, before the overrun deduction.
/// `generate` uses this to materialise checkout time into log entries.
pub fn build_checkout_attribution<Tz: TimeZone>(
    checkouts: &[CheckoutEntry],
    day_schedules: &[DaySchedule],
    year: i32,
    month: u32,
    now: &DateTime<Tz>,
) -> HashMap<String, HashMap<u32, i64>> {
    let total_days = days_in_month(year, month);
    let (schedule_windows, _) = build_schedule_lookup(day_schedules, year, month);
    build_checkout_bucket(checkouts, year, month, total_days, &schedule_windows, now)
}

fn generated_day_set(generated_days: &[String], year: i32, month: u32) -> HashSet<u32> {
    generated_days
        .iter()
        .filter_map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .filter(|d| d.year() == year && d.month() == month)
        .map(|d| d.day())
        .collect()
}

/// day -> windows and day -> total scheduled minutes for the target month.
fn build_schedule_lookup(
    day_schedules: &[DaySchedule],
    year: i32,
    month: u32,
) -> (HashMap<u32, Vec<TimeWindow>>, HashMap<u32, i64>) {
    let mut windows = HashMap::new();
    let mut minutes = HashMap::new();
    for ds in day_schedules {
        if ds.date.year() == year && ds.date.month() == month {
            minutes.insert(ds.date.day(), ds.scheduled_minutes());
            windows.insert(ds.date.day(), ds.windows.clone());
        }
    }
    (windows, minutes)
}

/// Bucket log entries by (task key, day) and total raw logged minutes per day.
fn build_log_bucket(
    logs: &[LogEntry],
    year: i32,
    month: u32,
) -> (HashMap<String, HashMap<u32, i64>>, HashMap<u32, i64>) {
    let mut bucket: HashMap<String, HashMap<u32, i64>> = HashMap::new();
    let mut by_day: HashMap<u32, i64> = HashMap::new();

    for log in logs {
        if log.start.year() != year || log.start.month() != month {
            continue;
        }
        let day = log.start.day();
        *bucket
            .entry(log.task_key().to_string())
            .or_default()
            .entry(day)
            .or_insert(0) += log.minutes;
        *by_day.entry(day).or_insert(0) += log.minutes;
    }

    (bucket, by_day)
}

struct CheckoutRange {
    branch: String,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

/// Resolve an instant from local wall-clock components in `tz`, tolerating
/// DST folds (earliest wins) and gaps (skip forward).
pub(crate) fn at_local<Tz: TimeZone>(
    tz: &Tz,
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Option<DateTime<Tz>> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let mut naive = date.and_hms_opt(hour, minute, second)?;
    for _ in 0..4 {
        match tz.from_local_datetime(&naive) {
            LocalResult::Single(t) => return Some(t),
            LocalResult::Ambiguous(earliest, _) => return Some(earliest),
            LocalResult::None => naive += Duration::hours(1),
        }
    }
    None
}

/// Compute per-branch, per-day minutes from checkout entries clipped to
/// schedule windows. Window times are interpreted in the timezone of `now`.
fn build_checkout_bucket<Tz: TimeZone>(
    checkouts: &[CheckoutEntry],
    year: i32,
    month: u32,
    total_days: u32,
    schedule_windows: &HashMap<u32, Vec<TimeWindow>>,
    now: &DateTime<Tz>,
) -> HashMap<String, HashMap<u32, i64>> {
    let tz = now.timezone();

    let mut sorted: Vec<&CheckoutEntry> = checkouts.iter().collect();
    sorted.sort_by_key(|c| c.timestamp);

    // Consecutive checkouts onto the same branch collapse into one range.
    sorted.dedup_by(|b, a| clean_branch_name(&b.next) == clean_branch_name(&a.next));

    let Some(month_start) = at_local(&tz, year, month, 1, 0, 0, 0) else {
        return HashMap::new();
    };
    let Some(month_end) = at_local(&tz, year, month, total_days, 23, 59, 59) else {
        return HashMap::new();
    };
    let month_start_utc = month_start.with_timezone(&Utc);
    let month_end_utc = month_end.with_timezone(&Utc);

    let mut ranges: Vec<CheckoutRange> = Vec::new();

    // The branch active when the month opens: the latest checkout at or
    // before month start.
    if let Some(last_before) = sorted
        .iter()
        .filter(|c| c.timestamp <= month_start_utc)
        .last()
    {
        ranges.push(CheckoutRange {
            branch: clean_branch_name(&last_before.next).to_string(),
            from: month_start_utc,
            to: month_start_utc,
        });
    }

    for c in &sorted {
        if c.timestamp > month_start_utc && c.timestamp <= month_end_utc {
            ranges.push(CheckoutRange {
                branch: clean_branch_name(&c.next).to_string(),
                from: c.timestamp,
                to: c.timestamp,
            });
        }
    }

    // Cap the open range at `now` so a still-active branch does not accrue
    // the rest of the month.
    let now_utc = now.with_timezone(&Utc);
    let last_end = (month_end_utc + Duration::seconds(1)).min(now_utc);
    for i in 0..ranges.len() {
        ranges[i].to = if i + 1 < ranges.len() {
            ranges[i + 1].from
        } else {
            last_end
        };
    }

    let mut bucket: HashMap<String, HashMap<u32, i64>> = HashMap::new();
    for range in &ranges {
        if range.branch.is_empty() {
            continue;
        }
        for day in 1..=total_days {
            let Some(windows) = schedule_windows.get(&day) else {
                continue;
            };
            let mins = overlap_minutes(range, year, month, day, windows, &tz);
            if mins > 0 {
                *bucket
                    .entry(range.branch.clone())
                    .or_default()
                    .entry(day)
                    .or_insert(0) += mins;
            }
        }
    }

    bucket
}

/// Minutes of `[range.from, range.to)` overlapping the given day's windows,
/// with window times interpreted in `tz`.
fn overlap_minutes<Tz: TimeZone>(
    range: &CheckoutRange,
    year: i32,
    month: u32,
    day: u32,
    windows: &[TimeWindow],
    tz: &Tz,
) -> i64 {
    let mut total = 0;
    for w in windows {
        let Some(w_start) = at_local(tz, year, month, day, w.from.hour, w.from.minute, 0) else {
            continue;
        };
        let Some(w_end) = at_local(tz, year, month, day, w.to.hour, w.to.minute, 0) else {
            continue;
        };
        let w_start = w_start.with_timezone(&Utc);
        let w_end = w_end.with_timezone(&Utc);

        let overlap_start = range.from.max(w_start);
        let overlap_end = range.to.min(w_end);
        if overlap_end > overlap_start {
            total += (overlap_end - overlap_start).num_minutes();
        }
    }
    total
}

/// Scale each day's checkout minutes down proportionally when they exceed
/// the scheduled minutes not already covered by manual logs. Floor
/// truncation per branch; ratios between branches are preserved.
fn deduct_schedule_overrun(
    checkout_bucket: &mut HashMap<String, HashMap<u32, i64>>,
    log_mins_by_day: &HashMap<u32, i64>,
    scheduled_mins: &HashMap<u32, i64>,
    total_days: u32,
    generated_days: &HashSet<u32>,
) {
    for day in 1..=total_days {
        if generated_days.contains(&day) {
            continue;
        }
        let max_mins = scheduled_mins.get(&day).copied().unwrap_or(0);
        if max_mins <= 0 {
            continue;
        }
        let log_mins = log_mins_by_day.get(&day).copied().unwrap_or(0);
        let available = (max_mins - log_mins).max(0);

        let total_checkout: i64 = checkout_bucket
            .values()
            .filter_map(|m| m.get(&day))
            .sum();

        if total_checkout > available && total_checkout > 0 {
            let ratio = available as f64 / total_checkout as f64;
            for day_map in checkout_bucket.values_mut() {
                if let Some(mins) = day_map.get_mut(&day) {
                    *mins = (*mins as f64 * ratio) as i64;
                }
            }
        }
    }
}

/// Merge checkout and log buckets into rows sorted by total descending,
/// ties broken by name ascending. Rows with a zero total are dropped.
fn merge_and_sort_rows(
    checkout_bucket: HashMap<String, HashMap<u32, i64>>,
    log_bucket: HashMap<String, HashMap<u32, i64>>,
) -> Vec<TaskRow> {
    let mut row_map: HashMap<String, TaskRow> = HashMap::new();

    for (branch, day_map) in checkout_bucket {
        let mut row = TaskRow {
            name: branch.clone(),
            total_minutes: 0,
            days: HashMap::new(),
        };
        for (day, mins) in day_map {
            if mins > 0 {
                row.days.insert(day, mins);
                row.total_minutes += mins;
            }
        }
        if row.total_minutes > 0 {
            row_map.insert(branch, row);
        }
    }

    for (key, day_map) in log_bucket {
        let row = row_map.entry(key.clone()).or_insert_with(|| TaskRow {
            name: key,
            total_minutes: 0,
            days: HashMap::new(),
        });
        for (day, mins) in day_map {
            *row.days.entry(day).or_insert(0) += mins;
            row.total_minutes += mins;
        }
    }

    let mut rows: Vec<TaskRow> = row_map.into_values().filter(|r| r.total_minutes > 0).collect();
    rows.sort_by(|a, b| {
        b.total_minutes
            .cmp(&a.total_minutes)
            .then_with(|| a.name.cmp(&b.name))
    });
    rows
}

/// Build the entry-level report for `[from, to]` (one month at most).
///
/// Persisted log entries appear as-is; checkout attribution becomes one
/// synthetic in-memory entry per branch per day, except where a persisted
/// `checkout-generated` entry for the same (branch, day) has replaced it.
pub fn build_detailed_report<Tz: TimeZone>(
    checkouts: &[CheckoutEntry],
    logs: &[LogEntry],
    day_schedules: &[DaySchedule],
    from: NaiveDate,
    to: NaiveDate,
    now: &DateTime<Tz>,
) -> DetailedReportData {
    let year = from.year();
    let month = from.month();
    let total_days = days_in_month(year, month);

    let (schedule_windows, scheduled_mins) = build_schedule_lookup(day_schedules, year, month);
    let scheduled_days: HashSet<u32> = scheduled_mins.keys().copied().collect();

    let mut checkout_bucket =
        build_checkout_bucket(checkouts, year, month, total_days, &schedule_windows, now);

    // Persisted checkout-generated entries suppress the synthetic entry for
    // their (task, day) cell.
    let mut persisted_checkout: HashSet<(String, u32)> = HashSet::new();
    for log in logs {
        if log.source != SOURCE_CHECKOUT_GENERATED {
            continue;
        }
        if log.start.year() != year || log.start.month() != month {
            continue;
        }
        persisted_checkout.insert((log.task_key().to_string(), log.start.day()));
    }

    let mut row_map: HashMap<String, DetailedTaskRow> = HashMap::new();
    let mut log_mins_by_day: HashMap<u32, i64> = HashMap::new();

    for log in logs {
        if log.start.year() != year || log.start.month() != month {
            continue;
        }
        let day = log.start.day();
        let Some(day_date) = NaiveDate::from_ymd_opt(year, month, day) else {
            continue;
        };
        if day_date < from || day_date > to {
            continue;
        }

        let row = row_map
            .entry(log.task_key().to_string())
            .or_insert_with(|| DetailedTaskRow {
                name: log.task_key().to_string(),
                total_minutes: 0,
                days: HashMap::new(),
            });
        let cell = row.days.entry(day).or_default();
        cell.entries.push(CellEntry {
            id: log.id.clone(),
            start: log.start,
            minutes: log.minutes,
            message: log.message.clone(),
            task: log.task.clone(),
            source: log.source.clone(),
            persisted: true,
            entry: Some(log.clone()),
        });
        cell.total_minutes += log.minutes;
        row.total_minutes += log.minutes;
        *log_mins_by_day.entry(day).or_insert(0) += log.minutes;
    }

    deduct_schedule_overrun(
        &mut checkout_bucket,
        &log_mins_by_day,
        &scheduled_mins,
        total_days,
        &HashSet::new(),
    );

    for (branch, day_map) in checkout_bucket {
        for (day, mins) in day_map {
            if mins <= 0 {
                continue;
            }
            let Some(day_date) = NaiveDate::from_ymd_opt(year, month, day) else {
                continue;
            };
            if day_date < from || day_date > to {
                continue;
            }
            if persisted_checkout.contains(&(branch.clone(), day)) {
                continue;
            }

            let clean = clean_branch_name(&branch).to_string();
            let nine_am = chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default();
            let row = row_map.entry(branch.clone()).or_insert_with(|| DetailedTaskRow {
                name: branch.clone(),
                total_minutes: 0,
                days: HashMap::new(),
            });
            let cell = row.days.entry(day).or_default();
            cell.entries.push(CellEntry {
                id: String::new(),
                start: Utc.from_utc_datetime(&day_date.and_time(nine_am)),
                minutes: mins,
                message: clean.clone(),
                task: clean,
                source: "checkout".to_string(),
                persisted: false,
                entry: None,
            });
            cell.total_minutes += mins;
            row.total_minutes += mins;
        }
    }

    let mut rows: Vec<DetailedTaskRow> =
        row_map.into_values().filter(|r| r.total_minutes > 0).collect();
    rows.sort_by(|a, b| {
        b.total_minutes
            .cmp(&a.total_minutes)
            .then_with(|| a.name.cmp(&b.name))
    });

    DetailedReportData {
        year,
        month,
        days_in_month: total_days,
        from,
        to,
        rows,
        scheduled_days,
    }
}

#[cfg(test)]
mod tests;
