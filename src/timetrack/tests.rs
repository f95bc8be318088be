use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};

use crate::entry::{CheckoutEntry, LogEntry, SOURCE_CHECKOUT_GENERATED, TYPE_CHECKOUT, TYPE_LOG};
use crate::schedule::{default_schedules, expand_schedules, DaySchedule};

use super::*;

fn checkout(ts: DateTime<Utc>, prev: &str, next: &str) -> CheckoutEntry {
    CheckoutEntry {
        id: crate::id::id_from_seed(&format!("{ts}{prev}{next}")),
        kind: TYPE_CHECKOUT.into(),
        timestamp: ts,
        previous: prev.into(),
        next: next.into(),
        commit_ref: "abc1234".into(),
    }
}

fn log(start: DateTime<Utc>, minutes: i64, message: &str, task: &str) -> LogEntry {
    LogEntry {
        id: crate::id::id_from_seed(&format!("{start}{message}{task}")),
        kind: TYPE_LOG.into(),
        start,
        minutes,
        message: message.into(),
        task: task.into(),
        source: String::new(),
        created_at: start,
    }
}

fn month_schedules(year: i32, month: u32) -> Vec<DaySchedule> {
    let from = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
    let to = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month)).unwrap();
    expand_schedules(&default_schedules(), from, to).unwrap()
}

fn row<'a>(report: &'a ReportData, name: &str) -> &'a TaskRow {
    report
        .rows
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("row '{name}' missing from {:?}", report.rows))
}

#[test]
fn days_in_month_handles_leap_years() {
    assert_eq!(days_in_month(2025, 1), 31);
    assert_eq!(days_in_month(2025, 2), 28);
    assert_eq!(days_in_month(2024, 2), 29);
    assert_eq!(days_in_month(2025, 12), 31);
}

#[test]
fn full_month_single_branch() {
    // Checkout before the month, nothing after: feature-x accrues the whole
    // scheduled month.
    let checkouts = vec![checkout(
        Utc.with_ymd_and_hms(2024, 12, 20, 10, 0, 0).unwrap(),
        "main",
        "feature-x",
    )];
    let now = Utc.with_ymd_and_hms(2025, 2, 5, 0, 0, 0).unwrap();

    let report = build_report(&checkouts, &[], &month_schedules(2025, 1), 2025, 1, &now, &[]);

    assert_eq!(report.rows.len(), 1);
    // January 2025 has 23 weekdays.
    assert_eq!(row(&report, "feature-x").total_minutes, 23 * 480);
}

#[test]
fn split_day_between_two_branches() {
    // Thu Jan 2 2025: main -> a at 09:00, a -> b at 13:00.
    let checkouts = vec![
        checkout(Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap(), "main", "a"),
        checkout(Utc.with_ymd_and_hms(2025, 1, 2, 13, 0, 0).unwrap(), "a", "b"),
    ];
    let now = Utc.with_ymd_and_hms(2025, 1, 2, 17, 0, 0).unwrap();

    let report = build_report(&checkouts, &[], &month_schedules(2025, 1), 2025, 1, &now, &[]);

    assert_eq!(row(&report, "a").days.get(&2), Some(&240));
    assert_eq!(row(&report, "b").days.get(&2), Some(&240));
}

#[test]
fn manual_log_deducts_checkout_time() {
    let checkouts = vec![checkout(
        Utc.with_ymd_and_hms(2024, 12, 20, 10, 0, 0).unwrap(),
        "main",
        "x",
    )];
    let logs = vec![log(
        Utc.with_ymd_and_hms(2025, 1, 2, 10, 0, 0).unwrap(),
        120,
        "research",
        "",
    )];
    // Only Jan 2 is scheduled.
    let schedules = expand_schedules(
        &default_schedules(),
        NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
    )
    .unwrap();
    let now = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();

    let report = build_report(&checkouts, &logs, &schedules, 2025, 1, &now, &[]);

    assert_eq!(row(&report, "x").days.get(&2), Some(&360));
    assert_eq!(row(&report, "research").days.get(&2), Some(&120));
}

#[test]
fn open_range_is_capped_at_now() {
    // Checkout at 09:00, now is 13:00 the same day: exactly 240 minutes,
    // nothing on later days.
    let checkouts = vec![checkout(
        Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap(),
        "main",
        "wip",
    )];
    let now = Utc.with_ymd_and_hms(2025, 1, 2, 13, 0, 0).unwrap();

    let report = build_report(&checkouts, &[], &month_schedules(2025, 1), 2025, 1, &now, &[]);

    let r = row(&report, "wip");
    assert_eq!(r.total_minutes, 240);
    assert_eq!(r.days.get(&2), Some(&240));
    assert!(r.days.get(&3).is_none());
}

#[test]
fn overrun_deduction_preserves_proportions() {
    // Two branches splitting an 8h day 6h/2h, plus 4h of manual logs:
    // 240 minutes remain for checkouts, split 180/60.
    let checkouts = vec![
        checkout(Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap(), "main", "a"),
        checkout(Utc.with_ymd_and_hms(2025, 1, 2, 15, 0, 0).unwrap(), "a", "b"),
    ];
    let logs = vec![log(
        Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap(),
        240,
        "meetings",
        "",
    )];
    let now = Utc.with_ymd_and_hms(2025, 1, 3, 0, 0, 0).unwrap();

    let report = build_report(&checkouts, &logs, &month_schedules(2025, 1), 2025, 1, &now, &[]);

    assert_eq!(row(&report, "a").days.get(&2), Some(&180));
    assert_eq!(row(&report, "b").days.get(&2), Some(&60));
    assert_eq!(row(&report, "meetings").days.get(&2), Some(&240));
}

#[test]
fn checkout_total_never_exceeds_available() {
    // Log already covers the whole day: checkouts scale to zero and the
    // branch row disappears.
    let checkouts = vec![checkout(
        Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap(),
        "main",
        "a",
    )];
    let logs = vec![log(
        Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap(),
        480,
        "all day",
        "",
    )];
    let now = Utc.with_ymd_and_hms(2025, 1, 3, 0, 0, 0).unwrap();

    let report = build_report(&checkouts, &logs, &month_schedules(2025, 1), 2025, 1, &now, &[]);

    assert!(report.rows.iter().all(|r| r.name != "a"));
    assert_eq!(row(&report, "all day").total_minutes, 480);
}

#[test]
fn log_with_branch_task_merges_into_checkout_row() {
    let checkouts = vec![checkout(
        Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap(),
        "main",
        "feature-x",
    )];
    // Saturday log (no schedule): no deduction, but it merges into the row.
    let logs = vec![log(
        Utc.with_ymd_and_hms(2025, 1, 4, 10, 0, 0).unwrap(),
        60,
        "weekend fix",
        "feature-x",
    )];
    let now = Utc.with_ymd_and_hms(2025, 1, 2, 17, 0, 0).unwrap();

    let report = build_report(&checkouts, &logs, &month_schedules(2025, 1), 2025, 1, &now, &[]);

    let r = row(&report, "feature-x");
    assert_eq!(r.days.get(&2), Some(&480));
    assert_eq!(r.days.get(&4), Some(&60));
    assert_eq!(r.total_minutes, 540);
}

#[test]
fn generated_days_are_zeroed() {
    let checkouts = vec![checkout(
        Utc.with_ymd_and_hms(2024, 12, 20, 10, 0, 0).unwrap(),
        "main",
        "x",
    )];
    let now = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();

    let report = build_report(
        &checkouts,
        &[],
        &month_schedules(2025, 1),
        2025,
        1,
        &now,
        &["2025-01-02".to_string(), "2025-02-03".to_string()],
    );

    let r = row(&report, "x");
    assert!(r.days.get(&2).is_none(), "generated day must not attribute");
    // The out-of-month marker is ignored; Jan 3 still attributes.
    assert_eq!(r.days.get(&3), Some(&480));
}

#[test]
fn rows_sorted_by_total_then_name() {
    let logs = vec![
        log(Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap(), 60, "b", ""),
        log(Utc.with_ymd_and_hms(2025, 1, 2, 10, 0, 0).unwrap(), 60, "a", ""),
        log(Utc.with_ymd_and_hms(2025, 1, 2, 11, 0, 0).unwrap(), 120, "c", ""),
    ];
    let now = Utc.with_ymd_and_hms(2025, 1, 3, 0, 0, 0).unwrap();

    let report = build_report(&[], &logs, &month_schedules(2025, 1), 2025, 1, &now, &[]);

    let names: Vec<&str> = report.rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["c", "a", "b"]);
}

#[test]
fn empty_branch_and_remote_names() {
    // A checkout onto the empty branch contributes nothing; remotes/ prefix
    // is stripped when naming rows.
    let checkouts = vec![
        checkout(Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap(), "main", ""),
        checkout(
            Utc.with_ymd_and_hms(2025, 1, 2, 13, 0, 0).unwrap(),
            "",
            "remotes/origin/main",
        ),
    ];
    let now = Utc.with_ymd_and_hms(2025, 1, 2, 17, 0, 0).unwrap();

    let report = build_report(&checkouts, &[], &month_schedules(2025, 1), 2025, 1, &now, &[]);

    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].name, "origin/main");
    assert_eq!(report.rows[0].total_minutes, 240);
}

#[test]
fn consecutive_same_branch_checkouts_collapse() {
    let checkouts = vec![
        checkout(Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap(), "main", "a"),
        checkout(Utc.with_ymd_and_hms(2025, 1, 2, 11, 0, 0).unwrap(), "a", "a"),
        checkout(Utc.with_ymd_and_hms(2025, 1, 2, 13, 0, 0).unwrap(), "a", "b"),
    ];
    let now = Utc.with_ymd_and_hms(2025, 1, 2, 17, 0, 0).unwrap();

    let report = build_report(&checkouts, &[], &month_schedules(2025, 1), 2025, 1, &now, &[]);

    assert_eq!(row(&report, "a").days.get(&2), Some(&240));
    assert_eq!(row(&report, "b").days.get(&2), Some(&240));
}

#[test]
fn windows_follow_the_timezone_of_now() {
    // A user at UTC+2 with a 09:00-17:00 local schedule: a checkout at
    // 07:00 UTC (09:00 local) covers the full local window.
    let tz = FixedOffset::east_opt(2 * 3600).unwrap();
    let checkouts = vec![checkout(
        Utc.with_ymd_and_hms(2025, 1, 2, 7, 0, 0).unwrap(),
        "main",
        "x",
    )];
    let now = tz.with_ymd_and_hms(2025, 1, 2, 17, 0, 0).unwrap();

    let report = build_report(&checkouts, &[], &month_schedules(2025, 1), 2025, 1, &now, &[]);

    assert_eq!(row(&report, "x").days.get(&2), Some(&480));
}

#[test]
fn day_without_schedule_contributes_zero() {
    // Saturday checkout under the weekday default schedule.
    let checkouts = vec![checkout(
        Utc.with_ymd_and_hms(2025, 1, 4, 9, 0, 0).unwrap(),
        "main",
        "x",
    )];
    let now = Utc.with_ymd_and_hms(2025, 1, 4, 17, 0, 0).unwrap();

    let report = build_report(&checkouts, &[], &month_schedules(2025, 1), 2025, 1, &now, &[]);
    assert!(report.rows.is_empty());
}

// =============================================================================
// Detailed report
// =============================================================================

fn january_range() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
    )
}

#[test]
fn detailed_report_synthesises_in_memory_entries() {
    let checkouts = vec![checkout(
        Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap(),
        "main",
        "x",
    )];
    let now = Utc.with_ymd_and_hms(2025, 1, 2, 17, 0, 0).unwrap();
    let (from, to) = january_range();

    let data =
        build_detailed_report(&checkouts, &[], &month_schedules(2025, 1), from, to, &now);

    assert_eq!(data.rows.len(), 1);
    let cell = data.rows[0].days.get(&2).expect("cell for Jan 2");
    assert_eq!(cell.entries.len(), 1);
    let entry = &cell.entries[0];
    assert!(!entry.persisted);
    assert!(entry.id.is_empty());
    assert!(entry.entry.is_none());
    assert_eq!(entry.minutes, 480);
    assert_eq!(entry.source, "checkout");
    assert!(data.scheduled_days.contains(&2));
    assert!(!data.scheduled_days.contains(&4));
}

#[test]
fn persisted_checkout_generated_entry_suppresses_synthetic() {
    let checkouts = vec![checkout(
        Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap(),
        "main",
        "x",
    )];
    let mut persisted = log(
        Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap(),
        300,
        "x",
        "x",
    );
    persisted.source = SOURCE_CHECKOUT_GENERATED.into();
    let now = Utc.with_ymd_and_hms(2025, 1, 2, 17, 0, 0).unwrap();
    let (from, to) = january_range();

    let data = build_detailed_report(
        &checkouts,
        &[persisted],
        &month_schedules(2025, 1),
        from,
        to,
        &now,
    );

    assert_eq!(data.rows.len(), 1);
    let cell = data.rows[0].days.get(&2).expect("cell");
    // Only the persisted copy; the synthetic entry is suppressed.
    assert_eq!(cell.entries.len(), 1);
    assert!(cell.entries[0].persisted);
    assert_eq!(cell.total_minutes, 300);
}

#[test]
fn detailed_report_clamps_to_requested_range() {
    let logs = vec![
        log(Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap(), 60, "in", ""),
        log(Utc.with_ymd_and_hms(2025, 1, 20, 9, 0, 0).unwrap(), 60, "out", ""),
    ];
    let now = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();

    // Week of Jan 6-12 only.
    let from = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    let to = NaiveDate::from_ymd_opt(2025, 1, 12).unwrap();

    let data = build_detailed_report(&[], &logs, &month_schedules(2025, 1), from, to, &now);

    assert_eq!(data.rows.len(), 1);
    assert_eq!(data.rows[0].name, "in");
}
