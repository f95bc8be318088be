//! End-to-end report scenarios over the library: attribution, generation,
//! and the generated-day suppression loop.

mod support;

use chrono::NaiveDate;
use hourgit::entry::{CheckoutEntry, TYPE_CHECKOUT};
use hourgit::prompt::Scripted;
use hourgit::schedule::{default_schedules, expand_schedules};
use hourgit::timetrack::{build_report, days_in_month};

use support::{utc, TestHome};

fn checkout(id: &str, ts: chrono::DateTime<chrono::Utc>, prev: &str, next: &str) -> CheckoutEntry {
    CheckoutEntry {
        id: id.to_string(),
        kind: TYPE_CHECKOUT.to_string(),
        timestamp: ts,
        previous: prev.to_string(),
        next: next.to_string(),
        commit_ref: "abc1234".to_string(),
    }
}

fn month_schedules(year: i32, month: u32) -> Vec<hourgit::schedule::DaySchedule> {
    expand_schedules(
        &default_schedules(),
        NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
        NaiveDate::from_ymd_opt(year, month, days_in_month(year, month)).unwrap(),
    )
    .unwrap()
}

#[test]
fn generate_then_report_suppresses_checkout_attribution() {
    let home = TestHome::new();
    let project = home.add_project("p");
    let store = home.store();

    // Active branch from before January.
    store
        .write_checkout(
            &project.slug,
            &checkout("cccc001", utc(2024, 12, 20, 10, 0), "main", "feature-x"),
        )
        .unwrap();

    let now = utc(2025, 2, 1, 0, 0);

    // Generate editable entries for Thu Jan 2.
    let options = hourgit::cli::GenerateOptions {
        today: false,
        week: false,
        month: false,
        date: Some("2025-01-02".to_string()),
        project: Some("p".to_string()),
    };
    hourgit::cli::run_generate(home.path(), None, &options, &mut Scripted::new(["y"]), &now)
        .unwrap();

    let logs = store.read_all_logs(&project.slug).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].minutes, 480);
    assert_eq!(logs[0].source, "generate");

    // Re-running the report now shows Jan 2 as log time only: the
    // generated-day marker removes the checkout attribution, so the total
    // stays one day's worth, not two.
    let generated: Vec<String> = store
        .read_all_generated_days(&project.slug)
        .unwrap()
        .into_iter()
        .map(|g| g.date)
        .collect();
    assert_eq!(generated, vec!["2025-01-02".to_string()]);

    let checkouts = store.read_all_checkouts(&project.slug).unwrap();
    let report = build_report(
        &checkouts,
        &logs,
        &month_schedules(2025, 1),
        2025,
        1,
        &now,
        &generated,
    );

    let row = report
        .rows
        .iter()
        .find(|r| r.name == "feature-x")
        .expect("feature-x row");
    assert_eq!(
        row.days.get(&2),
        Some(&480),
        "Jan 2 carries exactly the generated log minutes"
    );
    // 23 weekdays in January 2025, each worth 480 minutes; generation must
    // not have doubled Jan 2.
    assert_eq!(row.total_minutes, 23 * 480);
}

#[test]
fn submitted_period_survives_store_round_trip() {
    let home = TestHome::new();
    let project = home.add_project("p");
    let store = home.store();

    store
        .write_submit(
            &project.slug,
            &hourgit::entry::SubmitEntry {
                id: "aaaa010".to_string(),
                kind: hourgit::entry::TYPE_SUBMIT.to_string(),
                from: utc(2025, 1, 1, 0, 0),
                to: utc(2025, 1, 31, 0, 0),
                created_at: utc(2025, 2, 1, 9, 0),
            },
        )
        .unwrap();

    let submits = store.read_all_submits(&project.slug).unwrap();
    assert_eq!(submits.len(), 1);
    assert_eq!(submits[0].from, utc(2025, 1, 1, 0, 0));

    // Submit markers never leak into the other typed reads.
    assert!(store.read_all_logs(&project.slug).unwrap().is_empty());
    assert!(store.read_all_checkouts(&project.slug).unwrap().is_empty());
}
