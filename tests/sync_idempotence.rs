//! Reflog ingestion: filtering, dedup across runs, and deterministic IDs.

mod support;

use std::path::Path;

use chrono::{DateTime, Utc};
use hourgit::cli::run_sync;
use hourgit::error::Result;
use hourgit::project::{write_marker, RepoMarker};

use support::TestHome;

const REFLOG: &str = "\
abc1234 HEAD@{2025-06-15 14:30:00 +0000}: checkout: moving from main to feature
def5678 HEAD@{2025-06-15 12:00:00 +0000}: commit: add widget
abc9999 HEAD@{2025-06-14 09:00:00 +0000}: rebase (finish): returning to refs/heads/main
aaa1111 HEAD@{2025-06-13 08:00:00 +0000}: checkout: moving from remotes/origin/main to main
bbb2222 HEAD@{2025-06-12 10:15:00 +0000}: checkout: moving from 0a1b2c3 to main
ccc3333 HEAD@{2025-06-11 10:15:00 +0000}: checkout: moving from main to main
";

fn fixed_reflog(_: &Path, _: Option<DateTime<Utc>>) -> Result<String> {
    Ok(REFLOG.to_string())
}

fn assigned_repo(home: &TestHome, project_id: &str, name: &str) -> std::path::PathBuf {
    let repo = home.fake_repo();
    write_marker(
        &repo,
        &RepoMarker {
            project: name.to_string(),
            project_id: project_id.to_string(),
            last_sync: None,
        },
    )
    .unwrap();
    repo
}

#[test]
fn sync_filters_non_checkout_lines() {
    let home = TestHome::new();
    let project = home.add_project("p");
    let repo = assigned_repo(&home, &project.id, "p");

    run_sync(home.path(), Some(&repo), None, &fixed_reflog).unwrap();

    // Only "main -> feature" survives: the commit and rebase lines are not
    // checkouts, remotes/ and hash-named sides are filtered, and same-branch
    // moves are skipped.
    let checkouts = home.store().read_all_checkouts(&project.slug).unwrap();
    assert_eq!(checkouts.len(), 1);
    assert_eq!(checkouts[0].previous, "main");
    assert_eq!(checkouts[0].next, "feature");
}

#[test]
fn sync_is_idempotent() {
    let home = TestHome::new();
    let project = home.add_project("p");
    let repo = assigned_repo(&home, &project.id, "p");

    run_sync(home.path(), Some(&repo), None, &fixed_reflog).unwrap();
    run_sync(home.path(), Some(&repo), None, &fixed_reflog).unwrap();
    run_sync(home.path(), Some(&repo), None, &fixed_reflog).unwrap();

    assert_eq!(home.store().read_all_checkouts(&project.slug).unwrap().len(), 1);
}

#[test]
fn deleted_entry_is_recreated_with_same_id() {
    let home = TestHome::new();
    let project = home.add_project("p");
    let repo = assigned_repo(&home, &project.id, "p");
    let store = home.store();

    run_sync(home.path(), Some(&repo), None, &fixed_reflog).unwrap();
    let original = store.read_all_checkouts(&project.slug).unwrap().remove(0);

    store.delete(&project.slug, &original.id).unwrap();
    assert!(store.read_all_checkouts(&project.slug).unwrap().is_empty());

    run_sync(home.path(), Some(&repo), None, &fixed_reflog).unwrap();
    let recreated = store.read_all_checkouts(&project.slug).unwrap().remove(0);
    assert_eq!(recreated.id, original.id, "deterministic seed must reproduce the ID");
}

#[test]
fn sync_updates_last_sync_to_newest_processed() {
    let home = TestHome::new();
    let project = home.add_project("p");
    let repo = assigned_repo(&home, &project.id, "p");

    run_sync(home.path(), Some(&repo), None, &fixed_reflog).unwrap();

    let marker = hourgit::project::read_marker(&repo).unwrap().unwrap();
    assert_eq!(marker.last_sync, Some(support::utc(2025, 6, 15, 14, 30)));
}

#[test]
fn sync_passes_last_sync_as_since_bound() {
    let home = TestHome::new();
    let project = home.add_project("p");
    let repo = assigned_repo(&home, &project.id, "p");

    let since_seen = std::sync::Mutex::new(Vec::new());
    let recording =
        |_: &Path, since: Option<DateTime<Utc>>| -> Result<String> {
            since_seen.lock().unwrap().push(since);
            Ok(REFLOG.to_string())
        };

    run_sync(home.path(), Some(&repo), None, &recording).unwrap();
    run_sync(home.path(), Some(&repo), None, &recording).unwrap();

    let seen = since_seen.lock().unwrap();
    assert_eq!(seen[0], None, "first sync has no lower bound");
    assert_eq!(seen[1], Some(support::utc(2025, 6, 15, 14, 30)));
}
