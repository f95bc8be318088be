//! Cross-project lookup semantics of the entry store.

mod support;

use hourgit::entry::{
    find_any_across_projects, find_log_across_projects, CheckoutEntry, TYPE_CHECKOUT,
};

use support::{log_entry, utc, TestHome};

#[test]
fn lookup_scans_every_project_directory() {
    let home = TestHome::new();
    let alpha = home.add_project("alpha");
    let beta = home.add_project("beta");
    let store = home.store();

    store
        .write_log(&alpha.slug, &log_entry("aaaa001", utc(2025, 1, 2, 9, 0), 60, "in alpha"))
        .unwrap();
    store
        .write_log(&beta.slug, &log_entry("bbbb001", utc(2025, 1, 3, 9, 0), 90, "in beta"))
        .unwrap();

    let found = find_log_across_projects(&store, "bbbb001").unwrap();
    assert_eq!(found.slug, "beta");
    assert_eq!(found.entry.message, "in beta");

    let found = find_any_across_projects(&store, "aaaa001").unwrap();
    assert_eq!(found.slug, "alpha");
    assert_eq!(found.kind, "log");
}

#[test]
fn checkout_ids_are_reported_as_not_editable() {
    let home = TestHome::new();
    let project = home.add_project("p");
    let store = home.store();

    store
        .write_checkout(
            &project.slug,
            &CheckoutEntry {
                id: "cccc001".to_string(),
                kind: TYPE_CHECKOUT.to_string(),
                timestamp: utc(2025, 1, 2, 9, 0),
                previous: "main".to_string(),
                next: "feature".to_string(),
                commit_ref: String::new(),
            },
        )
        .unwrap();

    let err = find_log_across_projects(&store, "cccc001").unwrap_err();
    assert_eq!(
        err.to_string(),
        "entry 'cccc001' is a checkout entry and cannot be edited"
    );

    // But the any-record lookup returns it with a summary.
    let found = find_any_across_projects(&store, "cccc001").unwrap();
    assert_eq!(found.kind, "checkout");
    assert!(found.detail.contains("main → feature"));
}

#[test]
fn ids_preserved_across_edits() {
    let home = TestHome::new();
    let project = home.add_project("p");
    let store = home.store();

    let original = log_entry("aaaa002", utc(2025, 1, 2, 9, 0), 60, "before");
    store.write_log(&project.slug, &original).unwrap();

    let mut edited = original.clone();
    edited.minutes = 90;
    edited.message = "after".to_string();
    store.write_log(&project.slug, &edited).unwrap();

    let all = store.read_all_logs(&project.slug).unwrap();
    assert_eq!(all.len(), 1, "overwrite, not duplicate");
    assert_eq!(all[0].id, original.id);
    assert_eq!(all[0].created_at, original.created_at);
    assert_eq!(all[0].message, "after");
}
