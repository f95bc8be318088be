//! `hourgit sync` - ingest branch checkouts from the git reflog.
//!
//! The repo marker's `last_sync` timestamp bounds the reflog read; records
//! are walked oldest-first, filtered (same-branch moves, detached-HEAD
//! hashes, remote-tracking refs), given deterministic content-addressed IDs,
//! and written at most once.

use std::path::Path;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::entry::{CheckoutEntry, Store, TYPE_CHECKOUT};
use crate::error::Result;
use crate::git;
use crate::id;
use crate::project;
use crate::reflog;

use super::{home_dir, repo_dir, resolve_project_context};

// Full or abbreviated commit hashes (7-40 hex chars): detached-HEAD moves.
fn commit_hash_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9a-f]{7,40}$").unwrap())
}

fn looks_like_commit_hash(name: &str) -> bool {
    commit_hash_pattern().is_match(name)
}

pub fn run(project_flag: Option<&str>) -> Result<()> {
    let home = home_dir()?;
    let repo = repo_dir();
    let repo = repo.as_deref();
    run_sync(&home, repo, project_flag, &git::read_reflog)
}

/// The sync pipeline with an injectable reflog reader.
pub fn run_sync(
    home: &Path,
    repo_dir: Option<&Path>,
    project_flag: Option<&str>,
    read_reflog: &dyn Fn(&Path, Option<DateTime<Utc>>) -> Result<String>,
) -> Result<()> {
    let project = resolve_project_context(home, repo_dir, project_flag)?;

    let marker = match repo_dir {
        Some(dir) => project::read_marker(dir)?,
        None => None,
    };
    let last_sync = marker.as_ref().and_then(|m| m.last_sync);

    let output = match repo_dir {
        Some(dir) => read_reflog(dir, last_sync)?,
        None => String::new(),
    };

    let records = reflog::parse_reflog(&output);

    let store = Store::new(home);
    let mut known = store.checkout_ids(&project.slug)?;

    let mut created = 0usize;
    let mut newest: Option<DateTime<Utc>> = None;

    // Reflog is newest-first; ingest oldest-first.
    for record in records.iter().rev() {
        if looks_like_commit_hash(&record.previous) || looks_like_commit_hash(&record.next) {
            continue;
        }
        if record.previous.contains("remotes/") || record.next.contains("remotes/") {
            continue;
        }
        if record.previous == record.next {
            continue;
        }

        let seed = CheckoutEntry::id_seed(
            &record.commit_ref,
            record.timestamp,
            &record.previous,
            &record.next,
        );
        let entry_id = id::id_from_seed(&seed);

        if known.contains(&entry_id) {
            continue;
        }

        store.write_checkout(
            &project.slug,
            &CheckoutEntry {
                id: entry_id.clone(),
                kind: TYPE_CHECKOUT.to_string(),
                timestamp: record.timestamp,
                previous: record.previous.clone(),
                next: record.next.clone(),
                commit_ref: record.commit_ref.clone(),
            },
        )?;

        known.insert(entry_id);
        created += 1;

        if newest.map(|n| record.timestamp > n).unwrap_or(true) {
            newest = Some(record.timestamp);
        }
    }

    // Advance last_sync only on repos that actually carry a marker.
    if created > 0 {
        if let (Some(dir), Some(newest), Some(mut marker)) = (repo_dir, newest, marker) {
            marker.last_sync = Some(newest);
            project::write_marker(dir, &marker)?;
        }
    }

    if created == 0 {
        println!("already up to date");
    } else {
        println!("synced {created} checkout(s) for project '{}'", project.name);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_hash_detection() {
        assert!(looks_like_commit_hash("abc1234"));
        assert!(looks_like_commit_hash("0123456789abcdef0123456789abcdef01234567"));
        assert!(!looks_like_commit_hash("main"));
        assert!(!looks_like_commit_hash("feature-x"));
        assert!(!looks_like_commit_hash("abc123")); // 6 chars
        assert!(!looks_like_commit_hash("ABC1234")); // uppercase
    }
}
