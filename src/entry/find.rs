//! Cross-project entry lookup.
//!
//! Commands that take a bare entry ID fall back to scanning every project
//! directory under `<home>/.hourgit/` when neither the `--project` flag nor
//! the repo context resolves the entry.

use std::fs;

use crate::error::{Error, Result};
use crate::project;

use super::duration::format_minutes;
use super::{LogEntry, Store, TYPE_CHECKOUT, TYPE_LOG};

/// A log entry paired with the project slug it was found in.
#[derive(Debug, Clone)]
pub struct FoundLog {
    pub entry: LogEntry,
    pub slug: String,
}

/// Any record located by ID: slug, record kind, and a one-line summary.
#[derive(Debug, Clone)]
pub struct FoundRecord {
    pub slug: String,
    pub kind: String,
    pub detail: String,
}

fn project_slugs(store: &Store) -> Result<Vec<String>> {
    let dir = project::hourgit_dir(store.home());
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        // No hourgit directory means no projects yet; lookups just miss.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut slugs = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            slugs.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(slugs)
}

/// Scan all project directories for a log entry with the given ID. If the ID
/// exists only as a checkout entry somewhere, the error says so.
pub fn find_log_across_projects(store: &Store, id: &str) -> Result<FoundLog> {
    let slugs = project_slugs(store)?;

    for slug in &slugs {
        if let Ok(entry) = store.read_log(slug, id) {
            return Ok(FoundLog {
                entry,
                slug: slug.clone(),
            });
        }
    }

    for slug in &slugs {
        if store.is_checkout(slug, id) {
            return Err(Error::CheckoutNotEditable(id.to_string()));
        }
    }

    Err(Error::EntryNotFound(id.to_string()))
}

/// Scan all project directories for any record with the given ID.
pub fn find_any_across_projects(store: &Store, id: &str) -> Result<FoundRecord> {
    for slug in project_slugs(store)? {
        if let Some(found) = find_any_in_project(store, &slug, id) {
            return Ok(found);
        }
    }

    Err(Error::EntryNotFound(id.to_string()))
}

/// Locate a log or checkout record in one specific project.
pub fn find_any_in_project(store: &Store, slug: &str, id: &str) -> Option<FoundRecord> {
    if let Ok(e) = store.read_log(slug, id) {
        let mut detail = format!("{} — {}", format_minutes(e.minutes), e.message);
        if !e.task.is_empty() {
            detail = format!("[{}] {detail}", e.task);
        }
        return Some(FoundRecord {
            slug: slug.to_string(),
            kind: TYPE_LOG.to_string(),
            detail,
        });
    }

    if let Ok(e) = store.read_checkout(slug, id) {
        return Some(FoundRecord {
            slug: slug.to_string(),
            kind: TYPE_CHECKOUT.to_string(),
            detail: format!(
                "{} → {} at {}",
                e.previous,
                e.next,
                e.timestamp.format("%Y-%m-%d %H:%M")
            ),
        });
    }

    if let Ok(submits) = store.read_all_submits(slug) {
        if let Some(s) = submits.iter().find(|s| s.id == id) {
            return Some(FoundRecord {
                slug: slug.to_string(),
                kind: super::TYPE_SUBMIT.to_string(),
                detail: format!(
                    "submitted period {} to {}",
                    s.from.format("%Y-%m-%d"),
                    s.to.format("%Y-%m-%d")
                ),
            });
        }
    }

    if let Ok(days) = store.read_all_generated_days(slug) {
        if let Some(g) = days.iter().find(|g| g.id == id) {
            return Some(FoundRecord {
                slug: slug.to_string(),
                kind: super::TYPE_GENERATED_DAY.to_string(),
                detail: format!("generated day {}", g.date),
            });
        }
    }

    None
}
