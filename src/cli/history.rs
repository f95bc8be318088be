//! `hourgit history` - merged chronological feed of logs and checkouts.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::entry::{format_minutes, Store, TYPE_CHECKOUT, TYPE_LOG};
use crate::error::{Error, Result};
use crate::project::{Project, Registry};

use super::home_dir;

struct HistoryItem {
    id: String,
    timestamp: DateTime<Utc>,
    kind: &'static str,
    project: String,
    detail: String,
}

pub fn run(project_flag: Option<&str>, limit: usize) -> Result<()> {
    let home = home_dir()?;
    for line in collect_history(&home, project_flag, limit)? {
        println!("{line}");
    }
    Ok(())
}

pub fn collect_history(
    home: &Path,
    project_flag: Option<&str>,
    limit: usize,
) -> Result<Vec<String>> {
    let registry = Registry::load(home)?;

    let projects: Vec<Project> = match project_flag {
        Some(identifier) => {
            let project = registry
                .resolve(identifier)
                .ok_or_else(|| Error::ProjectNotFound(identifier.to_string()))?;
            vec![project.clone()]
        }
        None => registry.projects.clone(),
    };

    let store = Store::new(home);
    let mut items = Vec::new();

    for project in &projects {
        for e in store.read_all_logs(&project.slug)? {
            let mut detail = format_minutes(e.minutes);
            if !e.task.is_empty() {
                detail.push_str(&format!("  [{}]", e.task));
            }
            if !e.message.is_empty() {
                if e.task.is_empty() {
                    detail.push_str("  ");
                } else {
                    detail.push(' ');
                }
                detail.push_str(&e.message);
            }
            items.push(HistoryItem {
                id: e.id,
                timestamp: e.created_at,
                kind: TYPE_LOG,
                project: project.name.clone(),
                detail,
            });
        }

        for e in store.read_all_checkouts(&project.slug)? {
            items.push(HistoryItem {
                id: e.id,
                timestamp: e.timestamp,
                kind: TYPE_CHECKOUT,
                project: project.name.clone(),
                detail: format!("{} → {}", e.previous, e.next),
            });
        }
    }

    if items.is_empty() {
        return Ok(vec!["no entries found".to_string()]);
    }

    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    if limit > 0 && items.len() > limit {
        items.truncate(limit);
    }

    Ok(items
        .into_iter()
        .map(|item| {
            format!(
                "{}  {}  {}  {}  {}",
                item.id,
                item.timestamp.format("%Y-%m-%d %H:%M:%S"),
                item.kind,
                item.project,
                item.detail
            )
        })
        .collect())
}
