//! `hourgit checkout` - hook entrypoint recording a single branch switch.

use chrono::Utc;

use crate::entry::{CheckoutEntry, Store, TYPE_CHECKOUT};
use crate::error::{Error, Result};
use crate::id;

use super::{home_dir, repo_dir, resolve_project_context};

pub fn run(prev: &str, next: &str, project_flag: Option<&str>) -> Result<()> {
    if prev.is_empty() {
        return Err(Error::InvalidArgument("--prev is required".to_string()));
    }
    if next.is_empty() {
        return Err(Error::InvalidArgument("--next is required".to_string()));
    }
    if prev == next {
        // Known benign case from the hook: silent no-op.
        return Ok(());
    }

    let home = home_dir()?;
    let repo = repo_dir();
    let project = resolve_project_context(&home, repo.as_deref(), project_flag)?;

    let entry = CheckoutEntry {
        id: id::id_fresh("checkout"),
        kind: TYPE_CHECKOUT.to_string(),
        timestamp: Utc::now(),
        previous: prev.to_string(),
        next: next.to_string(),
        commit_ref: String::new(),
    };

    Store::new(&home).write_checkout(&project.slug, &entry)?;

    println!(
        "checkout {prev} → {next} for project '{}' ({})",
        project.name, entry.id
    );

    Ok(())
}
