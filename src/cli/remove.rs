//! `hourgit remove` - delete any record after confirmation.

use std::path::Path;

use crate::entry::{find_any_across_projects, find_any_in_project, FoundRecord, Store};
use crate::error::{Error, Result};
use crate::project::Registry;
use crate::prompt::Prompter;

use super::{home_dir, repo_dir, resolve_project_context};

pub fn run(id: &str, project_flag: Option<&str>, prompter: &mut dyn Prompter) -> Result<()> {
    let home = home_dir()?;
    let repo = repo_dir();
    run_remove(&home, repo.as_deref(), id, project_flag, prompter)
}

pub fn run_remove(
    home: &Path,
    repo: Option<&Path>,
    id: &str,
    project_flag: Option<&str>,
    prompter: &mut dyn Prompter,
) -> Result<()> {
    let found = locate_any(home, repo, id, project_flag)?;

    println!("  type:   {}", found.kind);
    println!("  detail: {}", found.detail);

    if !prompter.confirm("Remove this entry?")? {
        println!("cancelled");
        return Ok(());
    }

    Store::new(home).delete(&found.slug, id)?;
    println!("removed entry {id}");
    Ok(())
}

fn locate_any(
    home: &Path,
    repo: Option<&Path>,
    id: &str,
    project_flag: Option<&str>,
) -> Result<FoundRecord> {
    let store = Store::new(home);

    if let Some(identifier) = project_flag {
        let registry = Registry::load(home)?;
        let project = registry
            .resolve(identifier)
            .ok_or_else(|| Error::ProjectNotFound(identifier.to_string()))?;
        return find_any_in_project(&store, &project.slug, id)
            .ok_or_else(|| Error::EntryNotFound(id.to_string()));
    }

    if let Ok(project) = resolve_project_context(home, repo, None) {
        if let Some(found) = find_any_in_project(&store, &project.slug, id) {
            return Ok(found);
        }
    }

    find_any_across_projects(&store, id)
}
