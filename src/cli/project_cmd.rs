//! `hourgit project` - project registry management.

use std::path::Path;

use crate::error::{Error, Result};
use crate::project::{self, Registry};
use crate::prompt::{AlwaysYes, Prompter, StdinPrompter};

use super::{home_dir, ProjectCommands};

pub fn run(command: ProjectCommands) -> Result<()> {
    let home = home_dir()?;
    match command {
        ProjectCommands::Add { name } => add(&home, &name),
        ProjectCommands::List => list(&home),
        ProjectCommands::Assign { project, force, yes } => {
            let dir = std::env::current_dir()?;
            let mut prompter: Box<dyn Prompter> = if yes {
                Box::new(AlwaysYes(StdinPrompter))
            } else {
                Box::new(StdinPrompter)
            };
            assign(&home, &dir, &project, force, prompter.as_mut())
        }
        ProjectCommands::Remove { project, yes } => {
            let mut prompter: Box<dyn Prompter> = if yes {
                Box::new(AlwaysYes(StdinPrompter))
            } else {
                Box::new(StdinPrompter)
            };
            remove(&home, &project, prompter.as_mut())
        }
    }
}

fn add(home: &Path, name: &str) -> Result<()> {
    let project = project::create_project(home, name)?;
    println!("project '{}' created ({})", project.name, project.id);
    Ok(())
}

fn list(home: &Path) -> Result<()> {
    let registry = Registry::load(home)?;
    if registry.projects.is_empty() {
        println!("no projects");
        return Ok(());
    }

    for project in &registry.projects {
        let repos = match project.repos.len() {
            0 => "no repos".to_string(),
            1 => "1 repo".to_string(),
            n => format!("{n} repos"),
        };
        println!("{}  {}  ({repos})", project.id, project.name);
    }
    Ok(())
}

pub fn assign(
    home: &Path,
    repo_dir: &Path,
    identifier: &str,
    force: bool,
    prompter: &mut dyn Prompter,
) -> Result<()> {
    if !project::hook_installed(repo_dir) {
        return Err(Error::NotInitialized);
    }

    let marker = project::read_marker(repo_dir)?;

    let resolved = project::resolve_or_create(home, identifier, |name| {
        prompter.confirm(&format!("Project '{name}' does not exist. Create it?"))
    })?;
    let Some(resolved) = resolved else {
        println!("aborted");
        return Ok(());
    };

    if let Some(marker) = &marker {
        if !marker.project.is_empty() {
            if marker.project == resolved.project.name {
                println!("repository is already assigned to project '{}'", marker.project);
                return Ok(());
            }
            if !force {
                return Err(Error::AlreadyAssigned(marker.project.clone()));
            }

            // Detach from the old project first.
            let registry = Registry::load(home)?;
            let old_id = registry
                .find_by_name(&marker.project)
                .map(|p| p.id.clone())
                .or_else(|| registry.find_by_id(&marker.project_id).map(|p| p.id.clone()));
            if let Some(old_id) = old_id {
                project::remove_repo_from_project(home, &old_id, repo_dir)?;
            }
        }
    }

    if resolved.created {
        println!(
            "project '{}' created ({})",
            resolved.project.name, resolved.project.id
        );
    }

    project::assign_repo(home, repo_dir, &resolved.project.id)?;
    println!("repository assigned to project '{}'", resolved.project.name);
    Ok(())
}

pub fn remove(home: &Path, identifier: &str, prompter: &mut dyn Prompter) -> Result<()> {
    let registry = Registry::load(home)?;
    let project = registry
        .resolve(identifier)
        .ok_or_else(|| Error::ProjectNotFound(identifier.to_string()))?
        .clone();

    let ok = prompter.confirm(&format!(
        "Remove project '{}' and its {} assigned repo(s)?",
        project.name,
        project.repos.len()
    ))?;
    if !ok {
        println!("cancelled");
        return Ok(());
    }

    let removed = project::remove_project(home, identifier)?;

    // Best-effort cleanup of every assigned repository's marker and hook.
    for repo in &removed.repos {
        let repo = Path::new(repo);
        if let Err(e) = project::remove_marker(repo) {
            tracing::warn!("could not remove marker in {}: {e}", repo.display());
        }
        if let Err(e) = project::remove_hook(repo) {
            tracing::warn!("could not remove hook in {}: {e}", repo.display());
        }
    }

    println!("project '{}' removed", removed.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{create_project, read_marker, HOOK_CONTENT};
    use crate::prompt::Scripted;
    use std::fs;
    use tempfile::TempDir;

    fn initialized_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        let hooks = dir.path().join(".git/hooks");
        fs::create_dir_all(&hooks).unwrap();
        fs::write(hooks.join("post-checkout"), HOOK_CONTENT).unwrap();
        dir
    }

    #[test]
    fn assign_requires_hook() {
        let home = TempDir::new().unwrap();
        let repo = TempDir::new().unwrap();
        fs::create_dir_all(repo.path().join(".git")).unwrap();

        let err = assign(home.path(), repo.path(), "p", false, &mut Scripted::new(["y"]))
            .unwrap_err();
        assert!(err.to_string().contains("not initialized"));
    }

    #[test]
    fn assign_creates_after_confirmation() {
        let home = TempDir::new().unwrap();
        let repo = initialized_repo();

        assign(home.path(), repo.path(), "acme", false, &mut Scripted::new(["y"])).unwrap();

        let registry = Registry::load(home.path()).unwrap();
        assert!(registry.find_by_name("acme").is_some());
        assert!(read_marker(repo.path()).unwrap().is_some());
    }

    #[test]
    fn reassign_needs_force() {
        let home = TempDir::new().unwrap();
        let repo = initialized_repo();

        create_project(home.path(), "old").unwrap();
        create_project(home.path(), "new").unwrap();
        assign(home.path(), repo.path(), "old", false, &mut Scripted::new(["y"])).unwrap();

        let err = assign(home.path(), repo.path(), "new", false, &mut Scripted::new(["y"]))
            .unwrap_err();
        assert!(err.to_string().contains("already assigned"));

        assign(home.path(), repo.path(), "new", true, &mut Scripted::new(["y"])).unwrap();

        let registry = Registry::load(home.path()).unwrap();
        assert!(registry.find_by_name("old").unwrap().repos.is_empty());
        assert_eq!(registry.find_by_name("new").unwrap().repos.len(), 1);
        assert_eq!(read_marker(repo.path()).unwrap().unwrap().project, "new");
    }

    #[test]
    fn remove_cleans_marker_and_hook() {
        let home = TempDir::new().unwrap();
        let repo = initialized_repo();

        assign(home.path(), repo.path(), "acme", false, &mut Scripted::new(["y"])).unwrap();
        remove(home.path(), "acme", &mut Scripted::new(["y"])).unwrap();

        assert!(Registry::load(home.path()).unwrap().projects.is_empty());
        assert!(read_marker(repo.path()).unwrap().is_none());
        assert!(!repo.path().join(".git/hooks/post-checkout").exists());
    }

    #[test]
    fn remove_declined_is_noop() {
        let home = TempDir::new().unwrap();
        create_project(home.path(), "p").unwrap();

        remove(home.path(), "p", &mut Scripted::new(["n"])).unwrap();
        assert_eq!(Registry::load(home.path()).unwrap().projects.len(), 1);
    }
}
