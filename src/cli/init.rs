//! `hourgit init` - install the post-checkout hook, optionally assigning
//! the repository to a project.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::project::{self, HOOK_CONTENT, HOOK_MARKER};
use crate::prompt::Prompter;

use super::home_dir;

pub struct InitOptions {
    pub project: Option<String>,
    pub force: bool,
    pub merge: bool,
}

pub fn run(options: &InitOptions, prompter: &mut dyn Prompter) -> Result<()> {
    let dir = std::env::current_dir()?;
    let home = home_dir()?;
    run_init(&dir, &home, options, prompter)
}

pub fn run_init(
    repo_dir: &Path,
    home: &Path,
    options: &InitOptions,
    prompter: &mut dyn Prompter,
) -> Result<()> {
    let git_dir = repo_dir.join(".git");
    if !git_dir.exists() {
        return Err(Error::NotARepo);
    }

    let hooks_dir = git_dir.join("hooks");
    let hook_path = hooks_dir.join("post-checkout");

    match fs::read_to_string(&hook_path) {
        Ok(existing) => {
            if existing.contains(HOOK_MARKER) {
                return Err(Error::AlreadyInitialized);
            }
            if !options.force && !options.merge {
                return Err(Error::OperationFailed(
                    "post-checkout hook already exists (use --force to overwrite or --merge to append)"
                        .to_string(),
                ));
            }
            let content = if options.merge {
                format!("{existing}\n{HOOK_CONTENT}")
            } else {
                HOOK_CONTENT.to_string()
            };
            write_hook(&hook_path, &content)?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            fs::create_dir_all(&hooks_dir)?;
            write_hook(&hook_path, HOOK_CONTENT)?;
        }
        Err(e) => return Err(e.into()),
    }

    if let Some(identifier) = &options.project {
        let existing = project::read_marker(repo_dir)?;

        let resolved = project::resolve_or_create(home, identifier, |name| {
            prompter.confirm(&format!("Project '{name}' does not exist. Create it?"))
        })?;

        let Some(resolved) = resolved else {
            println!("project assignment skipped");
            println!("hourgit initialized successfully");
            return Ok(());
        };

        if let Some(marker) = existing {
            if !marker.project.is_empty() && marker.project != resolved.project.name {
                return Err(Error::AlreadyAssigned(marker.project));
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
    }

    println!("hourgit initialized successfully");
    Ok(())
}

fn write_hook(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}
