//! Project registry and per-repository markers.
//!
//! The registry is a single JSON file `<home>/.hourgit/projects.json`
//! holding every project (ID, name, slug, assigned repos, optional
//! schedules), the default schedules, and the update-check cache. Each
//! assigned repository additionally carries a small marker at
//! `.git/.hourgit` with the project name/ID and the repo-scoped last-sync
//! timestamp. The registry is the source of truth; the marker is a
//! rebuildable hint.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id;
use crate::schedule::{default_schedules, ScheduleEntry};
use crate::slug::slugify;

/// Marker line identifying the hourgit-installed portion of a hook.
pub const HOOK_MARKER: &str = "# Installed by hourgit";

/// The post-checkout hook script. `$1`/`$2` are the previous and new HEAD;
/// `$3` is 1 for branch checkouts.
pub const HOOK_CONTENT: &str = "\
#!/bin/sh
# Installed by hourgit
[ \"$3\" = \"1\" ] || exit 0
prev=$(git name-rev --name-only \"$1\" 2>/dev/null)
next=$(git rev-parse --abbrev-ref HEAD 2>/dev/null)
hourgit checkout --prev \"$prev\" --next \"$next\" >/dev/null 2>&1 || true
";

/// A single project in the global registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub repos: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schedules: Vec<ScheduleEntry>,
}

/// The global registry plus registry-level defaults and the update cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaults: Vec<ScheduleEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_check: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
}

/// The per-repo marker stored in `.git/.hourgit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoMarker {
    pub project: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
}

// =============================================================================
// Paths
// =============================================================================

/// The global hourgit config directory.
pub fn hourgit_dir(home: &Path) -> PathBuf {
    home.join(".hourgit")
}

/// Path to the global `projects.json`.
pub fn registry_path(home: &Path) -> PathBuf {
    hourgit_dir(home).join("projects.json")
}

/// Directory for a project's entry records.
pub fn log_dir(home: &Path, slug: &str) -> PathBuf {
    hourgit_dir(home).join(slug)
}

fn marker_path(repo_dir: &Path) -> PathBuf {
    repo_dir.join(".git").join(".hourgit")
}

// =============================================================================
// Registry I/O
// =============================================================================

impl Registry {
    /// Read the registry; a missing file is an empty registry.
    pub fn load(home: &Path) -> Result<Self> {
        let data = match fs::read(registry_path(home)) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&data).map_err(Error::from)
    }

    /// Write the registry, creating the directory on demand.
    pub fn save(&self, home: &Path) -> Result<()> {
        fs::create_dir_all(hourgit_dir(home))?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(registry_path(home), json).map_err(Error::from)
    }

    /// Look up a project by exact name (case-sensitive).
    pub fn find_by_name(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    /// Look up a project by exact ID.
    pub fn find_by_id(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Look up a project by slug. Internal use only (filesystem scans).
    pub fn find_by_slug(&self, slug: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.slug == slug)
    }

    /// Resolve a user-supplied identifier: exact ID match first, then exact
    /// name match. No prefix matching on either.
    pub fn resolve(&self, identifier: &str) -> Option<&Project> {
        self.find_by_id(identifier)
            .or_else(|| self.find_by_name(identifier))
    }

    fn find_mut_by_id(&mut self, id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == id)
    }

    /// Effective schedules for a project: its own list when non-empty, then
    /// the registry defaults, then the built-in Mon-Fri 9-5.
    pub fn schedules_for(&self, project_id: &str) -> Vec<ScheduleEntry> {
        if let Some(project) = self.find_by_id(project_id) {
            if !project.schedules.is_empty() {
                return project.schedules.clone();
            }
        }
        if !self.defaults.is_empty() {
            return self.defaults.clone();
        }
        default_schedules()
    }
}

// =============================================================================
// Project lifecycle
// =============================================================================

/// Create a new project, failing if the name is taken. Also creates the
/// project's log directory.
pub fn create_project(home: &Path, name: &str) -> Result<Project> {
    let mut registry = Registry::load(home)?;

    if let Some(existing) = registry.find_by_name(name) {
        return Err(Error::ProjectExists {
            name: name.to_string(),
            id: existing.id.clone(),
        });
    }

    let project = Project {
        id: id::id_fresh(name),
        name: name.to_string(),
        slug: slugify(name),
        repos: Vec::new(),
        schedules: Vec::new(),
    };

    fs::create_dir_all(log_dir(home, &project.slug))?;
    registry.projects.push(project.clone());
    registry.save(home)?;

    Ok(project)
}

/// Outcome of [`resolve_or_create`].
pub struct ResolvedProject {
    pub project: Project,
    pub created: bool,
}

/// Resolve a project by identifier, offering to create it when missing.
/// Returns `None` when the user declines creation.
pub fn resolve_or_create(
    home: &Path,
    identifier: &str,
    confirm_create: impl FnOnce(&str) -> Result<bool>,
) -> Result<Option<ResolvedProject>> {
    let registry = Registry::load(home)?;
    if let Some(project) = registry.resolve(identifier) {
        return Ok(Some(ResolvedProject {
            project: project.clone(),
            created: false,
        }));
    }

    if !confirm_create(identifier)? {
        return Ok(None);
    }

    Ok(Some(ResolvedProject {
        project: create_project(home, identifier)?,
        created: true,
    }))
}

/// Add a repository to a project and write the repo marker. Already-assigned
/// repos are not duplicated; an existing marker's `last_sync` survives.
pub fn assign_repo(home: &Path, repo_dir: &Path, project_id: &str) -> Result<()> {
    let mut registry = Registry::load(home)?;
    let repo = repo_dir.to_string_lossy().into_owned();

    let project = registry
        .find_mut_by_id(project_id)
        .ok_or_else(|| Error::ProjectNotFound(project_id.to_string()))?;

    if !project.repos.contains(&repo) {
        project.repos.push(repo);
    }

    let name = project.name.clone();
    let id = project.id.clone();
    registry.save(home)?;

    let last_sync = read_marker(repo_dir)?.and_then(|m| m.last_sync);
    write_marker(
        repo_dir,
        &RepoMarker {
            project: name,
            project_id: id,
            last_sync,
        },
    )
}

/// Remove a project from the registry by ID or name, returning the removed
/// entry so the caller can clean up its repositories.
pub fn remove_project(home: &Path, identifier: &str) -> Result<Project> {
    let mut registry = Registry::load(home)?;

    let idx = registry
        .projects
        .iter()
        .position(|p| p.id == identifier || p.name == identifier)
        .ok_or_else(|| Error::ProjectNotFound(identifier.to_string()))?;

    let removed = registry.projects.remove(idx);
    registry.save(home)?;
    Ok(removed)
}

/// Drop a repository path from a project's list.
pub fn remove_repo_from_project(home: &Path, project_id: &str, repo_dir: &Path) -> Result<()> {
    let mut registry = Registry::load(home)?;
    let repo = repo_dir.to_string_lossy();
    if let Some(project) = registry.find_mut_by_id(project_id) {
        project.repos.retain(|r| r.as_str() != repo);
    }
    registry.save(home)
}

/// Replace a project's schedules (empty list clears back to defaults).
pub fn set_schedules(home: &Path, project_id: &str, schedules: Vec<ScheduleEntry>) -> Result<()> {
    let mut registry = Registry::load(home)?;
    let project = registry
        .find_mut_by_id(project_id)
        .ok_or_else(|| Error::ProjectNotFound(project_id.to_string()))?;
    project.schedules = schedules;
    registry.save(home)
}

/// Replace the registry-level default schedules.
pub fn set_defaults(home: &Path, schedules: Vec<ScheduleEntry>) -> Result<()> {
    let mut registry = Registry::load(home)?;
    registry.defaults = schedules;
    registry.save(home)
}

// =============================================================================
// Repo marker
// =============================================================================

/// Read the per-repo marker. A missing file reads as `None`.
pub fn read_marker(repo_dir: &Path) -> Result<Option<RepoMarker>> {
    let data = match fs::read(marker_path(repo_dir)) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&data).map(Some).map_err(Error::from)
}

/// Write the per-repo marker.
pub fn write_marker(repo_dir: &Path, marker: &RepoMarker) -> Result<()> {
    let json = serde_json::to_string_pretty(marker)?;
    fs::write(marker_path(repo_dir), json).map_err(Error::from)
}

/// Delete the per-repo marker; missing is fine.
pub fn remove_marker(repo_dir: &Path) -> Result<()> {
    match fs::remove_file(marker_path(repo_dir)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Hook lifecycle
// =============================================================================

/// True when the repo's post-checkout hook carries the hourgit marker.
pub fn hook_installed(repo_dir: &Path) -> bool {
    let hook = repo_dir.join(".git").join("hooks").join("post-checkout");
    fs::read_to_string(hook)
        .map(|content| content.contains(HOOK_MARKER))
        .unwrap_or(false)
}

/// Remove the hourgit section from the post-checkout hook. If nothing but a
/// shebang remains, the hook file is deleted.
pub fn remove_hook(repo_dir: &Path) -> Result<()> {
    let hook = repo_dir.join(".git").join("hooks").join("post-checkout");
    let content = match fs::read_to_string(&hook) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    let Some(marker_idx) = content.find(HOOK_MARKER) else {
        return Ok(());
    };

    let before = content[..marker_idx].trim_end_matches([' ', '\t', '\n']);
    if before.is_empty() || before.trim() == "#!/bin/sh" {
        fs::remove_file(&hook)?;
        return Ok(());
    }

    fs::write(&hook, format!("{before}\n")).map_err(Error::from)
}
