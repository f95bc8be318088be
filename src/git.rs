//! Git integration.
//!
//! Repository discovery and the current branch go through libgit2. The
//! reflog is read by shelling out to `git reflog --date=iso` because the
//! ingestion pipeline is specified over that text format (and respects the
//! repo-scoped `--since` lower bound).

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use git2::Repository;

use crate::error::{Error, Result};

/// Open the repository containing `path` (or the current directory).
pub fn open_repo(path: Option<&Path>) -> Result<Repository> {
    let start = match path {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir()?,
    };
    Repository::discover(&start).map_err(|_| Error::NotARepo)
}

/// The repository's working directory.
pub fn workdir(repo: &Repository) -> Result<PathBuf> {
    repo.workdir()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::OperationFailed("repository has no working directory".to_string()))
}

/// The short name of the branch HEAD points at ("HEAD" when detached).
pub fn current_branch(repo: &Repository) -> Result<String> {
    let head = repo.head()?;
    Ok(head.shorthand().unwrap_or("HEAD").to_string())
}

/// Function type for reading the reflog; injectable so sync is testable
/// with canned output.
pub type ReflogFn = dyn Fn(&Path, Option<DateTime<Utc>>) -> Result<String>;

/// Run `git -C <repo> reflog --date=iso [--since=...]` and return stdout.
pub fn read_reflog(repo_dir: &Path, since: Option<DateTime<Utc>>) -> Result<String> {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(repo_dir).arg("reflog").arg("--date=iso");
    if let Some(since) = since {
        cmd.arg(format!("--since={}", since.format("%Y-%m-%d %H:%M:%S")));
    }

    let output = cmd
        .output()
        .map_err(|e| Error::OperationFailed(format!("failed to read git reflog: {e}")))?;

    if !output.status.success() {
        return Err(Error::OperationFailed(format!(
            "failed to read git reflog: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
