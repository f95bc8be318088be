use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use hourgit::entry::{LogEntry, Store, TYPE_LOG};
use hourgit::project::{create_project, Project};
use tempfile::TempDir;

/// A throwaway home directory with its own registry and stores.
pub struct TestHome {
    dir: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store(&self) -> Store {
        Store::new(self.dir.path())
    }

    pub fn add_project(&self, name: &str) -> Project {
        create_project(self.dir.path(), name).expect("failed to create project")
    }

    /// A repo directory with a bare `.git` folder, enough for markers.
    pub fn fake_repo(&self) -> PathBuf {
        let repo = self.dir.path().join("repo");
        fs::create_dir_all(repo.join(".git")).expect("failed to create fake repo");
        repo
    }
}

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

pub fn log_entry(id: &str, start: DateTime<Utc>, minutes: i64, message: &str) -> LogEntry {
    LogEntry {
        id: id.to_string(),
        kind: TYPE_LOG.to_string(),
        start,
        minutes,
        message: message.to_string(),
        task: String::new(),
        source: String::new(),
        created_at: start,
    }
}
