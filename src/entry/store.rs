//! Entry storage.
//!
//! One directory per project under `<home>/.hourgit/<slug>/`, one JSON file
//! per record named exactly by its ID (no extension). Readers inspect the
//! record's `type` field before decoding; files with malformed JSON or a
//! mismatched type are skipped rather than failing the scan, so the store
//! tolerates partial writes from interrupted runs.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::id::is_valid_id;
use crate::project;

use super::{
    CheckoutEntry, GeneratedDayEntry, LogEntry, SubmitEntry, TYPE_CHECKOUT, TYPE_GENERATED_DAY,
    TYPE_LOG, TYPE_SUBMIT,
};

/// Storage manager for per-project entry files.
#[derive(Debug, Clone)]
pub struct Store {
    home: PathBuf,
}

impl Store {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Directory holding a project's records.
    pub fn log_dir(&self, slug: &str) -> PathBuf {
        project::log_dir(&self.home, slug)
    }

    fn entry_path(&self, slug: &str, id: &str) -> Result<PathBuf> {
        if !is_valid_id(id) {
            return Err(Error::InvalidArgument(format!("invalid entry ID '{id}'")));
        }
        Ok(self.log_dir(slug).join(id))
    }

    /// Write a record atomically (temp file + rename) so readers never see a
    /// torn file.
    fn write_record<T: Serialize>(&self, slug: &str, id: &str, record: &T) -> Result<()> {
        let path = self.entry_path(slug, id)?;
        fs::create_dir_all(self.log_dir(slug))?;

        let json = serde_json::to_string_pretty(record)?;
        let temp_path = path.with_extension("tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &path)?;

        Ok(())
    }

    /// Read all record files from a project directory as raw bytes. A
    /// missing directory reads as empty.
    fn read_all_raw(&self, slug: &str) -> Result<Vec<Vec<u8>>> {
        let dir = self.log_dir(slug);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            files.push(fs::read(entry.path())?);
        }
        Ok(files)
    }

    /// Decode every record of one type, skipping everything else.
    fn read_all_typed<T: DeserializeOwned>(&self, slug: &str, kind: &str) -> Result<Vec<T>> {
        let mut records = Vec::new();
        for data in self.read_all_raw(slug)? {
            if !matches_type(&data, kind) {
                continue;
            }
            let Ok(record) = serde_json::from_slice(&data) else {
                continue;
            };
            records.push(record);
        }
        Ok(records)
    }

    fn read_one<T: DeserializeOwned>(&self, slug: &str, id: &str, kind: &str) -> Result<T> {
        let path = self.entry_path(slug, id)?;
        let data = fs::read(&path).map_err(|_| Error::EntryNotFound(id.to_string()))?;
        if !matches_type(&data, kind) {
            return Err(Error::EntryNotFound(id.to_string()));
        }
        serde_json::from_slice(&data).map_err(Error::from)
    }

    // =========================================================================
    // Log entries
    // =========================================================================

    pub fn write_log(&self, slug: &str, entry: &LogEntry) -> Result<()> {
        let mut entry = entry.clone();
        entry.kind = TYPE_LOG.to_string();
        self.write_record(slug, &entry.id, &entry)
    }

    pub fn read_log(&self, slug: &str, id: &str) -> Result<LogEntry> {
        self.read_one(slug, id, TYPE_LOG)
    }

    pub fn read_all_logs(&self, slug: &str) -> Result<Vec<LogEntry>> {
        self.read_all_typed(slug, TYPE_LOG)
    }

    // =========================================================================
    // Checkout entries
    // =========================================================================

    pub fn write_checkout(&self, slug: &str, entry: &CheckoutEntry) -> Result<()> {
        let mut entry = entry.clone();
        entry.kind = TYPE_CHECKOUT.to_string();
        self.write_record(slug, &entry.id, &entry)
    }

    pub fn read_checkout(&self, slug: &str, id: &str) -> Result<CheckoutEntry> {
        self.read_one(slug, id, TYPE_CHECKOUT)
    }

    pub fn read_all_checkouts(&self, slug: &str) -> Result<Vec<CheckoutEntry>> {
        self.read_all_typed(slug, TYPE_CHECKOUT)
    }

    /// Pure type probe; never raises.
    pub fn is_checkout(&self, slug: &str, id: &str) -> bool {
        let Ok(path) = self.entry_path(slug, id) else {
            return false;
        };
        let Ok(data) = fs::read(path) else {
            return false;
        };
        matches_type(&data, TYPE_CHECKOUT)
    }

    /// All known checkout IDs, for sync deduplication.
    pub fn checkout_ids(&self, slug: &str) -> Result<HashSet<String>> {
        Ok(self
            .read_all_checkouts(slug)?
            .into_iter()
            .map(|e| e.id)
            .collect())
    }

    // =========================================================================
    // Submit markers
    // =========================================================================

    pub fn write_submit(&self, slug: &str, entry: &SubmitEntry) -> Result<()> {
        let mut entry = entry.clone();
        entry.kind = TYPE_SUBMIT.to_string();
        self.write_record(slug, &entry.id, &entry)
    }

    pub fn read_all_submits(&self, slug: &str) -> Result<Vec<SubmitEntry>> {
        self.read_all_typed(slug, TYPE_SUBMIT)
    }

    // =========================================================================
    // Generated-day markers
    // =========================================================================

    pub fn write_generated_day(&self, slug: &str, entry: &GeneratedDayEntry) -> Result<()> {
        let mut entry = entry.clone();
        entry.kind = TYPE_GENERATED_DAY.to_string();
        self.write_record(slug, &entry.id, &entry)
    }

    pub fn read_all_generated_days(&self, slug: &str) -> Result<Vec<GeneratedDayEntry>> {
        self.read_all_typed(slug, TYPE_GENERATED_DAY)
    }

    /// Delete generated-day markers whose date is in `dates`.
    pub fn delete_generated_days_by_date(&self, slug: &str, dates: &HashSet<String>) -> Result<()> {
        for marker in self.read_all_generated_days(slug)? {
            if dates.contains(&marker.date) {
                self.delete(slug, &marker.id)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Any record
    // =========================================================================

    /// Delete a record of any type by ID.
    pub fn delete(&self, slug: &str, id: &str) -> Result<()> {
        let path = self.entry_path(slug, id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::EntryNotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Check whether raw JSON has a `type` field equal to `expected`. A missing
/// or empty type counts as a log entry (legacy records predate the field).
fn matches_type(data: &[u8], expected: &str) -> bool {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return false;
    };
    match value.get("type").and_then(|t| t.as_str()) {
        None | Some("") => expected == TYPE_LOG,
        Some(t) => t == expected,
    }
}
