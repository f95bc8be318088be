//! Typed records for the per-project store.
//!
//! Four record kinds share one directory and one filename scheme (the
//! 7-hex-char ID) and are told apart by their `type` field: log entries,
//! checkout entries, submit markers, and generated-day markers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod duration;
mod find;
mod store;

pub use duration::{format_minutes, parse_duration};
pub use find::{
    find_any_across_projects, find_any_in_project, find_log_across_projects, FoundLog, FoundRecord,
};
pub use store::Store;

pub const TYPE_LOG: &str = "log";
pub const TYPE_CHECKOUT: &str = "checkout";
pub const TYPE_SUBMIT: &str = "submit";
pub const TYPE_GENERATED_DAY: &str = "generated_day";

/// Source tags for log entries.
pub const SOURCE_MANUAL: &str = "manual";
pub const SOURCE_GENERATE: &str = "generate";
pub const SOURCE_CHECKOUT_GENERATED: &str = "checkout-generated";
pub const SOURCE_EDIT: &str = "edit";
pub const SOURCE_ADD: &str = "add";
pub const SOURCE_SUBMIT: &str = "submit";

/// A single time log entry (a "time commit").
///
/// The ID is preserved across edits and `created_at` is immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub start: DateTime<Utc>,
    pub minutes: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub task: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    pub created_at: DateTime<Utc>,
}

impl LogEntry {
    /// The grouping key for reports: the task if set, else the message.
    pub fn task_key(&self) -> &str {
        if self.task.is_empty() {
            &self.message
        } else {
            &self.task
        }
    }
}

/// A branch checkout event ingested from the reflog (or recorded live by the
/// post-checkout hook). The ID is derived deterministically from
/// `commit_ref ++ timestamp ++ previous ++ next` so re-ingestion is
/// idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutEntry {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub timestamp: DateTime<Utc>,
    pub previous: String,
    pub next: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub commit_ref: String,
}

impl CheckoutEntry {
    /// The deterministic ID seed for a checkout transition.
    pub fn id_seed(
        commit_ref: &str,
        timestamp: DateTime<Utc>,
        previous: &str,
        next: &str,
    ) -> String {
        format!(
            "{commit_ref}{}{previous}{next}",
            timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        )
    }
}

/// Marks a date range as submitted (finalised). Edits inside a submitted
/// period trigger a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitEntry {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Marks a calendar date as already materialised into editable log entries;
/// the attribution engine skips checkout time for such days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDayEntry {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    /// "YYYY-MM-DD"
    pub date: String,
}
