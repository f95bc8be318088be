//! hourgit - Git-aware time tracking library
//!
//! Turns branch checkout activity and manual log entries into per-project
//! daily/weekly/monthly timesheets.
//!
//! # Core Concepts
//!
//! - **Projects**: a global registry mapping repositories to named projects
//! - **Schedules**: recurring working windows (RFC 5545 style) expanded to
//!   concrete per-day hours
//! - **Checkout entries**: branch switches ingested from the git reflog with
//!   deterministic, content-addressed IDs
//! - **Attribution**: checkout ranges clipped to schedule windows, with
//!   manual logs deducting from the day's checkout budget
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `entry`: typed records and the one-file-per-record store
//! - `schedule`: time/date/recurrence parsing and expansion
//! - `timetrack`: the attribution engine and export data
//! - `project`: registry, repo markers, and hook lifecycle
//! - `reflog`: `git reflog` output parsing
//! - `ui`: the interactive report table
//! - `pdf`: timesheet PDF rendering

pub mod cli;
pub mod entry;
pub mod error;
pub mod git;
pub mod id;
pub mod pdf;
pub mod project;
pub mod prompt;
pub mod reflog;
pub mod schedule;
pub mod slug;
pub mod timetrack;
pub mod ui;

pub use error::{Error, Result};
