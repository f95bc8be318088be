//! Error types for hourgit
//!
//! Exit codes:
//! - 0: Success (a declined confirmation is a no-op success, not a failure)
//! - 1: Any error surfaced to the user

use thiserror::Error;

/// Main error type for hourgit operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("entry '{0}' not found")]
    EntryNotFound(String),

    #[error("entry '{0}' is a checkout entry and cannot be edited")]
    CheckoutNotEditable(String),

    #[error("project '{0}' not found")]
    ProjectNotFound(String),

    #[error("project '{name}' already exists ({id})")]
    ProjectExists { name: String, id: String },

    #[error("project '{0}' from repo config not found in registry")]
    StaleRepoMarker(String),

    #[error("no project found (use --project or run from inside an assigned repo)")]
    NoProjectContext,

    #[error("hourgit is not initialized (run 'hourgit init' first)")]
    NotInitialized,

    #[error("hourgit is already initialized")]
    AlreadyInitialized,

    #[error("repository is already assigned to project '{0}' (use --force to reassign)")]
    AlreadyAssigned(String),

    #[error("not a git repository")]
    NotARepo,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Validation(String),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Result type alias for hourgit operations
pub type Result<T> = std::result::Result<T, Error>;
