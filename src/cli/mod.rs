//! Command-line interface for hourgit
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::{Error, Result};
use crate::project::{self, Project, Registry};
use crate::prompt::{AlwaysYes, Prompter, StdinPrompter};

mod checkout;
mod completion;
mod config;
mod defaults;
mod edit;
mod generate;
mod history;
mod init;
mod log;
mod project_cmd;
mod remove;
mod report;
mod status;
mod sync;
mod update;

pub use generate::{run_generate, GenerateOptions};
pub use sync::run_sync;

/// hourgit - Git-aware time tracking
///
/// Records branch checkouts via the git reflog, combines them with your
/// working schedule and manual log entries, and produces monthly timesheets.
#[derive(Parser, Debug)]
#[command(name = "hourgit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize hourgit in a git repository
    Init {
        /// Assign repository to a project by name or ID (creates if needed)
        #[arg(long)]
        project: Option<String>,

        /// Overwrite an existing post-checkout hook
        #[arg(long)]
        force: bool,

        /// Append to an existing post-checkout hook
        #[arg(long)]
        merge: bool,

        /// Skip confirmation prompts
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Project management
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Record a branch checkout (used by the post-checkout hook)
    Checkout {
        /// Previous branch name
        #[arg(long)]
        prev: String,

        /// Next branch name
        #[arg(long)]
        next: String,

        /// Project name or ID (auto-detected from repo if omitted)
        #[arg(long, short = 'p')]
        project: Option<String>,
    },

    /// Sync branch checkouts from the git reflog
    Sync {
        /// Project name or ID (auto-detected from repo if omitted)
        #[arg(long, short = 'p')]
        project: Option<String>,
    },

    /// Generate editable time entries from checkout history
    Generate {
        /// Generate for today
        #[arg(long)]
        today: bool,

        /// Generate for the current week (Mon-Sun)
        #[arg(long)]
        week: bool,

        /// Generate for the current month
        #[arg(long)]
        month: bool,

        /// Generate for a specific date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Project name or ID (auto-detected from repo if omitted)
        #[arg(long, short = 'p')]
        project: Option<String>,

        /// Skip confirmation prompts
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Log time manually for a project
    Log {
        /// Log message
        message: Option<String>,

        /// Duration to log (e.g. 30m, 3h, 3h30m)
        #[arg(long)]
        duration: Option<String>,

        /// Start time (e.g. 9am, 14:00)
        #[arg(long)]
        from: Option<String>,

        /// End time (e.g. 5pm, 17:00)
        #[arg(long)]
        to: Option<String>,

        /// Date to log for (default: today)
        #[arg(long)]
        date: Option<String>,

        /// Task label for this entry
        #[arg(long)]
        task: Option<String>,

        /// Project name or ID (auto-detected from repo if omitted)
        #[arg(long, short = 'p')]
        project: Option<String>,

        /// Skip confirmation prompts
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Edit an existing log entry
    Edit {
        /// Entry ID
        id: String,

        /// New duration (e.g. 30m, 3h, 3h30m)
        #[arg(long)]
        duration: Option<String>,

        /// New start time (e.g. 9am, 14:00)
        #[arg(long)]
        from: Option<String>,

        /// New end time (e.g. 5pm, 17:00)
        #[arg(long)]
        to: Option<String>,

        /// New date (YYYY-MM-DD); preserves the time of day
        #[arg(long)]
        date: Option<String>,

        /// New task label (empty string clears it)
        #[arg(long)]
        task: Option<String>,

        /// New message
        #[arg(long, short = 'm')]
        message: Option<String>,

        /// Project name or ID (auto-detected from repo if omitted)
        #[arg(long, short = 'p')]
        project: Option<String>,

        /// Skip confirmation prompts
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Remove a log or checkout entry
    Remove {
        /// Entry ID
        id: String,

        /// Project name or ID (auto-detected from repo if omitted)
        #[arg(long, short = 'p')]
        project: Option<String>,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Show a chronological feed of all recorded activity
    History {
        /// Filter by project name or ID
        #[arg(long, short = 'p')]
        project: Option<String>,

        /// Maximum number of entries to show (0 = all)
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// Open the interactive monthly report (or export it)
    Report {
        /// Month number 1-12 (default: current)
        #[arg(long)]
        month: Option<u32>,

        /// ISO week number (opens the detailed view for that week)
        #[arg(long)]
        week: Option<u32>,

        /// Year (default: current)
        #[arg(long)]
        year: Option<i32>,

        /// Project name or ID (auto-detected from repo if omitted)
        #[arg(long, short = 'p')]
        project: Option<String>,

        /// Export format (only "pdf")
        #[arg(long)]
        export: Option<String>,

        /// Output path for the export (auto-named if omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show current tracking status
    Status {
        /// Project name or ID (auto-detected from repo if omitted)
        #[arg(long, short = 'p')]
        project: Option<String>,
    },

    /// Per-project schedule configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Default schedule configuration
    #[command(subcommand)]
    Defaults(DefaultsCommands),

    /// Shell completion scripts
    #[command(subcommand)]
    Completion(CompletionCommands),

    /// Show the hourgit version
    Version,

    /// Check for a newer hourgit version
    Update,
}

/// Project subcommands
#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a new project
    Add {
        /// Project name
        name: String,
    },

    /// List all projects
    List,

    /// Assign the current repository to a project
    Assign {
        /// Project name or ID (created after confirmation if missing)
        project: String,

        /// Reassign even if the repository belongs to another project
        #[arg(long)]
        force: bool,

        /// Skip confirmation prompts
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Remove a project and clean up its repositories
    Remove {
        /// Project name or ID
        project: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

/// Per-project schedule subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the project's effective schedule
    Get {
        #[arg(long, short = 'p')]
        project: Option<String>,
    },

    /// Interactively edit the project's schedule
    Set {
        #[arg(long, short = 'p')]
        project: Option<String>,
    },

    /// Clear the project's schedule (falls back to defaults)
    Reset {
        #[arg(long, short = 'p')]
        project: Option<String>,
    },

    /// Preview the expanded schedule for the current month
    Report {
        #[arg(long, short = 'p')]
        project: Option<String>,
    },
}

/// Default schedule subcommands
#[derive(Subcommand, Debug)]
pub enum DefaultsCommands {
    /// Show the default schedule
    Get,

    /// Interactively edit the default schedule
    Set,

    /// Clear the defaults (falls back to Mon-Fri 9-5)
    Reset,

    /// Print the stored defaults as JSON
    Read,

    /// Preview the expanded defaults for the current month
    Report,
}

/// Completion subcommands
#[derive(Subcommand, Debug)]
pub enum CompletionCommands {
    /// Print a completion script for a shell
    Generate {
        /// Shell (bash, zsh, fish, elvish, powershell); detected from $SHELL if omitted
        shell: Option<String>,
    },

    /// Install the completion script for the current shell
    Install,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Init { project, force, merge, yes } => {
                init::run(&init::InitOptions { project, force, merge }, prompter(yes).as_mut())
            }
            Commands::Project(cmd) => project_cmd::run(cmd),
            Commands::Checkout { prev, next, project } => checkout::run(&prev, &next, project.as_deref()),
            Commands::Sync { project } => sync::run(project.as_deref()),
            Commands::Generate { today, week, month, date, project, yes } => generate::run(
                &generate::GenerateOptions { today, week, month, date, project },
                prompter(yes).as_mut(),
            ),
            Commands::Log { message, duration, from, to, date, task, project, yes } => log::run(
                &log::LogOptions { message, duration, from, to, date, task, project },
                prompter(yes).as_mut(),
            ),
            Commands::Edit { id, duration, from, to, date, task, message, project, yes } => {
                edit::run(
                    &edit::EditOptions { id, duration, from, to, date, task, message, project },
                    prompter(yes).as_mut(),
                )
            }
            Commands::Remove { id, project, yes } => {
                remove::run(&id, project.as_deref(), prompter(yes).as_mut())
            }
            Commands::History { project, limit } => history::run(project.as_deref(), limit),
            Commands::Report { month, week, year, project, export, output } => report::run(
                &report::ReportOptions { month, week, year, project, export, output },
            ),
            Commands::Status { project } => status::run(project.as_deref()),
            Commands::Config(cmd) => config::run(cmd),
            Commands::Defaults(cmd) => defaults::run(cmd),
            Commands::Completion(cmd) => completion::run(cmd),
            Commands::Version => {
                println!("hourgit {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
            Commands::Update => update::run(),
        }
    }
}

fn prompter(yes: bool) -> Box<dyn Prompter> {
    if yes {
        Box::new(AlwaysYes(StdinPrompter))
    } else {
        Box::new(StdinPrompter)
    }
}

// =============================================================================
// Shared context resolution
// =============================================================================

/// The user's home directory, honouring `HOME`.
pub(crate) fn home_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        if !home.is_empty() {
            return Ok(PathBuf::from(home));
        }
    }
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or_else(|| Error::OperationFailed("cannot determine home directory".to_string()))
}

/// The directory commands treat as the current repository.
pub(crate) fn repo_dir() -> Option<PathBuf> {
    std::env::current_dir().ok()
}

/// Find the active project: the `--project` flag first, then the current
/// repo's `.git/.hourgit` marker.
pub(crate) fn resolve_project_context(
    home: &std::path::Path,
    repo_dir: Option<&std::path::Path>,
    project_flag: Option<&str>,
) -> Result<Project> {
    let registry = Registry::load(home)?;

    if let Some(identifier) = project_flag {
        return registry
            .resolve(identifier)
            .cloned()
            .ok_or_else(|| Error::ProjectNotFound(identifier.to_string()));
    }

    if let Some(repo) = repo_dir {
        if let Some(marker) = project::read_marker(repo)? {
            if let Some(found) = registry.find_by_id(&marker.project_id) {
                return Ok(found.clone());
            }
            if let Some(found) = registry.find_by_name(&marker.project) {
                return Ok(found.clone());
            }
            return Err(Error::StaleRepoMarker(marker.project));
        }
    }

    Err(Error::NoProjectContext)
}
