//! `hourgit edit` - modify an existing log entry.
//!
//! Locates the entry (project flag, repo context, then a cross-project
//! scan), applies flag-driven or interactive changes, validates, runs the
//! schedule guard when the time changed, and writes the record back with its
//! ID and `created_at` untouched.

use std::path::Path;

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::entry::{
    find_log_across_projects, format_minutes, parse_duration, LogEntry, Store,
};
use crate::error::{Error, Result};
use crate::project::{Project, Registry};
use crate::prompt::Prompter;

use super::log::{check_schedule_warnings, check_submit_warning, parse_from_to, resolve_base_date};
use super::{home_dir, repo_dir, resolve_project_context};

pub struct EditOptions {
    pub id: String,
    pub duration: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<String>,
    pub task: Option<String>,
    pub message: Option<String>,
    pub project: Option<String>,
}

impl EditOptions {
    fn any_flag_set(&self) -> bool {
        self.duration.is_some()
            || self.from.is_some()
            || self.to.is_some()
            || self.date.is_some()
            || self.task.is_some()
            || self.message.is_some()
    }
}

pub fn run(options: &EditOptions, prompter: &mut dyn Prompter) -> Result<()> {
    let home = home_dir()?;
    let repo = repo_dir();
    let now = Local::now();
    run_edit(&home, repo.as_deref(), options, prompter, &now)
}

pub fn run_edit<Tz: TimeZone>(
    home: &Path,
    repo: Option<&Path>,
    options: &EditOptions,
    prompter: &mut dyn Prompter,
    now: &DateTime<Tz>,
) -> Result<()> {
    let (slug, project, original) = locate_entry(home, repo, options)?;

    let edited = if options.any_flag_set() {
        apply_flag_edits(original.clone(), options, now)?
    } else {
        apply_interactive_edits(original.clone(), prompter, now)?
    };

    if edited.minutes <= 0 {
        return Err(Error::Validation("duration must be positive".to_string()));
    }
    if edited.minutes > 24 * 60 {
        return Err(Error::Validation(
            "cannot log more than 24h in a single entry".to_string(),
        ));
    }
    if edited.message.is_empty() {
        return Err(Error::Validation("message is required".to_string()));
    }

    let time_changed = edited.start != original.start || edited.minutes != original.minutes;
    if time_changed {
        if let Some(project) = &project {
            if !check_schedule_warnings(
                home,
                project,
                edited.start,
                edited.minutes,
                &edited.id,
                prompter,
            )? {
                println!("cancelled");
                return Ok(());
            }
        }
        if !check_submit_warning(home, &slug, edited.start.date_naive(), prompter)? {
            println!("cancelled");
            return Ok(());
        }
    }

    if edited.start == original.start
        && edited.minutes == original.minutes
        && edited.message == original.message
        && edited.task == original.task
    {
        println!("no changes");
        return Ok(());
    }

    // ID and created_at survive the edit untouched.
    Store::new(home).write_log(&slug, &edited)?;

    print_edit_diff(&original, &edited);
    Ok(())
}

/// Find the entry by ID: project flag first, then repo context, then a scan
/// across every project. The project is `None` only when the scan found the
/// entry but its slug has no registry entry.
fn locate_entry(
    home: &Path,
    repo: Option<&Path>,
    options: &EditOptions,
) -> Result<(String, Option<Project>, LogEntry)> {
    let store = Store::new(home);
    let id = &options.id;

    if let Some(identifier) = options.project.as_deref() {
        let registry = Registry::load(home)?;
        let project = registry
            .resolve(identifier)
            .cloned()
            .ok_or_else(|| Error::ProjectNotFound(identifier.to_string()))?;
        let entry = match store.read_log(&project.slug, id) {
            Ok(entry) => entry,
            Err(e) => {
                if store.is_checkout(&project.slug, id) {
                    return Err(Error::CheckoutNotEditable(id.clone()));
                }
                return Err(e);
            }
        };
        let slug = project.slug.clone();
        return Ok((slug, Some(project), entry));
    }

    if let Ok(project) = resolve_project_context(home, repo, None) {
        match store.read_log(&project.slug, id) {
            Ok(entry) => {
                let slug = project.slug.clone();
                return Ok((slug, Some(project), entry));
            }
            Err(_) if store.is_checkout(&project.slug, id) => {
                return Err(Error::CheckoutNotEditable(id.clone()));
            }
            Err(_) => {}
        }
    }

    let found = find_log_across_projects(&store, id)?;
    let registry = Registry::load(home)?;
    let project = registry.find_by_slug(&found.slug).cloned();
    Ok((found.slug, project, found.entry))
}

fn apply_flag_edits<Tz: TimeZone>(
    mut entry: LogEntry,
    options: &EditOptions,
    now: &DateTime<Tz>,
) -> Result<LogEntry> {
    let has_duration = options.duration.is_some();
    let has_from = options.from.is_some();
    let has_to = options.to.is_some();

    if has_duration && (has_from || has_to) {
        return Err(Error::Validation(
            "--duration and --from/--to are mutually exclusive".to_string(),
        ));
    }

    // A date change shifts the day but keeps the time of day.
    if let Some(date_flag) = &options.date {
        let new_date = resolve_base_date(date_flag, now)?;
        let time = entry.start.time();
        entry.start = Utc.from_utc_datetime(&new_date.and_time(time));
    }

    if let Some(duration) = &options.duration {
        entry.minutes = parse_duration(duration)?;
    } else if has_from || has_to {
        let old_end = entry.start + chrono::Duration::minutes(entry.minutes);
        let old_from = entry.start.format("%H:%M").to_string();
        let old_to = old_end.format("%H:%M").to_string();

        let from = options.from.clone().unwrap_or(old_from);
        let to = options.to.clone().unwrap_or(old_to);

        let (start, minutes) = parse_from_to(&from, &to, entry.start.date_naive(), &Utc)?;
        entry.start = start;
        entry.minutes = minutes;
    }

    if let Some(task) = &options.task {
        entry.task = task.clone();
    }

    if let Some(message) = &options.message {
        if message.is_empty() {
            return Err(Error::Validation("message is required".to_string()));
        }
        entry.message = message.clone();
    }

    Ok(entry)
}

fn apply_interactive_edits<Tz: TimeZone>(
    mut entry: LogEntry,
    prompter: &mut dyn Prompter,
    now: &DateTime<Tz>,
) -> Result<LogEntry> {
    let date_str = prompter.prompt_with_default(
        "Date (YYYY-MM-DD)",
        &entry.start.format("%Y-%m-%d").to_string(),
    )?;
    let new_date = resolve_base_date(&date_str, now)?;

    let from = prompter.prompt_with_default(
        "From (e.g. 9am, 14:00)",
        &entry.start.format("%H:%M").to_string(),
    )?;
    let end = entry.start + chrono::Duration::minutes(entry.minutes);
    let to = prompter.prompt_with_default(
        "To (e.g. 5pm, 17:00)",
        &end.format("%H:%M").to_string(),
    )?;

    let (start, minutes) = parse_from_to(&from, &to, new_date, &Utc)?;
    entry.start = start;
    entry.minutes = minutes;

    entry.task = prompter.prompt_with_default("Task", &entry.task.clone())?;
    entry.message = prompter.prompt_with_default("Message", &entry.message.clone())?;

    Ok(entry)
}

fn print_edit_diff(before: &LogEntry, after: &LogEntry) {
    if before.start != after.start {
        println!(
            "  date:     {} → {}",
            before.start.format("%Y-%m-%d %H:%M"),
            after.start.format("%Y-%m-%d %H:%M")
        );
    }
    if before.minutes != after.minutes {
        println!(
            "  duration: {} → {}",
            format_minutes(before.minutes),
            format_minutes(after.minutes)
        );
    }
    if before.task != after.task {
        let label = |t: &str| if t.is_empty() { "(none)".to_string() } else { t.to_string() };
        println!("  task:     {} → {}", label(&before.task), label(&after.task));
    }
    if before.message != after.message {
        println!("  message:  {} → {}", before.message, after.message);
    }
    println!("updated entry {}", after.id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Store, TYPE_LOG};
    use crate::project::create_project;
    use crate::prompt::Scripted;
    use tempfile::TempDir;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn seed(home: &Path) -> (Project, LogEntry) {
        let project = create_project(home, "p").unwrap();
        let entry = LogEntry {
            id: "aaaa001".into(),
            kind: TYPE_LOG.into(),
            start: utc(2026, 1, 1, 9, 0),
            minutes: 180,
            message: "original".into(),
            task: "t1".into(),
            source: String::new(),
            created_at: utc(2026, 1, 1, 12, 0),
        };
        Store::new(home).write_log(&project.slug, &entry).unwrap();
        (project, entry)
    }

    fn options(id: &str) -> EditOptions {
        EditOptions {
            id: id.into(),
            duration: None,
            from: None,
            to: None,
            date: None,
            task: None,
            message: None,
            project: Some("p".into()),
        }
    }

    #[test]
    fn duration_edit_preserves_id_and_created_at() {
        let home = TempDir::new().unwrap();
        let (project, before) = seed(home.path());
        let now = utc(2026, 1, 2, 12, 0);

        let mut opts = options("aaaa001");
        opts.duration = Some("2h".into());
        run_edit(home.path(), None, &opts, &mut Scripted::new::<_, String>([]), &now).unwrap();

        let after = Store::new(home.path()).read_log(&project.slug, "aaaa001").unwrap();
        assert_eq!(after.minutes, 120);
        assert_eq!(after.id, before.id);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.message, "original");
    }

    #[test]
    fn date_shift_preserves_time_of_day() {
        let home = TempDir::new().unwrap();
        let (project, _) = seed(home.path());
        let now = utc(2026, 1, 2, 12, 0);

        let mut opts = options("aaaa001");
        opts.date = Some("2026-01-05".into());
        // Same duration on the new day is within budget: no prompt needed.
        run_edit(home.path(), None, &opts, &mut Scripted::new::<_, String>([]), &now).unwrap();

        let after = Store::new(home.path()).read_log(&project.slug, "aaaa001").unwrap();
        assert_eq!(after.start, utc(2026, 1, 5, 9, 0));
    }

    #[test]
    fn from_to_edit_merges_with_existing_times() {
        let home = TempDir::new().unwrap();
        let (project, _) = seed(home.path());
        let now = utc(2026, 1, 2, 12, 0);

        // Only --to changes; --from defaults to the entry's current 09:00.
        let mut opts = options("aaaa001");
        opts.to = Some("11:30".into());
        run_edit(home.path(), None, &opts, &mut Scripted::new::<_, String>([]), &now).unwrap();

        let after = Store::new(home.path()).read_log(&project.slug, "aaaa001").unwrap();
        assert_eq!(after.start, utc(2026, 1, 1, 9, 0));
        assert_eq!(after.minutes, 150);
    }

    #[test]
    fn duration_and_from_are_exclusive() {
        let home = TempDir::new().unwrap();
        seed(home.path());
        let now = utc(2026, 1, 2, 12, 0);

        let mut opts = options("aaaa001");
        opts.duration = Some("2h".into());
        opts.from = Some("9am".into());
        let err = run_edit(home.path(), None, &opts, &mut Scripted::new::<_, String>([]), &now)
            .unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn unchanged_edit_reports_no_changes() {
        let home = TempDir::new().unwrap();
        let (project, before) = seed(home.path());
        let now = utc(2026, 1, 2, 12, 0);

        let mut opts = options("aaaa001");
        opts.task = Some("t1".into());
        run_edit(home.path(), None, &opts, &mut Scripted::new::<_, String>([]), &now).unwrap();

        let after = Store::new(home.path()).read_log(&project.slug, "aaaa001").unwrap();
        assert_eq!(after, before);
    }

    #[test]
    fn clearing_task_with_empty_string() {
        let home = TempDir::new().unwrap();
        let (project, _) = seed(home.path());
        let now = utc(2026, 1, 2, 12, 0);

        let mut opts = options("aaaa001");
        opts.task = Some(String::new());
        run_edit(home.path(), None, &opts, &mut Scripted::new::<_, String>([]), &now).unwrap();

        let after = Store::new(home.path()).read_log(&project.slug, "aaaa001").unwrap();
        assert!(after.task.is_empty());
    }

    #[test]
    fn empty_message_rejected() {
        let home = TempDir::new().unwrap();
        seed(home.path());
        let now = utc(2026, 1, 2, 12, 0);

        let mut opts = options("aaaa001");
        opts.message = Some(String::new());
        let err = run_edit(home.path(), None, &opts, &mut Scripted::new::<_, String>([]), &now)
            .unwrap_err();
        assert!(err.to_string().contains("message is required"));
    }

    #[test]
    fn editing_checkout_entry_fails() {
        let home = TempDir::new().unwrap();
        let (project, _) = seed(home.path());
        Store::new(home.path())
            .write_checkout(
                &project.slug,
                &crate::entry::CheckoutEntry {
                    id: "cccc001".into(),
                    kind: crate::entry::TYPE_CHECKOUT.into(),
                    timestamp: utc(2026, 1, 1, 9, 0),
                    previous: "main".into(),
                    next: "x".into(),
                    commit_ref: String::new(),
                },
            )
            .unwrap();
        let now = utc(2026, 1, 2, 12, 0);

        let mut opts = options("cccc001");
        opts.duration = Some("1h".into());
        let err = run_edit(home.path(), None, &opts, &mut Scripted::new::<_, String>([]), &now)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "entry 'cccc001' is a checkout entry and cannot be edited"
        );
    }

    #[test]
    fn cross_project_scan_without_flag() {
        let home = TempDir::new().unwrap();
        let (project, _) = seed(home.path());
        let now = utc(2026, 1, 2, 12, 0);

        let mut opts = options("aaaa001");
        opts.project = None;
        opts.message = Some("found you".into());
        run_edit(home.path(), None, &opts, &mut Scripted::new::<_, String>([]), &now).unwrap();

        let after = Store::new(home.path()).read_log(&project.slug, "aaaa001").unwrap();
        assert_eq!(after.message, "found you");
    }

    #[test]
    fn interactive_edit_walks_all_fields() {
        let home = TempDir::new().unwrap();
        let (project, _) = seed(home.path());
        let now = utc(2026, 1, 2, 12, 0);

        let mut opts = options("aaaa001");
        opts.project = Some("p".into());
        // date (default), from 10:00, to 12:00, task (default), message new
        let mut prompter = Scripted::new(["", "10:00", "12:00", "", "rewritten"]);
        run_edit(home.path(), None, &opts, &mut prompter, &now).unwrap();

        let after = Store::new(home.path()).read_log(&project.slug, "aaaa001").unwrap();
        assert_eq!(after.start, utc(2026, 1, 1, 10, 0));
        assert_eq!(after.minutes, 120);
        assert_eq!(after.task, "t1");
        assert_eq!(after.message, "rewritten");
    }
}
