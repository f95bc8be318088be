//! Event loop for the interactive report table.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, TimeZone, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::entry::{
    LogEntry, Store, SubmitEntry, SOURCE_CHECKOUT_GENERATED, SOURCE_MANUAL, TYPE_LOG, TYPE_SUBMIT,
};
use crate::error::Result;
use crate::id;
use crate::project::Registry;
use crate::schedule::expand_schedules;
use crate::timetrack::{build_detailed_report, CellEntry, DetailedReportData};

use super::model::ReportModel;
use super::overlay::{AddState, EditState, Outcome, Overlay, RemoveState, SelectAction, SelectorState, SubmitState};
use super::view;

const EVENT_POLL_MS: u64 = 120;

/// Restores the terminal even when the event loop errors out.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    home: PathBuf,
    slug: String,
    model: ReportModel,
    overlay: Option<Overlay>,
}

/// Run the interactive table until the user quits.
pub fn run(home: &Path, slug: &str, data: DetailedReportData) -> Result<()> {
    let guard = TerminalGuard::enter()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let mut app = App {
        home: home.to_path_buf(),
        slug: slug.to_string(),
        model: ReportModel::new(data),
        overlay: None,
    };

    loop {
        terminal.draw(|frame| {
            let (rows, cols) = view::visible_dims(frame.size());
            app.model.ensure_visible(rows, cols);
            view::draw(frame, &app.model, app.overlay.as_ref());
        })?;

        if !event::poll(Duration::from_millis(EVENT_POLL_MS))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if let Some(overlay) = app.overlay.as_mut() {
            if let Some(outcome) = overlay.handle_key(key) {
                app.overlay = None;
                app.apply(outcome)?;
            }
            continue;
        }

        if app.handle_key(key)? {
            break;
        }
    }

    drop(guard);
    Ok(())
}

impl App {
    /// Returns true when the loop should exit.
    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(true)
            }
            KeyCode::Left | KeyCode::Char('h') => self.model.move_cols(-1),
            KeyCode::Right | KeyCode::Char('l') => self.model.move_cols(1),
            KeyCode::Up | KeyCode::Char('k') => self.model.move_rows(-1),
            KeyCode::Down | KeyCode::Char('j') => self.model.move_rows(1),
            KeyCode::Char('e') => self.start_edit(),
            KeyCode::Char('a') => self.start_add(),
            KeyCode::Char('r') | KeyCode::Delete | KeyCode::Backspace => self.start_remove(),
            KeyCode::Char('s') => self.start_submit(),
            _ => {}
        }
        Ok(false)
    }

    fn start_edit(&mut self) {
        let Some(cell) = self.model.selected_cell() else {
            self.model.footer = "No entries to edit in this cell".to_string();
            return;
        };
        self.overlay = Some(if cell.entries.len() == 1 {
            Overlay::Edit(EditState::new(cell.entries[0].clone()))
        } else {
            Overlay::Selector(SelectorState::new(
                cell.entries.clone(),
                "Select entry to edit",
                SelectAction::Edit,
            ))
        });
    }

    fn start_add(&mut self) {
        let day = self.model.selected_day();
        let Some(date) =
            chrono::NaiveDate::from_ymd_opt(self.model.data.year, self.model.data.month, day)
        else {
            return;
        };
        let task = self.model.selected_task().unwrap_or_default().to_string();
        self.overlay = Some(Overlay::Add(AddState::new(day, date, &task)));
    }

    fn start_remove(&mut self) {
        let Some(cell) = self.model.selected_cell() else {
            self.model.footer = "No entries to remove in this cell".to_string();
            return;
        };
        self.overlay = Some(if cell.entries.len() == 1 {
            Overlay::Remove(RemoveState::new(cell.entries[0].clone()))
        } else {
            Overlay::Selector(SelectorState::new(
                cell.entries.clone(),
                "Select entry to remove",
                SelectAction::Remove,
            ))
        });
    }

    fn start_submit(&mut self) {
        let count = self.model.in_memory_entries().len();
        self.overlay = Some(Overlay::Submit(SubmitState::new(
            count,
            self.model.data.from,
            self.model.data.to,
        )));
    }

    fn apply(&mut self, outcome: Outcome) -> Result<()> {
        match outcome {
            Outcome::Cancel => {
                self.model.footer.clear();
            }
            Outcome::Edit { entry, minutes, task, message } => {
                self.apply_edit(entry, minutes, task, message)?;
                self.model.footer = "Entry saved".to_string();
                self.reload()?;
            }
            Outcome::Add { day, minutes, task, message } => {
                self.apply_add(day, minutes, task, message)?;
                self.model.footer = "Entry added".to_string();
                self.reload()?;
            }
            Outcome::Remove(entry) => {
                if entry.persisted {
                    Store::new(&self.home).delete(&self.slug, &entry.id)?;
                    self.reload()?;
                } else {
                    // No disk record yet; drop it from the view only.
                    self.model.remove_in_memory_entry(&entry);
                }
                self.model.footer = "Entry removed".to_string();
            }
            Outcome::Submit => {
                self.apply_submit()?;
                self.model.footer = "Period submitted".to_string();
                self.reload()?;
            }
        }
        Ok(())
    }

    fn apply_edit(
        &mut self,
        cell_entry: CellEntry,
        minutes: i64,
        task: String,
        message: String,
    ) -> Result<()> {
        let store = Store::new(&self.home);

        if let Some(mut record) = cell_entry.entry.clone() {
            record.minutes = minutes;
            record.task = task;
            record.message = message;
            store.write_log(&self.slug, &record)?;
        } else {
            // Persisting an in-memory checkout entry replaces the synthetic
            // one from the next rebuild onwards.
            store.write_log(
                &self.slug,
                &LogEntry {
                    id: id::id_fresh("edit"),
                    kind: TYPE_LOG.to_string(),
                    start: cell_entry.start,
                    minutes,
                    message,
                    task,
                    source: SOURCE_CHECKOUT_GENERATED.to_string(),
                    created_at: Utc::now(),
                },
            )?;
        }
        Ok(())
    }

    fn apply_add(&mut self, day: u32, minutes: i64, task: String, message: String) -> Result<()> {
        let Some(date) =
            chrono::NaiveDate::from_ymd_opt(self.model.data.year, self.model.data.month, day)
        else {
            return Ok(());
        };
        let nine_am = chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default();
        let message = if message.is_empty() { task.clone() } else { message };

        Store::new(&self.home).write_log(
            &self.slug,
            &LogEntry {
                id: id::id_fresh("add"),
                kind: TYPE_LOG.to_string(),
                start: Utc.from_utc_datetime(&date.and_time(nine_am)),
                minutes,
                message,
                task,
                source: SOURCE_MANUAL.to_string(),
                created_at: Utc::now(),
            },
        )?;
        Ok(())
    }

    fn apply_submit(&mut self) -> Result<()> {
        let store = Store::new(&self.home);
        let in_memory = self.model.in_memory_entries();

        // Persisted copies carry source=checkout-generated: the detailed
        // report suppresses the synthetic duplicates and the monthly report's
        // overrun deduction absorbs the now-logged minutes.
        for entry in &in_memory {
            store.write_log(
                &self.slug,
                &LogEntry {
                    id: id::id_fresh("submit"),
                    kind: TYPE_LOG.to_string(),
                    start: entry.start,
                    minutes: entry.minutes,
                    message: entry.message.clone(),
                    task: entry.task.clone(),
                    source: SOURCE_CHECKOUT_GENERATED.to_string(),
                    created_at: Utc::now(),
                },
            )?;
        }

        let midnight = chrono::NaiveTime::default();
        store.write_submit(
            &self.slug,
            &SubmitEntry {
                id: id::id_fresh("submit-marker"),
                kind: TYPE_SUBMIT.to_string(),
                from: Utc.from_utc_datetime(&self.model.data.from.and_time(midnight)),
                to: Utc.from_utc_datetime(&self.model.data.to.and_time(midnight)),
                created_at: Utc::now(),
            },
        )?;

        self.model.submitted = true;
        Ok(())
    }

    /// Rebuild the detailed report from the store so the table reflects the
    /// latest writes.
    fn reload(&mut self) -> Result<()> {
        let registry = Registry::load(&self.home)?;
        let store = Store::new(&self.home);

        let project_id = registry
            .find_by_slug(&self.slug)
            .map(|p| p.id.clone())
            .unwrap_or_default();
        let schedules = registry.schedules_for(&project_id);

        let from = self.model.data.from;
        let to = self.model.data.to;
        let year = self.model.data.year;
        let month = self.model.data.month;

        let month_first = chrono::NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(from);
        let month_last = chrono::NaiveDate::from_ymd_opt(
            year,
            month,
            crate::timetrack::days_in_month(year, month),
        )
        .unwrap_or(to);
        let day_schedules = expand_schedules(&schedules, month_first, month_last)?;

        let logs = store.read_all_logs(&self.slug)?;
        let checkouts = store.read_all_checkouts(&self.slug)?;

        let now = Local::now();
        let data = build_detailed_report(&checkouts, &logs, &day_schedules, from, to, &now);
        self.model.reload(data);
        Ok(())
    }
}
