//! Overlay stack for the report table.
//!
//! At most one overlay is active; it consumes all key events until it yields
//! an [`Outcome`] the parent applies. The selector overlay chains into edit
//! or remove when a cell holds more than one entry.

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};

use crate::entry::{format_minutes, parse_duration};
use crate::timetrack::CellEntry;

/// What the parent should do once an overlay finishes.
pub enum Outcome {
    Cancel,
    Edit { entry: CellEntry, minutes: i64, task: String, message: String },
    Add { day: u32, minutes: i64, task: String, message: String },
    Remove(CellEntry),
    Submit,
}

pub enum Overlay {
    Selector(SelectorState),
    Edit(EditState),
    Add(AddState),
    Remove(RemoveState),
    Submit(SubmitState),
}

impl Overlay {
    /// Feed a key event. `Some(outcome)` closes the overlay; the selector
    /// swaps itself for the chained overlay internally.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Outcome> {
        match self {
            Overlay::Selector(state) => {
                let (next, outcome) = state.handle_key(key);
                if let Some(next) = next {
                    *self = next;
                    return None;
                }
                outcome
            }
            Overlay::Edit(state) => state.handle_key(key),
            Overlay::Add(state) => state.handle_key(key),
            Overlay::Remove(state) => state.handle_key(key),
            Overlay::Submit(state) => state.handle_key(key),
        }
    }
}

/// What the selector chains into.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum SelectAction {
    Edit,
    Remove,
}

pub struct SelectorState {
    pub entries: Vec<CellEntry>,
    pub cursor: usize,
    pub title: String,
    pub action: SelectAction,
}

impl SelectorState {
    pub fn new(entries: Vec<CellEntry>, title: &str, action: SelectAction) -> Self {
        Self {
            entries,
            cursor: 0,
            title: title.to_string(),
            action,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> (Option<Overlay>, Option<Outcome>) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => (None, Some(Outcome::Cancel)),
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
                (None, None)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < self.entries.len() {
                    self.cursor += 1;
                }
                (None, None)
            }
            KeyCode::Enter => {
                let entry = self.entries[self.cursor].clone();
                let next = match self.action {
                    SelectAction::Edit => Overlay::Edit(EditState::new(entry)),
                    SelectAction::Remove => Overlay::Remove(RemoveState::new(entry)),
                };
                (Some(next), None)
            }
            _ => (None, None),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.title.clone(), String::new()];
        for (i, entry) in self.entries.iter().enumerate() {
            let marker = if i == self.cursor { "> " } else { "  " };
            let mut label = format!("{}  {}", format_minutes(entry.minutes), entry.message);
            if !entry.persisted {
                label.push_str(" (generated)");
            }
            lines.push(format!("{marker}{label}"));
        }
        lines.push(String::new());
        lines.push("up/down select  |  enter confirm  |  esc cancel".to_string());
        lines
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FormField {
    Duration,
    Task,
    Message,
    Confirm,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::Duration => FormField::Task,
            FormField::Task => FormField::Message,
            _ => FormField::Confirm,
        }
    }

    fn prev(self) -> Self {
        match self {
            FormField::Confirm => FormField::Message,
            FormField::Message => FormField::Task,
            _ => FormField::Duration,
        }
    }
}

pub struct EditState {
    pub entry: CellEntry,
    pub duration: String,
    pub task: String,
    pub message: String,
    field: FormField,
    pub error: String,
}

impl EditState {
    pub fn new(entry: CellEntry) -> Self {
        Self {
            duration: format_minutes(entry.minutes).replace(' ', ""),
            task: entry.task.clone(),
            message: entry.message.clone(),
            entry,
            field: FormField::Duration,
            error: String::new(),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<Outcome> {
        match key.code {
            KeyCode::Esc => Some(Outcome::Cancel),
            KeyCode::Tab | KeyCode::Down => {
                self.field = self.field.next();
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.field = self.field.prev();
                None
            }
            KeyCode::Enter => {
                if self.field != FormField::Confirm {
                    self.field = self.field.next();
                    return None;
                }
                match parse_duration(&self.duration) {
                    Ok(minutes) => Some(Outcome::Edit {
                        entry: self.entry.clone(),
                        minutes,
                        task: self.task.clone(),
                        message: self.message.clone(),
                    }),
                    Err(_) => {
                        self.error = "Invalid duration (e.g. 2h30m, 90m)".to_string();
                        None
                    }
                }
            }
            KeyCode::Backspace => {
                self.active_field_mut().pop();
                None
            }
            KeyCode::Char(c) => {
                self.active_field_mut().push(c);
                None
            }
            _ => None,
        }
    }

    fn active_field_mut(&mut self) -> &mut String {
        match self.field {
            FormField::Task => &mut self.task,
            FormField::Message => &mut self.message,
            _ => &mut self.duration,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        form_lines(
            "Edit Entry",
            &self.duration,
            &self.task,
            &self.message,
            self.field,
            "[Save]",
            &self.error,
        )
    }
}

pub struct AddState {
    pub day: u32,
    pub date: NaiveDate,
    pub duration: String,
    pub task: String,
    pub message: String,
    field: FormField,
    pub error: String,
}

impl AddState {
    pub fn new(day: u32, date: NaiveDate, task: &str) -> Self {
        Self {
            day,
            date,
            duration: String::new(),
            task: task.to_string(),
            message: String::new(),
            field: FormField::Duration,
            error: String::new(),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<Outcome> {
        match key.code {
            KeyCode::Esc => Some(Outcome::Cancel),
            KeyCode::Tab | KeyCode::Down => {
                self.field = self.field.next();
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.field = self.field.prev();
                None
            }
            KeyCode::Enter => {
                if self.field != FormField::Confirm {
                    self.field = self.field.next();
                    return None;
                }
                if self.duration.is_empty() {
                    self.error = "Duration is required".to_string();
                    return None;
                }
                match parse_duration(&self.duration) {
                    Ok(minutes) => Some(Outcome::Add {
                        day: self.day,
                        minutes,
                        task: self.task.clone(),
                        message: self.message.clone(),
                    }),
                    Err(_) => {
                        self.error = "Invalid duration (e.g. 2h30m, 90m)".to_string();
                        None
                    }
                }
            }
            KeyCode::Backspace => {
                self.active_field_mut().pop();
                None
            }
            KeyCode::Char(c) => {
                self.active_field_mut().push(c);
                None
            }
            _ => None,
        }
    }

    fn active_field_mut(&mut self) -> &mut String {
        match self.field {
            FormField::Task => &mut self.task,
            FormField::Message => &mut self.message,
            _ => &mut self.duration,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        form_lines(
            &format!("Add Entry - {}", self.date.format("%b %e")),
            &self.duration,
            &self.task,
            &self.message,
            self.field,
            "[Add]",
            &self.error,
        )
    }
}

fn form_lines(
    title: &str,
    duration: &str,
    task: &str,
    message: &str,
    field: FormField,
    confirm_label: &str,
    error: &str,
) -> Vec<String> {
    let mark = |f: FormField| if f == field { "> " } else { "  " };

    let mut lines = vec![title.to_string(), String::new()];
    lines.push(format!("{}Duration: {duration}", mark(FormField::Duration)));
    lines.push(format!("{}Task: {task}", mark(FormField::Task)));
    lines.push(format!("{}Message: {message}", mark(FormField::Message)));
    lines.push(String::new());
    lines.push(format!("{}{confirm_label}", mark(FormField::Confirm)));
    if !error.is_empty() {
        lines.push(String::new());
        lines.push(error.to_string());
    }
    lines.push(String::new());
    lines.push("tab/up/down navigate  |  enter confirm  |  esc cancel".to_string());
    lines
}

pub struct RemoveState {
    pub entry: CellEntry,
    /// 0 = yes, 1 = no; defaults to no.
    pub cursor: usize,
}

impl RemoveState {
    pub fn new(entry: CellEntry) -> Self {
        Self { entry, cursor: 1 }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<Outcome> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('n') => Some(Outcome::Cancel),
            KeyCode::Char('y') => Some(Outcome::Remove(self.entry.clone())),
            KeyCode::Left | KeyCode::Right | KeyCode::Tab
            | KeyCode::Char('h') | KeyCode::Char('l') => {
                self.cursor = 1 - self.cursor;
                None
            }
            KeyCode::Enter => {
                if self.cursor == 0 {
                    Some(Outcome::Remove(self.entry.clone()))
                } else {
                    Some(Outcome::Cancel)
                }
            }
            _ => None,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut label = format!("{}  {}", format_minutes(self.entry.minutes), self.entry.message);
        if !self.entry.persisted {
            label.push_str(" (generated)");
        }
        vec![
            "Remove Entry".to_string(),
            String::new(),
            format!("  {label}"),
            String::new(),
            "  Remove this entry?".to_string(),
            String::new(),
            yes_no_line(self.cursor),
            String::new(),
            "left/right select  |  enter confirm  |  esc cancel".to_string(),
        ]
    }
}

pub struct SubmitState {
    pub in_memory_count: usize,
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// 0 = yes, 1 = no; defaults to no.
    pub cursor: usize,
}

impl SubmitState {
    pub fn new(in_memory_count: usize, from: NaiveDate, to: NaiveDate) -> Self {
        Self { in_memory_count, from, to, cursor: 1 }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<Outcome> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('n') => Some(Outcome::Cancel),
            KeyCode::Char('y') => Some(Outcome::Submit),
            KeyCode::Left | KeyCode::Right | KeyCode::Tab
            | KeyCode::Char('h') | KeyCode::Char('l') => {
                self.cursor = 1 - self.cursor;
                None
            }
            KeyCode::Enter => {
                if self.cursor == 0 {
                    Some(Outcome::Submit)
                } else {
                    Some(Outcome::Cancel)
                }
            }
            _ => None,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let count_line = if self.in_memory_count > 0 {
            format!("  {} generated entries will be persisted.", self.in_memory_count)
        } else {
            "  No generated entries to persist.".to_string()
        };
        vec![
            "Submit Period".to_string(),
            String::new(),
            format!("  {} - {}", self.from.format("%b %e, %Y"), self.to.format("%b %e, %Y")),
            String::new(),
            count_line,
            String::new(),
            "  Submit?".to_string(),
            String::new(),
            yes_no_line(self.cursor),
            String::new(),
            "left/right select  |  enter confirm  |  esc cancel".to_string(),
        ]
    }
}

fn yes_no_line(cursor: usize) -> String {
    let yes = if cursor == 0 { "> [Yes]" } else { "  [Yes]" };
    let no = if cursor == 1 { "> [No]" } else { "  [No]" };
    format!("{yes}    {no}")
}
