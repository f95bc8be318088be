//! Table state for the interactive report.

use chrono::Datelike;

use crate::timetrack::{CellData, CellEntry, DetailedReportData};

pub struct ReportModel {
    pub data: DetailedReportData,
    /// Selected row index into `data.rows`.
    pub cursor_row: usize,
    /// Selected day as a 0-based column (day of month minus one).
    pub cursor_col: usize,
    pub row_offset: usize,
    pub col_offset: usize,
    pub footer: String,
    pub submitted: bool,
}

impl ReportModel {
    pub fn new(data: DetailedReportData) -> Self {
        // Open on the first day of the requested range.
        let cursor_col = data.from.day() as usize - 1;
        Self {
            data,
            cursor_row: 0,
            cursor_col,
            row_offset: 0,
            col_offset: cursor_col.saturating_sub(6),
            footer: String::new(),
            submitted: false,
        }
    }

    /// Replace the report data, keeping the cursor clamped in bounds.
    pub fn reload(&mut self, data: DetailedReportData) {
        self.data = data;
        self.clamp_cursor();
    }

    pub fn selected_day(&self) -> u32 {
        self.cursor_col as u32 + 1
    }

    pub fn selected_cell(&self) -> Option<&CellData> {
        let row = self.data.rows.get(self.cursor_row)?;
        row.days.get(&self.selected_day())
    }

    pub fn selected_task(&self) -> Option<&str> {
        self.data.rows.get(self.cursor_row).map(|r| r.name.as_str())
    }

    pub fn move_rows(&mut self, delta: isize) {
        let rows = self.data.rows.len();
        if rows == 0 {
            return;
        }
        let current = self.cursor_row as isize;
        self.cursor_row = (current + delta).clamp(0, rows as isize - 1) as usize;
    }

    pub fn move_cols(&mut self, delta: isize) {
        let days = self.data.days_in_month as isize;
        if days == 0 {
            return;
        }
        let current = self.cursor_col as isize;
        self.cursor_col = (current + delta).clamp(0, days - 1) as usize;
    }

    fn clamp_cursor(&mut self) {
        if !self.data.rows.is_empty() && self.cursor_row >= self.data.rows.len() {
            self.cursor_row = self.data.rows.len() - 1;
        }
        let days = self.data.days_in_month as usize;
        if days > 0 && self.cursor_col >= days {
            self.cursor_col = days - 1;
        }
    }

    /// Keep the selected cell inside the visible window.
    pub fn ensure_visible(&mut self, visible_rows: usize, visible_cols: usize) {
        if visible_rows > 0 {
            if self.cursor_row < self.row_offset {
                self.row_offset = self.cursor_row;
            } else if self.cursor_row >= self.row_offset + visible_rows {
                self.row_offset = self.cursor_row + 1 - visible_rows;
            }
        }
        if visible_cols > 0 {
            if self.cursor_col < self.col_offset {
                self.col_offset = self.cursor_col;
            } else if self.cursor_col >= self.col_offset + visible_cols {
                self.col_offset = self.cursor_col + 1 - visible_cols;
            }
        }
    }

    /// Drop one in-memory entry from the selected cell. Persisted entries
    /// are removed from disk and handled by a data reload instead.
    pub fn remove_in_memory_entry(&mut self, target: &CellEntry) {
        let day = self.selected_day();
        let Some(row) = self.data.rows.get_mut(self.cursor_row) else {
            return;
        };
        let Some(cell) = row.days.get_mut(&day) else {
            return;
        };

        if let Some(pos) = cell
            .entries
            .iter()
            .position(|e| !e.persisted && e.minutes == target.minutes && e.task == target.task)
        {
            let removed = cell.entries.remove(pos);
            cell.total_minutes -= removed.minutes;
            row.total_minutes -= removed.minutes;
            if cell.entries.is_empty() {
                row.days.remove(&day);
            }
        }
    }

    /// Every in-memory entry in the report, with its day.
    pub fn in_memory_entries(&self) -> Vec<CellEntry> {
        self.data
            .rows
            .iter()
            .flat_map(|row| row.days.values())
            .flat_map(|cell| cell.entries.iter())
            .filter(|e| !e.persisted)
            .cloned()
            .collect()
    }
}
