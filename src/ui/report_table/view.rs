//! Rendering for the report table and its overlays.

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::model::ReportModel;
use super::overlay::Overlay;

/// Width of the task-name column.
const NAME_W: usize = 22;
/// Width of one day column.
const DAY_W: usize = 6;

/// Rows of chrome around the table: title, day header, footer.
const CHROME_ROWS: u16 = 4;

pub fn visible_dims(area: Rect) -> (usize, usize) {
    let rows = area.height.saturating_sub(CHROME_ROWS) as usize;
    let cols = ((area.width as usize).saturating_sub(NAME_W + 2)) / DAY_W;
    (rows, cols.max(1))
}

pub fn draw(frame: &mut Frame, model: &ReportModel, overlay: Option<&Overlay>) {
    let area = frame.size();
    let (visible_rows, visible_cols) = visible_dims(area);

    let mut lines: Vec<Line> = Vec::new();

    let title = format!(
        "{}  ({} - {})",
        chrono::NaiveDate::from_ymd_opt(model.data.year, model.data.month, 1)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_default(),
        model.data.from,
        model.data.to
    );
    lines.push(Line::styled(title, Style::default().add_modifier(Modifier::BOLD)));

    // Day header row. Unscheduled days render dimmed.
    let mut header = vec![Span::raw(format!("{:NAME_W$}", "task"))];
    for col in visible_day_columns(model, visible_cols) {
        let day = col + 1;
        let style = if model.data.scheduled_days.contains(&day) {
            Style::default()
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        header.push(Span::styled(format!("{day:>DAY_W$}"), style));
    }
    header.push(Span::raw(format!("{:>8}", "total")));
    lines.push(Line::from(header));

    let end_row = (model.row_offset + visible_rows).min(model.data.rows.len());
    for (row_idx, row) in model.data.rows[model.row_offset..end_row]
        .iter()
        .enumerate()
        .map(|(i, r)| (i + model.row_offset, r))
    {
        let mut spans = vec![Span::raw(format!(
            "{:NAME_W$.NAME_W$}",
            row.name
        ))];

        for col in visible_day_columns(model, visible_cols) {
            let day = col + 1;
            let text = match row.days.get(&day) {
                Some(cell) if cell.total_minutes > 0 => {
                    format!("{:>DAY_W$}", short_minutes(cell.total_minutes))
                }
                _ => format!("{:>DAY_W$}", "·"),
            };

            let selected = row_idx == model.cursor_row && col as usize == model.cursor_col;
            let style = if selected {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            spans.push(Span::styled(text, style));
        }

        spans.push(Span::raw(format!("{:>8}", short_minutes(row.total_minutes))));
        lines.push(Line::from(spans));
    }

    let footer = if model.footer.is_empty() {
        "arrows move  |  e edit  a add  r remove  s submit  |  q quit".to_string()
    } else {
        model.footer.clone()
    };
    lines.push(Line::styled(footer, Style::default().add_modifier(Modifier::DIM)));

    frame.render_widget(Paragraph::new(lines), area);

    if let Some(overlay) = overlay {
        draw_overlay(frame, area, overlay);
    }
}

fn visible_day_columns(model: &ReportModel, visible_cols: usize) -> std::ops::Range<u32> {
    let start = model.col_offset as u32;
    let end = (model.col_offset + visible_cols).min(model.data.days_in_month as usize) as u32;
    start..end
}

/// Compact minute rendering for a narrow cell ("7h50" fits, "7h 50m" not).
fn short_minutes(minutes: i64) -> String {
    if minutes <= 0 {
        return "0".to_string();
    }
    if minutes % 60 == 0 {
        return format!("{}h", minutes / 60);
    }
    if minutes < 60 {
        return format!("{minutes}m");
    }
    format!("{}h{:02}", minutes / 60, minutes % 60)
}

fn draw_overlay(frame: &mut Frame, area: Rect, overlay: &Overlay) {
    let lines = match overlay {
        Overlay::Selector(state) => state.lines(),
        Overlay::Edit(state) => state.lines(),
        Overlay::Add(state) => state.lines(),
        Overlay::Remove(state) => state.lines(),
        Overlay::Submit(state) => state.lines(),
    };

    let width = (lines.iter().map(String::len).max().unwrap_or(20) as u16 + 6).min(area.width);
    let height = (lines.len() as u16 + 2).min(area.height);
    let x = area.width.saturating_sub(width) / 2;
    let y = area.height.saturating_sub(height) / 2;
    let popup = Rect::new(x, y, width, height);

    let text: Vec<Line> = lines.into_iter().map(Line::from).collect();
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(text).block(Block::default().borders(Borders::ALL)),
        popup,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minute_cells_stay_narrow() {
        assert_eq!(short_minutes(0), "0");
        assert_eq!(short_minutes(30), "30m");
        assert_eq!(short_minutes(60), "1h");
        assert_eq!(short_minutes(480), "8h");
        assert_eq!(short_minutes(470), "7h50");
        assert!(short_minutes(1439).len() <= 5);
    }

    #[test]
    fn dims_leave_room_for_chrome() {
        let area = Rect::new(0, 0, 120, 30);
        let (rows, cols) = visible_dims(area);
        assert_eq!(rows, 26);
        assert!(cols >= 10);
    }
}
