//! Timesheet PDF rendering.
//!
//! Renders [`ExportData`](crate::timetrack::ExportData) into a paginated A4
//! document: a title block, one section per day with task groups and their
//! entries, and a grand total. Object IDs, pages, and content streams are
//! managed by hand on top of `pdf-writer`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str};

use crate::entry::format_minutes;
use crate::error::{Error, Result};
use crate::timetrack::{ExportData, ExportDay};

const PAGE_W: f32 = 595.0;
const PAGE_H: f32 = 842.0;
const MARGIN: f32 = 50.0;
const ROW_H: f32 = 16.0;

const FONT_SIZE: f32 = 10.0;
const HEADER_FONT_SIZE: f32 = 11.0;
const TITLE_FONT_SIZE: f32 = 16.0;

struct TimesheetPdf {
    pdf: Pdf,
    catalog_id: Ref,
    pages_id: Ref,
    font_id: Ref,
    next_id: i32,
    page_refs: Vec<Ref>,
    current_content_id: Option<Ref>,
}

impl TimesheetPdf {
    fn new() -> Self {
        let mut pdf = Pdf::new();

        let catalog_id = Ref::new(1);
        let pages_id = Ref::new(2);
        let font_id = Ref::new(3);

        pdf.type1_font(font_id).base_font(Name(b"Helvetica"));

        Self {
            pdf,
            catalog_id,
            pages_id,
            font_id,
            next_id: 4,
            page_refs: Vec::new(),
            current_content_id: None,
        }
    }

    fn fresh_ref(&mut self) -> Ref {
        let id = self.next_id;
        self.next_id += 1;
        Ref::new(id)
    }

    fn new_page(&mut self) -> Content {
        let page_id = self.fresh_ref();
        let content_id = self.fresh_ref();
        self.page_refs.push(page_id);

        let mut page = self.pdf.page(page_id);
        page.parent(self.pages_id)
            .media_box(Rect::new(0.0, 0.0, PAGE_W, PAGE_H))
            .contents(content_id);
        page.resources().fonts().pair(Name(b"F1"), self.font_id);
        drop(page);

        self.current_content_id = Some(content_id);
        Content::new()
    }

    fn finalize_page(&mut self, content: Content) {
        if let Some(id) = self.current_content_id.take() {
            self.pdf.stream(id, &content.finish());
        }
    }

    fn text(&self, content: &mut Content, x: f32, y: f32, size: f32, text: &str) {
        content.begin_text();
        content.set_font(Name(b"F1"), size);
        content.set_text_matrix([1.0, 0.0, 0.0, 1.0, x, y]);
        content.show(Str(text.as_bytes()));
        content.end_text();
    }

    fn rule(&self, content: &mut Content, y: f32) {
        content.save_state();
        content.set_stroke_rgb(0.65, 0.65, 0.65);
        content.move_to(MARGIN, y);
        content.line_to(PAGE_W - MARGIN, y);
        content.stroke();
        content.restore_state();
    }

    fn finish(mut self, path: &Path) -> Result<()> {
        let page_count = self.page_refs.len() as i32;
        let kids = self.page_refs.clone();
        self.pdf.pages(self.pages_id).count(page_count).kids(kids);
        self.pdf.catalog(self.catalog_id).pages(self.pages_id);

        let bytes = self.pdf.finish();
        let mut file = File::create(path)
            .map_err(|e| Error::OperationFailed(format!("cannot write {}: {e}", path.display())))?;
        file.write_all(&bytes)?;
        Ok(())
    }
}

/// Render the export data as a paginated timesheet PDF at `path`.
pub fn render_timesheet(data: &ExportData, path: &Path) -> Result<()> {
    let mut doc = TimesheetPdf::new();
    let mut content = doc.new_page();
    let mut y = PAGE_H - MARGIN;

    // Helvetica is WinAnsi; stick to ASCII in the rendered strings.
    let title = format!("{} - {}", data.project_name, month_title(data.year, data.month));
    doc.text(&mut content, MARGIN, y, TITLE_FONT_SIZE, &title);
    y -= ROW_H * 2.0;

    for day in &data.days {
        // Keep a day header and at least two rows together on one page.
        if y < MARGIN + ROW_H * 4.0 {
            doc.finalize_page(content);
            content = doc.new_page();
            y = PAGE_H - MARGIN;
        }

        doc.rule(&mut content, y + 4.0);
        doc.text(
            &mut content,
            MARGIN,
            y - ROW_H + 4.0,
            HEADER_FONT_SIZE,
            &format!(
                "{}    {}",
                day_title(day),
                format_minutes(day.total_minutes)
            ),
        );
        y -= ROW_H * 1.5;

        for group in &day.groups {
            if y < MARGIN + ROW_H * 2.0 {
                doc.finalize_page(content);
                content = doc.new_page();
                y = PAGE_H - MARGIN;
            }
            doc.text(
                &mut content,
                MARGIN + 10.0,
                y,
                FONT_SIZE,
                &format!("{}  ({})", group.task, format_minutes(group.total_minutes)),
            );
            y -= ROW_H;

            for entry in &group.entries {
                if y < MARGIN + ROW_H {
                    doc.finalize_page(content);
                    content = doc.new_page();
                    y = PAGE_H - MARGIN;
                }
                doc.text(
                    &mut content,
                    MARGIN + 24.0,
                    y,
                    FONT_SIZE,
                    &format!(
                        "{}  {}  {}",
                        entry.start.format("%H:%M"),
                        format_minutes(entry.minutes),
                        entry.message
                    ),
                );
                y -= ROW_H;
            }
        }

        y -= ROW_H / 2.0;
    }

    if y < MARGIN + ROW_H * 2.0 {
        doc.finalize_page(content);
        content = doc.new_page();
        y = PAGE_H - MARGIN;
    }
    doc.rule(&mut content, y + 4.0);
    doc.text(
        &mut content,
        MARGIN,
        y - ROW_H + 4.0,
        HEADER_FONT_SIZE,
        &format!("Total    {}", format_minutes(data.total_minutes)),
    );

    doc.finalize_page(content);
    doc.finish(path)
}

fn month_title(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_else(|| format!("{year}-{month:02}"))
}

fn day_title(day: &ExportDay) -> String {
    day.date.format("%a %b %e").to_string()
}
