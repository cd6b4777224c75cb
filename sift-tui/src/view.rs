use crate::form::{FormState, Focus};
use crate::input::LineInput;
use crate::styles;
use crate::table::ResultTable;
use anyhow::Result;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
};
use sift_common::NOT_FOUND;
use std::io::Stdout;
use textwrap::wrap;

const MAX_ROW_LINES: usize = 6;

pub struct ViewSnap<'a> {
    pub form: &'a FormState,
    pub spinner: &'static str,
    pub model: &'a str,
}

pub fn draw(term: &mut Terminal<CrosstermBackend<Stdout>>, snap: &ViewSnap<'_>) -> Result<()> {
    let form = snap.form;
    term.draw(|frame| {
        let area = frame.area();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(area);

        let header = Paragraph::new(Line::from(vec![
            Span::styled(" sift ", styles::title()),
            Span::styled(" Strategy: ", styles::label()),
            Span::styled(form.strategy.label(), styles::value()),
            Span::styled("  (F2 toggle, Tab switch field, Enter scrape, Ctrl-Q quit)", styles::dim()),
        ]));
        frame.render_widget(header, layout[0]);

        frame.render_widget(input_box(&form.url, " URL ", form.focus == Focus::Url), layout[1]);
        frame.render_widget(
            input_box(&form.fields, " Fields (comma separated) ", form.focus == Focus::Fields),
            layout[2],
        );

        render_results(frame, layout[3], form);

        let status_line = Line::from(vec![
            Span::raw(" "),
            Span::styled(snap.spinner, styles::busy()),
            Span::raw(" "),
            if form.busy {
                Span::styled("Scraping…", styles::busy())
            } else {
                Span::styled("Idle", styles::idle())
            },
            Span::styled(format!(" • model: {}", snap.model), styles::dim()),
            match &form.notice {
                Some(n) => Span::styled(format!(" • {n}"), styles::error()),
                None => Span::raw(""),
            },
        ]);
        let status = Paragraph::new(status_line)
            .block(Block::default().borders(Borders::ALL).title(" Status "));
        frame.render_widget(status, layout[4]);

        if let Some(msg) = &form.alert {
            let popup = centered(area, 50, 7);
            let body = Paragraph::new(Text::from(vec![
                Line::from(Span::styled(msg.clone(), styles::error())),
                Line::from(""),
                Line::from(Span::styled("Press Enter to dismiss", styles::dim())),
            ]))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(styles::error())
                    .title(" Error "),
            );
            frame.render_widget(Clear, popup);
            frame.render_widget(body, popup);
        } else {
            let (input, rect) = match form.focus {
                Focus::Url => (&form.url, layout[1]),
                Focus::Fields => (&form.fields, layout[2]),
            };
            frame.set_cursor_position(Position {
                x: rect.x + 1 + visual_caret_col(input.text(), input.cursor()),
                y: rect.y + 1,
            });
        }
    })?;

    Ok(())
}

fn input_box<'a>(input: &'a LineInput, title: &'a str, focused: bool) -> Paragraph<'a> {
    let mut block = Block::default().borders(Borders::ALL).title(title);
    if focused {
        block = block.border_style(styles::focused_border());
    }
    Paragraph::new(input.text()).block(block)
}

fn render_results(frame: &mut ratatui::Frame<'_>, area: Rect, form: &FormState) {
    let block = Block::default().borders(Borders::ALL);

    let table = match &form.table {
        None => {
            let hint = Paragraph::new("Enter a URL and the fields to extract, then press Enter.")
                .style(styles::dim())
                .block(block.title(" Results "));
            frame.render_widget(hint, area);
            return;
        }
        Some(t) if t.is_empty() => {
            let empty = Paragraph::new("No records found.")
                .style(styles::dim())
                .block(block.title(" Results (0) "));
            frame.render_widget(empty, area);
            return;
        }
        Some(t) => t,
    };

    let block = block.title(format!(" Results ({}) ", table.rows.len()));
    let inner_width = area.width.saturating_sub(2) as usize;
    let col_width = column_width(inner_width, table.columns.len());
    let widths = vec![Constraint::Length(col_width as u16); table.columns.len()];

    let header = Row::new(
        table
            .columns
            .iter()
            .map(|c| Cell::from(c.clone()).style(styles::column_header())),
    );
    let rows = build_rows(table, col_width, form.scroll);

    let widget = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(block);
    frame.render_widget(widget, area);
}

fn build_rows(table: &ResultTable, col_width: usize, scroll: usize) -> Vec<Row<'static>> {
    table
        .rows
        .iter()
        .skip(scroll)
        .map(|cells| {
            let mut height = 1;
            let cells: Vec<Cell> = cells
                .iter()
                .map(|text| {
                    let lines: Vec<Line> = wrap(text, col_width.max(1))
                        .into_iter()
                        .take(MAX_ROW_LINES)
                        .map(|seg| Line::from(seg.into_owned()))
                        .collect();
                    height = height.max(lines.len());
                    let style = if text == NOT_FOUND {
                        styles::sentinel()
                    } else {
                        styles::value()
                    };
                    Cell::from(Text::from(lines)).style(style)
                })
                .collect();
            Row::new(cells).height(height as u16)
        })
        .collect()
}

fn column_width(inner_width: usize, columns: usize) -> usize {
    if columns == 0 {
        return inner_width;
    }
    let spacing = columns.saturating_sub(1);
    (inner_width.saturating_sub(spacing) / columns).max(1)
}

fn centered(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x) / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn visual_caret_col(input: &str, cursor: usize) -> u16 {
    use unicode_width::UnicodeWidthStr;
    UnicodeWidthStr::width(&input[..cursor]) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_share_width_after_spacing() {
        assert_eq!(column_width(31, 3), 9);
        assert_eq!(column_width(2, 5), 1);
    }

    #[test]
    fn scrolled_rows_are_skipped() {
        let table = ResultTable {
            columns: vec!["desc".into()],
            rows: vec![vec!["one two three four five".into()], vec!["x".into()]],
        };
        let rows = build_rows(&table, 9, 0);
        assert_eq!(rows.len(), 2);
        assert_eq!(build_rows(&table, 9, 1).len(), 1);
    }

    #[test]
    fn caret_counts_display_width() {
        assert_eq!(visual_caret_col("日本x", "日本".len()), 4);
    }

    #[test]
    fn popup_is_centered_and_clamped() {
        let r = centered(Rect::new(0, 0, 100, 4), 50, 7);
        assert_eq!(r, Rect::new(25, 0, 50, 4));
    }
}
