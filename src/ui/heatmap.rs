use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table, Widget},
};

use crate::error::Result;
use crate::mistake_db::MistakeDb;

/// One key in the mistake heat map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatRow {
    pub character: char,
    pub misses: i64,
    /// What was most often typed instead, when known.
    pub top_confusion: Option<char>,
}

/// Rows for the current run, most missed first.
pub fn session_rows(heat: &[(char, usize)]) -> Vec<HeatRow> {
    heat.iter()
        .map(|&(character, misses)| HeatRow {
            character,
            misses: misses as i64,
            top_confusion: None,
        })
        .collect()
}

/// Rows from the persisted history, at most `limit`.
pub fn history_rows(db: &MistakeDb, limit: usize) -> Result<Vec<HeatRow>> {
    db.heat_map()?
        .into_iter()
        .take(limit)
        .map(|(character, misses)| {
            let top_confusion = db
                .top_confusions(character, 1)?
                .first()
                .map(|(typed, _)| *typed);
            Ok(HeatRow {
                character,
                misses,
                top_confusion,
            })
        })
        .collect()
}

/// Fill in confusions for session rows from the history.
pub fn with_confusions(rows: Vec<HeatRow>, history: &[HeatRow]) -> Vec<HeatRow> {
    rows.into_iter()
        .map(|row| HeatRow {
            top_confusion: history
                .iter()
                .find(|h| h.character == row.character)
                .and_then(|h| h.top_confusion),
            ..row
        })
        .collect()
}

fn display_char(c: char) -> String {
    if c == ' ' {
        "SPACE".to_string()
    } else {
        c.to_string()
    }
}

/// Colour a row by how it compares to the worst key.
fn heat_color(misses: i64, max: i64) -> Color {
    if max <= 0 {
        return Color::Green;
    }
    let ratio = misses as f64 / max as f64;
    if ratio >= 0.66 {
        Color::Red
    } else if ratio >= 0.33 {
        Color::Yellow
    } else {
        Color::Green
    }
}

/// Pure presenter for a single heat map row
pub fn present_row(row: &HeatRow, max: i64) -> Row<'static> {
    let bar = "█".repeat(((row.misses * 10) / max.max(1)).max(1) as usize);
    Row::new(vec![
        Cell::from(display_char(row.character))
            .style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(row.misses.to_string()),
        Cell::from(bar).style(Style::default().fg(heat_color(row.misses, max))),
        Cell::from(row.top_confusion.map_or("-".to_string(), display_char)),
    ])
}

/// Plain-text line for non-interactive output.
pub fn format_heat_line(row: &HeatRow) -> String {
    match row.top_confusion {
        Some(typed) => format!(
            "{:>5}  {:>4}  (often typed {})",
            display_char(row.character),
            row.misses,
            display_char(typed)
        ),
        None => format!("{:>5}  {:>4}", display_char(row.character), row.misses),
    }
}

pub fn render_heat_map(rows: &[HeatRow], title: &str, area: Rect, buf: &mut Buffer) {
    let max = rows.iter().map(|r| r.misses).max().unwrap_or(0);
    let header = Row::new(vec!["Key", "Misses", "", "Typed"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let table = Table::new(
        rows.iter().map(|r| present_row(r, max)).collect_vec(),
        [
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(11),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title.to_string()));

    Widget::render(table, area, buf);
}
