//! Twin state rendering.
//!
//! Displays one row per property with its flattened values and the time of
//! the last sample.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use super::common;
use crate::app::App;
use crate::data::status::MISSING;

/// Render the current state of the selected twin.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref dt) = app.dt else {
        common::render_message(frame, app, "State", "Select a twin on the Twins page", area);
        return;
    };

    let chunks = Layout::vertical([Constraint::Length(3), Constraint::Min(3)]).split(area);
    common::render_filter(frame, app, &app.detail.search, chunks[0]);

    let title = format!("State of {}", dt);
    if app.detail.loading {
        common::render_message(frame, app, &title, "Loading...", chunks[1]);
        return;
    }

    let rows = app.detail_rows();
    if rows.is_empty() {
        common::render_message(frame, app, &title, "No properties", chunks[1]);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Key"),
        Cell::from("Value"),
        Cell::from("Timestamp"),
    ])
    .height(1)
    .style(app.theme.header);

    let muted = Style::default().fg(app.theme.muted);
    let cell = |text: &str| {
        if text == MISSING {
            Cell::from(text.to_string()).style(muted)
        } else {
            Cell::from(text.to_string())
        }
    };

    let table_rows: Vec<Row> = rows
        .iter()
        .map(|r| Row::new(vec![Cell::from(r.key.clone()), cell(&r.value), cell(&r.timestamp)]))
        .collect();

    let widths = [
        Constraint::Fill(1),
        Constraint::Fill(3),
        Constraint::Length(20),
    ];

    let selected = app.detail.selected.min(rows.len().saturating_sub(1));
    let position = format!(" [{}/{}]", selected + 1, rows.len());
    let filtered = if app.detail.search.value().is_empty() {
        String::new()
    } else {
        format!(" ({}/{})", rows.len(), app.detail.snapshot.properties.len())
    };

    let table = Table::new(table_rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(format!(" {}{}{} ", title, filtered, position))
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected));

    frame.render_stateful_widget(table, chunks[1], &mut state);
}
