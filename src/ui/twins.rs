//! Twin list rendering.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use super::common;
use crate::app::App;

/// Render the list of all digital twins.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([Constraint::Length(3), Constraint::Min(3)]).split(area);
    common::render_filter(frame, app, &app.twins.search, chunks[0]);

    if app.twins.loading {
        common::render_message(frame, app, "Digital Twins", "Loading DTs...", chunks[1]);
        return;
    }

    let twins = app.visible_twins();
    if twins.is_empty() {
        let message = if app.twins.ids.is_empty() {
            "No digital twins found"
        } else {
            "No twins match the search"
        };
        common::render_message(frame, app, "Digital Twins", message, chunks[1]);
        return;
    }

    let header = Row::new(vec![Cell::from("#"), Cell::from("Twin")])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = twins
        .iter()
        .enumerate()
        .map(|(i, id)| Row::new(vec![Cell::from(format!("{}", i + 1)), Cell::from(id.as_str())]))
        .collect();

    let selected = app.twins.selected.min(twins.len().saturating_sub(1));
    let title = format!(
        " Digital Twins ({}/{}) [{}/{}] ",
        twins.len(),
        app.twins.ids.len(),
        selected + 1,
        twins.len()
    );

    let table = Table::new(rows, [Constraint::Length(5), Constraint::Fill(1)])
        .header(header)
        .block(
            Block::default()
                .title(title)
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
