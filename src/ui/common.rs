//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, search input,
//! and help overlay.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::input::FilterInput;

/// Render the header bar with the data source and selected twin.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let twin = match app.dt {
        Some(ref dt) => Span::styled(dt.clone(), Style::default().add_modifier(Modifier::BOLD)),
        None => Span::styled("no twin selected", Style::default().fg(app.theme.muted)),
    };

    let mut spans = vec![
        Span::styled(" TWINWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::raw(app.source_description()),
        Span::raw(" │ "),
        twin,
    ];

    if !app.twins.loading {
        spans.push(Span::raw(format!(" │ {} twins", app.twins.ids.len())));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the tab bar showing available views.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let views = [View::Twins, View::Detail, View::Live, View::Query];
    let titles: Vec<Line> = views
        .iter()
        .enumerate()
        .map(|(i, v)| Line::from(format!(" {}:{} ", i + 1, v.label())))
        .collect();

    let selected = views.iter().position(|v| *v == app.current_view).unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows time since last update and context-sensitive controls. Temporary
/// status messages and errors take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    if let Some(ref err) = app.load_error {
        let paragraph = Paragraph::new(format!(" Error: {} | r:retry q:quit", err))
            .style(Style::default().fg(app.theme.error));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = if app.is_editing() {
        match app.current_view {
            View::Query => "Type to edit | ↑↓:field Del:remove row Tab:switch",
            _ => "Type to search | Enter:apply Esc:done Ctrl-C:clear",
        }
    } else {
        match app.current_view {
            View::Twins => "/:search Enter:state l:live Tab:switch ?:help q:quit",
            View::Detail => "/:search Enter:chart e:export Esc:back ?:help q:quit",
            View::Live => "/:search ↑↓:property +/-:window Esc:back ?:help q:quit",
            View::Query => "↑↓:field Space:toggle ←→:cycle e:export ?:help q:quit",
        }
    };

    let updated = match app.last_update {
        Some(t) => format!("Updated {:.1}s ago", t.elapsed().as_secs_f64()),
        None => "Waiting for data".to_string(),
    };

    let feed = app
        .feed_error()
        .map(|e| format!(" | Stream: {}", e))
        .unwrap_or_default();

    let paragraph = Paragraph::new(format!(" {}{} | {}", updated, feed, controls))
        .style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Render a bordered one-line search input.
pub fn render_filter(frame: &mut Frame, app: &App, input: &FilterInput, area: Rect) {
    let border = if input.is_active() {
        app.theme.highlight
    } else {
        app.theme.border
    };

    let content = if input.is_active() {
        Line::from(vec![Span::raw(input.value().to_string()), Span::raw("_")])
    } else if input.value().is_empty() {
        Line::from(Span::styled(
            input.placeholder(),
            Style::default().fg(app.theme.muted),
        ))
    } else {
        Line::from(input.value().to_string())
    };

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .title(" / ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(border)),
    );
    frame.render_widget(paragraph, area);
}

/// Render a centered, dimmed message inside a bordered block.
pub fn render_message(frame: &mut Frame, app: &App, title: &str, message: &str, area: Rect) {
    let paragraph = Paragraph::new(message.to_string())
        .alignment(Alignment::Center)
        .style(Style::default().fg(app.theme.muted))
        .block(
            Block::default()
                .title(format!(" {} ", title))
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        );
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  Tab/S-Tab   Switch views"),
        Line::from("  1-4         Jump to view"),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Enter       Open selection"),
        Line::from("  Esc         Go back"),
        Line::from(""),
        section(" Twins, State & Live"),
        Line::from("  /         Search (regex)"),
        Line::from("  c         Clear search"),
        Line::from("  l         Live chart (Twins)"),
        Line::from("  +/-       Chart window (Live)"),
        Line::from("  0         Reset window (Live)"),
        Line::from(""),
        section(" Query"),
        Line::from("  Space     Toggle / activate"),
        Line::from("  ←/→       Cycle choice"),
        Line::from("  Del       Remove filter row"),
        Line::from(""),
        section(" General"),
        Line::from("  r         Reload data"),
        Line::from("  e         Export to JSON"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_area = super::centered(
        area,
        42u16.min(area.width.saturating_sub(4)),
        31u16.min(area.height.saturating_sub(2)),
    );

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
