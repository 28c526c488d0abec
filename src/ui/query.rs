//! Query builder rendering.
//!
//! The form is drawn as one line per focusable field, with section labels in
//! between. The generated query is shown as a modal overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, FormField};
use crate::data::query::{AggregateOperation, QueryMode};

/// Render the query builder form.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let form = &app.query.form;
    let focus = app.query_focus();
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(app.theme.muted);

    let mut lines: Vec<Line> = Vec::new();
    let mut focus_line = 0;

    for field in app.query_fields() {
        // Section labels precede the first field of each group.
        match field {
            FormField::Twin(0) => lines.push(Line::from(Span::styled(" Twins", bold))),
            FormField::FilterName(0) => lines.push(Line::from(Span::styled(" Filters", bold))),
            FormField::AddFilter if form.filters.is_empty() => {
                lines.push(Line::from(Span::styled(" Filters", bold)));
            }
            _ => {}
        }

        let text = match field {
            FormField::Mode => {
                let choice = |mode: QueryMode| {
                    if form.mode == mode {
                        format!("({}) ", mode.label())
                    } else {
                        format!(" {}  ", mode.label())
                    }
                };
                format!(
                    " Mode:       {}{}",
                    choice(QueryMode::Aggregate),
                    choice(QueryMode::Search)
                )
            }
            FormField::Operation => {
                let ops: Vec<String> = AggregateOperation::ALL
                    .iter()
                    .map(|op| {
                        if *op == form.operation {
                            format!("[{}]", op.label())
                        } else {
                            format!(" {} ", op.label())
                        }
                    })
                    .collect();
                format!(" Operation:  {}", ops.join(" "))
            }
            FormField::Property => format!(" Property:   {}{}", form.property, cursor(field, focus)),
            FormField::Twin(i) => {
                let dt = app.twins.ids.get(i).map(String::as_str).unwrap_or_default();
                let mark = if form.is_selected(dt) { "x" } else { " " };
                format!("   [{}] {}", mark, dt)
            }
            FormField::FilterName(i) => format!(
                "   #{} property: {}{}",
                i + 1,
                form.filters[i].property_name,
                cursor(field, focus)
            ),
            FormField::FilterOp(i) => format!("      op:       {}", form.filters[i].op.symbol()),
            FormField::FilterValue(i) => format!(
                "      value:    {}{}",
                form.filters[i].value,
                cursor(field, focus)
            ),
            FormField::AddFilter => "   [+ Add filter]".to_string(),
            FormField::Generate => " [ Generate query ]".to_string(),
        };

        if field == focus {
            focus_line = lines.len();
            lines.push(Line::from(Span::styled(text, app.theme.focused)));
        } else {
            lines.push(Line::from(text));
        }

        // Twin checkboxes are not focusable while the list loads or when empty.
        if field == FormField::Property && form.mode == QueryMode::Aggregate {
            let placeholder = if app.twins.loading {
                Some("   Loading DTs...")
            } else if app.twins.ids.is_empty() {
                Some("   No digital twins found")
            } else {
                None
            };
            if let Some(text) = placeholder {
                lines.push(Line::from(Span::styled(" Twins", bold)));
                lines.push(Line::from(Span::styled(text, muted)));
            }
        }
    }

    // Keep the focused line in view.
    let visible = area.height.saturating_sub(2) as usize;
    let scroll = (focus_line + 1).saturating_sub(visible) as u16;

    let title = format!(" Query Builder ({}) ", form.mode.label());
    let paragraph = Paragraph::new(lines).scroll((scroll, 0)).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );

    frame.render_widget(paragraph, area);
}

fn cursor(field: FormField, focus: FormField) -> &'static str {
    if field == focus {
        "_"
    } else {
        ""
    }
}

/// Render the last generated query as a modal overlay.
pub fn render_generated(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref json) = app.query.generated else {
        return;
    };

    let mut lines: Vec<Line> = json.lines().map(|l| Line::from(l.to_string())).collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "e:export  any other key to close",
        Style::default().add_modifier(Modifier::DIM),
    )));

    let title = match app.query.form.mode {
        QueryMode::Aggregate => " Aggregate query ",
        QueryMode::Search => " Search query ",
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let width = 60u16.min(area.width.saturating_sub(4));
    let overlay = super::centered(area, width, height);

    frame.render_widget(Clear, overlay);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        overlay,
    );
}
