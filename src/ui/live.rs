//! Live property rendering: property list and a line chart of recent samples.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, ListState},
    Frame,
};

use super::common;
use crate::app::App;
use crate::data::chart::{ChartData, EMPTY_MESSAGE};
use crate::data::status::format_time_of_day;

/// Render the live page of the selected twin.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref dt) = app.dt else {
        common::render_message(frame, app, "Live", "Select a twin on the Twins page", area);
        return;
    };

    let columns =
        Layout::horizontal([Constraint::Percentage(30), Constraint::Percentage(70)]).split(area);

    render_properties(frame, app, dt, columns[0]);
    render_chart(frame, app, columns[1]);
}

fn render_properties(frame: &mut Frame, app: &App, dt: &str, area: Rect) {
    let chunks = Layout::vertical([Constraint::Length(3), Constraint::Min(3)]).split(area);
    common::render_filter(frame, app, &app.live.search, chunks[0]);

    let visible = app.visible_properties();
    let title = format!("Properties of {}", dt);
    if visible.is_empty() {
        common::render_message(frame, app, &title, "No properties", chunks[1]);
        return;
    }

    let items: Vec<ListItem> = visible.iter().map(|p| ListItem::new(p.as_str())).collect();
    let selected = app
        .live
        .selected
        .as_ref()
        .and_then(|sel| visible.iter().position(|p| *p == sel));

    let list = List::new(items)
        .block(
            Block::default()
                .title(format!(" {} ", title))
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = ListState::default();
    state.select(selected);

    frame.render_stateful_widget(list, chunks[1], &mut state);
}

fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref property) = app.live.selected else {
        common::render_message(frame, app, "Chart", "Select a property", area);
        return;
    };

    let title = format!("{} (last {} min) [+/-]", property, app.live.minutes);
    let now = chrono::Utc::now().timestamp_millis();

    let Some(data) = app.chart_data(now) else {
        common::render_message(frame, app, &title, EMPTY_MESSAGE, area);
        return;
    };

    let series: Vec<Vec<(f64, f64)>> = data.keys.iter().map(|k| data.series(k)).collect();
    let datasets: Vec<Dataset> = data
        .keys
        .iter()
        .zip(&series)
        .enumerate()
        .map(|(i, (key, points))| {
            Dataset::default()
                .name(key.clone())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(app.theme.series_color(i)))
                .data(points)
        })
        .collect();

    let (x_min, x_max) = x_bounds(&data);
    let (y_min, y_max) = y_bounds(&data);
    let x_mid = (x_min + x_max) / 2.0;
    let y_mid = (y_min + y_max) / 2.0;

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(Span::styled(
                    format!(" {} ", title),
                    Style::default().add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .x_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.muted))
                .bounds([x_min, x_max])
                .labels(vec![
                    Span::from(format_time_of_day(x_min)),
                    Span::from(format_time_of_day(x_mid)),
                    Span::from(format_time_of_day(x_max)),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.muted))
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::from(format!("{:.1}", y_min)),
                    Span::from(format!("{:.1}", y_mid)),
                    Span::from(format!("{:.1}", y_max)),
                ]),
        );

    frame.render_widget(chart, area);
}

/// Time axis bounds, widened to one second when all samples share a timestamp.
fn x_bounds(data: &ChartData) -> (f64, f64) {
    match data.time_bounds() {
        Some((lo, hi)) if hi > lo => (lo, hi),
        Some((lo, _)) => (lo - 500.0, lo + 500.0),
        None => (0.0, 1.0),
    }
}

/// Value axis bounds with a margin so lines do not sit on the border.
fn y_bounds(data: &ChartData) -> (f64, f64) {
    match data.value_bounds() {
        Some((lo, hi)) if hi > lo => {
            let pad = (hi - lo) / 10.0;
            (lo - pad, hi + pad)
        }
        Some((v, _)) => (v - 1.0, v + 1.0),
        None => (0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FieldValue, PropertyRecord};

    fn sample(ts: f64, bpm: f64) -> PropertyRecord {
        PropertyRecord::new(
            "heart-rate",
            [
                ("timestamp", FieldValue::number(ts)),
                ("bpm", FieldValue::number(bpm)),
            ]
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn single_sample_bounds_are_widened() {
        let history = vec![sample(1000.0, 70.0)];
        let data = ChartData::derive(&history, "heart-rate", 5, 1000).unwrap();
        assert_eq!(x_bounds(&data), (500.0, 1500.0));
        assert_eq!(y_bounds(&data), (69.0, 71.0));
    }

    #[test]
    fn value_bounds_are_padded() {
        let history = vec![sample(1000.0, 60.0), sample(2000.0, 80.0)];
        let data = ChartData::derive(&history, "heart-rate", 5, 2000).unwrap();
        assert_eq!(x_bounds(&data), (1000.0, 2000.0));
        assert_eq!(y_bounds(&data), (58.0, 82.0));
    }
}
