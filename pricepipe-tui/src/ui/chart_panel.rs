//! Panel 2, Chart: close price by date.

use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Chart, Dataset, GraphType, Paragraph};
use ratatui::Frame;

use crate::app::{AppState, FetchedData};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    match app.loaded() {
        Some(data) if !data.table.close_series().is_empty() => render_close_chart(f, area, data),
        _ => render_empty(f, area),
    }
}

fn render_empty(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            "No price data loaded yet.",
            theme::muted(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Go to the form (press 1), enter a ticker and press Enter.",
            theme::muted(),
        )),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

/// Line chart of the close column against trading date.
pub fn render_close_chart(f: &mut Frame, area: Rect, data: &FetchedData) {
    let series = data.table.close_series();
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return;
    };

    let min_y = series.iter().map(|(_, c)| *c).fold(f64::INFINITY, f64::min);
    let max_y = series.iter().map(|(_, c)| *c).fold(f64::NEG_INFINITY, f64::max);

    let padding = ((max_y - min_y).abs() * 0.05).max(0.01);
    let y_min = min_y - padding;
    let y_max = max_y + padding;
    let x_max = series.len().saturating_sub(1) as f64;

    let points: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .map(|(i, (_, close))| (i as f64, *close))
        .collect();

    let color = match data.change() {
        Some(change) if change < 0.0 => theme::NEGATIVE,
        _ => theme::ACCENT,
    };
    let label = format!("{} close", data.request.ticker);
    let dataset = Dataset::default()
        .name(label)
        .marker(symbols::Marker::Braille)
        .style(Style::default().fg(color))
        .graph_type(GraphType::Line)
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .x_axis(
            Axis::default()
                .title(Span::styled("Date", theme::muted()))
                .style(theme::muted())
                .bounds([0.0, x_max.max(1.0)])
                .labels(vec![
                    Span::styled(first.0.format("%Y-%m-%d").to_string(), theme::muted()),
                    Span::styled(last.0.format("%Y-%m-%d").to_string(), theme::muted()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled("Close", theme::muted()))
                .style(theme::muted())
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::styled(format!("{:.2}", y_min), theme::muted()),
                    Span::styled(format!("{:.2}", y_max), theme::muted()),
                ]),
        );

    f.render_widget(chart, area);
}
