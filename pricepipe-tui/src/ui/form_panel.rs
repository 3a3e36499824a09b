//! Panel 1, Form: ticker input, period selector, results.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};
use ratatui::Frame;

use pricepipe_core::data::preview_rows;
use pricepipe_core::Period;

use crate::app::{AppState, FetchState, FetchedData, FormField, PREVIEW_ROWS};
use crate::theme;
use crate::ui::chart_panel;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // subtitle
            Constraint::Length(3), // ticker
            Constraint::Length(3), // period
            Constraint::Length(1), // hints
            Constraint::Length(1), // banner
            Constraint::Length(1), // stats
            Constraint::Min(0),    // chart + preview
        ])
        .split(area);

    f.render_widget(
        Paragraph::new(Span::styled(
            "Fetch, normalize and save daily price history",
            theme::muted(),
        )),
        chunks[0],
    );
    render_ticker(f, chunks[1], app);
    render_period(f, chunks[2], app);
    f.render_widget(
        Paragraph::new(Span::styled(
            "[Enter] fetch  [Esc] period  [h/l] change period  [s] save CSV  [e] errors",
            theme::muted(),
        )),
        chunks[3],
    );
    f.render_widget(Paragraph::new(banner(app)), chunks[4]);

    if let Some(data) = app.loaded() {
        f.render_widget(Paragraph::new(stats(data, app)), chunks[5]);
        render_results(f, chunks[6], data);
    }
}

fn render_ticker(f: &mut Frame, area: Rect, app: &AppState) {
    let focused = app.form.focus == FormField::Ticker;
    let mut spans = vec![Span::styled(app.form.ticker_input.as_str(), theme::text())];
    if focused {
        spans.push(Span::styled("_", theme::accent()));
    }
    if let Some(err) = &app.form.validation_error {
        spans.push(Span::styled(format!("  {err}"), theme::warning()));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::field(focused))
        .title(" Ticker symbol ");
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_period(f: &mut Frame, area: Rect, app: &AppState) {
    let focused = app.form.focus == FormField::Period;
    let mut spans: Vec<Span> = Vec::new();
    for period in Period::ALL {
        let style = if period == app.form.period {
            theme::accent_bold()
        } else {
            theme::muted()
        };
        let token = if period == app.form.period {
            format!("[{}]", period.as_str())
        } else {
            format!(" {} ", period.as_str())
        };
        spans.push(Span::styled(token, style));
    }
    spans.push(Span::styled(format!("  {}", app.form.period.label()), theme::text()));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::field(focused))
        .title(" Period ");
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn banner(app: &AppState) -> Line<'static> {
    match &app.fetch {
        FetchState::Idle => Line::from(Span::styled(
            "Enter a ticker and press Enter to fetch.",
            theme::muted(),
        )),
        FetchState::InFlight(request) => Line::from(Span::styled(
            format!("Fetching data for {request}..."),
            theme::warning(),
        )),
        FetchState::Loaded(data) => Line::from(Span::styled(
            format!(
                "Successfully loaded {} days of data for {}",
                data.rows(),
                data.request.ticker
            ),
            theme::positive(),
        )),
        FetchState::NoData(request) => Line::from(Span::styled(
            format!("No data found for ticker: {}", request.ticker),
            theme::warning(),
        )),
        FetchState::Failed { request, message } => Line::from(Span::styled(
            format!("Error fetching {request}: {message}"),
            theme::negative(),
        )),
    }
}

fn stats(data: &FetchedData, app: &AppState) -> Line<'static> {
    let mut spans = vec![Span::styled(format!("{} rows", data.rows()), theme::text())];
    if let Some(close) = data.latest_close() {
        spans.push(Span::styled("  |  Latest close: ", theme::muted()));
        spans.push(Span::styled(format!("${close:.2}"), theme::accent_bold()));
    }
    if let Some(change) = data.change() {
        spans.push(Span::styled("  |  Change: ", theme::muted()));
        spans.push(Span::styled(format!("{change:+.2}"), theme::change_color(change)));
    }
    spans.push(Span::styled(
        format!("  |  fetched {}", data.fetched_at.format("%H:%M:%S")),
        theme::muted(),
    ));
    if let Some(path) = &app.last_saved {
        spans.push(Span::styled(
            format!("  |  saved {}", path.display()),
            theme::positive(),
        ));
    }
    Line::from(spans)
}

fn render_results(f: &mut Frame, area: Rect, data: &FetchedData) {
    let preview_height = (PREVIEW_ROWS as u16) + 3;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(preview_height)])
        .split(area);

    chart_panel::render_close_chart(f, chunks[0], data);
    render_preview(f, chunks[1], data);
}

fn render_preview(f: &mut Frame, area: Rect, data: &FetchedData) {
    let columns = data.table.column_names();
    let rows = preview_rows(&data.table, PREVIEW_ROWS).unwrap_or_default();

    let header = Row::new(columns.clone()).style(theme::accent_bold());
    let body: Vec<Row> = rows
        .into_iter()
        .map(|cells| Row::new(cells.into_iter().map(|c| display_cell(&c))).style(theme::text()))
        .collect();
    let widths = vec![Constraint::Ratio(1, columns.len().max(1) as u32); columns.len()];

    let table = Table::new(body, widths).header(header).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(theme::muted())
            .title(format!(" First {PREVIEW_ROWS} rows ")),
    );
    f.render_widget(table, area);
}

/// Shorten float cells to two decimals for the preview.
fn display_cell(cell: &str) -> String {
    match cell.parse::<f64>() {
        Ok(v) if cell.contains('.') => format!("{v:.2}"),
        _ => cell.to_string(),
    }
}
