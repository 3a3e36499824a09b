//! Panel 3, Help: keyboard shortcuts.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use pricepipe_core::Period;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let mut lines: Vec<Line> = Vec::new();

    section(&mut lines, "Global Navigation");
    key(&mut lines, "1-3", "Switch to panel by number (outside the ticker field)");
    key(&mut lines, "Tab / Shift+Tab", "Cycle panels forward / back");
    key(&mut lines, "e", "Open error history overlay");
    key(&mut lines, "s / Ctrl+S", "Save the loaded table as CSV");
    key(&mut lines, "q / Ctrl+C", "Quit");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 1: Form");
    key(&mut lines, "type", "Enter a ticker symbol (2-15 letters, '-' or '.')");
    key(&mut lines, "Esc / Down", "Leave the ticker field for the period selector");
    key(&mut lines, "h / l", "Previous / next period");
    key(&mut lines, "k / Up / i", "Back to the ticker field");
    key(&mut lines, "Enter", "Fetch and normalize the selected ticker");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 2: Chart");
    key(&mut lines, "", "Close price by date for the loaded ticker");
    lines.push(Line::from(""));

    section(&mut lines, "Periods");
    let tokens: Vec<String> = Period::ALL
        .iter()
        .map(|p| format!("{} ({})", p.as_str(), p.label()))
        .collect();
    for chunk in tokens.chunks(4) {
        key(&mut lines, "", &chunk.join(", "));
    }
    lines.push(Line::from(""));

    section(&mut lines, "Output");
    key(
        &mut lines,
        "directory",
        &app.layout.output_dir().display().to_string(),
    );
    key(&mut lines, "filename", "<TICKER>_<period>_<YYYYMMDD_HHMMSS>.csv");

    f.render_widget(Paragraph::new(lines), area);
}

fn section<'a>(lines: &mut Vec<Line<'a>>, title: &str) {
    lines.push(Line::from(Span::styled(title.to_string(), theme::accent_bold())));
}

fn key<'a>(lines: &mut Vec<Line<'a>>, keys: &str, desc: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {:>20}  ", keys), theme::accent()),
        Span::styled(desc.to_string(), theme::muted()),
    ]));
}
