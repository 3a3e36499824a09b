//! Keyboard input dispatch: overlays, then global keys, then panel keys.
//!
//! While the ticker field has focus, printable keys are typed into it, so
//! the single-letter global shortcuts only apply outside the field.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use pricepipe_core::domain::ticker::MAX_TICKER_LEN;

use crate::app::{AppState, FormField, Overlay, Panel};

/// Handle a key event.
pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        app.running = false;
        return;
    }

    // 1. Overlays consume input first.
    match &app.overlay {
        Overlay::Welcome => {
            app.overlay = Overlay::None;
            return;
        }
        Overlay::ErrorHistory => {
            handle_error_overlay(app, key);
            return;
        }
        Overlay::None => {}
    }

    if ctrl && key.code == KeyCode::Char('s') {
        app.save_csv();
        return;
    }

    // 2. Global keys.
    let editing = app.active_panel == Panel::Form && app.form.is_editing();
    match key.code {
        KeyCode::Tab => {
            app.active_panel = app.active_panel.next();
            return;
        }
        KeyCode::BackTab => {
            app.active_panel = app.active_panel.prev();
            return;
        }
        KeyCode::Char(c) if !editing => match c {
            'q' => {
                app.running = false;
                return;
            }
            '1' => {
                app.active_panel = Panel::Form;
                return;
            }
            '2' => {
                app.active_panel = Panel::Chart;
                return;
            }
            '3' => {
                app.active_panel = Panel::Help;
                return;
            }
            'e' => {
                app.overlay = Overlay::ErrorHistory;
                app.error_scroll = 0;
                return;
            }
            's' => {
                app.save_csv();
                return;
            }
            _ => {}
        },
        _ => {}
    }

    // 3. Panel-specific keys.
    match app.active_panel {
        Panel::Form => handle_form_key(app, key),
        Panel::Chart | Panel::Help => {} // display only
    }
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

fn handle_form_key(app: &mut AppState, key: KeyEvent) {
    if key.code == KeyCode::Enter {
        app.submit();
        return;
    }

    match app.form.focus {
        FormField::Ticker => match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if app.form.ticker_input.chars().count() < MAX_TICKER_LEN {
                    app.form.ticker_input.push(c);
                }
                app.form.validation_error = None;
            }
            KeyCode::Backspace => {
                app.form.ticker_input.pop();
                app.form.validation_error = None;
            }
            KeyCode::Esc | KeyCode::Down => {
                app.form.focus = FormField::Period;
            }
            _ => {}
        },
        FormField::Period => match key.code {
            KeyCode::Char('h') | KeyCode::Left => {
                app.form.period = app.form.period.prev();
            }
            KeyCode::Char('l') | KeyCode::Right => {
                app.form.period = app.form.period.next();
            }
            KeyCode::Char('k') | KeyCode::Up | KeyCode::Char('i') => {
                app.form.focus = FormField::Ticker;
            }
            _ => {}
        },
    }
}
