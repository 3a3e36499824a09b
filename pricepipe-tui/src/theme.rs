//! Parrot/neon theme tokens.
//!
//! # Color Palette
//! - **Accent**: Electric cyan (primary highlights, focus)
//! - **Positive**: Neon green (success, rising prices)
//! - **Negative**: Hot pink (errors, falling prices)
//! - **Warning**: Neon orange (validation problems, no-data notices)
//! - **Neutral**: Cool purple (secondary info)
//! - **Muted**: Steel blue (hints, disabled text)

use ratatui::style::{Color, Modifier, Style};

pub const ACCENT: Color = Color::Rgb(0, 255, 255);
pub const POSITIVE: Color = Color::Rgb(0, 255, 128);
pub const NEGATIVE: Color = Color::Rgb(255, 20, 147);
pub const WARNING: Color = Color::Rgb(255, 140, 0);
pub const NEUTRAL: Color = Color::Rgb(147, 112, 219);
pub const MUTED: Color = Color::Rgb(100, 149, 237);
pub const TEXT: Color = Color::White;

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn positive() -> Style {
    Style::default().fg(POSITIVE)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn neutral() -> Style {
    Style::default().fg(NEUTRAL)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn text() -> Style {
    Style::default().fg(TEXT)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}

/// Input field style: highlighted when focused.
pub fn field(focused: bool) -> Style {
    if focused {
        accent_bold().add_modifier(Modifier::UNDERLINED)
    } else {
        text()
    }
}

/// Green for a rise over the window, pink for a fall.
pub fn change_color(change: f64) -> Style {
    if change >= 0.0 {
        positive()
    } else {
        negative()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_color_sign() {
        assert_eq!(change_color(1.5), positive());
        assert_eq!(change_color(0.0), positive());
        assert_eq!(change_color(-0.1), negative());
    }

    #[test]
    fn focus_styles_differ() {
        assert_ne!(panel_border(true), panel_border(false));
        assert_ne!(field(true), field(false));
    }
}
