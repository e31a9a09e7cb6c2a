//! Color theme for console output.

use crossterm::style::{Attribute, Attributes, Color, ContentStyle};

/// Styles used by the console renderers.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub title: ContentStyle,
    pub page_info: ContentStyle,
    pub table_header: ContentStyle,
    pub sender: ContentStyle,
    pub timestamp: ContentStyle,
    pub message_type: ContentStyle,
    pub attachment: ContentStyle,
    pub url: ContentStyle,
    pub result_number: ContentStyle,
    pub conversation: ContentStyle,
    pub match_label: ContentStyle,
    pub search_highlight: ContentStyle,
    pub notice: ContentStyle,
    pub error: ContentStyle,
}

fn style(fg: Color, bold: bool) -> ContentStyle {
    ContentStyle {
        foreground_color: Some(fg),
        attributes: if bold {
            Attributes::from(Attribute::Bold)
        } else {
            Attributes::default()
        },
        ..ContentStyle::default()
    }
}

impl Theme {
    /// Colored theme (default).
    pub fn colored() -> Self {
        Self {
            title: style(Color::Cyan, true),
            page_info: style(Color::Yellow, false),
            table_header: style(Color::Cyan, true),
            sender: style(Color::Blue, true),
            timestamp: style(Color::Green, false),
            message_type: style(Color::Magenta, false),
            attachment: style(Color::Yellow, false),
            url: style(Color::Cyan, false),
            result_number: style(Color::Yellow, false),
            conversation: style(Color::Magenta, false),
            match_label: style(Color::Green, false),
            search_highlight: style(Color::Yellow, true),
            notice: style(Color::Green, false),
            error: style(Color::Red, false),
        }
    }

    /// No escape codes at all; for pipes, files and tests.
    pub fn plain() -> Self {
        let none = ContentStyle::default();
        Self {
            title: none,
            page_info: none,
            table_header: none,
            sender: none,
            timestamp: none,
            message_type: none,
            attachment: none,
            url: none,
            result_number: none,
            conversation: none,
            match_label: none,
            search_highlight: none,
            notice: none,
            error: none,
        }
    }
}

/// Pick the theme: colored unless disabled or `NO_COLOR` is set.
pub fn current_theme(color: bool) -> Theme {
    if color && std::env::var_os("NO_COLOR").is_none() {
        Theme::colored()
    } else {
        Theme::plain()
    }
}
