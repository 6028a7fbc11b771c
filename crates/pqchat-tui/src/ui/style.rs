//! Styled text conversion.
//!
//! Maps the renderer contract's [`view::StyledText`] onto ratatui text, parsing
//! color tags on the way. Tags that are not `#RGB` or `#RRGGBB` fall back to
//! the terminal's default color.

use pqchat_app::view;
use pqchat_proto::ColorTag;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
};

/// Parse a `#RGB` or `#RRGGBB` color tag.
pub fn color(tag: &ColorTag) -> Option<Color> {
    let hex = tag.as_str().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }

    match hex.len() {
        3 => {
            let mut digits = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
            Some(Color::Rgb(digits.next()??, digits.next()??, digits.next()??))
        },
        6 => {
            let channel = |at: usize| u8::from_str_radix(&hex[at..at + 2], 16).ok();
            Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
        },
        _ => None,
    }
}

/// Convert one span.
pub fn span(span: &view::Span) -> Span<'static> {
    let mut style = Style::default();
    if let Some(fg) = span.color.as_ref().and_then(color) {
        style = style.fg(fg);
    }
    if span.bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    Span::styled(span.text.clone(), style)
}

/// Convert one line.
pub fn line(line: &view::Line) -> Line<'static> {
    Line::from(line.spans.iter().map(span).collect::<Vec<_>>())
}

/// Convert a whole widget's text.
pub fn text(text: &[view::Line]) -> Text<'static> {
    Text::from(text.iter().map(line).collect::<Vec<_>>())
}
