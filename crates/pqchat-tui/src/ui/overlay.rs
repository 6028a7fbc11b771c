//! Console and debug overlays
//!
//! Drawn on top of the message log when toggled.

use std::collections::VecDeque;

use pqchat_app::SessionStats;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
};

const DEBUG_WIDTH: u16 = 28;
const DEBUG_HEIGHT: u16 = 6;

/// Render the backend console over the lower half of `area`.
pub fn console(frame: &mut Frame, lines: &VecDeque<String>, area: Rect) {
    let height = if area.height < 6 { area.height } else { area.height / 2 };
    let area = Rect { y: area.y + area.height - height, height, ..area };

    let visible = height.saturating_sub(2) as usize;
    let skip = lines.len().saturating_sub(visible);
    let text: Vec<Line> = lines.iter().skip(skip).map(|l| Line::raw(l.clone())).collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Console ")
        .border_style(Style::default().fg(Color::Yellow));

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(text).block(block), area);
}

/// Render session counters in the top-right corner of `area`.
pub fn debug(frame: &mut Frame, stats: &SessionStats, area: Rect) {
    let width = DEBUG_WIDTH.min(area.width);
    let height = DEBUG_HEIGHT.min(area.height);
    let area = Rect { x: area.x + area.width - width, width, height, ..area };

    let text: Vec<Line> = debug_lines(stats).into_iter().map(Line::raw).collect();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Debug ")
        .border_style(Style::default().fg(Color::DarkGray));

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(text).block(block), area);
}

/// Debug overlay contents.
pub fn debug_lines(stats: &SessionStats) -> Vec<String> {
    vec![
        format!("lines:          {}", stats.lines),
        format!("events:         {}", stats.events),
        format!("parse failures: {}", stats.parse_failures),
        format!("ignored:        {}", stats.ignored),
    ]
}
