//! UI rendering
//!
//! [`ScreenState`] is the terminal side of the renderer contract: it keeps
//! the last text each widget was given plus the console and debug overlays.
//! [`render`] lays it out with ratatui. Rendering is pure (no I/O) so it can
//! be checked against a test backend.

mod overlay;
pub mod style;

use std::collections::{HashMap, VecDeque};

use pqchat_app::{
    RendererKey, Screen, SessionStats, Widget,
    view::{Line, StyledText},
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Paragraph},
};

pub use overlay::debug_lines;

/// Backend stderr lines kept for the console pane.
pub const CONSOLE_CAPACITY: usize = 200;

const BORDER_SIZE: u16 = 2;

/// Widget contents and overlay state.
#[derive(Debug, Default)]
pub struct ScreenState {
    widgets: HashMap<Widget, StyledText>,
    console: VecDeque<String>,
    show_console: bool,
    show_debug: bool,
    stats: SessionStats,
}

impl ScreenState {
    /// Empty screen, overlays hidden.
    pub fn new() -> Self {
        Self::default()
    }

    /// Show or hide an overlay.
    pub fn toggle(&mut self, key: RendererKey) {
        match key {
            RendererKey::ToggleConsole => self.show_console = !self.show_console,
            RendererKey::ToggleDebug => self.show_debug = !self.show_debug,
        }
        tracing::debug!(console = self.show_console, debug = self.show_debug, "overlays toggled");
    }

    /// Append a backend stderr line to the console.
    pub fn push_console(&mut self, line: String) {
        if self.console.len() >= CONSOLE_CAPACITY {
            self.console.pop_front();
        }
        self.console.push_back(line);
    }

    /// Update the counters shown by the debug overlay.
    pub fn set_stats(&mut self, stats: SessionStats) {
        self.stats = stats;
    }

    /// Current text of `widget`.
    pub fn widget(&self, widget: Widget) -> Option<&[Line]> {
        self.widgets.get(&widget).map(Vec::as_slice)
    }

    /// Console lines, oldest first.
    pub fn console(&self) -> &VecDeque<String> {
        &self.console
    }
}

impl Screen for ScreenState {
    fn display_text(&mut self, widget: Widget, text: StyledText) {
        self.widgets.insert(widget, text);
    }

    fn clear(&mut self, widget: Widget) {
        self.widgets.remove(&widget);
    }
}

/// Render the entire UI.
///
/// Rooms on the left, messages with input and status in the middle, users
/// and the local user badge on the right.
pub fn render(frame: &mut Frame, state: &ScreenState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(10),
            Constraint::Percentage(80),
            Constraint::Percentage(10),
        ])
        .split(frame.area());

    let [rooms_area, center_area, users_area] = columns.as_ref() else {
        return;
    };

    render_panel(frame, state, Widget::Rooms, " Rooms ", *rooms_area);
    let messages_area = render_center(frame, state, *center_area);
    render_users(frame, state, *users_area);

    if state.show_console {
        overlay::console(frame, state.console(), messages_area);
    }
    if state.show_debug {
        overlay::debug(frame, &state.stats, messages_area);
    }
}

/// Render messages, input and status. Returns the messages area.
fn render_center(frame: &mut Frame, state: &ScreenState, area: Rect) -> Rect {
    const MESSAGES_MIN_HEIGHT: u16 = 3;
    const INPUT_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(MESSAGES_MIN_HEIGHT),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(area);

    let [messages_area, input_area, status_area] = rows.as_ref() else {
        return area;
    };

    render_messages(frame, state, *messages_area);
    render_panel(frame, state, Widget::InputBar, "", *input_area);
    frame.render_widget(Paragraph::new(widget_text(state, Widget::Status)), *status_area);

    *messages_area
}

/// Render the message log, scrolled to the newest line.
fn render_messages(frame: &mut Frame, state: &ScreenState, area: Rect) {
    let lines = state.widget(Widget::Messages).unwrap_or_default();
    let visible = area.height.saturating_sub(BORDER_SIZE) as usize;
    let skip = lines.len().saturating_sub(visible);

    let text = style::text(&lines[skip..]);
    let block = Block::default().borders(Borders::ALL).title(" Messages ");
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn render_users(frame: &mut Frame, state: &ScreenState, area: Rect) {
    const BADGE_HEIGHT: u16 = 3;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(BADGE_HEIGHT), Constraint::Length(BADGE_HEIGHT)])
        .split(area);

    let [list_area, badge_area] = rows.as_ref() else {
        return;
    };

    render_panel(frame, state, Widget::Users, " Users ", *list_area);
    render_panel(frame, state, Widget::CurrentUser, " You ", *badge_area);
}

fn render_panel(frame: &mut Frame, state: &ScreenState, widget: Widget, title: &str, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    frame.render_widget(Paragraph::new(widget_text(state, widget)).block(block), area);
}

fn widget_text(state: &ScreenState, widget: Widget) -> ratatui::text::Text<'static> {
    state.widget(widget).map(style::text).unwrap_or_default()
}
