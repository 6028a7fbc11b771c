//! Terminal screen.
//!
//! Implements the [`Screen`] contract on a real terminal using crossterm for
//! raw mode and ratatui for drawing. The terminal is restored on drop.

use std::io::{Stdout, stdout};

use crossterm::{
    ExecutableCommand,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use pqchat_app::{RendererKey, Screen, SessionStats, Widget, view::StyledText};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::{RuntimeError, ui};

/// Full-screen terminal surface.
pub struct TerminalScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    state: ui::ScreenState,
}

impl TerminalScreen {
    /// Switch the terminal to raw mode on the alternate screen.
    pub fn new() -> Result<Self, RuntimeError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        Ok(Self { terminal, state: ui::ScreenState::new() })
    }

    /// Show or hide an overlay.
    pub fn toggle(&mut self, key: RendererKey) {
        self.state.toggle(key);
    }

    /// Append a backend stderr line to the console pane.
    pub fn push_console(&mut self, line: String) {
        self.state.push_console(line);
    }

    /// Draw the current state, with `stats` in the debug overlay.
    pub fn draw(&mut self, stats: SessionStats) -> Result<(), RuntimeError> {
        self.state.set_stats(stats);
        let Self { terminal, state } = self;
        terminal.draw(|frame| ui::render(frame, state))?;
        Ok(())
    }
}

impl Screen for TerminalScreen {
    fn display_text(&mut self, widget: Widget, text: StyledText) {
        self.state.display_text(widget, text);
    }

    fn clear(&mut self, widget: Widget) {
        self.state.clear(widget);
    }
}

impl Drop for TerminalScreen {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}
