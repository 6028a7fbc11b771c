//! Async runtime
//!
//! Event loop that drives terminal I/O and the backend process. Uses
//! tokio::select! to multiplex terminal events with backend output; all
//! state changes go through the [`Session`] and reach the screen through
//! the [`Renderer`].

use std::rc::Rc;

use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::StreamExt;
use pqchat_app::{EventBus, Outbound, Renderer, Session, SessionStep};

use crate::{
    RuntimeError,
    backend::{self, BackendConfig, BackendEvent, BackendHandle},
    input,
    terminal::TerminalScreen,
};

/// Async runtime for the TUI.
///
/// Owns the session, the renderer, the backend process and the terminal.
/// Dropping it kills the backend and restores the terminal.
pub struct Runtime {
    session: Session,
    renderer: Renderer,
    backend: BackendHandle,
    screen: TerminalScreen,
}

impl Runtime {
    /// Spawn the backend and take over the terminal.
    ///
    /// The backend is started first so a bad backend path is reported on a
    /// normal terminal.
    pub fn start(config: &BackendConfig) -> Result<Self, RuntimeError> {
        let bus = Rc::new(EventBus::new());
        let (outbound, stdin) = Outbound::channel();

        let backend = backend::spawn(config, stdin)?;
        let session = Session::new(Rc::clone(&bus), outbound);
        let renderer = Renderer::new(&bus);
        let screen = TerminalScreen::new()?;

        Ok(Self { session, renderer, backend, screen })
    }

    /// Run until the user quits or the backend exits. Returns the process
    /// exit code.
    pub async fn run(mut self) -> Result<i32, RuntimeError> {
        self.session.connect();
        self.renderer.redraw_all(self.session.store(), &mut self.screen);
        self.screen.draw(self.session.stats())?;

        let mut event_stream = EventStream::new();

        loop {
            let step = tokio::select! {
                // Terminal events
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(event)) => self.handle_terminal_event(&event),
                        Some(Err(e)) => return Err(RuntimeError::Io(e)),
                        None => SessionStep::Quit { code: 0 },
                    }
                }

                // Backend stdout, stderr and exit
                Some(event) = self.backend.events.recv() => self.handle_backend_event(event),
            };

            match step {
                SessionStep::Continue => {},
                SessionStep::Renderer(key) => self.screen.toggle(key),
                SessionStep::Quit { code } => {
                    tracing::info!(code, "exiting");
                    return Ok(code);
                },
            }

            self.renderer.refresh(self.session.store(), &mut self.screen);
            self.screen.draw(self.session.stats())?;
        }
    }

    /// Handle a terminal event.
    fn handle_terminal_event(&mut self, event: &Event) -> SessionStep {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                input::key_press(key).map_or(SessionStep::Continue, |press| {
                    self.session.handle_key(&press)
                })
            },
            Event::Resize(cols, rows) => {
                tracing::debug!(cols, rows, "terminal resized");
                self.renderer.redraw_all(self.session.store(), &mut self.screen);
                SessionStep::Continue
            },
            _ => SessionStep::Continue,
        }
    }

    /// Handle backend activity.
    fn handle_backend_event(&mut self, event: BackendEvent) -> SessionStep {
        match event {
            BackendEvent::Output(chunk) => {
                self.session.handle_output(&chunk);
                SessionStep::Continue
            },
            BackendEvent::Stderr(line) => {
                self.screen.push_console(line);
                SessionStep::Continue
            },
            BackendEvent::Exited { code } => self.session.handle_backend_exit(code),
        }
    }
}
