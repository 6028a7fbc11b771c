//! Session dispatcher.
//!
//! The [`Session`] is the only place where protocol, state and input meet.
//! It owns the [`Store`] and the line decoder, routes decoded events into
//! the store and publishes the resulting notifications on the bus. Key
//! presses go through the [`InputController`]; the submit and exit requests
//! it raises come back to the session through a private mailbox.
//!
//! Nothing here performs I/O. The caller feeds backend output, key presses
//! and the backend's exit status in, and acts on the returned
//! [`SessionStep`].

use std::rc::Rc;

use pqchat_proto::{CommandKind, InboundEvent, LineDecoder, decode_frame};

use crate::{
    EventBus, InputController, KeyInput, KeyOutcome, KeyPress, Mailbox, Outbound, Payload,
    RendererKey, Store, Topic,
};

/// Subscriber id of the session's control mailbox.
const CONTROL_SUBSCRIBER: &str = "session";

/// What the caller should do after a session call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    /// Keep running.
    Continue,
    /// Restore the terminal and exit with `code`.
    Quit {
        /// Process exit code.
        code: i32,
    },
    /// Forward a renderer-owned key to the screen.
    Renderer(RendererKey),
}

/// Counters for the inbound stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Complete lines received from the backend.
    pub lines: u64,
    /// Events applied to the store.
    pub events: u64,
    /// Lines or frames skipped as malformed.
    pub parse_failures: u64,
    /// Well-formed frames of an unknown type.
    pub ignored: u64,
}

/// Dispatcher between backend, store, bus and input line.
#[derive(Debug)]
pub struct Session {
    bus: Rc<EventBus>,
    store: Store,
    input: InputController,
    decoder: LineDecoder,
    outbound: Outbound,
    control: Mailbox,
    stats: SessionStats,
}

impl Session {
    /// Create a session publishing on `bus` and writing through `outbound`.
    pub fn new(bus: Rc<EventBus>, outbound: Outbound) -> Self {
        let control = bus.subscribe_mailbox(
            &[Topic::SubmitRequested, Topic::ExitRequested],
            CONTROL_SUBSCRIBER,
        );
        Self {
            input: InputController::new(Rc::clone(&bus)),
            bus,
            store: Store::new(),
            decoder: LineDecoder::new(),
            outbound,
            control,
            stats: SessionStats::default(),
        }
    }

    /// Ask the backend to connect to the server.
    pub fn connect(&self) {
        tracing::info!("requesting backend connect");
        self.outbound.send(CommandKind::Connect, "");
    }

    /// Feed a chunk of backend stdout.
    ///
    /// Malformed lines are logged, counted and skipped. They never affect
    /// neighbouring lines.
    pub fn handle_output(&mut self, chunk: &[u8]) {
        for line in self.decoder.feed(chunk) {
            match line {
                Ok(line) => self.handle_line(&line),
                Err(error) => {
                    self.stats.parse_failures += 1;
                    tracing::warn!(%error, "dropping backend output");
                },
            }
        }
    }

    /// Decode and apply one complete line.
    pub fn handle_line(&mut self, line: &str) {
        self.stats.lines += 1;

        let frame = match decode_frame(line) {
            Ok(frame) => frame,
            Err(error) => {
                self.stats.parse_failures += 1;
                tracing::warn!(%error, line, "skipping malformed frame");
                return;
            },
        };

        match InboundEvent::from_frame(&frame) {
            Ok(Some(event)) => self.handle_event(event),
            Ok(None) => {
                self.stats.ignored += 1;
                tracing::debug!(kind = %frame.kind, "ignoring unknown frame type");
            },
            Err(error) => {
                self.stats.parse_failures += 1;
                tracing::warn!(kind = %frame.kind, %error, "skipping frame");
            },
        }
    }

    /// Apply a decoded event and publish what changed.
    pub fn handle_event(&mut self, event: InboundEvent) {
        self.stats.events += 1;
        tracing::debug!(kind = event.kind().as_str(), "applying event");

        for notification in self.store.apply(event) {
            self.bus.publish(notification);
        }
    }

    /// Handle a key press from the terminal.
    pub fn handle_key(&mut self, press: &KeyPress) -> SessionStep {
        let Some(key) = KeyInput::from_press(press) else {
            tracing::trace!(?press, "unmapped key");
            return SessionStep::Continue;
        };

        match self.input.handle_key(self.store.input_mut(), key) {
            KeyOutcome::Renderer(key) => SessionStep::Renderer(key),
            KeyOutcome::Ignored => SessionStep::Continue,
            KeyOutcome::Handled => self.process_requests(),
        }
    }

    /// Send the input buffer as a chat message and reset it.
    ///
    /// Blank input is left untouched and nothing is sent.
    pub fn submit(&mut self) {
        let text = self.store.input().text().to_string();
        if text.trim().is_empty() {
            return;
        }

        let notifications = self.store.push_sent(text.as_str());
        self.outbound.send(CommandKind::Send, text);
        self.store.input_mut().clear();

        for notification in notifications {
            self.bus.publish(notification);
        }
        self.bus.notify(Topic::InputBar, None);
    }

    /// The backend process exited with `code`.
    ///
    /// Applies whatever unterminated output is left, resets all state and
    /// announces the exit on the bus.
    pub fn handle_backend_exit(&mut self, code: i32) -> SessionStep {
        if let Some(line) = self.decoder.finish() {
            self.handle_line(&line);
        }

        tracing::info!(code, "backend exited");
        self.store.clear();
        self.bus.notify(Topic::ExitRequested, Some(Payload::Exit { code }));

        let _ = self.control.drain();
        SessionStep::Quit { code }
    }

    /// Client state.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Inbound stream counters.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Act on submit and exit requests raised since the last call.
    fn process_requests(&mut self) -> SessionStep {
        for notification in self.control.drain() {
            match (notification.topic, notification.payload) {
                (Topic::SubmitRequested, _) => self.submit(),
                (Topic::ExitRequested, Some(Payload::Exit { code })) => {
                    return SessionStep::Quit { code };
                },
                (Topic::ExitRequested, _) => return SessionStep::Quit { code: 0 },
                (topic, _) => tracing::trace!(?topic, "unexpected control notification"),
            }
        }
        SessionStep::Continue
    }
}
