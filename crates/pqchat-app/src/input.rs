//! Terminal-agnostic keyboard input.
//!
//! The terminal reports key presses as [`KeyPress`] records (raw escape
//! sequence plus a key name and modifiers). [`KeyInput::from_press`] reduces
//! them to the handful of keys the input line understands, and
//! [`InputController`] applies those to the [`InputBuffer`].

use std::rc::Rc;

use crate::{EventBus, InputBuffer, Topic};

/// Key press as reported by the terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPress {
    /// Raw input sequence (`"a"`, `"\r"`, `"\x1b[D"`, ...).
    pub sequence: String,
    /// Key name (`"a"`, `"return"`, `"left"`, ...).
    pub name: String,
    /// Control held.
    pub ctrl: bool,
    /// Shift held.
    pub shift: bool,
}

impl KeyPress {
    /// Key press with a sequence and name, no modifiers.
    pub fn new(sequence: impl Into<String>, name: impl Into<String>) -> Self {
        Self { sequence: sequence.into(), name: name.into(), ctrl: false, shift: false }
    }

    /// Printable character key.
    pub fn char(c: char) -> Self {
        Self::new(c, c)
    }

    /// Set the control modifier.
    #[must_use]
    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }
}

/// Keys the input line reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Enter/Return key (submit).
    Enter,
    /// Backspace key (delete character before cursor).
    Backspace,
    /// Delete key (delete character at cursor).
    Delete,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Home key (cursor to start).
    Home,
    /// End key (cursor to end).
    End,
    /// Escape key (quit).
    Esc,
    /// Renderer-owned key, passed through untouched.
    Renderer(RendererKey),
}

/// Keys owned by the renderer rather than the input line.
///
/// Bound to ctrl+`` ` ``/ctrl+`"` and ctrl+`.`, so the bare characters stay typeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKey {
    /// Show or hide the backend console pane.
    ToggleConsole,
    /// Show or hide the debug overlay.
    ToggleDebug,
}

impl KeyInput {
    /// Decode a terminal key press. `None` for keys with no meaning here.
    pub fn from_press(press: &KeyPress) -> Option<Self> {
        if press.ctrl {
            return match press.name.as_str() {
                "`" | "\"" => Some(Self::Renderer(RendererKey::ToggleConsole)),
                "." => Some(Self::Renderer(RendererKey::ToggleDebug)),
                "c" => Some(Self::Esc),
                _ => None,
            };
        }

        let key = match press.sequence.as_str() {
            "\r" | "\n" => Self::Enter,
            "\u{7f}" | "\u{8}" => Self::Backspace,
            "\u{1b}[3~" => Self::Delete,
            "\u{1b}[D" => Self::Left,
            "\u{1b}[C" => Self::Right,
            "\u{1b}[H" | "\u{1b}[1~" | "\u{1b}OH" => Self::Home,
            "\u{1b}[F" | "\u{1b}[4~" | "\u{1b}OF" => Self::End,
            "\u{1b}" => Self::Esc,
            _ if press.name == "escape" => Self::Esc,
            sequence => {
                let mut chars = sequence.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_control() => Self::Char(c),
                    _ => return None,
                }
            },
        };
        Some(key)
    }
}

/// Result of handling one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Key consumed by the input line (buffer edit, submit or exit request).
    Handled,
    /// Key had no effect (cursor already at a bound, empty submit, ...).
    Ignored,
    /// Key belongs to the renderer.
    Renderer(RendererKey),
}

/// Input line state machine.
///
/// Edits go straight to the buffer; everything else leaves as a bus
/// notification: [`Topic::InputBar`] after any edit, [`Topic::SubmitRequested`]
/// on Enter with non-blank text, [`Topic::ExitRequested`] on Escape.
#[derive(Debug, Clone)]
pub struct InputController {
    bus: Rc<EventBus>,
}

impl InputController {
    /// Create a controller publishing on `bus`.
    pub fn new(bus: Rc<EventBus>) -> Self {
        Self { bus }
    }

    /// Apply `key` to `buffer`.
    pub fn handle_key(&self, buffer: &mut InputBuffer, key: KeyInput) -> KeyOutcome {
        let changed = match key {
            KeyInput::Char(c) => {
                buffer.insert(c);
                true
            },
            KeyInput::Backspace => buffer.backspace(),
            KeyInput::Delete => buffer.delete(),
            KeyInput::Left => buffer.left(),
            KeyInput::Right => buffer.right(),
            KeyInput::Home => {
                buffer.home();
                true
            },
            KeyInput::End => {
                buffer.end();
                true
            },
            KeyInput::Enter => {
                if buffer.text().trim().is_empty() {
                    return KeyOutcome::Ignored;
                }
                self.bus.notify(Topic::SubmitRequested, None);
                return KeyOutcome::Handled;
            },
            KeyInput::Esc => {
                self.bus.notify(Topic::ExitRequested, None);
                return KeyOutcome::Handled;
            },
            KeyInput::Renderer(key) => return KeyOutcome::Renderer(key),
        };

        if changed {
            self.bus.notify(Topic::InputBar, None);
            KeyOutcome::Handled
        } else {
            KeyOutcome::Ignored
        }
    }
}
