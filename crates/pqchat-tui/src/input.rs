//! Crossterm key events to [`KeyPress`] records.
//!
//! Crossterm decodes escape sequences itself. Here they are re-encoded into
//! the raw sequence and key name the input controller expects.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use pqchat_app::KeyPress;

/// Convert a crossterm key event. `None` for releases and keys the input
/// line has no use for.
pub fn key_press(event: &KeyEvent) -> Option<KeyPress> {
    if event.kind == KeyEventKind::Release {
        return None;
    }

    let (sequence, name) = match event.code {
        KeyCode::Char(c) => (c.to_string(), c.to_lowercase().to_string()),
        KeyCode::Enter => ("\r".into(), "return".into()),
        KeyCode::Backspace => ("\u{7f}".into(), "backspace".into()),
        KeyCode::Delete => ("\u{1b}[3~".into(), "delete".into()),
        KeyCode::Left => ("\u{1b}[D".into(), "left".into()),
        KeyCode::Right => ("\u{1b}[C".into(), "right".into()),
        KeyCode::Up => ("\u{1b}[A".into(), "up".into()),
        KeyCode::Down => ("\u{1b}[B".into(), "down".into()),
        KeyCode::Home => ("\u{1b}[H".into(), "home".into()),
        KeyCode::End => ("\u{1b}[F".into(), "end".into()),
        KeyCode::Tab => ("\t".into(), "tab".into()),
        KeyCode::Esc => ("\u{1b}".into(), "escape".into()),
        _ => return None,
    };

    Some(KeyPress {
        sequence,
        name,
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
        shift: event.modifiers.contains(KeyModifiers::SHIFT),
    })
}
