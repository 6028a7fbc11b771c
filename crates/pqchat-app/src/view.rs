//! Renderer contract.
//!
//! The terminal implements [`Screen`]: a set of named [`Widget`] slots that
//! accept styled text. [`Renderer`] listens on the bus for refresh topics
//! and, when asked, redraws the affected widgets from the [`Store`].
//!
//! The functions in this module turn store snapshots into [`StyledText`].
//! They are pure so the widget texts can be tested without a terminal.

use std::collections::BTreeSet;

use pqchat_proto::{ColorTag, Identity};

use crate::{EventBus, InputBuffer, Mailbox, Message, Store, Topic};

/// Color of message timestamps.
pub const TIMESTAMP_COLOR: &str = "#8b949e";
/// Color of panel headers.
pub const HEADER_COLOR: &str = "#58a6ff";
/// Color of placeholder and hint text.
pub const MUTED_COLOR: &str = "#8b949e";
/// Color of the room the local user is in.
pub const CURRENT_ROOM_COLOR: &str = "#0F0";
/// Color of every other room.
pub const OTHER_ROOM_COLOR: &str = "#00F";
/// Block cursor drawn inside the input text.
pub const CURSOR_GLYPH: char = '▊';

/// Topics the renderer redraws on.
const REFRESH_TOPICS: [Topic; 5] =
    [Topic::Identity, Topic::Roster, Topic::Rooms, Topic::MessageLog, Topic::InputBar];

/// Named display slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Widget {
    /// Message log.
    Messages,
    /// Connected users panel.
    Users,
    /// Room directory panel.
    Rooms,
    /// Input line with cursor.
    InputBar,
    /// Hint line below the input.
    Status,
    /// Local user badge.
    CurrentUser,
}

impl Widget {
    /// Every widget, in draw order.
    pub const ALL: [Self; 6] =
        [Self::Rooms, Self::Messages, Self::InputBar, Self::Status, Self::Users, Self::CurrentUser];

    /// Widgets showing data behind `topic`.
    pub fn for_topic(topic: Topic) -> &'static [Self] {
        match topic {
            Topic::Identity => &[Self::CurrentUser, Self::Users],
            Topic::Roster => &[Self::Users],
            Topic::Rooms => &[Self::Rooms],
            Topic::MessageLog => &[Self::Messages],
            Topic::InputBar => &[Self::InputBar, Self::Status],
            Topic::SubmitRequested | Topic::ExitRequested | Topic::MessageAppended => &[],
        }
    }
}

/// Run of text with one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Text.
    pub text: String,
    /// Foreground color. `None` uses the screen default.
    pub color: Option<ColorTag>,
    /// Bold.
    pub bold: bool,
}

impl Span {
    /// Unstyled span.
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), color: None, bold: false }
    }

    /// Span in `color`.
    pub fn colored(text: impl Into<String>, color: impl Into<ColorTag>) -> Self {
        Self { text: text.into(), color: Some(color.into()), bold: false }
    }

    /// Make the span bold.
    #[must_use]
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// One line of styled text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    /// Spans, left to right.
    pub spans: Vec<Span>,
}

impl Line {
    /// Line from spans.
    pub fn new(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    /// Text with styling dropped.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

impl From<Span> for Line {
    fn from(span: Span) -> Self {
        Self { spans: vec![span] }
    }
}

/// Styled, multi-line text for one widget.
pub type StyledText = Vec<Line>;

/// Display surface the renderer draws on.
pub trait Screen {
    /// Replace the contents of `widget`.
    fn display_text(&mut self, widget: Widget, text: StyledText);

    /// Empty `widget`.
    fn clear(&mut self, widget: Widget);
}

/// Redraws widgets whose data changed.
///
/// Change notifications are queued in a bus mailbox as they happen;
/// [`Renderer::refresh`] coalesces them so a burst of events costs one redraw
/// per widget.
#[derive(Debug)]
pub struct Renderer {
    mailbox: Mailbox,
}

impl Renderer {
    /// Subscribe a renderer to `bus`.
    pub fn new(bus: &EventBus) -> Self {
        Self { mailbox: bus.subscribe_mailbox(&REFRESH_TOPICS, "renderer") }
    }

    /// Redraw widgets touched since the last refresh. Returns `true` if
    /// anything was drawn.
    pub fn refresh(&mut self, store: &Store, screen: &mut impl Screen) -> bool {
        let dirty: BTreeSet<Widget> = self
            .mailbox
            .drain()
            .into_iter()
            .flat_map(|n| Widget::for_topic(n.topic).iter().copied())
            .collect();

        for &widget in &dirty {
            draw(widget, store, screen);
        }
        !dirty.is_empty()
    }

    /// Redraw every widget, dropping queued notifications.
    pub fn redraw_all(&mut self, store: &Store, screen: &mut impl Screen) {
        let _ = self.mailbox.drain();
        for widget in Widget::ALL {
            draw(widget, store, screen);
        }
    }
}

fn draw(widget: Widget, store: &Store, screen: &mut impl Screen) {
    let text = match widget {
        Widget::Messages => messages(store),
        Widget::Users => users(store),
        Widget::Rooms => rooms(store),
        Widget::InputBar => input_bar(store.input()),
        Widget::Status => status(store.input()),
        Widget::CurrentUser => match current_user(store) {
            Some(text) => text,
            None => {
                screen.clear(widget);
                return;
            },
        },
    };
    screen.display_text(widget, text);
}

/// Message log, one line per message.
pub fn messages(store: &Store) -> StyledText {
    store.messages().iter().map(message_line).collect()
}

/// A single log line: `HH:MM [You: ]text`.
pub fn message_line(message: &Message) -> Line {
    let mut spans =
        vec![Span::colored(message.timestamp.format("%H:%M ").to_string(), TIMESTAMP_COLOR)];
    if message.is_sent {
        spans.push(Span::colored("You: ", message.color.clone()).bold());
    }
    spans.push(Span::colored(message.text.clone(), message.color.clone()));
    Line::new(spans)
}

/// Connected users panel.
pub fn users(store: &Store) -> StyledText {
    let me = store.connection();
    let listed: Vec<Line> = store
        .users()
        .iter()
        .filter(|user| !me.is_self(user))
        .map(badge)
        .collect();

    panel("Connected Users", listed, "No users connected")
}

/// Room directory panel.
pub fn rooms(store: &Store) -> StyledText {
    let current = store.current_room_id();
    let listed = store
        .rooms()
        .iter()
        .map(|room| {
            let color =
                if current == Some(&room.id) { CURRENT_ROOM_COLOR } else { OTHER_ROOM_COLOR };
            Line::from(Span::colored(room.name.clone(), color))
        })
        .collect();

    panel("Available Rooms", listed, "No available rooms")
}

/// Input line: `> ` prompt, text, and a cursor glyph inside the text or a
/// trailing space at the end.
pub fn input_bar(input: &InputBuffer) -> StyledText {
    let (before, after) = input.split_at_cursor();
    let cursor = if after.is_empty() { ' ' } else { CURSOR_GLYPH };
    vec![Line::from(Span::colored(format!("> {before}{cursor}{after}"), HEADER_COLOR))]
}

/// Hint line below the input.
pub fn status(input: &InputBuffer) -> StyledText {
    let text = if input.is_empty() {
        "Ready - Type a message and press Enter to send, ESC to exit".to_string()
    } else {
        format!("Type: {} chars | Press Enter to send, ESC to exit", input.len())
    };
    vec![Line::from(Span::colored(text, MUTED_COLOR))]
}

/// Local user badge, `None` while the local user is unknown.
pub fn current_user(store: &Store) -> Option<StyledText> {
    store.connection().current_user.as_ref().map(|me| vec![badge(me)])
}

fn badge(user: &Identity) -> Line {
    let color = user.color().clone();
    Line::new(vec![
        Span::colored("● ", color.clone()),
        Span::colored(user.username(), color),
    ])
}

fn panel(header: &str, listed: Vec<Line>, placeholder: &str) -> StyledText {
    let mut text = vec![Line::from(Span::colored(header, HEADER_COLOR).bold()), Line::default()];
    if listed.is_empty() {
        text.push(Line::from(Span::colored(placeholder, MUTED_COLOR)));
    } else {
        text.extend(listed);
    }
    text
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pqchat_proto::{InboundEvent, Room};

    use super::*;

    #[derive(Default)]
    struct RecordingScreen {
        widgets: HashMap<Widget, Vec<String>>,
        draws: Vec<Widget>,
    }

    impl Screen for RecordingScreen {
        fn display_text(&mut self, widget: Widget, text: StyledText) {
            self.draws.push(widget);
            self.widgets.insert(widget, text.iter().map(Line::text).collect());
        }

        fn clear(&mut self, widget: Widget) {
            self.draws.push(widget);
            self.widgets.remove(&widget);
        }
    }

    fn texts(text: &StyledText) -> Vec<String> {
        text.iter().map(Line::text).collect()
    }

    fn apply(store: &mut Store, event: InboundEvent) {
        let _ = store.apply(event);
    }

    #[test]
    fn input_bar_cursor_rendering() {
        let mut input = InputBuffer::default();
        assert_eq!(texts(&input_bar(&input)), vec![">  "]);

        for c in "abc".chars() {
            input.insert(c);
        }
        assert_eq!(texts(&input_bar(&input)), vec!["> abc "]);

        input.left();
        assert_eq!(texts(&input_bar(&input)), vec!["> ab▊c"]);
    }

    #[test]
    fn status_counts_characters() {
        let mut input = InputBuffer::default();
        assert_eq!(texts(&status(&input)), vec![
            "Ready - Type a message and press Enter to send, ESC to exit"
        ]);

        input.insert('é');
        input.insert('x');
        assert_eq!(texts(&status(&input)), vec!["Type: 2 chars | Press Enter to send, ESC to exit"]);
    }

    #[test]
    fn panels_show_placeholders_when_empty() {
        let store = Store::new();
        assert_eq!(texts(&users(&store)), vec!["Connected Users", "", "No users connected"]);
        assert_eq!(texts(&rooms(&store)), vec!["Available Rooms", "", "No available rooms"]);
        assert_eq!(current_user(&store), None);
    }

    #[test]
    fn current_room_is_highlighted() {
        let mut store = Store::new();
        apply(&mut store, InboundEvent::CurrentRooms(vec![Room::new("r1", "Lobby"), Room::new("r2", "Dev")]));
        apply(&mut store, InboundEvent::JoinedRoom(Room::new("r2", "Dev")));

        let text = rooms(&store);
        let colors: Vec<_> =
            text[2..].iter().map(|l| l.spans[0].color.as_ref().map(ColorTag::as_str)).collect();
        assert_eq!(colors, vec![Some(OTHER_ROOM_COLOR), Some(CURRENT_ROOM_COLOR)]);
    }

    #[test]
    fn sent_messages_are_prefixed() {
        let mut store = Store::new();
        let _ = store.push_sent("hi");
        apply(&mut store, InboundEvent::Message { text: "yo".into(), color: ColorTag::new("#123") });

        let lines = messages(&store);
        assert!(lines[0].text().ends_with(" You: hi"));
        assert!(lines[0].spans[1].bold);
        assert!(lines[1].text().ends_with(" yo"));
        assert_eq!(lines[1].spans.len(), 2);
    }

    #[test]
    fn refresh_redraws_only_touched_widgets() {
        let bus = EventBus::new();
        let mut renderer = Renderer::new(&bus);
        let mut screen = RecordingScreen::default();
        let store = Store::new();

        assert!(!renderer.refresh(&store, &mut screen));

        bus.notify(Topic::Roster, None);
        bus.notify(Topic::Roster, None);
        bus.notify(Topic::InputBar, None);
        bus.notify(Topic::MessageAppended, None);
        assert!(renderer.refresh(&store, &mut screen));

        assert_eq!(screen.draws, vec![Widget::Users, Widget::InputBar, Widget::Status]);
    }

    #[test]
    fn redraw_all_clears_unknown_user_badge() {
        let bus = EventBus::new();
        let mut renderer = Renderer::new(&bus);
        let mut screen = RecordingScreen::default();
        let mut store = Store::new();

        apply(&mut store, InboundEvent::Connected {
            identity: Some(Identity::current("me", "alice", "#abc")),
        });
        renderer.redraw_all(&store, &mut screen);
        assert_eq!(screen.widgets.get(&Widget::CurrentUser), Some(&vec!["● alice".to_string()]));

        store.clear();
        bus.notify(Topic::Identity, None);
        renderer.refresh(&store, &mut screen);
        assert!(!screen.widgets.contains_key(&Widget::CurrentUser));
        assert_eq!(screen.draws.len(), Widget::ALL.len() + 2);
    }
}
