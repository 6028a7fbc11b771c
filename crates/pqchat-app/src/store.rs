//! Client state store.
//!
//! [`Store`] is the single owner of all mutable client state: connection
//! status, local identity, message log, user roster, room directory and the
//! input buffer. Nothing else mutates these collections.
//!
//! Like the rest of this crate the store is a pure state machine:
//! [`Store::apply`] consumes a decoded [`InboundEvent`] and returns the
//! [`Notification`]s the caller must publish.
//!
//! # Invariants
//!
//! - The message log holds at most [`MESSAGE_LOG_CAPACITY`] entries, oldest
//!   evicted first, with non-decreasing timestamps.
//! - The roster never holds an entry keyed like the local identity.
//! - Roster and room directory hold at most one entry per key.
//! - `0 <= cursor <= text length` for the input buffer.

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use pqchat_proto::{ColorTag, Identity, IdentityKey, InboundEvent, Room, RoomId};

use crate::{Notification, Payload, Topic};

/// Number of messages kept in the log.
pub const MESSAGE_LOG_CAPACITY: usize = 50;

/// Color of locally sent messages when the local identity is unknown.
const SENT_FALLBACK_COLOR: &str = "#58a6ff";

/// A line in the message log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message text.
    pub text: String,
    /// `true` if typed locally, `false` if received or generated.
    pub is_sent: bool,
    /// Time the message was appended.
    pub timestamp: DateTime<Local>,
    /// Color tag passed to the renderer.
    pub color: ColorTag,
}

/// Connection status and local identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    /// Backend reports an open server connection.
    pub is_connected: bool,
    /// Local user. `None` until the backend reports one.
    pub current_user: Option<Identity>,
}

impl ConnectionState {
    /// `true` if `identity` is the local user, in either schema.
    pub fn is_self(&self, identity: &Identity) -> bool {
        self.current_user.as_ref().is_some_and(|me| me.same_user(identity))
    }
}

/// Text being typed, with a cursor counted in characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
    cursor: usize,
}

impl InputBuffer {
    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor position in characters, `0..=len()`.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// `true` if no text has been typed.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Text before and after the cursor.
    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.text.split_at(self.byte_offset(self.cursor))
    }

    /// Insert `c` at the cursor and advance past it.
    pub fn insert(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor. `false` at position 0.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_offset(self.cursor);
        self.text.remove(at);
        true
    }

    /// Delete the character under the cursor. `false` at the end.
    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.len() {
            return false;
        }
        let at = self.byte_offset(self.cursor);
        self.text.remove(at);
        true
    }

    /// Move the cursor one character left. `false` if already at 0.
    pub fn left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Move the cursor one character right. `false` if already at the end.
    pub fn right(&mut self) -> bool {
        if self.cursor >= self.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Jump to the start.
    pub fn home(&mut self) {
        self.cursor = 0;
    }

    /// Jump to the end.
    pub fn end(&mut self) {
        self.cursor = self.len();
    }

    /// Empty the buffer and reset the cursor.
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.text.char_indices().nth(chars).map_or(self.text.len(), |(i, _)| i)
    }
}

/// Owner of all client state.
#[derive(Debug, Clone, Default)]
pub struct Store {
    connection: ConnectionState,
    messages: VecDeque<Message>,
    /// Connected users in arrival order.
    users: Vec<Identity>,
    /// Known rooms in announcement order.
    rooms: Vec<Room>,
    /// Room the local user is in. Refers into `rooms` by id.
    current_room: Option<RoomId>,
    input: InputBuffer,
}

impl Store {
    /// Create an empty, disconnected store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an inbound event and return the notifications to publish.
    pub fn apply(&mut self, event: InboundEvent) -> Vec<Notification> {
        let mut out = Vec::new();

        match event {
            InboundEvent::Connected { identity } => {
                let color = status_color(identity.as_ref());
                self.connect(identity);
                self.log("Connected to server.", color, &mut out);
                out.push(Notification::refresh(Topic::Identity));
                out.push(Notification::refresh(Topic::Roster));
                out.push(Notification::refresh(Topic::Rooms));
            },
            InboundEvent::Disconnected { identity } => {
                let color = status_color(identity.as_ref());
                self.disconnect(identity);
                self.log("Disconnected from server.", color, &mut out);
                out.push(Notification::refresh(Topic::Identity));
                out.push(Notification::refresh(Topic::Roster));
                out.push(Notification::refresh(Topic::Rooms));
                out.push(Notification::refresh(Topic::InputBar));
            },
            InboundEvent::Reconnecting => {
                self.log("Reconnecting...", ColorTag::new(ColorTag::DEFAULT), &mut out);
            },
            InboundEvent::KeysExchanged => {
                self.log("Keys exchanged.", ColorTag::new(ColorTag::DEFAULT), &mut out);
            },
            InboundEvent::Message { text, color } => self.log(text, color, &mut out),
            InboundEvent::Error { text } => self.log(text, ColorTag::new(ColorTag::ERROR), &mut out),
            InboundEvent::Success { text } => {
                self.log(text, ColorTag::new(ColorTag::SUCCESS), &mut out);
            },
            InboundEvent::UserEntered(identity) => {
                self.add_user(identity);
                out.push(Notification::refresh(Topic::Roster));
            },
            InboundEvent::UserLeft(identity) => {
                self.remove_user(&identity);
                out.push(Notification::refresh(Topic::Roster));
            },
            InboundEvent::CurrentUsers(users) => {
                self.replace_users(users);
                out.push(Notification::refresh(Topic::Roster));
            },
            InboundEvent::JoinedRoom(room) => {
                let id = room.id.clone();
                self.upsert_room(room);
                self.set_current_room(Some(id));
                out.push(Notification::refresh(Topic::Rooms));
            },
            InboundEvent::CreatedRoom(room) => {
                self.upsert_room(room);
                out.push(Notification::refresh(Topic::Rooms));
            },
            InboundEvent::LeftRoom(room) => {
                self.leave_room(&room.id);
                out.push(Notification::refresh(Topic::Rooms));
            },
            InboundEvent::DeletedRoom(room) => {
                self.remove_room(&room.id);
                out.push(Notification::refresh(Topic::Rooms));
            },
            InboundEvent::CurrentRooms(rooms) => {
                self.replace_rooms(rooms);
                out.push(Notification::refresh(Topic::Rooms));
            },
        }

        out
    }

    /// Mark connected as `identity` and drop it from the roster if listed.
    pub fn connect(&mut self, identity: Option<Identity>) {
        self.connection = ConnectionState { is_connected: true, current_user: identity };
        if let Some(Identity::Current { current_room_id: Some(room), .. }) =
            &self.connection.current_user
        {
            self.current_room = Some(room.clone());
        }
        self.exclude_self();
    }

    /// Reset everything, then mark disconnected as `identity`.
    pub fn disconnect(&mut self, identity: Option<Identity>) {
        self.clear();
        self.connection = ConnectionState { is_connected: false, current_user: identity };
    }

    /// Append a message, evicting the oldest beyond capacity.
    ///
    /// Timestamps are taken at append time and never go backwards, even if
    /// the wall clock does.
    pub fn push_message(&mut self, text: impl Into<String>, is_sent: bool, color: ColorTag) -> &Message {
        let now = Local::now();
        let timestamp = self.messages.back().map_or(now, |last| last.timestamp.max(now));

        if self.messages.len() >= MESSAGE_LOG_CAPACITY {
            self.messages.pop_front();
        }
        self.messages.push_back(Message { text: text.into(), is_sent, timestamp, color });

        let len = self.messages.len();
        &self.messages[len - 1]
    }

    /// Append a locally typed message in the local user's color.
    pub fn push_sent(&mut self, text: impl Into<String>) -> Vec<Notification> {
        let color = self
            .connection
            .current_user
            .as_ref()
            .map(|me| me.color().clone())
            .unwrap_or_default()
            .or(SENT_FALLBACK_COLOR);

        let message = self.push_message(text, true, color).clone();
        vec![
            Notification::refresh(Topic::MessageLog),
            Notification::with(Topic::MessageAppended, Payload::Message(message)),
        ]
    }

    /// Add or replace a user. Returns `false` (no-op) for the local user.
    pub fn add_user(&mut self, identity: Identity) -> bool {
        if self.connection.is_self(&identity) {
            return false;
        }
        let key = identity.key();
        match self.users.iter_mut().find(|u| u.key() == key) {
            Some(existing) => *existing = identity,
            None => self.users.push(identity),
        }
        true
    }

    /// Remove a user. Returns `false` for the local user or unknown users.
    pub fn remove_user(&mut self, identity: &Identity) -> bool {
        if self.connection.is_self(identity) {
            return false;
        }
        let key = identity.key();
        let before = self.users.len();
        self.users.retain(|u| u.key() != key);
        self.users.len() != before
    }

    /// Replace the roster wholesale. The local user is filtered out and
    /// duplicates collapse, last one winning.
    pub fn replace_users(&mut self, users: Vec<Identity>) {
        self.users.clear();
        for user in users {
            self.add_user(user);
        }
    }

    /// Insert a room or replace the one with the same id.
    pub fn upsert_room(&mut self, room: Room) {
        match self.rooms.iter_mut().find(|r| r.id == room.id) {
            Some(existing) => *existing = room,
            None => self.rooms.push(room),
        }
    }

    /// Remove a room by id, unsetting it as current room.
    pub fn remove_room(&mut self, id: &RoomId) -> bool {
        self.leave_room(id);
        let before = self.rooms.len();
        self.rooms.retain(|r| &r.id != id);
        self.rooms.len() != before
    }

    /// Replace the room directory wholesale. The current room survives only
    /// if it is still listed.
    pub fn replace_rooms(&mut self, rooms: Vec<Room>) {
        self.rooms.clear();
        for room in rooms {
            self.upsert_room(room);
        }
        if let Some(current) = &self.current_room
            && !self.rooms.iter().any(|r| &r.id == current)
        {
            self.current_room = None;
        }
    }

    /// Set (or unset) the current room.
    pub fn set_current_room(&mut self, id: Option<RoomId>) {
        self.current_room = id;
    }

    /// Unset the current room if it is `id`.
    pub fn leave_room(&mut self, id: &RoomId) {
        if self.current_room.as_ref() == Some(id) {
            self.current_room = None;
        }
    }

    /// Reset log, input, roster, rooms and identity to their initial state.
    pub fn clear(&mut self) {
        self.connection = ConnectionState::default();
        self.messages.clear();
        self.users.clear();
        self.rooms.clear();
        self.current_room = None;
        self.input.clear();
    }

    /// Connection status and local identity.
    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    /// Message log, oldest first.
    pub fn messages(&self) -> &VecDeque<Message> {
        &self.messages
    }

    /// Connected users, excluding the local user.
    pub fn users(&self) -> &[Identity] {
        &self.users
    }

    /// `true` if a user with this key is in the roster.
    pub fn has_user(&self, key: &IdentityKey) -> bool {
        self.users.iter().any(|u| &u.key() == key)
    }

    /// Known rooms.
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Look up a room by id.
    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| &r.id == id)
    }

    /// Id of the room the local user is in.
    pub fn current_room_id(&self) -> Option<&RoomId> {
        self.current_room.as_ref()
    }

    /// Room the local user is in, if it is in the directory.
    pub fn current_room(&self) -> Option<&Room> {
        self.current_room.as_ref().and_then(|id| self.room(id))
    }

    /// Input buffer.
    pub fn input(&self) -> &InputBuffer {
        &self.input
    }

    /// Input buffer, mutably. Reserved for the input controller and submit.
    pub(crate) fn input_mut(&mut self) -> &mut InputBuffer {
        &mut self.input
    }

    fn log(&mut self, text: impl Into<String>, color: ColorTag, out: &mut Vec<Notification>) {
        let message = self.push_message(text, false, color).clone();
        out.push(Notification::refresh(Topic::MessageLog));
        out.push(Notification::with(Topic::MessageAppended, Payload::Message(message)));
    }

    fn exclude_self(&mut self) {
        let connection = &self.connection;
        self.users.retain(|u| !connection.is_self(u));
    }
}

fn status_color(identity: Option<&Identity>) -> ColorTag {
    identity.map(|i| i.color().clone()).unwrap_or_default().or(ColorTag::DEFAULT)
}
