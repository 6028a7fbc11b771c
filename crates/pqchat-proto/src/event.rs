//! Typed inbound events.
//!
//! Second decoding stage: maps an [`InboundFrame`] onto an [`InboundEvent`],
//! decoding identity metadata and JSON documents nested inside `value`.
//!
//! Nested decoding lives here and nowhere else. Call sites receive fully typed
//! users and rooms.

use serde::de::DeserializeOwned;

use crate::{
    ColorTag, Identity, InboundFrame, ProtocolError, Result, Room, identity::WireIdentity,
};

/// Known inbound frame types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundKind {
    /// Backend connected to the chat server.
    Connected,
    /// Backend lost the chat server.
    Disconnected,
    /// Backend is retrying the chat server.
    Reconnecting,
    /// Key exchange with the chat server completed.
    KeysExchanged,
    /// Decrypted chat message.
    Message,
    /// Error reported by the backend or server.
    Error,
    /// Success notice reported by the backend or server.
    Success,
    /// Another user entered the chat.
    UserEnteredChat,
    /// Another user left the chat.
    UserLeftChat,
    /// Full roster resync.
    CurrentUsers,
    /// Local user joined a room.
    JoinedRoom,
    /// Local user left a room.
    LeftRoom,
    /// A room was created.
    CreatedRoom,
    /// A room was deleted.
    DeletedRoom,
    /// Full room directory resync.
    CurrentRooms,
}

impl InboundKind {
    /// Parse a wire type name. `None` for types this client does not know.
    ///
    /// `available_rooms` is accepted as an alias of `current_rooms`.
    pub fn parse(kind: &str) -> Option<Self> {
        Some(match kind {
            "connected" => Self::Connected,
            "disconnected" => Self::Disconnected,
            "reconnecting" => Self::Reconnecting,
            "keys_exchanged" => Self::KeysExchanged,
            "message" => Self::Message,
            "error" => Self::Error,
            "success" => Self::Success,
            "user_entered_chat" => Self::UserEnteredChat,
            "user_left_chat" => Self::UserLeftChat,
            "current_users" => Self::CurrentUsers,
            "joined_room" => Self::JoinedRoom,
            "left_room" => Self::LeftRoom,
            "created_room" => Self::CreatedRoom,
            "deleted_room" => Self::DeletedRoom,
            "current_rooms" | "available_rooms" => Self::CurrentRooms,
            _ => return None,
        })
    }

    /// Canonical wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Reconnecting => "reconnecting",
            Self::KeysExchanged => "keys_exchanged",
            Self::Message => "message",
            Self::Error => "error",
            Self::Success => "success",
            Self::UserEnteredChat => "user_entered_chat",
            Self::UserLeftChat => "user_left_chat",
            Self::CurrentUsers => "current_users",
            Self::JoinedRoom => "joined_room",
            Self::LeftRoom => "left_room",
            Self::CreatedRoom => "created_room",
            Self::DeletedRoom => "deleted_room",
            Self::CurrentRooms => "current_rooms",
        }
    }
}

/// Inbound event, fully decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Connected. Carries the local identity when the backend reports one.
    Connected {
        /// Local user's identity.
        identity: Option<Identity>,
    },
    /// Disconnected. Carries the local identity when the backend reports one.
    Disconnected {
        /// Local user's identity.
        identity: Option<Identity>,
    },
    /// Reconnection attempt in progress.
    Reconnecting,
    /// Key exchange completed.
    KeysExchanged,
    /// Chat message from another user.
    Message {
        /// Message text.
        text: String,
        /// Sender color.
        color: ColorTag,
    },
    /// Error status line.
    Error {
        /// Error text.
        text: String,
    },
    /// Success status line.
    Success {
        /// Success text.
        text: String,
    },
    /// User entered the chat.
    UserEntered(Identity),
    /// User left the chat.
    UserLeft(Identity),
    /// Authoritative roster.
    CurrentUsers(Vec<Identity>),
    /// Local user joined this room.
    JoinedRoom(Room),
    /// Local user left this room.
    LeftRoom(Room),
    /// Room was created.
    CreatedRoom(Room),
    /// Room was deleted.
    DeletedRoom(Room),
    /// Authoritative room directory.
    CurrentRooms(Vec<Room>),
}

impl InboundEvent {
    /// Decode a raw frame into a typed event.
    ///
    /// Returns `Ok(None)` for frame types this client does not know; those are
    /// forward-compatible no-ops, not errors.
    ///
    /// A malformed nested list (`current_users`, `current_rooms`) is logged
    /// and decoded as an empty list, since the event is an authoritative
    /// resync either way.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnknownSchema` if identity metadata matches no known
    ///   schema, or a user event carries no identity at all.
    /// - `ProtocolError::NestedPayload` if a single-room value is malformed.
    pub fn from_frame(frame: &InboundFrame) -> Result<Option<Self>> {
        let Some(kind) = InboundKind::parse(&frame.kind) else {
            return Ok(None);
        };

        let event = match kind {
            InboundKind::Connected => Self::Connected { identity: frame_identity(frame, kind)? },
            InboundKind::Disconnected => {
                Self::Disconnected { identity: frame_identity(frame, kind)? }
            },
            InboundKind::Reconnecting => Self::Reconnecting,
            InboundKind::KeysExchanged => Self::KeysExchanged,
            InboundKind::Message => {
                Self::Message { text: frame.value.clone(), color: frame_color(frame) }
            },
            InboundKind::Error => Self::Error { text: frame.value.clone() },
            InboundKind::Success => Self::Success { text: frame.value.clone() },
            InboundKind::UserEnteredChat => Self::UserEntered(required_identity(frame, kind)?),
            InboundKind::UserLeftChat => Self::UserLeft(required_identity(frame, kind)?),
            InboundKind::CurrentUsers => {
                let users = nested_list::<WireIdentity>(frame, kind)
                    .into_iter()
                    .map(Identity::from)
                    .collect();
                Self::CurrentUsers(users)
            },
            InboundKind::JoinedRoom => Self::JoinedRoom(nested(frame, kind)?),
            InboundKind::LeftRoom => Self::LeftRoom(nested(frame, kind)?),
            InboundKind::CreatedRoom => Self::CreatedRoom(nested(frame, kind)?),
            InboundKind::DeletedRoom => Self::DeletedRoom(nested(frame, kind)?),
            InboundKind::CurrentRooms => Self::CurrentRooms(nested_list(frame, kind)),
        };

        Ok(Some(event))
    }

    /// Wire kind this event was decoded from.
    pub fn kind(&self) -> InboundKind {
        match self {
            Self::Connected { .. } => InboundKind::Connected,
            Self::Disconnected { .. } => InboundKind::Disconnected,
            Self::Reconnecting => InboundKind::Reconnecting,
            Self::KeysExchanged => InboundKind::KeysExchanged,
            Self::Message { .. } => InboundKind::Message,
            Self::Error { .. } => InboundKind::Error,
            Self::Success { .. } => InboundKind::Success,
            Self::UserEntered(_) => InboundKind::UserEnteredChat,
            Self::UserLeft(_) => InboundKind::UserLeftChat,
            Self::CurrentUsers(_) => InboundKind::CurrentUsers,
            Self::JoinedRoom(_) => InboundKind::JoinedRoom,
            Self::LeftRoom(_) => InboundKind::LeftRoom,
            Self::CreatedRoom(_) => InboundKind::CreatedRoom,
            Self::DeletedRoom(_) => InboundKind::DeletedRoom,
            Self::CurrentRooms(_) => InboundKind::CurrentRooms,
        }
    }
}

/// Identity attached to a frame, if any.
///
/// Metadata wins. Without metadata, legacy backends identify the user by
/// `value` (username) and the top-level `color`.
fn frame_identity(frame: &InboundFrame, kind: InboundKind) -> Result<Option<Identity>> {
    match &frame.metadata {
        Some(metadata) => Identity::from_metadata(kind.as_str(), metadata).map(Some),
        None if frame.value.is_empty() => Ok(None),
        None => Ok(Some(Identity::legacy(
            frame.value.clone(),
            frame.color.clone().unwrap_or_default(),
        ))),
    }
}

fn required_identity(frame: &InboundFrame, kind: InboundKind) -> Result<Identity> {
    frame_identity(frame, kind)?
        .ok_or_else(|| ProtocolError::UnknownSchema { kind: kind.as_str().to_string() })
}

/// Sender color: metadata color, then top-level color, then the default.
fn frame_color(frame: &InboundFrame) -> ColorTag {
    let from_metadata = frame
        .metadata
        .as_ref()
        .and_then(|m| m.get("color"))
        .and_then(serde_json::Value::as_str)
        .filter(|c| !c.is_empty());

    let color = from_metadata.or(frame.color.as_deref()).unwrap_or_default();
    ColorTag::new(color).or(ColorTag::DEFAULT)
}

fn nested<T: DeserializeOwned>(frame: &InboundFrame, kind: InboundKind) -> Result<T> {
    serde_json::from_str(&frame.value)
        .map_err(|source| ProtocolError::NestedPayload { kind: kind.as_str().to_string(), source })
}

/// Decode a nested list. `null` (a nil slice on the backend) is an empty list.
fn nested_list<T: DeserializeOwned>(frame: &InboundFrame, kind: InboundKind) -> Vec<T> {
    match nested::<Option<Vec<T>>>(frame, kind) {
        Ok(items) => items.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "treating malformed list as empty");
            Vec::new()
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::decode_frame;

    fn decode(line: &str) -> Result<Option<InboundEvent>> {
        InboundEvent::from_frame(&decode_frame(line)?)
    }

    #[test]
    fn unknown_type_is_ignored() {
        assert_eq!(decode(r#"{"type":"exchange_keys","value":"x"}"#).unwrap(), None);
    }

    #[test]
    fn connected_with_current_metadata() {
        let event = decode(
            r##"{"type":"connected","value":"alice","metadata":{"userId":"u1","username":"alice","color":"#abc"}}"##,
        )
        .unwrap();

        assert_eq!(
            event,
            Some(InboundEvent::Connected { identity: Some(Identity::current("u1", "alice", "#abc")) })
        );
    }

    #[test]
    fn legacy_user_event_without_metadata() {
        let event = decode(r##"{"type":"user_entered_chat","value":"bob","color":"#123"}"##).unwrap();
        assert_eq!(event, Some(InboundEvent::UserEntered(Identity::legacy("bob", "#123"))));
    }

    #[test]
    fn user_event_without_any_identity_is_rejected() {
        let err = decode(r#"{"type":"user_left_chat","value":""}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownSchema { .. }));
    }

    #[test]
    fn current_users_is_decoded_in_two_stages() {
        let users = json!([
            {"userId": "u1", "username": "a", "color": "#1"},
            {"username": "b", "color": "#2"}
        ])
        .to_string();
        let frame = InboundFrame::new("current_users", users);

        let event = InboundEvent::from_frame(&frame).unwrap();
        assert_eq!(
            event,
            Some(InboundEvent::CurrentUsers(vec![
                Identity::current("u1", "a", "#1"),
                Identity::legacy("b", "#2"),
            ]))
        );
    }

    #[test]
    fn malformed_user_list_is_empty() {
        let frame = InboundFrame::new("current_users", "[{not json");
        assert_eq!(InboundEvent::from_frame(&frame).unwrap(), Some(InboundEvent::CurrentUsers(vec![])));

        let frame = InboundFrame::new("current_users", "null");
        assert_eq!(InboundEvent::from_frame(&frame).unwrap(), Some(InboundEvent::CurrentUsers(vec![])));
    }

    #[test]
    fn current_rooms_and_alias() {
        let rooms = r#"[{"ID":"r1","Name":"Lobby"},{"ID":"r2","Name":"Dev"}]"#;
        for kind in ["current_rooms", "available_rooms"] {
            let event = InboundEvent::from_frame(&InboundFrame::new(kind, rooms)).unwrap();
            assert_eq!(
                event,
                Some(InboundEvent::CurrentRooms(vec![Room::new("r1", "Lobby"), Room::new("r2", "Dev")]))
            );
        }
    }

    #[test]
    fn malformed_single_room_is_an_error() {
        let frame = InboundFrame::new("joined_room", "{\"Name\":\"no id\"}");
        let err = InboundEvent::from_frame(&frame).unwrap_err();
        assert!(matches!(err, ProtocolError::NestedPayload { ref kind, .. } if kind == "joined_room"));
    }

    #[test]
    fn message_color_falls_back_to_default() {
        let event = decode(r#"{"type":"message","value":"hey"}"#).unwrap();
        assert_eq!(
            event,
            Some(InboundEvent::Message { text: "hey".into(), color: ColorTag::new(ColorTag::DEFAULT) })
        );
    }

    #[test]
    fn kind_names_round_trip() {
        for name in [
            "connected",
            "disconnected",
            "reconnecting",
            "keys_exchanged",
            "message",
            "error",
            "success",
            "user_entered_chat",
            "user_left_chat",
            "current_users",
            "joined_room",
            "left_room",
            "created_room",
            "deleted_room",
            "current_rooms",
        ] {
            assert_eq!(InboundKind::parse(name).map(InboundKind::as_str), Some(name));
        }
    }
}
