//! User identity as carried by protocol metadata.
//!
//! The backend has shipped two identity shapes over time:
//!
//! - Legacy: `{"username": "...", "color": "..."}`. Users are told apart by
//!   the `(username, color)` pair.
//! - Current: `{"userId": "...", "username": "...", "color": "...",
//!   "currentRoomId": "..."}`. Users are told apart by `userId` alone.
//!
//! Both shapes are decoded here, at the parse boundary, into the [`Identity`]
//! union. Anything matching neither shape is rejected instead of coerced.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ProtocolError, Result, RoomId};

/// Opaque color tag forwarded untouched to the renderer (`#RGB`/`#RRGGBB`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorTag(String);

impl ColorTag {
    /// Color the backend assigns when a frame carries none.
    pub const DEFAULT: &'static str = "#7ee787";
    /// Color of `error` status lines.
    pub const ERROR: &'static str = "#F00";
    /// Color of `success` status lines.
    pub const SUCCESS: &'static str = "#0F0";

    /// Wrap a raw color string.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Color as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` if no color was provided.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// This color, or `fallback` if empty.
    #[must_use]
    pub fn or(self, fallback: &str) -> Self {
        if self.is_empty() { Self::new(fallback) } else { self }
    }
}

impl From<&str> for ColorTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl fmt::Display for ColorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque user identifier assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a raw user identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Key used to tell roster entries apart.
///
/// Keys only compare within one schema: a legacy key never equals a current
/// one. Use [`Identity::same_user`] to match across schemas.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IdentityKey {
    /// Legacy composite key.
    Composite {
        /// Display name.
        username: String,
        /// Assigned color.
        color: ColorTag,
    },
    /// Stable backend-assigned id.
    UserId(UserId),
}

/// A user identity, versioned by wire schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Identity keyed by `(username, color)`.
    Legacy {
        /// Display name.
        username: String,
        /// Assigned color.
        color: ColorTag,
    },
    /// Identity keyed by an opaque `userId`.
    Current {
        /// Backend-assigned user id.
        user_id: UserId,
        /// Display name.
        username: String,
        /// Assigned color.
        color: ColorTag,
        /// Room the user is in. `None` if not reported.
        current_room_id: Option<RoomId>,
    },
}

impl Identity {
    /// Build a legacy identity.
    pub fn legacy(username: impl Into<String>, color: impl Into<String>) -> Self {
        Self::Legacy { username: username.into(), color: ColorTag::new(color) }
    }

    /// Build a current identity without room information.
    pub fn current(
        user_id: impl Into<String>,
        username: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self::Current {
            user_id: UserId::new(user_id),
            username: username.into(),
            color: ColorTag::new(color),
            current_room_id: None,
        }
    }

    /// Comparison key for this identity.
    pub fn key(&self) -> IdentityKey {
        match self {
            Self::Legacy { username, color } => {
                IdentityKey::Composite { username: username.clone(), color: color.clone() }
            },
            Self::Current { user_id, .. } => IdentityKey::UserId(user_id.clone()),
        }
    }

    /// `true` if both identities name the same user.
    ///
    /// The `userId` decides when both sides carry one. Otherwise the
    /// `(username, color)` pair does: the server reports other users in the
    /// legacy shape even to clients that know their own `userId`.
    pub fn same_user(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Current { user_id: a, .. }, Self::Current { user_id: b, .. }) => a == b,
            _ => self.username() == other.username() && self.color() == other.color(),
        }
    }

    /// Display name.
    pub fn username(&self) -> &str {
        match self {
            Self::Legacy { username, .. } | Self::Current { username, .. } => username,
        }
    }

    /// Assigned color.
    pub fn color(&self) -> &ColorTag {
        match self {
            Self::Legacy { color, .. } | Self::Current { color, .. } => color,
        }
    }

    /// Decode a metadata object into an identity.
    ///
    /// `kind` is the frame type, used for error context only.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnknownSchema` if the value matches neither the
    ///   legacy nor the current shape.
    pub fn from_metadata(kind: &str, value: &serde_json::Value) -> Result<Self> {
        WireIdentity::deserialize(value)
            .map(Identity::from)
            .map_err(|_| ProtocolError::UnknownSchema { kind: kind.to_string() })
    }
}

/// Wire shapes for identity metadata, most recent first.
///
/// Untagged: serde tries `Current` (requires `userId`) before `Legacy`
/// (requires `username`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireIdentity {
    Current {
        #[serde(rename = "userId")]
        user_id: String,
        username: String,
        #[serde(default)]
        color: String,
        #[serde(rename = "currentRoomId", default)]
        current_room_id: Option<String>,
    },
    Legacy {
        username: String,
        #[serde(default)]
        color: String,
    },
}

impl From<WireIdentity> for Identity {
    fn from(wire: WireIdentity) -> Self {
        match wire {
            // An empty id means the backend had not assigned one yet.
            WireIdentity::Current { user_id, username, color, .. } if user_id.is_empty() => {
                Identity::legacy(username, color)
            },
            WireIdentity::Current { user_id, username, color, current_room_id } => {
                Identity::Current {
                    user_id: UserId::new(user_id),
                    username,
                    color: ColorTag::new(color),
                    current_room_id: current_room_id.filter(|id| !id.is_empty()).map(RoomId::new),
                }
            },
            WireIdentity::Legacy { username, color } => Identity::legacy(username, color),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn current_schema_keys_by_user_id() {
        let value = json!({"userId": "u1", "username": "alice", "color": "#abc"});
        let identity = Identity::from_metadata("connected", &value).unwrap();

        assert_eq!(identity.key(), IdentityKey::UserId(UserId::new("u1")));
        assert_eq!(identity.username(), "alice");
    }

    #[test]
    fn same_user_id_with_new_color_is_same_user() {
        let a = Identity::current("u1", "alice", "#abc");
        let b = Identity::current("u1", "alice", "#def");
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn same_user_across_schemas() {
        let me = Identity::current("c1", "alice", "#abc");

        assert!(me.same_user(&Identity::legacy("alice", "#abc")));
        assert!(Identity::legacy("alice", "#abc").same_user(&me));
        assert!(!me.same_user(&Identity::legacy("alice", "#def")));
        assert!(!me.same_user(&Identity::legacy("bob", "#abc")));

        // Both ids known: the id wins over name and color.
        assert!(me.same_user(&Identity::current("c1", "alice2", "#fff")));
        assert!(!me.same_user(&Identity::current("c2", "alice", "#abc")));
    }

    #[test]
    fn keys_order_by_schema_then_fields() {
        let mut keys = vec![
            Identity::current("u2", "b", "#1").key(),
            Identity::legacy("b", "#2").key(),
            Identity::legacy("a", "#9").key(),
            Identity::current("u1", "a", "#1").key(),
        ];
        keys.sort();
        assert_eq!(keys, vec![
            Identity::legacy("a", "#9").key(),
            Identity::legacy("b", "#2").key(),
            Identity::current("u1", "a", "#1").key(),
            Identity::current("u2", "b", "#1").key(),
        ]);
    }

    #[test]
    fn legacy_schema_keys_by_name_and_color() {
        let value = json!({"username": "bob", "color": "#123"});
        let identity = Identity::from_metadata("user_entered_chat", &value).unwrap();

        assert_eq!(identity, Identity::legacy("bob", "#123"));
        assert_ne!(identity.key(), Identity::legacy("bob", "#456").key());
    }

    #[test]
    fn empty_user_id_falls_back_to_legacy() {
        let value = json!({"userId": "", "username": "bob", "color": "#123"});
        let identity = Identity::from_metadata("connected", &value).unwrap();
        assert!(matches!(identity, Identity::Legacy { .. }));
    }

    #[test]
    fn current_room_id_is_captured() {
        let value =
            json!({"userId": "u1", "username": "a", "color": "", "currentRoomId": "lobby"});
        let identity = Identity::from_metadata("connected", &value).unwrap();

        assert!(matches!(
            identity,
            Identity::Current { current_room_id: Some(ref id), .. } if id.as_str() == "lobby"
        ));
    }

    #[test]
    fn unknown_shape_is_rejected() {
        let value = json!({"name": "carol"});
        let err = Identity::from_metadata("user_entered_chat", &value).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownSchema { ref kind } if kind == "user_entered_chat"));

        assert!(Identity::from_metadata("x", &json!("alice")).is_err());
    }
}
