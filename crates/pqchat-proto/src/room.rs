//! Room entity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque room identifier assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wrap a raw room identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Chat room as announced by the backend.
///
/// The backend serializes its room struct without JSON tags, so the wire keys
/// are capitalised (`ID`, `Name`, `CreatedBy`). Unknown keys (such as the
/// server-side connection map) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Room identifier.
    #[serde(rename = "ID")]
    pub id: RoomId,
    /// Display name.
    #[serde(rename = "Name", default)]
    pub name: String,
    /// Creator's client id. `None` for rooms announced without one.
    #[serde(rename = "CreatedBy", default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl Room {
    /// Create a room with an id and name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: RoomId::new(id), name: name.into(), created_by: None }
    }
}
