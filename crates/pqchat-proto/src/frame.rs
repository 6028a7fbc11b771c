//! Raw protocol frames.
//!
//! An [`InboundFrame`] is the first decoding stage: one line of backend output
//! parsed into `{type, value, metadata?}` without interpreting `type`. See
//! [`crate::InboundEvent`] for the typed second stage.

use serde::{Deserialize, Serialize};

use crate::{ProtocolError, Result};

/// One line of backend output, structurally decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundFrame {
    /// Frame type (`connected`, `message`, ...). Not validated here.
    #[serde(rename = "type")]
    pub kind: String,
    /// Frame value. Plain text or a JSON document encoded as a string.
    pub value: String,
    /// Identity metadata. `None` if absent or `null`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// Top-level color used by legacy backends that send no metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl InboundFrame {
    /// Create a frame with a type and value and no metadata.
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self { kind: kind.into(), value: value.into(), metadata: None, color: None }
    }

    /// Attach metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Decode one protocol line into a raw frame.
///
/// Surrounding whitespace (including a trailing `\r`) is ignored.
///
/// # Errors
///
/// - `ProtocolError::MalformedFrame` if the line is not a JSON object with a
///   string `type` and a string `value`.
pub fn decode_frame(line: &str) -> Result<InboundFrame> {
    serde_json::from_str(line.trim()).map_err(ProtocolError::MalformedFrame)
}

/// Commands the client sends to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Open the backend's server connection. Sent once at startup.
    Connect,
    /// Send a chat line (or a backend slash command) typed by the user.
    Send,
}

/// Outbound frame written to the backend's stdin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundCommand {
    /// Command type.
    #[serde(rename = "type")]
    pub kind: CommandKind,
    /// Command payload.
    pub value: String,
}

impl OutboundCommand {
    /// Create a command.
    pub fn new(kind: CommandKind, value: impl Into<String>) -> Self {
        Self { kind, value: value.into() }
    }

    /// Serialize to a single newline-terminated JSON line.
    ///
    /// JSON string escaping guarantees the only `\n` in the output is the
    /// terminator, whatever `value` contains.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Encode` if serialization fails.
    pub fn encode_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self).map_err(ProtocolError::Encode)?;
        line.push('\n');
        Ok(line)
    }
}
