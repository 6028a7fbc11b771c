//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding or encoding protocol frames.
///
/// All variants are recoverable: the caller logs the error and skips the
/// offending line. None of them should stop the event loop.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Line is not a JSON object of the shape `{type, value, metadata?}`.
    #[error("malformed frame: {0}")]
    MalformedFrame(#[source] serde_json::Error),

    /// Metadata object matches no known identity schema.
    #[error("{kind}: metadata matches no known identity schema")]
    UnknownSchema {
        /// Frame type the metadata was attached to.
        kind: String,
    },

    /// JSON document nested inside `value` failed to decode.
    #[error("{kind}: malformed nested payload: {source}")]
    NestedPayload {
        /// Frame type carrying the nested payload.
        kind: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// A single line exceeded [`crate::MAX_LINE_LEN`] and was discarded.
    #[error("line too long: {len} bytes buffered without a newline")]
    LineTooLong {
        /// Bytes buffered when the line was discarded.
        len: usize,
    },

    /// Outbound command failed to serialize.
    #[error("failed to encode command: {0}")]
    Encode(#[source] serde_json::Error),
}
