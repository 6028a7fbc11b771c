//! Protocol codec for the pqchat backend process.
//!
//! The backend process speaks line-delimited JSON over its standard streams.
//! Each frame is one JSON object terminated by `\n`:
//!
//! ```text
//! TUI -> backend: {"type":"connect"|"send","value":"..."}
//! backend -> TUI: {"type":"...","value":"...","metadata":{...}}
//! ```
//!
//! Some inbound values are themselves JSON documents encoded as strings (user
//! and room lists, single rooms). Decoding is therefore split into two
//! explicit stages:
//!
//! 1. [`decode_frame`] turns one line into a raw [`InboundFrame`].
//! 2. [`InboundEvent::from_frame`] maps the frame onto a typed event, decoding
//!    nested values and classifying identity metadata.
//!
//! # Components
//!
//! - [`LineDecoder`]: Reassembles lines across arbitrary read boundaries
//! - [`InboundFrame`] / [`InboundEvent`]: Raw and typed inbound frames
//! - [`OutboundCommand`]: Commands written to the backend's stdin
//! - [`Identity`] / [`Room`]: Entities carried by the protocol

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod codec;
mod error;
mod event;
mod frame;
mod identity;
mod room;

pub use codec::{LineDecoder, MAX_LINE_LEN};
pub use error::{ProtocolError, Result};
pub use event::{InboundEvent, InboundKind};
pub use frame::{CommandKind, InboundFrame, OutboundCommand, decode_frame};
pub use identity::{ColorTag, Identity, IdentityKey, UserId};
pub use room::{Room, RoomId};
