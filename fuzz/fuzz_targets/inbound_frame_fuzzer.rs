//! Fuzz target for the two inbound decoding stages
//!
//! # Strategy
//!
//! - Raw lines as arbitrary strings
//! - Structured frames with known kinds and arbitrary values, so the
//!   nested-JSON decoders for user and room lists are reached
//!
//! # Invariants
//!
//! - `decode_frame` and `InboundEvent::from_frame` never panic
//! - A decoded event reports the kind it was decoded from

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pqchat_proto::{InboundEvent, InboundFrame, InboundKind, decode_frame};

const KINDS: &[&str] = &[
    "connected",
    "disconnected",
    "reconnecting",
    "message",
    "keys_exchanged",
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
    "available_rooms",
];

#[derive(Debug, Arbitrary)]
enum Input {
    Line(String),
    Frame {
        kind: u8,
        value: String,
        user_id: Option<String>,
        username: Option<String>,
        color: Option<String>,
    },
}

fn check(frame: &InboundFrame) {
    if let Ok(Some(event)) = InboundEvent::from_frame(frame) {
        assert_eq!(Some(event.kind()), InboundKind::parse(&frame.kind));
    }
}

fuzz_target!(|input: Input| {
    match input {
        Input::Line(line) => {
            if let Ok(frame) = decode_frame(&line) {
                check(&frame);
            }
        },
        Input::Frame { kind, value, user_id, username, color } => {
            let kind = KINDS[usize::from(kind) % KINDS.len()];
            let mut metadata = serde_json::Map::new();
            for (key, field) in [("userId", user_id), ("username", username), ("color", color)] {
                if let Some(field) = field {
                    metadata.insert(key.to_string(), field.into());
                }
            }
            let frame = InboundFrame::new(kind, value).with_metadata(metadata.into());
            check(&frame);
        },
    }
});
