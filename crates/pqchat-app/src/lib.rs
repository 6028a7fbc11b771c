//! Application layer for pqchat
//!
//! Client-side state and orchestration for a terminal UI driving an external
//! chat backend process. Everything here is synchronous and free of terminal
//! and process I/O, so the same code runs in production and in tests.
//!
//! # Components
//!
//! - [`EventBus`]: Topic-based publish/subscribe between the session and the
//!   renderers
//! - [`Store`]: Owner of all client state and its reconciliation rules
//! - [`InputController`]: Key handling for the input line
//! - [`Outbound`]: Fire-and-forget handle to the backend's stdin
//! - [`Session`]: Dispatcher wiring codec, store, bus and controller together
//! - [`Renderer`] / [`Screen`]: Refresh-driven contract with the terminal

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod bus;
mod input;
mod outbound;
mod session;
mod store;
pub mod view;

pub use bus::{EventBus, Mailbox, Notification, Payload, SubscriberId, Topic};
pub use input::{InputController, KeyInput, KeyOutcome, KeyPress, RendererKey};
pub use outbound::Outbound;
pub use session::{Session, SessionStats, SessionStep};
pub use store::{ConnectionState, InputBuffer, MESSAGE_LOG_CAPACITY, Message, Store};
pub use view::{Renderer, Screen, Widget};
