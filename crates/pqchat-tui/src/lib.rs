//! Terminal UI for pqchat
//!
//! A thin shell over [`pqchat_app::Session`] that provides terminal and
//! process I/O: it spawns the backend, feeds its output and the user's key
//! presses into the session, and draws the widgets the renderer hands it.
//!
//! All protocol and state logic lives in `pqchat-app` and `pqchat-proto`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod backend;
pub mod error;
pub mod input;
pub mod logging;
pub mod runtime;
pub mod terminal;
pub mod ui;

pub use backend::{BackendConfig, BackendEvent, BackendHandle};
pub use error::RuntimeError;
pub use runtime::Runtime;
pub use terminal::TerminalScreen;
