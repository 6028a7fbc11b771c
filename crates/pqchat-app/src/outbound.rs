//! Handle to the backend's standard input.

use pqchat_proto::{CommandKind, OutboundCommand};
use tokio::sync::mpsc;

/// Fire-and-forget sender of outbound commands.
///
/// Encoded lines go through an unbounded channel to whatever task owns the
/// backend's stdin. Sends never fail from the caller's point of view: with no
/// backend attached, or after the writer has gone away, the command is dropped
/// with a debug log.
#[derive(Debug, Clone, Default)]
pub struct Outbound {
    tx: Option<mpsc::UnboundedSender<String>>,
}

impl Outbound {
    /// Handle with no backend attached. Every send is dropped.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Handle writing into `tx`.
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Handle plus the receiving end the stdin writer drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// `true` if a writer is attached and still listening.
    pub fn is_attached(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Encode and send one command.
    pub fn send(&self, kind: CommandKind, payload: impl Into<String>) {
        let Some(tx) = &self.tx else {
            tracing::debug!(?kind, "no backend attached, dropping command");
            return;
        };

        let line = match OutboundCommand::new(kind, payload).encode_line() {
            Ok(line) => line,
            Err(error) => {
                tracing::warn!(?kind, %error, "failed to encode command");
                return;
            },
        };

        if tx.send(line).is_err() {
            tracing::debug!(?kind, "backend writer closed, dropping command");
        }
    }
}
