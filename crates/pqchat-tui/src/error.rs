//! Runtime errors.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors that end the TUI.
///
/// Protocol problems never show up here: the session logs and skips them.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The backend process could not be started.
    #[error("failed to spawn backend {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A spawned backend is missing one of its piped standard streams.
    #[error("backend {stream} was not captured")]
    MissingPipe {
        /// Stream name (`stdin`, `stdout`, `stderr`).
        stream: &'static str,
    },

    /// The log file could not be opened.
    #[error("failed to open log file {}: {source}", path.display())]
    LogFile {
        /// Requested log path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}
