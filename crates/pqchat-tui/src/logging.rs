//! Log setup.
//!
//! Stdout belongs to the terminal UI, so logs only go to a file. Without
//! `--log-file` no subscriber is installed and every `tracing` call is a
//! no-op.

use std::{fs::OpenOptions, path::Path, sync::Mutex};

use tracing_subscriber::EnvFilter;

use crate::RuntimeError;

/// Install the global subscriber writing to `path`.
///
/// `RUST_LOG` takes precedence over `default_filter`.
pub fn init(path: Option<&Path>, default_filter: &str) -> Result<(), RuntimeError> {
    let Some(path) = path else {
        return Ok(());
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| RuntimeError::LogFile { path: path.to_path_buf(), source })?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "logging to {}", path.display());
    Ok(())
}
