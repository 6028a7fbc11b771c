//! Line framing for the backend's output stream.
//!
//! Reads from a pipe deliver arbitrary byte ranges: a read may hold zero, one
//! or many complete frames, and may end in the middle of a frame (or in the
//! middle of a multi-byte UTF-8 character). [`LineDecoder`] buffers bytes
//! until a newline arrives and only then yields the line.

use bytes::{Buf, BytesMut};

use crate::{ProtocolError, Result};

/// Largest line the decoder accepts (1 MiB), not counting its terminator.
///
/// Enforced on complete lines and on partial lines still waiting for a
/// newline alike.
pub const MAX_LINE_LEN: usize = 1024 * 1024;

/// Incremental newline splitter.
///
/// # Invariants
///
/// - Lines are yielded in stream order, each exactly once.
/// - The output does not depend on how the stream is split into chunks.
/// - Memory is bounded by [`MAX_LINE_LEN`] plus one chunk.
#[derive(Debug, Default)]
pub struct LineDecoder {
    /// Bytes received after the last newline.
    buf: BytesMut,
    /// Bytes of `buf` already searched for a newline.
    scanned: usize,
    /// Dropping the rest of an oversized line until its newline.
    discarding: bool,
}

impl LineDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read's worth of bytes.
    ///
    /// Returns every line completed by this chunk, without its terminator.
    /// Blank lines are skipped. Invalid UTF-8 is replaced, not rejected.
    ///
    /// An oversized line yields a single `ProtocolError::LineTooLong` and is
    /// skipped up to and including its newline.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<String>> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();

        while let Some(offset) = self.buf[self.scanned..].iter().position(|&b| b == b'\n') {
            let mut line = self.buf.split_to(self.scanned + offset + 1);
            self.scanned = 0;
            line.truncate(line.len() - 1);

            if std::mem::take(&mut self.discarding) {
                continue;
            }
            if line.len() > MAX_LINE_LEN {
                tracing::error!(len = line.len(), max = MAX_LINE_LEN, "discarding oversized line");
                lines.push(Err(ProtocolError::LineTooLong { len: line.len() }));
                continue;
            }
            if let Some(text) = Self::text(&line) {
                lines.push(Ok(text));
            }
        }
        self.scanned = self.buf.len();

        if self.buf.len() > MAX_LINE_LEN {
            let len = self.buf.len();
            if !self.discarding {
                tracing::error!(len, max = MAX_LINE_LEN, "discarding oversized line");
                lines.push(Err(ProtocolError::LineTooLong { len }));
            }
            self.buf.advance(len);
            self.scanned = 0;
            self.discarding = true;
        }

        lines
    }

    /// Flush a final unterminated line at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        let line = self.buf.split();
        self.scanned = 0;
        if std::mem::take(&mut self.discarding) {
            return None;
        }
        Self::text(&line)
    }

    /// Bytes buffered while waiting for a newline.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    fn text(line: &[u8]) -> Option<String> {
        let text = String::from_utf8_lossy(line);
        let text = text.trim_end_matches('\r');
        if text.trim().is_empty() { None } else { Some(text.to_string()) }
    }
}
