//! Fuzz target for line reassembly across read boundaries
//!
//! # Strategy
//!
//! - Arbitrary stdout bytes, including invalid UTF-8 and `\r\n`
//! - Arbitrary split points standing in for OS read sizes
//!
//! # Invariants
//!
//! - Decoded lines MUST NOT depend on where the stream was split, and
//!   oversized lines are rejected at the same positions
//! - No decoded line contains `\n` or is blank
//! - Buffered bytes never exceed `MAX_LINE_LEN` after a feed

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pqchat_proto::{LineDecoder, MAX_LINE_LEN};

#[derive(Debug, Arbitrary)]
struct Input {
    stream: Vec<u8>,
    splits: Vec<u16>,
}

/// Decoded lines, `None` standing for a rejected oversized line. The
/// reported length of a rejected line depends on chunking.
fn decode(chunks: &[&[u8]]) -> Vec<Option<String>> {
    let mut decoder = LineDecoder::new();
    let mut out = Vec::new();
    for chunk in chunks {
        out.extend(decoder.feed(chunk).into_iter().map(Result::ok));
        assert!(decoder.pending() <= MAX_LINE_LEN, "pending {} bytes", decoder.pending());
    }
    out.extend(decoder.finish().map(Some));
    out
}

fuzz_target!(|input: Input| {
    let whole = decode(&[&input.stream]);

    let mut chunks = Vec::new();
    let mut rest = input.stream.as_slice();
    for split in input.splits {
        if rest.is_empty() {
            break;
        }
        let at = usize::from(split) % (rest.len() + 1);
        let (head, tail) = rest.split_at(at);
        chunks.push(head);
        rest = tail;
    }
    chunks.push(rest);
    let chunked = decode(&chunks);

    for line in whole.iter().flatten() {
        assert!(!line.contains('\n'));
        assert!(!line.trim().is_empty());
    }

    assert_eq!(whole, chunked);
});
