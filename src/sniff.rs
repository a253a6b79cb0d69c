//! Buffered magic-byte sniffing over raw byte streams.
//!
//! Compressed variant files hide their real format one layer down: a BCF is
//! gzip-block-compressed, so the BCF magic is only visible after inflation.
//! [`sniff`] buffers a small head, unwraps gzip transparently when the
//! signature is present, and re-buffers the head of the decompressed output,
//! so callers test magic bytes against the innermost stream. The buffered
//! bytes are replayed ahead of the remainder when the stream is consumed.

use std::io::{self, Read};

use flate2::read::MultiGzDecoder;

use crate::error::{ProbeError, Result};

/// Bytes buffered before any consumption decision: wide enough for the BCF
/// magic plus its two version bytes, and for the gzip signature.
pub(crate) const SNIFF_LEN: usize = 5;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A byte stream with its first bytes buffered for magic-number tests.
pub struct SniffedStream {
    head: Vec<u8>,
    rest: Box<dyn Read>,
}

impl SniffedStream {
    /// The buffered head. Streams shorter than the sniff window yield a
    /// shorter head.
    pub fn head(&self) -> &[u8] {
        &self.head
    }

    /// True if the buffered head starts with `magic`.
    pub fn starts_with(&self, magic: &[u8]) -> bool {
        self.head.starts_with(magic)
    }

    /// Reassemble the full stream, head first.
    pub fn into_reader(self) -> Box<dyn Read> {
        Box::new(io::Cursor::new(self.head).chain(self.rest))
    }
}

/// Buffer the first bytes of `raw`, unwrapping gzip if present.
///
/// Multi-member decoding is required: bgzip writes one gzip member per
/// block, and a plain `GzDecoder` would stop at the first boundary.
///
/// # Errors
///
/// Returns `ProbeError::Io` if reading the head fails (a gzipped stream
/// with a corrupt first block fails here, when the inner head is pulled).
pub fn sniff(raw: Box<dyn Read>, source_id: &str) -> Result<SniffedStream> {
    let outer = peek(raw).map_err(|e| ProbeError::io(source_id, e))?;

    if outer.starts_with(&GZIP_MAGIC) {
        let decoder = MultiGzDecoder::new(outer.into_reader());
        peek(Box::new(decoder)).map_err(|e| ProbeError::io(source_id, e))
    } else {
        Ok(outer)
    }
}

/// Read up to [`SNIFF_LEN`] bytes into an owned head, keeping the remainder.
fn peek(mut reader: Box<dyn Read>) -> io::Result<SniffedStream> {
    let mut head = vec![0u8; SNIFF_LEN];
    let mut filled = 0;
    while filled < SNIFF_LEN {
        let n = reader.read(&mut head[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    head.truncate(filled);
    Ok(SniffedStream { head, rest: reader })
}
