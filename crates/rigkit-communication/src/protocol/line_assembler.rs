//! Line framing of the receive stream.
//!
//! Bytes arrive in arbitrary chunks. The assembler buffers them and emits one
//! [`Line`] per LF, so the output does not depend on where chunk boundaries
//! fall.

use bytes::BytesMut;
use rigkit_core::Line;

const LF: u8 = b'\n';
const CR: u8 = b'\r';

/// Initial receive buffer capacity
const INITIAL_CAPACITY: usize = 256;

/// Reassembles LF-delimited lines from raw byte chunks.
///
/// After every [`push`](Self::push) the buffer holds at most one partial
/// line (the bytes after the last LF). Buffer growth is unbounded: a peer
/// that never sends LF grows it until it does.
#[derive(Debug)]
pub struct LineAssembler {
    /// Undecoded bytes of the current partial line
    buffer: BytesMut,
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl LineAssembler {
    /// Create an assembler with an empty buffer
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Append a chunk and return every line it completes, in arrival order.
    ///
    /// One trailing CR is stripped from each line and invalid UTF-8 is
    /// replaced with U+FFFD. Empty lines are emitted as empty [`Line`]s.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Line> {
        // Everything already buffered is known to be LF-free.
        let mut search_from = self.buffer.len();
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(offset) = self.buffer[search_from..].iter().position(|&b| b == LF) {
            let end = search_from + offset;
            let mut raw = self.buffer.split_to(end + 1);
            raw.truncate(end);
            if raw.last() == Some(&CR) {
                raw.truncate(end - 1);
            }
            lines.push(Line::new(String::from_utf8_lossy(&raw).into_owned()));
            search_from = 0;
        }

        if !lines.is_empty() {
            tracing::trace!(
                "Assembled {} line(s), {} byte(s) pending",
                lines.len(),
                self.buffer.len()
            );
        }
        lines
    }

    /// Bytes of the pending partial line
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the number of buffered bytes
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Discard any partial line
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
