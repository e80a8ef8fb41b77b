//! Rig controller wire protocol
//!
//! The protocol is plain ASCII lines:
//!
//! - **Commands** (host → controller): a verb followed by space-separated
//!   `key=value` pairs, terminated with `\r\n`. Every verb except `PING` is
//!   prefixed with `CMD `.
//! - **Lines** (controller → host): free-form text terminated with `\n`, with
//!   an optional `\r` before it. Payloads are opaque to this layer.
//!
//! There is no checksum, no length prefix, and no acknowledgment
//! correlation between commands and received lines.

mod commands;
mod line_assembler;

pub use commands::{Command, ParseVerbError, Verb, COMMAND_PREFIX};
pub use line_assembler::LineAssembler;

/// Terminator appended to every outgoing line
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Frame an outgoing line for the wire.
///
/// Any trailing CR/LF already present is replaced by a single `\r\n`.
pub fn encode_line(line: &str) -> Vec<u8> {
    let body = line.trim_end_matches(['\r', '\n']);
    let mut buf = Vec::with_capacity(body.len() + LINE_TERMINATOR.len());
    buf.extend_from_slice(body.as_bytes());
    buf.extend_from_slice(LINE_TERMINATOR);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_line_appends_crlf() {
        assert_eq!(encode_line("PING"), b"PING\r\n");
    }

    #[test]
    fn test_encode_line_does_not_double_terminate() {
        assert_eq!(encode_line("CMD GET_STATUS\n"), b"CMD GET_STATUS\r\n");
        assert_eq!(encode_line("CMD GET_STATUS\r\n"), b"CMD GET_STATUS\r\n");
    }

    #[test]
    fn test_encode_empty_line() {
        assert_eq!(encode_line(""), b"\r\n");
    }
}
