//! Line-based codec for NUT communication.
//!
//! Every request and every reply line is UTF-8 text terminated with `\n`.
//! No line length limit is enforced.

use bytes::BytesMut;

/// Line terminator used on the wire.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Initial capacity of the receive buffer.
const INITIAL_CAPACITY: usize = 512;

/// A codec for reading and writing protocol lines.
///
/// Accumulates received bytes until a complete `\n`-terminated line is
/// available. A `\r` immediately before the terminator is dropped.
#[derive(Debug, Default)]
pub struct LineCodec {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
}

impl LineCodec {
    /// Create a new line codec.
    pub fn new() -> Self {
        LineCodec {
            buffer: BytesMut::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode a complete line from the buffer.
    ///
    /// Returns `Some(line)` without its terminator, or `None` if more data is
    /// needed. Empty lines are returned as empty strings.
    pub fn decode_line(&mut self) -> Option<String> {
        let end = self.buffer.iter().position(|&b| b == LINE_TERMINATOR)?;

        let mut line = self.buffer.split_to(end + 1);
        line.truncate(end);
        if line.last() == Some(&b'\r') {
            line.truncate(end - 1);
        }

        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Take whatever is left in the buffer as a final, unterminated line.
    ///
    /// Used when the peer closes the stream without a trailing `\n`.
    pub fn take_remaining(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = self.buffer.split();
        Some(String::from_utf8_lossy(&rest).into_owned())
    }

    /// Encode a line for transmission.
    ///
    /// Appends the `\n` terminator.
    pub fn encode_line(line: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(LINE_TERMINATOR);
        buf
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
