//! Streaming AT command line codec
//!
//! Modem channels deliver commands as `AT<command>` terminated by a carriage
//! return (some hosts send `\r\n` or a bare `\n`). The codec buffers partial
//! input and yields one command per line with the `AT` prefix removed.

use crate::ProtocolCodec;

/// Maximum line length (reasonable limit to prevent unbounded buffering)
pub const MAX_LINE_LEN: usize = 256;

/// Streaming AT line codec
#[derive(Debug, Default)]
pub struct AtLineCodec {
    buffer: Vec<u8>,
}

impl AtLineCodec {
    /// Create a new line codec
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MAX_LINE_LEN),
        }
    }

    /// Strip the `AT` prefix (either case) from a command line
    pub fn strip_at_prefix(line: &str) -> &str {
        match line.get(..2) {
            Some(prefix) if prefix.eq_ignore_ascii_case("AT") => &line[2..],
            _ => line,
        }
    }
}

impl ProtocolCodec for AtLineCodec {
    type Command = String;

    fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);

        // A line this long without a terminator is garbage; keep only the tail
        if self.buffer.len() > MAX_LINE_LEN * 4 {
            let start = self.buffer.len() - MAX_LINE_LEN;
            self.buffer = self.buffer[start..].to_vec();
        }
    }

    fn next_command(&mut self) -> Option<Self::Command> {
        self.next_command_with_bytes().map(|(cmd, _)| cmd)
    }

    fn next_command_with_bytes(&mut self) -> Option<(Self::Command, Vec<u8>)> {
        loop {
            let term_pos = self
                .buffer
                .iter()
                .position(|&b| b == b'\r' || b == b'\n')?;

            let line_bytes: Vec<u8> = self.buffer.drain(..=term_pos).collect();
            let line = String::from_utf8_lossy(&line_bytes[..line_bytes.len() - 1]);
            let line = line.trim();

            if line.is_empty() {
                // Second half of a CRLF pair, or a blank line
                continue;
            }

            tracing::trace!("AT line: {:?}", line);
            let cmd = Self::strip_at_prefix(line).to_string();
            return Some((cmd, line_bytes));
        }
    }

    fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::AtLineCodec;
    use crate::ProtocolCodec;

    #[test]
    fn test_single_line() {
        let mut codec = AtLineCodec::new();
        codec.push_bytes(b"AT+CRSM=176,28589,0,0,4\r");
        assert_eq!(codec.next_command().unwrap(), "+CRSM=176,28589,0,0,4");
        assert!(codec.next_command().is_none());
    }

    #[test]
    fn test_streaming_parse() {
        let mut codec = AtLineCodec::new();

        codec.push_bytes(b"AT+CRSM=192,2");
        assert!(codec.next_command().is_none());

        codec.push_bytes(b"8436,0,0,15\r\n");
        assert_eq!(codec.next_command().unwrap(), "+CRSM=192,28436,0,0,15");
        assert!(codec.next_command().is_none());
    }

    #[test]
    fn test_multiple_lines_and_blank_lines() {
        let mut codec = AtLineCodec::new();
        codec.push_bytes(b"\r\nat+CRSM=176,28438,0,0,2\r\n\r\nAT+CPIN?\n");

        assert_eq!(codec.next_command().unwrap(), "+CRSM=176,28438,0,0,2");
        assert_eq!(codec.next_command().unwrap(), "+CPIN?");
        assert!(codec.next_command().is_none());
    }

    #[test]
    fn test_without_prefix() {
        let mut codec = AtLineCodec::new();
        codec.push_bytes(b"+CRSM=242,0,0,0,0\r");
        let (cmd, raw) = codec.next_command_with_bytes().unwrap();
        assert_eq!(cmd, "+CRSM=242,0,0,0,0");
        assert_eq!(raw, b"+CRSM=242,0,0,0,0\r");
    }

    #[test]
    fn test_overlong_garbage_is_dropped() {
        let mut codec = AtLineCodec::new();
        codec.push_bytes(&[b'x'; 2000]);
        codec.push_bytes(b"\rAT+CRSM=176,28438,0,0,2\r");

        // The truncated garbage line comes out first, then the real command
        let first = codec.next_command().unwrap();
        assert!(first.len() <= super::MAX_LINE_LEN);
        assert_eq!(codec.next_command().unwrap(), "+CRSM=176,28438,0,0,2");
    }

    #[test]
    fn test_clear() {
        let mut codec = AtLineCodec::new();
        codec.push_bytes(b"AT+CRSM=17");
        codec.clear();
        codec.push_bytes(b"6,28438,0,0,2\r");
        assert_eq!(codec.next_command().unwrap(), "6,28438,0,0,2");
    }
}
