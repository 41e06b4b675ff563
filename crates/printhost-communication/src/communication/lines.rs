//! Inbound line framing
//!
//! The printer answers with `\n`-terminated text lines; reads from the port
//! return arbitrary chunks, so bytes are buffered until a terminator shows up.

/// Accumulates raw bytes and yields complete, trimmed lines
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: Vec<u8>,
}

impl LineBuffer {
    /// Create an empty line buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed.
    ///
    /// Lines are decoded only once complete, so a UTF-8 sequence split
    /// across reads survives. Blank lines are skipped; a trailing partial
    /// line stays buffered.
    pub fn push(&mut self, data: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(data);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..pos]).trim().to_string();

            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }

    /// Bytes held back waiting for a terminator
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Drop any partial line
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_across_chunks() {
        let mut lines = LineBuffer::new();
        assert!(lines.push(b"o").is_empty());
        assert_eq!(lines.push(b"k\nT:20"), vec!["ok".to_string()]);
        assert_eq!(lines.pending(), b"T:20");
        assert_eq!(lines.push(b"5.3 /0.0\r\n"), vec!["T:205.3 /0.0".to_string()]);
        assert!(lines.pending().is_empty());
    }

    #[test]
    fn test_multibyte_character_split_across_reads() {
        let mut lines = LineBuffer::new();
        let text = "echo:Target 200.0°C\n".as_bytes();
        let split = text.iter().position(|&b| b == 0xC2).unwrap() + 1;

        assert!(lines.push(&text[..split]).is_empty());
        assert_eq!(
            lines.push(&text[split..]),
            vec!["echo:Target 200.0°C".to_string()]
        );
    }

    #[test]
    fn test_skips_blank_lines() {
        let mut lines = LineBuffer::new();
        assert_eq!(
            lines.push(b"start\n\r\n\nok\n"),
            vec!["start".to_string(), "ok".to_string()]
        );
    }

    #[test]
    fn test_clear_drops_partial_line() {
        let mut lines = LineBuffer::new();
        lines.push(b"echo:busy");
        lines.clear();
        assert_eq!(lines.push(b"ok\n"), vec!["ok".to_string()]);
    }
}
