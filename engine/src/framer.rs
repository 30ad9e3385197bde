//! Splits the engine's raw output into protocol lines.

/// Buffers engine output across reads and hands out complete lines only.
///
/// Framing happens on bytes, so a UTF-8 sequence torn across two reads is
/// reassembled before decoding. Lines are trimmed (this also drops the `\r`
/// of CRLF endings) and blank lines are skipped.
#[derive(Debug, Default)]
pub struct LineFramer {
    pending: Vec<u8>,
    // Prefix of `pending` already known to hold no newline.
    scanned: usize,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line it completed, in arrival order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(offset) = self.pending[from..].iter().position(|&b| b == b'\n') {
            let end = from + offset;
            if let Some(line) = decode_line(&self.pending[start..end]) {
                lines.push(line);
            }
            start = end + 1;
            from = start;
        }
        self.pending.drain(..start);
        self.scanned = self.pending.len();

        lines
    }

    /// Bytes of the unterminated fragment currently held back.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// End of stream. An unterminated fragment is incomplete by definition and
    /// is dropped; returns how many bytes were discarded.
    pub fn finish(&mut self) -> usize {
        let discarded = self.pending.len();
        if discarded > 0 {
            tracing::debug!("Discarding {} bytes of unterminated engine output", discarded);
        }
        self.pending.clear();
        self.scanned = 0;
        discarded
    }
}

fn decode_line(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
