//! Incremental UTF-8 decoding of a chunked response body.
//!
//! A read may end in the middle of a multi-byte character. The incomplete
//! tail is held back and completed by the next read, so a split character
//! never decodes to U+FFFD.

#[cfg(test)]
#[path = "decode_test.rs"]
mod decode_test;

const REPLACEMENT: char = '\u{FFFD}';

/// Streaming UTF-8 decoder; state is carried between [`decode`](Self::decode) calls.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one read. Returns every complete character decoded so far,
    /// possibly an empty string when the read only extended a partial one.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut buf = std::mem::take(&mut self.pending);
        buf.extend_from_slice(chunk);

        let mut out = String::with_capacity(buf.len());
        let mut rest = buf.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    if let Ok(text) = std::str::from_utf8(valid) {
                        out.push_str(text);
                    }
                    match e.error_len() {
                        // Malformed bytes: replace and keep going.
                        Some(len) => {
                            out.push(REPLACEMENT);
                            rest = &tail[len..];
                        }
                        // Incomplete sequence at the end: wait for more input.
                        None => {
                            self.pending = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// End of input. A still-incomplete trailing sequence is malformed and
    /// flushes as U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let pending = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&pending).into_owned()
    }

    /// Whether part of a character is buffered.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
