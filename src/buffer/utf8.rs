//! Permissive incremental UTF-8 decoding

use bytes::{Buf, BytesMut};

/// Incremental UTF-8 decoder that drops invalid byte sequences.
///
/// A multi-byte character split across two reads is held back until the rest
/// of it arrives. Bytes that can never form a valid character are discarded.
#[derive(Debug, Default)]
pub struct LossyDecoder {
    pending: BytesMut,
}

impl LossyDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `data`, appending the valid text to `out`.
    pub fn decode_into(&mut self, data: &[u8], out: &mut String) {
        self.pending.extend_from_slice(data);

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));

                    match err.error_len() {
                        // Invalid sequence: skip it and keep decoding
                        Some(bad) => self.pending.advance(valid + bad),
                        // Truncated sequence at the end: wait for more bytes
                        None => {
                            self.pending.advance(valid);
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Number of bytes held back waiting for the rest of a character
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
