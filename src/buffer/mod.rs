//! Buffer management for process output

mod utf8;

pub use utf8::LossyDecoder;

/// Cumulative text of everything the child has printed.
///
/// The buffer is never reset or bounded: prompt matching always looks at the
/// whole session output, not just the latest chunk.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    text: String,
    decoder: LossyDecoder,
}

impl OutputBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode and append a chunk, returning the newly decoded text
    pub fn append(&mut self, data: &[u8]) -> &str {
        let start = self.text.len();
        self.decoder.decode_into(data, &mut self.text);
        &self.text[start..]
    }

    /// Get the accumulated text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length of the accumulated text in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether nothing has been decoded yet
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether the accumulated text contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }

    /// Consume the buffer, returning the accumulated text
    pub fn into_string(self) -> String {
        self.text
    }
}
