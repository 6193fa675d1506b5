//! Trigger matcher implementations

use crate::result::PatternError;
use regex::{Regex, RegexBuilder};

/// Trait for testing accumulated output against a trigger
pub trait Matcher: Send + Sync {
    /// Whether the trigger appears anywhere in `text`
    fn is_match(&self, text: &str) -> bool;
}

/// Literal substring matcher using Boyer-Moore-Horspool algorithm
pub struct ExactMatcher {
    pattern: Vec<u8>,
    bad_char_table: [usize; 256],
}

impl ExactMatcher {
    /// Create a new exact matcher
    pub fn new(pattern: impl Into<Vec<u8>>) -> Result<Self, PatternError> {
        let pattern = pattern.into();

        if pattern.is_empty() {
            return Err(PatternError::EmptyPattern);
        }

        let mut bad_char_table = [pattern.len(); 256];
        for (i, &byte) in pattern.iter().enumerate().take(pattern.len() - 1) {
            bad_char_table[byte as usize] = pattern.len() - 1 - i;
        }

        Ok(Self {
            pattern,
            bad_char_table,
        })
    }

    /// Byte offset of the first occurrence in `haystack`
    pub fn find(&self, haystack: &[u8]) -> Option<usize> {
        let len = self.pattern.len();
        if haystack.len() < len {
            return None;
        }

        let mut pos = 0;
        while pos + len <= haystack.len() {
            if haystack[pos..pos + len] == self.pattern[..] {
                return Some(pos);
            }

            let shift_char = haystack[pos + len - 1];
            pos += self.bad_char_table[shift_char as usize];
        }

        None
    }
}

impl Matcher for ExactMatcher {
    fn is_match(&self, text: &str) -> bool {
        self.find(text.as_bytes()).is_some()
    }
}

/// Case-insensitive literal matcher
///
/// Equivalent to lower-casing both the text and the literal before a
/// substring test, without allocating a lower-cased copy of the buffer.
pub struct IgnoreCaseMatcher {
    regex: Regex,
}

impl IgnoreCaseMatcher {
    /// Create a new case-insensitive matcher for a literal
    pub fn new(literal: &str) -> Result<Self, PatternError> {
        if literal.is_empty() {
            return Err(PatternError::EmptyPattern);
        }

        let regex = RegexBuilder::new(&regex::escape(literal))
            .case_insensitive(true)
            .build()?;

        Ok(Self { regex })
    }
}

impl Matcher for IgnoreCaseMatcher {
    fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Regex matcher
pub struct RegexMatcher {
    regex: Regex,
}

impl RegexMatcher {
    /// Create a new regex matcher
    pub fn new(regex: Regex) -> Self {
        Self { regex }
    }
}

impl Matcher for RegexMatcher {
    fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}
