//! Trigger patterns for prompt detection

mod matcher;

pub use matcher::{ExactMatcher, IgnoreCaseMatcher, Matcher, RegexMatcher};

use crate::result::PatternError;
use regex::Regex;

/// Text whose appearance in the accumulated output identifies a prompt.
///
/// Triggers are always tested against everything the child has printed so
/// far, so a prompt split across several reads is still recognized.
///
/// # Examples
///
/// ```
/// use convex_deploy::Trigger;
///
/// // Literal, case-sensitive
/// let login = Trigger::exact("Would you like to login to your account?");
///
/// // Literal, case-insensitive
/// let project = Trigger::ignore_case("project name");
///
/// // Regular expression
/// let confirm = Trigger::regex(r"\(y/N\)\s*$").unwrap();
/// ```
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Case-sensitive literal substring.
    Exact(String),

    /// Case-insensitive literal substring.
    IgnoreCase(String),

    /// Regular expression match anywhere in the output.
    Regex(Regex),
}

impl Trigger {
    /// Create a case-sensitive literal trigger.
    pub fn exact(s: impl Into<String>) -> Self {
        Trigger::Exact(s.into())
    }

    /// Create a case-insensitive literal trigger.
    pub fn ignore_case(s: impl Into<String>) -> Self {
        Trigger::IgnoreCase(s.into())
    }

    /// Create a regex trigger.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InvalidRegex`] if the pattern does not compile.
    pub fn regex(pattern: &str) -> Result<Self, PatternError> {
        Ok(Trigger::Regex(Regex::new(pattern)?))
    }

    /// Convert the trigger to a matcher implementation
    pub fn to_matcher(&self) -> Result<Box<dyn Matcher>, PatternError> {
        match self {
            Trigger::Exact(s) => Ok(Box::new(ExactMatcher::new(s.as_bytes())?)),
            Trigger::IgnoreCase(s) => Ok(Box::new(IgnoreCaseMatcher::new(s)?)),
            Trigger::Regex(r) => Ok(Box::new(RegexMatcher::new(r.clone()))),
        }
    }
}
