//! Post-run inspection of the generated configuration file

use crate::pattern::ExactMatcher;
use crate::result::{DriverError, PatternError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Outcome of inspecting the result artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The file exists and contains the marker.
    Configured,
    /// The file exists but does not contain the marker.
    MarkerMissing,
    /// The file does not exist.
    FileMissing,
}

/// Checks a file for a literal marker once the child has exited.
///
/// # Examples
///
/// ```no_run
/// use convex_deploy::{Outcome, PostCheck};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let check = PostCheck::new(".env.local", "NEXT_PUBLIC_CONVEX_URL=https://")?;
/// match check.check()? {
///     Outcome::Configured => println!("configured"),
///     Outcome::MarkerMissing => println!("marker missing"),
///     Outcome::FileMissing => println!("file missing"),
/// }
/// # Ok(())
/// # }
/// ```
pub struct PostCheck {
    path: PathBuf,
    marker: ExactMatcher,
}

impl PostCheck {
    /// Create a check for `marker` inside the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::EmptyPattern`] for an empty marker.
    pub fn new(path: impl Into<PathBuf>, marker: &str) -> Result<Self, PatternError> {
        Ok(Self {
            path: path.into(),
            marker: ExactMatcher::new(marker.as_bytes())?,
        })
    }

    /// Path being checked, as configured
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inspect the file, resolving a relative path against the current directory.
    pub fn check(&self) -> Result<Outcome, DriverError> {
        self.inspect(&self.path)
    }

    /// Inspect the file, resolving a relative path against `dir`.
    pub fn check_in(&self, dir: impl AsRef<Path>) -> Result<Outcome, DriverError> {
        self.inspect(&dir.as_ref().join(&self.path))
    }

    fn inspect(&self, path: &Path) -> Result<Outcome, DriverError> {
        let contents = match std::fs::read(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "result file not found");
                return Ok(Outcome::FileMissing);
            }
            Err(e) => return Err(DriverError::Io(e)),
        };

        let outcome = if self.marker.find(&contents).is_some() {
            Outcome::Configured
        } else {
            Outcome::MarkerMissing
        };
        debug!(path = %path.display(), ?outcome, "result file inspected");
        Ok(outcome)
    }
}
