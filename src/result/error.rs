//! Error types for convex-deploy

use thiserror::Error;

/// Errors that can occur while driving an interactive session.
///
/// Only the "no data yet" condition of a non-blocking read is expected and is
/// never surfaced as an error. Everything here is fatal to the session and is
/// returned after cleanup has run.
///
/// # Examples
///
/// ```no_run
/// use convex_deploy::{DriverError, Session};
///
/// match Session::spawn("npx convex dev --once") {
///     Ok(_session) => println!("spawned"),
///     Err(DriverError::Spawn(reason)) => eprintln!("could not start: {}", reason),
///     Err(e) => eprintln!("pty failure: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum DriverError {
    /// I/O error.
    ///
    /// Returned when reading from or writing to the pty fails, or when the
    /// post-check cannot read the result artifact.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PTY error.
    ///
    /// Returned when the pseudo-terminal cannot be allocated or its endpoints
    /// cannot be cloned.
    #[error("PTY error: {0}")]
    Pty(String),

    /// Process spawning error.
    ///
    /// Returned when the command cannot be started (empty command, program not
    /// found, permission denied).
    #[error("Failed to spawn process: {0}")]
    Spawn(String),

    /// Invalid trigger pattern.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] PatternError),

    /// The child has already been reaped by [`Session::close`](crate::Session::close).
    #[error("Process has already exited")]
    ProcessExited,
}

/// Errors related to trigger creation.
#[derive(Error, Debug)]
pub enum PatternError {
    /// Invalid regex pattern.
    #[error("Invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// Empty pattern.
    ///
    /// An empty literal would match every buffer, including the empty one.
    #[error("Pattern cannot be empty")]
    EmptyPattern,
}
