//! Result types for driven sessions

mod error;

pub use error::{DriverError, PatternError};

use portable_pty::ExitStatus;

/// One response written to the child.
///
/// Produced by [`Responder::next_exchange`](crate::Responder::next_exchange)
/// whenever a rule matches the accumulated output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// Index of the rule that fired (0-based, in priority order).
    pub rule_index: usize,

    /// Name of the rule that fired.
    pub rule: String,

    /// Human readable notice printed before the response is written.
    pub notice: String,

    /// Bytes written to the child's input.
    pub response: Vec<u8>,
}

/// Everything observed while driving one session to completion.
///
/// # Examples
///
/// ```no_run
/// use convex_deploy::{convex, Driver, Session};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::spawn("npx convex dev --once")?;
/// let driver = Driver::new(convex::responder()?);
/// let transcript = driver
///     .run(session, &mut std::io::stdout(), std::future::pending::<std::io::Result<()>>())
///     .await?;
///
/// for exchange in &transcript.exchanges {
///     println!("answered {} with {:?}", exchange.rule, exchange.response);
/// }
/// println!("exit code: {}", transcript.exit_status.exit_code());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Transcript {
    /// All output read from the child, decoded permissively.
    pub output: String,

    /// Responses written to the child, in the order they were sent.
    pub exchanges: Vec<Exchange>,

    /// Whether the session ended because of an external interrupt.
    pub interrupted: bool,

    /// Exit status reaped from the child during cleanup.
    pub exit_status: ExitStatus,
}

impl Transcript {
    /// Number of times the named rule fired during the session.
    pub fn fire_count(&self, rule: &str) -> usize {
        self.exchanges.iter().filter(|e| e.rule == rule).count()
    }
}
