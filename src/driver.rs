//! Poll loop that answers prompts on a running session

use crate::buffer::OutputBuffer;
use crate::responder::Responder;
use crate::result::{DriverError, Exchange, Transcript};
use crate::session::Session;
use std::future::Future;
use std::io::{self, Write};
use std::time::Duration;
use tracing::{info, warn};

/// Default sleep between polls when no output is available
const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Drives a [`Session`] to completion, answering prompts with a [`Responder`].
///
/// Each iteration checks whether the child has exited, then attempts a
/// non-blocking read. New output is appended to the cumulative buffer, echoed
/// to the console sink, and the whole buffer is offered to the responder. An
/// empty read sleeps for the poll interval and retries.
///
/// # Examples
///
/// ```no_run
/// use convex_deploy::{convex, Driver, Session};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::builder()
///     .clear_env("CONVEX_DEPLOYMENT")
///     .spawn("npx convex dev --once")?;
///
/// let transcript = Driver::new(convex::responder()?)
///     .poll_interval(Duration::from_millis(100))
///     .run(session, &mut std::io::stdout(), tokio::signal::ctrl_c())
///     .await?;
///
/// if transcript.interrupted {
///     println!("interrupted");
/// }
/// # Ok(())
/// # }
/// ```
pub struct Driver {
    responder: Responder,
    poll_interval: Duration,
    buffer: OutputBuffer,
    exchanges: Vec<Exchange>,
    interrupt_notice: Option<String>,
}

enum Stop {
    Finished(Result<(), DriverError>),
    Interrupted,
    SignalFailed(io::Error),
}

impl Driver {
    /// Create a driver answering prompts with `responder`
    pub fn new(responder: Responder) -> Self {
        Self {
            responder,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            buffer: OutputBuffer::new(),
            exchanges: Vec::new(),
            interrupt_notice: None,
        }
    }

    /// Set the sleep between polls when no output is available (default: 100ms).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Text written to the echo sink as soon as an interrupt is seen.
    pub fn interrupt_notice(mut self, notice: impl Into<String>) -> Self {
        self.interrupt_notice = Some(notice.into());
        self
    }

    /// Run the session until the child exits or `interrupt` resolves.
    ///
    /// An `Ok` from `interrupt` asks the child to terminate. An `Err` means
    /// the interrupt source is unusable: it is logged and the session keeps
    /// running. Either way the session is closed before returning: the
    /// primary endpoint is released and the child is reaped. Errors raised by
    /// the poll loop are returned after that cleanup.
    pub async fn run<W, F>(
        mut self,
        mut session: Session,
        echo: &mut W,
        interrupt: F,
    ) -> Result<Transcript, DriverError>
    where
        W: Write,
        F: Future<Output = io::Result<()>>,
    {
        let stop = tokio::select! {
            result = self.pump(&mut session, echo) => Stop::Finished(result),
            signal = interrupt => match signal {
                Ok(()) => Stop::Interrupted,
                Err(e) => Stop::SignalFailed(e),
            },
        };

        let outcome = match stop {
            Stop::Finished(result) => result.map(|()| false),
            Stop::Interrupted => Ok(true),
            Stop::SignalFailed(e) => {
                warn!(error = %e, "interrupt handler unavailable, continuing without it");
                self.pump(&mut session, echo).await.map(|()| false)
            }
        };

        if let Ok(true) = outcome {
            warn!("interrupted, terminating child");
            if let Some(notice) = &self.interrupt_notice {
                // Shown before cleanup, which may block on the child
                if let Err(e) = writeln!(echo, "{notice}").and_then(|()| echo.flush()) {
                    warn!(error = %e, "failed to write interrupt notice");
                }
            }
            if let Err(e) = session.terminate() {
                warn!(error = %e, "failed to terminate child");
            }
        }

        let closed = session.close().await;
        let interrupted = outcome?;
        let exit_status = closed?;

        Ok(Transcript {
            output: self.buffer.into_string(),
            exchanges: self.exchanges,
            interrupted,
            exit_status,
        })
    }

    async fn pump<W: Write>(
        &mut self,
        session: &mut Session,
        echo: &mut W,
    ) -> Result<(), DriverError> {
        loop {
            if session.has_exited()? {
                return Ok(());
            }

            let Some(chunk) = session.try_read() else {
                tokio::time::sleep(self.poll_interval).await;
                continue;
            };

            let text = self.buffer.append(&chunk);
            if text.is_empty() {
                // Nothing decodable yet: not an iteration that answers prompts
                continue;
            }
            echo.write_all(text.as_bytes())?;
            echo.flush()?;

            let Some(exchange) = self.responder.next_exchange(self.buffer.as_str()) else {
                continue;
            };

            writeln!(echo, "\n[Auto-responding: {}]", exchange.notice)?;
            echo.flush()?;
            info!(rule = %exchange.rule, "auto-responding");

            if let Err(e) = session.send(&exchange.response).await {
                // The child may exit between the exit check and the write
                if session.has_exited()? {
                    return Ok(());
                }
                return Err(e);
            }
            self.exchanges.push(exchange);
        }
    }
}
