//! Session management for pty-attached child processes

mod builder;
mod spawn;

pub use builder::SessionBuilder;

use crate::result::DriverError;
use portable_pty::{Child, ExitStatus, MasterPty};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

/// A running child process attached to a pseudo-terminal.
///
/// The child's stdin, stdout and stderr all sit on the secondary endpoint of
/// the pty, so everything it prints arrives merged on the primary endpoint
/// owned by the session.
///
/// Cleanup is explicit through [`Session::close`]. A session dropped without
/// being closed performs the same cleanup, blocking until the child exits.
///
/// # Examples
///
/// ```no_run
/// use convex_deploy::Session;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut session = Session::spawn("npx convex dev --once")?;
///
/// while !session.has_exited()? {
///     match session.try_read() {
///         Some(chunk) => print!("{}", String::from_utf8_lossy(&chunk)),
///         None => tokio::time::sleep(std::time::Duration::from_millis(100)).await,
///     }
/// }
///
/// let status = session.close().await?;
/// println!("exit code: {}", status.exit_code());
/// # Ok(())
/// # }
/// ```
pub struct Session {
    master: Option<Box<dyn MasterPty + Send>>,
    writer: Option<Arc<Mutex<Box<dyn Write + Send>>>>,
    output: mpsc::UnboundedReceiver<Vec<u8>>,
    child: Option<Box<dyn Child + Send + Sync>>,
    exit_status: Option<ExitStatus>,
}

impl Session {
    /// Create a new session builder.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Spawn a command and return a session (convenience method).
    ///
    /// This is a shorthand for `Session::builder().spawn(command)`.
    pub fn spawn(command: &str) -> Result<Self, DriverError> {
        SessionBuilder::new().spawn(command)
    }

    /// Non-blocking read of the next output chunk.
    ///
    /// Returns `None` when no data is currently available. A pty that has
    /// been closed by the child side also reports `None`; use
    /// [`Session::has_exited`] to tell the two apart.
    pub fn try_read(&mut self) -> Option<Vec<u8>> {
        self.output.try_recv().ok()
    }

    /// Send data to the process and flush it.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::ProcessExited`] after [`Session::close`], or an
    /// I/O error if the write fails.
    pub async fn send(&mut self, data: &[u8]) -> Result<(), DriverError> {
        let writer = self.writer.clone().ok_or(DriverError::ProcessExited)?;
        let data = data.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut writer = writer.blocking_lock();
            writer.write_all(&data)?;
            writer.flush()
        })
        .await
        .map_err(|e| DriverError::Io(std::io::Error::other(e)))??;

        Ok(())
    }

    /// Send a line to the process (appends newline).
    pub async fn send_line(&mut self, line: &str) -> Result<(), DriverError> {
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
        self.send(&data).await
    }

    /// Check without blocking whether the child has exited.
    ///
    /// The status is recorded the first time an exit is observed and is
    /// returned again by [`Session::close`].
    pub fn has_exited(&mut self) -> Result<bool, DriverError> {
        if self.exit_status.is_some() {
            return Ok(true);
        }

        let child = self.child.as_mut().ok_or(DriverError::ProcessExited)?;
        match spawn::try_status(child)? {
            Some(status) => {
                debug!(code = status.exit_code(), "child exited");
                self.exit_status = Some(status);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Exit status observed so far, if the child has exited.
    pub fn exit_status(&self) -> Option<&ExitStatus> {
        self.exit_status.as_ref()
    }

    /// Process ID of the child, while it has not been reaped.
    pub fn process_id(&self) -> Option<u32> {
        self.child.as_ref().and_then(|child| child.process_id())
    }

    /// Ask the child to terminate without waiting for it.
    pub fn terminate(&mut self) -> Result<(), DriverError> {
        if self.exit_status.is_some() {
            return Ok(());
        }
        let child = self.child.as_mut().ok_or(DriverError::ProcessExited)?;
        spawn::terminate(child)
    }

    /// Whether [`Session::close`] has already reaped the child.
    pub fn is_closed(&self) -> bool {
        self.child.is_none()
    }

    /// Close the primary pty endpoint, then wait for the child and reap it.
    ///
    /// The child is reaped exactly once: calling `close` again returns
    /// [`DriverError::ProcessExited`].
    ///
    /// Releasing the pty writer makes portable-pty send a newline followed by
    /// the EOF character to the child. A child still waiting at a prompt reads
    /// that as an empty answer and may accept the prompt's default.
    pub async fn close(&mut self) -> Result<ExitStatus, DriverError> {
        self.close_pty();
        let mut child = self.child.take().ok_or(DriverError::ProcessExited)?;

        let status = tokio::task::spawn_blocking(move || child.wait())
            .await
            .map_err(|e| DriverError::Io(std::io::Error::other(e)))??;

        info!(code = status.exit_code(), success = status.success(), "child reaped");
        Ok(status)
    }

    fn close_pty(&mut self) {
        self.writer.take();
        self.master.take();
        self.output.close();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close_pty();
        if let Some(mut child) = self.child.take() {
            debug!("reaping child from drop");
            let _ = child.wait();
        }
    }
}
