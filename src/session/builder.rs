//! Session builder for configuration

use crate::result::DriverError;
use crate::session::Session;
use portable_pty::{native_pty_system, CommandBuilder, PtyPair, PtySize};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, trace};

/// Default size of a single read from the pty (in bytes)
const DEFAULT_READ_CHUNK: usize = 1024;

/// Default PTY rows
const DEFAULT_PTY_ROWS: u16 = 24;

/// Default PTY columns
const DEFAULT_PTY_COLS: u16 = 80;

/// Builder for configuring and spawning sessions.
///
/// # Defaults
///
/// - Read chunk: 1024 bytes
/// - PTY size: 24 rows × 80 columns
/// - Working directory: the caller's current directory
/// - Environment: inherited from the caller
///
/// # Examples
///
/// ```no_run
/// use convex_deploy::Session;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::builder()
///     .cwd("/srv/app")
///     .clear_env("CONVEX_DEPLOYMENT")
///     .spawn("npx convex dev --once")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    read_chunk: usize,
    pty_size: PtySize,
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    /// Create a new session builder with default configuration.
    ///
    /// See the [`SessionBuilder`] documentation for default values.
    pub fn new() -> Self {
        Self {
            read_chunk: DEFAULT_READ_CHUNK,
            pty_size: PtySize {
                rows: DEFAULT_PTY_ROWS,
                cols: DEFAULT_PTY_COLS,
                pixel_width: 0,
                pixel_height: 0,
            },
            cwd: None,
            env: Vec::new(),
        }
    }

    /// Set the maximum number of bytes returned by a single read.
    pub fn read_chunk(mut self, size: usize) -> Self {
        self.read_chunk = size.max(1);
        self
    }

    /// Set PTY (terminal) size.
    ///
    /// # Arguments
    ///
    /// * `rows` - Number of rows (default: 24)
    /// * `cols` - Number of columns (default: 80)
    pub fn pty_size(mut self, rows: u16, cols: u16) -> Self {
        self.pty_size = PtySize {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        };
        self
    }

    /// Set the child's working directory.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Set an environment variable for the child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Clear an environment variable for the child.
    ///
    /// The variable stays defined but empty, which is enough to make tools
    /// that read it fall back to their default mode.
    pub fn clear_env(self, key: impl Into<String>) -> Self {
        self.env(key, "")
    }

    /// Spawn a whitespace-separated command line and return a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the command string is empty, the PTY cannot be
    /// created, or the process cannot be spawned.
    pub fn spawn(self, command: &str) -> Result<Session, DriverError> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| DriverError::Spawn("Empty command".to_string()))?;
        let args: Vec<&str> = parts.collect();
        self.spawn_argv(program, &args)
    }

    /// Spawn `program` with an explicit argument vector and return a session.
    ///
    /// # Errors
    ///
    /// Same as [`SessionBuilder::spawn`].
    pub fn spawn_argv<S: AsRef<str>>(
        self,
        program: &str,
        args: &[S],
    ) -> Result<Session, DriverError> {
        if program.is_empty() {
            return Err(DriverError::Spawn("Empty command".to_string()));
        }

        let pty_system = native_pty_system();
        let PtyPair { master, slave } = pty_system
            .openpty(self.pty_size)
            .map_err(|e| DriverError::Pty(e.to_string()))?;

        let mut cmd = CommandBuilder::new(program);
        for arg in args {
            cmd.arg(arg.as_ref());
        }
        // portable-pty falls back to the home directory when no cwd is given
        let cwd = match self.cwd {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        cmd.cwd(&cwd);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        let child = slave
            .spawn_command(cmd)
            .map_err(|e| DriverError::Spawn(e.to_string()))?;
        // The child keeps its own copy of the secondary endpoint
        drop(slave);

        info!(
            program,
            pid = ?child.process_id(),
            cwd = %cwd.display(),
            "spawned child on pty"
        );

        let reader = master
            .try_clone_reader()
            .map_err(|e| DriverError::Pty(e.to_string()))?;
        let writer = master
            .take_writer()
            .map_err(|e| DriverError::Pty(e.to_string()))?;

        let output = spawn_reader(reader, self.read_chunk)?;

        Ok(Session {
            master: Some(master),
            writer: Some(Arc::new(Mutex::new(writer))),
            output,
            child: Some(child),
            exit_status: None,
        })
    }
}

/// Drain the blocking pty reader on its own thread.
///
/// Each read of up to `chunk` bytes is forwarded as-is; an empty channel is
/// the session's "would block" condition. The thread ends when the pty is
/// closed or the session is dropped.
fn spawn_reader(
    mut reader: Box<dyn Read + Send>,
    chunk: usize,
) -> Result<mpsc::UnboundedReceiver<Vec<u8>>, DriverError> {
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::Builder::new()
        .name("pty-reader".to_string())
        .spawn(move || {
            let mut buf = vec![0u8; chunk];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        trace!(bytes = n, "pty read");
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        // EIO once the child side has closed
                        debug!(error = %e, "pty reader stopped");
                        break;
                    }
                }
            }
        })?;

    Ok(rx)
}
