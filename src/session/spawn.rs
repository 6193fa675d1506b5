//! Process lifecycle utilities

use crate::result::DriverError;
use portable_pty::{Child, ExitStatus};
use tracing::debug;

/// Poll a child process without blocking, returning its status once exited
pub fn try_status(
    child: &mut Box<dyn Child + Send + Sync>,
) -> Result<Option<ExitStatus>, DriverError> {
    child.try_wait().map_err(DriverError::Io)
}

/// Ask the child to terminate.
///
/// Sends `SIGTERM` on Unix. There is no escalation: a child that ignores the
/// signal keeps running and cleanup waits for it.
#[cfg(unix)]
pub fn terminate(child: &mut Box<dyn Child + Send + Sync>) -> Result<(), DriverError> {
    let Some(pid) = child.process_id() else {
        return Ok(());
    };

    let target = signal_target(pid)?;

    debug!(pid, "sending SIGTERM");
    // SAFETY: kill(2) has no memory-safety preconditions.
    let rc = unsafe { libc::kill(target, libc::SIGTERM) };
    if rc == 0 {
        return Ok(());
    }

    let err = std::io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        // Already gone
        return Ok(());
    }
    Err(DriverError::Io(err))
}

/// Convert a child PID for kill(2), refusing values that would wrap negative
/// and address a process group instead.
#[cfg(unix)]
fn signal_target(pid: u32) -> Result<libc::pid_t, DriverError> {
    libc::pid_t::try_from(pid).map_err(|_| {
        DriverError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("PID {pid} exceeds pid_t range, refusing to signal"),
        ))
    })
}

/// Ask the child to terminate.
#[cfg(not(unix))]
pub fn terminate(child: &mut Box<dyn Child + Send + Sync>) -> Result<(), DriverError> {
    use portable_pty::ChildKiller;

    debug!(pid = ?child.process_id(), "terminating child");
    child.kill().map_err(DriverError::Io)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_signal_target_in_range() {
        assert_eq!(signal_target(4242).unwrap(), 4242);
    }

    #[test]
    fn test_signal_target_rejects_wrapping_pid() {
        assert!(matches!(signal_target(u32::MAX), Err(DriverError::Io(_))));
        assert!(matches!(
            signal_target(libc::pid_t::MAX as u32 + 1),
            Err(DriverError::Io(_))
        ));
    }
}
