//! Daemon lifecycle management for quantumd.
//!
//! Handles singleton enforcement, PID file management, and the runtime-file
//! cleanup that teardown performs even when startup only got half way.

use std::path::Path;
use thiserror::Error;

/// Errors from lifecycle management.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Daemon is already running")]
    AlreadyRunning,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PID file error: {0}")]
    PidFile(String),
}

/// Result of checking whether the daemon is already running.
#[derive(Debug, PartialEq, Eq)]
pub enum SingletonCheck {
    /// No daemon running, safe to start.
    Available,
    /// A stale socket was found and cleaned up.
    StaleSocketCleaned,
    /// Another daemon is already running.
    AlreadyRunning,
}

/// Check if the daemon is already running by testing the socket file.
///
/// Returns `Available` if no socket exists, `StaleSocketCleaned` if a stale
/// socket was found and removed, or `AlreadyRunning` if a daemon responded.
pub fn check_singleton(socket_path: &Path) -> SingletonCheck {
    if !socket_path.exists() {
        return SingletonCheck::Available;
    }

    // Socket exists — try to connect to see if a daemon is actually running.
    // We use a sync connect attempt here to avoid requiring a tokio runtime.
    match std::os::unix::net::UnixStream::connect(socket_path) {
        Ok(_stream) => {
            // Something is listening — daemon is running
            SingletonCheck::AlreadyRunning
        }
        Err(_) => {
            // Socket exists but nothing is listening — stale
            let _ = std::fs::remove_file(socket_path);
            SingletonCheck::StaleSocketCleaned
        }
    }
}

/// Write the current process PID to the given path.
pub fn write_pid_file(pid_path: &Path) -> Result<u32, LifecycleError> {
    let pid = std::process::id();
    std::fs::write(pid_path, pid.to_string())?;
    Ok(pid)
}

/// Read a PID from the given file.
pub fn read_pid_file(pid_path: &Path) -> Result<Option<u32>, LifecycleError> {
    if !pid_path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(pid_path)?;
    let pid = content
        .trim()
        .parse::<u32>()
        .map_err(|e| LifecycleError::PidFile(format!("Invalid PID: {}", e)))?;
    Ok(Some(pid))
}

/// Check whether a process with the given PID exists.
///
/// Signal 0 performs the existence check without delivering anything;
/// EPERM still means the process is there.
pub fn pid_alive(pid: u32) -> bool {
    let rc = unsafe { libc::kill(pid as i32, 0) };
    if rc == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

/// Clean up PID file if it exists.
pub fn cleanup_pid_file(pid_path: &Path) -> Result<(), LifecycleError> {
    if pid_path.exists() {
        std::fs::remove_file(pid_path)?;
    }
    Ok(())
}

/// Clean up socket file if it exists.
pub fn cleanup_socket_file(socket_path: &Path) -> Result<(), LifecycleError> {
    if socket_path.exists() {
        std::fs::remove_file(socket_path)?;
    }
    Ok(())
}
