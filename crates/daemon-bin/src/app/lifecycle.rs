//! Daemon lifecycle management (stop, status).

use daemon_config_and_utils::Paths;
use daemon_ipc::{ops, IpcClient};
use daemon_lifecycle::{cleanup_pid_file, pid_alive, read_pid_file};

/// Stop the daemon.
pub async fn stop_daemon(paths: &Paths) -> Result<(), Box<dyn std::error::Error>> {
    let socket_path = paths.socket_file();
    let pid_path = paths.pid_file();

    if !socket_path.exists() {
        println!("Daemon is not running (socket not found)");
        // Clean up stale PID file if it exists
        let _ = cleanup_pid_file(&pid_path);
        return Ok(());
    }

    // Try graceful shutdown first
    let client = IpcClient::new(&socket_path.to_string_lossy());

    match client.call_op(ops::SHUTDOWN).await {
        Ok(response) => {
            if response.is_success() {
                println!("Daemon shutdown initiated");
            } else {
                println!("Shutdown failed: {:?}", response.error);
            }
        }
        Err(e) => {
            println!("Failed to connect to daemon: {}", e);
        }
    }

    // Wait for daemon to stop (up to 3 seconds)
    for _ in 0..30 {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        if !socket_path.exists() {
            println!("Daemon stopped");
            return Ok(());
        }
    }

    // If still running, try to force kill using PID
    if let Ok(Some(pid)) = read_pid_file(&pid_path) {
        if pid_alive(pid) {
            println!(
                "Daemon did not stop gracefully, sending SIGKILL to PID {}",
                pid
            );
            unsafe {
                libc::kill(pid as i32, libc::SIGKILL);
            }
            println!("Daemon killed");
        } else {
            println!("Daemon process {} already exited", pid);
        }
        // Clean up files
        let _ = std::fs::remove_file(&socket_path);
        let _ = std::fs::remove_file(&pid_path);
        return Ok(());
    }

    // Last resort: clean up socket file
    if socket_path.exists() {
        let _ = std::fs::remove_file(&socket_path);
        println!("Cleaned up stale socket file");
    }

    Ok(())
}

/// Check daemon status.
pub async fn check_status(paths: &Paths) -> Result<(), Box<dyn std::error::Error>> {
    let socket_path = paths.socket_file();
    let pid_path = paths.pid_file();

    if !socket_path.exists() {
        // A PID file without a socket is what a crash leaves behind.
        match read_pid_file(&pid_path) {
            Ok(Some(pid)) if pid_alive(pid) => {
                println!(
                    "Daemon is not running (socket not found), but PID {} is still alive",
                    pid
                );
            }
            Ok(Some(pid)) => {
                println!("Daemon is not running (stale PID file for {})", pid);
            }
            _ => println!("Daemon is not running (socket not found)"),
        }
        return Ok(());
    }

    let client = IpcClient::new(&socket_path.to_string_lossy());

    match client.call_op(ops::HEALTH).await {
        Ok(response) => {
            if response.is_success() {
                if let Some(result) = response.result {
                    let version = result
                        .get("version")
                        .and_then(|v| v.as_str())
                        .unwrap_or("unknown");
                    let status = result
                        .get("status")
                        .and_then(|v| v.as_str())
                        .unwrap_or("unknown");
                    let quantum = result.get("quantum").and_then(|v| v.as_i64());
                    let callers = result.get("callers_seen").and_then(|v| v.as_u64());

                    let pid = read_pid_file(&pid_path).ok().flatten();

                    println!("Daemon is running");
                    println!("  Status:  {}", status);
                    println!("  Version: {}", version);
                    if let Some(pid) = pid {
                        println!("  PID:     {}", pid);
                    }
                    if let Some(quantum) = quantum {
                        println!("  Quantum: {}", quantum);
                    }
                    if let Some(callers) = callers {
                        println!("  Callers: {}", callers);
                    }
                    println!("  Socket:  {}", socket_path.display());
                } else {
                    println!("Daemon is running (no details available)");
                }
            } else {
                println!("Daemon returned error: {:?}", response.error);
            }
        }
        Err(e) => {
            println!("Failed to connect to daemon: {}", e);
            println!("Daemon may not be running or socket may be stale");
        }
    }

    Ok(())
}
