//! Daemon initialization and teardown.
//!
//! Startup is split in two: everything fallible lives in [`serve`], and
//! [`run_daemon`] guarantees that [`teardown`] runs afterwards whether
//! `serve` returned cleanly, failed to bind, or never finished starting.
//! The caller registry is created before any fallible step, so the final
//! report happens exactly once on every path.

use crate::app::DaemonState;
use crate::ipc::register_handlers;
use daemon_config_and_utils::{Config, Paths};
use daemon_ipc::IpcServer;
use daemon_lifecycle::{
    check_singleton, cleanup_pid_file, cleanup_socket_file, write_pid_file, LifecycleError,
    SingletonCheck,
};
use std::sync::Arc;
use task_introspect::ProcSched;
use tracing::{error, info, warn};

/// Run the daemon.
pub async fn run_daemon(
    config: Config,
    paths: Paths,
    foreground: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Singleton enforcement: refuse to start while another daemon answers.
    match check_singleton(&paths.socket_file()) {
        SingletonCheck::AlreadyRunning => {
            eprintln!("Error: Daemon is already running. Use 'quantumd stop' to stop it first.");
            return Err(LifecycleError::AlreadyRunning.into());
        }
        SingletonCheck::StaleSocketCleaned => {
            warn!("Removed stale socket file");
        }
        SingletonCheck::Available => {}
    }

    if !foreground {
        return spawn_detached(&paths);
    }

    // Clean up stale PID file if it exists
    let _ = cleanup_pid_file(&paths.pid_file());

    info!("Starting quantumd");
    info!(
        initial_quantum = config.initial_quantum,
        registry_capacity = ?config.registry_capacity,
        "Configuration loaded"
    );

    // State is built before anything fallible, so teardown always has a
    // registry to drain.
    let state = DaemonState::new(config, paths.clone(), Arc::new(ProcSched::new()));

    let result = serve(&state, &paths).await;

    teardown(&state, &paths);

    result
}

/// Re-exec this binary in the foreground with output going to the log file.
fn spawn_detached(paths: &Paths) -> Result<(), Box<dyn std::error::Error>> {
    paths.ensure_dirs()?;

    let log = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(paths.daemon_log_file())?;
    let log_err = log.try_clone()?;

    let exe = std::env::current_exe()?;
    let child = std::process::Command::new(exe)
        .arg("start")
        .arg("--foreground")
        .arg("--base-dir")
        .arg(paths.base_dir())
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::from(log))
        .stderr(std::process::Stdio::from(log_err))
        .spawn()?;

    println!("Daemon started (PID {})", child.id());
    println!("Logs: {}", paths.daemon_log_file().display());
    Ok(())
}

/// The fallible part of startup, then the serve loop until shutdown.
async fn serve(state: &DaemonState, paths: &Paths) -> Result<(), Box<dyn std::error::Error>> {
    // Ensure directories exist
    paths.ensure_dirs()?;

    // Write PID file
    let pid = write_pid_file(&paths.pid_file())?;
    info!(pid = pid, "Daemon started");

    let ipc_server = IpcServer::new(&paths.socket_file().to_string_lossy());

    // SIGINT/SIGTERM feed the same shutdown channel as the shutdown op.
    spawn_signal_listener(ipc_server.shutdown_sender());

    // Register handlers
    register_handlers(&ipc_server, state.clone()).await;

    info!(
        socket = %paths.socket_file().display(),
        "IPC server starting"
    );

    ipc_server.run().await?;
    Ok(())
}

/// Release everything startup may have acquired.
///
/// Tolerates a partial start: files that were never created and an empty
/// registry are both fine. Draining through the registry makes a repeated
/// call report nothing.
fn teardown(state: &DaemonState, paths: &Paths) {
    let count = state.dispatcher.registry().drain_and_report(|seq, caller| {
        info!("Task {}: PID {}, TGID {}", seq, caller.pid, caller.tgid);
    });
    info!(callers = count, "Caller registry drained");

    if let Err(e) = cleanup_socket_file(&paths.socket_file()) {
        warn!(error = %e, "Failed to remove socket file");
    }
    if let Err(e) = cleanup_pid_file(&paths.pid_file()) {
        warn!(error = %e, "Failed to remove PID file");
    }

    info!("Daemon stopped");
}

/// Forward termination signals into the server's shutdown channel.
fn spawn_signal_listener(shutdown_tx: tokio::sync::broadcast::Sender<()>) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut term = match signal(SignalKind::terminate()) {
                Ok(term) => term,
                Err(e) => {
                    error!(error = %e, "Failed to install SIGTERM handler");
                    return;
                }
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
                _ = term.recv() => info!("Received SIGTERM"),
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received Ctrl-C");
        }

        let _ = shutdown_tx.send(());
    });
}
