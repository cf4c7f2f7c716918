//! CLI command implementations.

mod identify;
mod quantum;
mod stress;

pub use identify::identify;
pub use quantum::{exchange, get, query, reset, set, shift, tell};
pub use stress::{stress_procs, stress_threads};

use anyhow::Result;
use daemon_config_and_utils::Paths;
use daemon_ipc::IpcClient;
use std::path::PathBuf;
use tracing::debug;

/// Resolve the daemon's runtime paths, honoring `--base-dir`.
pub fn resolve_paths(base_dir: Option<PathBuf>) -> Result<Paths> {
    let paths = match base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    debug!(base_dir = %paths.base_dir().display(), "Resolved runtime paths");
    Ok(paths)
}

/// Get an IPC client for communicating with the daemon.
pub fn get_ipc_client(paths: &Paths) -> IpcClient {
    IpcClient::new(&paths.socket_file().to_string_lossy())
}

/// Get an IPC client, but fail if the daemon is not answering.
pub async fn require_daemon(paths: &Paths) -> Result<IpcClient> {
    let client = get_ipc_client(paths);
    if !client.is_daemon_running().await {
        anyhow::bail!("Daemon is not running. Start it with 'quantumd start'");
    }
    Ok(client)
}
