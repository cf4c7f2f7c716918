//! Handler registration for the IPC server.

use crate::app::DaemonState;
use crate::ipc::handlers;
use daemon_ipc::IpcServer;
use tracing::info;

/// Register all IPC handlers.
///
/// Health and shutdown get dedicated entries; every other selector falls
/// through to the quantum dispatcher, which recognizes its own commands and
/// rejects the rest.
pub async fn register_handlers(server: &IpcServer, state: DaemonState) {
    handlers::health::register(server, state.clone()).await;
    handlers::quantum::register(server, state.dispatcher.clone()).await;

    info!("All IPC handlers registered");
}
