//! Health and shutdown handlers.

use crate::app::DaemonState;
use daemon_ipc::{ops, IpcServer, Response};
use tracing::info;

/// Register health and shutdown handlers.
pub async fn register(server: &IpcServer, state: DaemonState) {
    // Health check
    server
        .register_handler(ops::HEALTH, move |req| {
            let dispatcher = state.dispatcher.clone();
            async move {
                Response::success(
                    &req.id,
                    serde_json::json!({
                        "status": "ok",
                        "version": env!("CARGO_PKG_VERSION"),
                        "pid": std::process::id(),
                        "quantum": dispatcher.quantum(),
                        "callers_seen": dispatcher.registry().len(),
                    }),
                )
            }
        })
        .await;

    // Shutdown
    let shutdown_tx = server.shutdown_sender();
    server
        .register_handler(ops::SHUTDOWN, move |req| {
            let tx = shutdown_tx.clone();
            async move {
                // Send shutdown signal
                let _ = tx.send(());
                Response::success(&req.id, serde_json::json!({ "status": "shutting_down" }))
            }
        })
        .await;

    info!("Registered health handlers");
}
