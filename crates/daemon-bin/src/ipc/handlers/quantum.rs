//! Quantum command handler.
//!
//! Registered as the server's fallback route, so every selector without a
//! dedicated handler reaches the dispatcher. The dispatcher's own
//! recognition step decides what is a command and what gets rejected,
//! keeping a single source of truth for the command surface.

use daemon_ipc::{error_codes, IpcServer, Request, Response};
use quantum_core::{CommandOutput, DispatchError, Dispatcher};
use serde_json::json;
use std::sync::Arc;

/// Execute one request against the dispatcher and encode the outcome.
pub fn handle(dispatcher: &Dispatcher, req: &Request) -> Response {
    match dispatcher.dispatch(&req.op, req.arg.as_ref()) {
        Ok(CommandOutput::Done) => Response::success(&req.id, json!({ "status": "ok" })),
        Ok(CommandOutput::Value(value)) => Response::success(&req.id, json!({ "value": value })),
        Ok(CommandOutput::WriteBack(value)) => Response::success(&req.id, json!({ "arg": value })),
        Ok(CommandOutput::Snapshot(snapshot)) => {
            Response::success(&req.id, json!({ "arg": snapshot }))
        }
        Err(err) => {
            let code = match &err {
                DispatchError::InvalidCommand(_) => error_codes::INVALID_COMMAND,
                DispatchError::InvalidArgRegion(_) => error_codes::INVALID_ARG_REGION,
                DispatchError::Introspection(_) => error_codes::INTERNAL_ERROR,
            };
            Response::error(&req.id, code, &err.to_string())
        }
    }
}

/// Register the dispatcher as the server's fallback handler.
pub async fn register(server: &IpcServer, dispatcher: Arc<Dispatcher>) {
    server
        .register_fallback_handler(move |req| {
            let dispatcher = dispatcher.clone();
            async move { handle(&dispatcher, &req) }
        })
        .await;
}
