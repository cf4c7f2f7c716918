//! IPC server implementation.
//!
//! Request/response over a Unix domain socket, one JSON object per line.
//! Each line is parsed into a [`Request`], routed to the handler registered
//! for its operation selector, and answered with exactly one [`Response`]
//! line. Selectors without a dedicated handler go to the fallback handler,
//! which owns the recognition of every quantum command.

use crate::{IpcError, IpcResult};
use ipc_protocol_types::{error_codes, Request, Response};
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};

/// Handler function type for IPC operations.
pub type HandlerFn =
    Box<dyn Fn(Request) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync>;

/// IPC server that listens on a Unix domain socket.
pub struct IpcServer {
    socket_path: String,
    handlers: Arc<RwLock<HashMap<String, HandlerFn>>>,
    fallback: Arc<RwLock<Option<HandlerFn>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl IpcServer {
    /// Create a new IPC server.
    pub fn new(socket_path: &str) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            socket_path: socket_path.to_string(),
            handlers: Arc::new(RwLock::new(HashMap::new())),
            fallback: Arc::new(RwLock::new(None)),
            shutdown_tx,
        }
    }

    /// Register a handler for an operation selector.
    pub async fn register_handler<F, Fut>(&self, op: &str, handler: F)
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let boxed_handler: HandlerFn = Box::new(move |req| Box::pin(handler(req)));
        self.handlers
            .write()
            .await
            .insert(op.to_string(), boxed_handler);
    }

    /// Register the fallback handler for selectors with no dedicated entry.
    ///
    /// The fallback sees the request exactly as received, including its
    /// selector, so it can distinguish commands it knows from ones it must
    /// reject.
    pub async fn register_fallback_handler<F, Fut>(&self, handler: F)
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let boxed: HandlerFn = Box::new(move |req| Box::pin(handler(req)));
        *self.fallback.write().await = Some(boxed);
    }

    /// Get a shutdown receiver.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Get a shutdown sender (for handlers that need to trigger shutdown).
    pub fn shutdown_sender(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Trigger shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Start the server and listen for connections.
    pub async fn run(&self) -> IpcResult<()> {
        // Remove existing socket file
        let socket_path = Path::new(&self.socket_path);
        if socket_path.exists() {
            std::fs::remove_file(socket_path)?;
        }

        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        info!(path = %self.socket_path, "IPC server listening");

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, _)) => {
                            let handlers = self.handlers.clone();
                            let fallback = self.fallback.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, handlers, fallback).await {
                                    error!(error = %e, "Connection error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Accept error");
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("IPC server shutting down");
                    break;
                }
            }
        }

        // Cleanup socket file
        let _ = std::fs::remove_file(&self.socket_path);

        Ok(())
    }
}

/// Handle a single client connection.
async fn handle_connection(
    stream: UnixStream,
    handlers: Arc<RwLock<HashMap<String, HandlerFn>>>,
    fallback: Arc<RwLock<Option<HandlerFn>>>,
) -> IpcResult<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    debug!("Client connected");

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            debug!("Client disconnected");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        debug!(request = %trimmed, "Received request");

        let request = match Request::from_json(trimmed) {
            Ok(req) => req,
            Err(e) => {
                warn!(error = %e, "Failed to parse request");
                let response =
                    Response::error("", error_codes::PARSE_ERROR, &format!("Parse error: {}", e));
                let response_json = response.to_json()?;
                writer.write_all(response_json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
                continue;
            }
        };

        let request_id = request.id.clone();
        let op = request.op.clone();

        let response = {
            let handlers = handlers.read().await;
            if let Some(handler) = handlers.get(&op) {
                handler(request).await
            } else if let Some(handler) = fallback.read().await.as_ref() {
                handler(request).await
            } else {
                Response::error(
                    &request_id,
                    error_codes::INVALID_COMMAND,
                    &format!("Unknown operation: {}", op),
                )
            }
        };

        let response_json = response.to_json()?;
        debug!(response = %response_json, "Sending response");

        writer.write_all(response_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    Ok(())
}

/// IPC client for connecting to the daemon.
pub struct IpcClient {
    socket_path: String,
}

impl IpcClient {
    /// Create a new IPC client.
    pub fn new(socket_path: &str) -> Self {
        Self {
            socket_path: socket_path.to_string(),
        }
    }

    /// Send a request and wait for response.
    pub async fn call(&self, request: Request) -> IpcResult<Response> {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|e| IpcError::Socket(format!("Failed to connect: {}", e)))?;

        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        // Send request
        let request_json = request.to_json()?;
        writer.write_all(request_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;

        // Read response
        let mut line = String::new();
        reader.read_line(&mut line).await?;

        if line.is_empty() {
            return Err(IpcError::ConnectionClosed);
        }

        let response = Response::from_json(line.trim())?;
        Ok(response)
    }

    /// Send an operation with no argument.
    pub async fn call_op(&self, op: &str) -> IpcResult<Response> {
        self.call(Request::new(op)).await
    }

    /// Send an operation with an argument.
    pub async fn call_op_with_arg(
        &self,
        op: &str,
        arg: serde_json::Value,
    ) -> IpcResult<Response> {
        self.call(Request::with_arg(op, arg)).await
    }

    /// Check if the daemon is running.
    pub async fn is_daemon_running(&self) -> bool {
        self.call_op(ipc_protocol_types::ops::HEALTH).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ipc_client_not_running() {
        let client = IpcClient::new("/tmp/nonexistent.sock");
        assert!(!client.is_daemon_running().await);
    }

    #[tokio::test]
    async fn test_ipc_client_connect_failure() {
        let client = IpcClient::new("/tmp/definitely-does-not-exist-12345.sock");
        let result = client.call_op(ipc_protocol_types::ops::HEALTH).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_ipc_server_shutdown() {
        let server = IpcServer::new("/tmp/test-server4.sock");
        let mut receiver = server.shutdown_receiver();

        server.shutdown();

        let result =
            tokio::time::timeout(std::time::Duration::from_millis(100), receiver.recv()).await;

        assert!(result.is_ok());
    }
}
