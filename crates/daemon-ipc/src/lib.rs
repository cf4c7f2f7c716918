//! IPC layer for daemon-client communication.
//!
//! This crate provides:
//! - Unix domain socket server
//! - JSON-RPC-like protocol, one JSON object per line
//! - Request/response handling with a fallback route for command dispatch

mod error;
mod server;

pub use error::{IpcError, IpcResult};
pub use ipc_protocol_types::{error_codes, ops, ErrorInfo, Request, Response};
pub use server::{IpcClient, IpcServer};
