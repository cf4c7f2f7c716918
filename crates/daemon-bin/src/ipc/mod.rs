//! IPC server wiring for the daemon.

pub mod handlers;
mod register;

pub use register::register_handlers;
