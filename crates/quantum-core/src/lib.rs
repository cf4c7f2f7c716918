//! # quantum-core
//!
//! The control-plane state machine behind `quantumd`: one shared int-sized
//! scheduling parameter (the quantum), a registry of every distinct caller
//! that has identified itself, and the command dispatcher that ties them
//! together.
//!
//! Design principles:
//!
//! - **No I/O.** This crate never touches sockets, files, or clocks. The
//!   transport hands the dispatcher a selector string and a decoded JSON
//!   argument; everything else is pure state manipulation.
//! - **Validate before touching state.** A command either passes selector
//!   and argument validation and runs to completion, or fails without any
//!   observable effect.
//! - **Whole-operation atomicity.** The quantum lives in one atomic cell;
//!   read-modify-write commands use a single swap, so concurrent callers
//!   interleave at command granularity and never observe torn updates.
//! - **Callers are recorded once.** The registry deduplicates on the full
//!   (pid, tgid) pair and preserves first-seen order until it is drained at
//!   shutdown.
//!
//! ## Example
//!
//! ```
//! use quantum_core::{CommandOutput, Dispatcher, StubSched, DEFAULT_QUANTUM};
//! use std::sync::Arc;
//!
//! let dispatcher = Dispatcher::new(Arc::new(StubSched::new()));
//!
//! let out = dispatcher.dispatch("quantum.query", None).unwrap();
//! assert_eq!(out, CommandOutput::Value(DEFAULT_QUANTUM));
//!
//! dispatcher
//!     .dispatch("quantum.tell", Some(&serde_json::json!(512)))
//!     .unwrap();
//! assert_eq!(dispatcher.quantum(), 512);
//! ```

mod dispatch;
mod registry;
mod sched;
mod types;

pub use dispatch::{Command, CommandOutput, DispatchError, DispatchResult, Dispatcher};
pub use registry::{InsertOutcome, Registry};
pub use sched::{SchedError, SchedSource, StubSched};
pub use types::{CallerIdentity, SchedSnapshot, DEFAULT_QUANTUM};

#[cfg(test)]
mod tests;
