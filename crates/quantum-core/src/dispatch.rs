//! Command decoding and dispatch against the shared quantum and registry.
//!
//! A request arrives as an operation selector plus an optional JSON argument
//! (the transport has already copied it out of the caller's hands). The
//! dispatcher validates in two steps before any effect: the selector must
//! name a known command, and the argument region must match the command's
//! calling convention. Only then does the command execute.

use crate::registry::{InsertOutcome, Registry};
use crate::sched::{SchedError, SchedSource};
use crate::types::{CallerIdentity, SchedSnapshot, DEFAULT_QUANTUM};
use ipc_protocol_types::ops;
use serde_json::Value;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors surfaced to the caller of a command.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The operation selector is not one of the eight known commands.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// The argument region is missing, mis-typed, or the wrong size for the
    /// command's calling convention.
    #[error("invalid argument region: {0}")]
    InvalidArgRegion(String),

    /// IDENTIFY could not take the caller's scheduling snapshot.
    #[error(transparent)]
    Introspection(#[from] SchedError),
}

/// Result type alias using DispatchError.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// A fully decoded, validated command. Construction via [`Command::decode`]
/// performs all argument validation, so executing a `Command` can no longer
/// fail on the argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Restore the compile-time default quantum.
    Reset,
    /// Store a new quantum, argument passed by reference.
    Set(i32),
    /// Store a new quantum, argument passed by value.
    Tell(i32),
    /// Write the current quantum back through the argument region.
    Get,
    /// Return the current quantum as the call result.
    Query,
    /// Store a new quantum and write the old one back through the region.
    Exchange(i32),
    /// Store a new quantum and return the old one as the call result.
    Shift(i32),
    /// Snapshot the caller's scheduling state and record its identity.
    Identify(CallerIdentity),
}

impl Command {
    /// Decode an operation selector and argument into a command.
    ///
    /// Unknown selectors fail with [`DispatchError::InvalidCommand`];
    /// unusable arguments with [`DispatchError::InvalidArgRegion`]. Both
    /// checks run to completion before any state is touched.
    pub fn decode(op: &str, arg: Option<&Value>) -> DispatchResult<Self> {
        match op {
            ops::QUANTUM_RESET => Ok(Command::Reset),
            ops::QUANTUM_SET => Ok(Command::Set(int_by_reference(arg)?)),
            ops::QUANTUM_TELL => Ok(Command::Tell(int_by_value(arg)?)),
            ops::QUANTUM_GET => Ok(Command::Get),
            ops::QUANTUM_QUERY => Ok(Command::Query),
            ops::QUANTUM_EXCHANGE => Ok(Command::Exchange(int_by_reference(arg)?)),
            ops::QUANTUM_SHIFT => Ok(Command::Shift(int_by_value(arg)?)),
            ops::CALLER_IDENTIFY => Ok(Command::Identify(caller_identity_arg(arg)?)),
            other => Err(DispatchError::InvalidCommand(other.to_string())),
        }
    }
}

/// By-reference convention (SET, EXCHANGE): the argument region must exist
/// and hold an integer that fits the int-sized region exactly.
fn int_by_reference(arg: Option<&Value>) -> DispatchResult<i32> {
    let value = required_arg(arg)?;
    let n = value.as_i64().ok_or_else(|| {
        DispatchError::InvalidArgRegion(format!("expected an integer, got {value}"))
    })?;
    i32::try_from(n)
        .map_err(|_| DispatchError::InvalidArgRegion(format!("{n} does not fit an int region")))
}

/// By-value convention (TELL, SHIFT): the argument word is taken as-is. A
/// missing word reads as zero and an oversized integer truncates, the way a
/// raw word assignment would.
fn int_by_value(arg: Option<&Value>) -> DispatchResult<i32> {
    match arg {
        None | Some(Value::Null) => Ok(0),
        Some(value) => {
            let n = value.as_i64().ok_or_else(|| {
                DispatchError::InvalidArgRegion(format!("expected an integer, got {value}"))
            })?;
            Ok(n as i32)
        }
    }
}

/// IDENTIFY carries the caller's own identity pair; both fields must be
/// present and non-negative.
fn caller_identity_arg(arg: Option<&Value>) -> DispatchResult<CallerIdentity> {
    let value = required_arg(arg)?;
    let caller: CallerIdentity = serde_json::from_value(value.clone())
        .map_err(|e| DispatchError::InvalidArgRegion(format!("malformed caller identity: {e}")))?;
    if caller.pid < 0 || caller.tgid < 0 {
        return Err(DispatchError::InvalidArgRegion(format!(
            "negative caller identity: {caller}"
        )));
    }
    Ok(caller)
}

fn required_arg(arg: Option<&Value>) -> DispatchResult<&Value> {
    match arg {
        Some(Value::Null) | None => Err(DispatchError::InvalidArgRegion(
            "argument region is required".to_string(),
        )),
        Some(value) => Ok(value),
    }
}

/// Result of an executed command, preserving each command's calling
/// convention: `Value` is the call's own result, `WriteBack` is the value
/// written back through the argument region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandOutput {
    /// Effect-only command (RESET, SET, TELL).
    Done,
    /// Direct return value (QUERY, SHIFT).
    Value(i32),
    /// Value written back through the argument region (GET, EXCHANGE).
    WriteBack(i32),
    /// Snapshot written back through the caller's region (IDENTIFY).
    Snapshot(SchedSnapshot),
}

/// Executes commands against the shared quantum and the caller registry.
///
/// Owns the only two pieces of shared mutable state in the system. The
/// quantum is a single atomic cell, so concurrent SET/TELL/EXCHANGE/SHIFT
/// interleave at whole-operation granularity; the registry serializes itself
/// behind its own lock. The dispatcher keeps no per-request state.
pub struct Dispatcher {
    quantum: AtomicI32,
    registry: Registry,
    sched: Arc<dyn SchedSource>,
}

impl Dispatcher {
    /// Create a dispatcher with the compile-time default quantum.
    pub fn new(sched: Arc<dyn SchedSource>) -> Self {
        Self::with_quantum(DEFAULT_QUANTUM, sched)
    }

    /// Create a dispatcher with a configured initial quantum.
    pub fn with_quantum(initial: i32, sched: Arc<dyn SchedSource>) -> Self {
        Self::with_registry(initial, Registry::new(), sched)
    }

    /// Create a dispatcher around an explicitly constructed registry.
    pub fn with_registry(initial: i32, registry: Registry, sched: Arc<dyn SchedSource>) -> Self {
        Self {
            quantum: AtomicI32::new(initial),
            registry,
            sched,
        }
    }

    /// Current quantum value.
    pub fn quantum(&self) -> i32 {
        self.quantum.load(Ordering::SeqCst)
    }

    /// The caller registry (for teardown reporting and introspection).
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Decode and execute in one step.
    pub fn dispatch(&self, op: &str, arg: Option<&Value>) -> DispatchResult<CommandOutput> {
        self.execute(Command::decode(op, arg)?)
    }

    /// Execute an already decoded command.
    pub fn execute(&self, command: Command) -> DispatchResult<CommandOutput> {
        match command {
            Command::Reset => {
                self.quantum.store(DEFAULT_QUANTUM, Ordering::SeqCst);
                Ok(CommandOutput::Done)
            }
            Command::Set(value) | Command::Tell(value) => {
                self.quantum.store(value, Ordering::SeqCst);
                Ok(CommandOutput::Done)
            }
            Command::Get => Ok(CommandOutput::WriteBack(self.quantum())),
            Command::Query => Ok(CommandOutput::Value(self.quantum())),
            Command::Exchange(value) => {
                let old = self.quantum.swap(value, Ordering::SeqCst);
                Ok(CommandOutput::WriteBack(old))
            }
            Command::Shift(value) => {
                let old = self.quantum.swap(value, Ordering::SeqCst);
                Ok(CommandOutput::Value(old))
            }
            Command::Identify(caller) => {
                // Snapshot first: if introspection fails the registry stays
                // untouched. A dropped insert is deliberately not surfaced,
                // the snapshot is still delivered.
                let snapshot = self.sched.snapshot(caller)?;
                match self.registry.find_or_insert(caller) {
                    InsertOutcome::Inserted => {
                        debug!(pid = caller.pid, tgid = caller.tgid, "New caller recorded");
                    }
                    InsertOutcome::AlreadyPresent | InsertOutcome::Dropped => {}
                }
                Ok(CommandOutput::Snapshot(snapshot))
            }
        }
    }
}
