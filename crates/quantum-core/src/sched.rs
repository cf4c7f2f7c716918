//! Scheduling-metadata source abstraction.
//!
//! The dispatcher never reads `/proc` (or any other introspection facility)
//! itself; IDENTIFY asks a [`SchedSource`] for the caller's snapshot. The
//! production source lives in the `task-introspect` crate, [`StubSched`] is
//! the in-crate double for tests.

use crate::types::{CallerIdentity, SchedSnapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use thiserror::Error;

/// Errors from a scheduling-metadata source.
#[derive(Error, Debug)]
pub enum SchedError {
    /// The requested task does not exist (or is gone already).
    #[error("task not found: pid {pid} tgid {tgid}")]
    TaskNotFound { pid: i32, tgid: i32 },

    /// The source itself failed (I/O, parse, permissions).
    #[error("introspection source error: {0}")]
    Source(String),
}

/// Provider of point-in-time scheduling metadata for a calling task.
pub trait SchedSource: Send + Sync {
    /// Take a snapshot of the given caller's scheduling state.
    fn snapshot(&self, caller: CallerIdentity) -> Result<SchedSnapshot, SchedError>;
}

/// Deterministic [`SchedSource`] for tests.
///
/// Records every caller it was asked about and synthesizes a fixed runnable
/// snapshot for it. [`StubSched::fail_next`] arms a one-shot failure so tests
/// can exercise the IDENTIFY error path.
#[derive(Default)]
pub struct StubSched {
    calls: Mutex<Vec<CallerIdentity>>,
    fail_next: AtomicBool,
}

impl StubSched {
    pub fn new() -> Self {
        Self::default()
    }

    /// All callers snapshotted so far, in call order.
    pub fn calls(&self) -> Vec<CallerIdentity> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of snapshots taken.
    pub fn len(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make the next `snapshot` call fail with `TaskNotFound`.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

impl SchedSource for StubSched {
    fn snapshot(&self, caller: CallerIdentity) -> Result<SchedSnapshot, SchedError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(SchedError::TaskNotFound {
                pid: caller.pid,
                tgid: caller.tgid,
            });
        }
        self.calls.lock().unwrap().push(caller);
        Ok(SchedSnapshot {
            state: 'R',
            cpu: 0,
            prio: 120,
            pid: caller.pid,
            tgid: caller.tgid,
            nvcsw: 0,
            nivcsw: 0,
        })
    }
}
