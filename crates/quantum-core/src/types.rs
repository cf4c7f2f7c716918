//! Core value types shared across the dispatcher and registry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Compile-time default for the shared quantum. RESET always restores this
/// value, regardless of what the daemon was configured to start with.
pub const DEFAULT_QUANTUM: i32 = 4000;

/// Identity of a distinct calling context: the calling thread of control
/// (`pid`) and its thread group (`tgid`). For a single-threaded process the
/// two are equal. Uniqueness key is the whole pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub pid: i32,
    pub tgid: i32,
}

impl CallerIdentity {
    pub fn new(pid: i32, tgid: i32) -> Self {
        Self { pid, tgid }
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid {} tgid {}", self.pid, self.tgid)
    }
}

/// Point-in-time copy of caller-visible scheduling metadata, taken when an
/// IDENTIFY command executes. Returned to the caller, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedSnapshot {
    /// Run state as reported by the scheduler ('R', 'S', 'D', ...).
    pub state: char,
    /// CPU the task last ran on, or -1 when unknown.
    pub cpu: i32,
    /// Scheduler priority.
    pub prio: i64,
    pub pid: i32,
    pub tgid: i32,
    /// Voluntary context switches.
    pub nvcsw: u64,
    /// Involuntary context switches.
    pub nivcsw: u64,
}
