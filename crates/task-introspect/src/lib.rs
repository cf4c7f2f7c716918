//! Live scheduler introspection for identified callers.
//!
//! [`ProcSched`] implements [`SchedSource`] against the kernel's procfs
//! tree: the caller's (pid, tgid) pair selects `/proc/<tgid>/task/<pid>`,
//! and the snapshot is assembled from that task's `stat` and `status`
//! files. Off Linux there is no procfs to consult, so the source degrades
//! to an identity-only snapshot and the rest of the system keeps working.

use quantum_core::{CallerIdentity, SchedError, SchedSnapshot, SchedSource};

/// Scheduler state source backed by procfs.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcSched;

impl ProcSched {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "linux")]
impl SchedSource for ProcSched {
    fn snapshot(&self, caller: CallerIdentity) -> Result<SchedSnapshot, SchedError> {
        use procfs::process::Process;

        let map_err = |e: procfs::ProcError| match e {
            procfs::ProcError::NotFound(_) => SchedError::TaskNotFound {
                pid: caller.pid,
                tgid: caller.tgid,
            },
            other => SchedError::Source(other.to_string()),
        };

        let process = Process::new(caller.tgid).map_err(map_err)?;
        let task = process.task_from_tid(caller.pid).map_err(map_err)?;
        let stat = task.stat().map_err(map_err)?;
        let status = task.status().map_err(map_err)?;

        let snapshot = SchedSnapshot {
            state: stat.state,
            cpu: stat.processor.unwrap_or(-1),
            prio: stat.priority,
            pid: caller.pid,
            tgid: caller.tgid,
            nvcsw: status.voluntary_ctxt_switches.unwrap_or(0),
            nivcsw: status.nonvoluntary_ctxt_switches.unwrap_or(0),
        };
        tracing::trace!(
            pid = caller.pid,
            tgid = caller.tgid,
            state = %snapshot.state,
            "Captured scheduling snapshot"
        );
        Ok(snapshot)
    }
}

#[cfg(not(target_os = "linux"))]
impl SchedSource for ProcSched {
    fn snapshot(&self, caller: CallerIdentity) -> Result<SchedSnapshot, SchedError> {
        tracing::trace!(
            pid = caller.pid,
            tgid = caller.tgid,
            "No procfs on this platform, returning identity-only snapshot"
        );
        Ok(SchedSnapshot {
            state: '?',
            cpu: -1,
            prio: 0,
            pid: caller.pid,
            tgid: caller.tgid,
            nvcsw: 0,
            nivcsw: 0,
        })
    }
}

/// Identity of the calling task: its own thread id paired with the id of
/// the process it belongs to. For a single-threaded process the two match.
pub fn self_identity() -> CallerIdentity {
    let tgid = std::process::id() as i32;
    #[cfg(target_os = "linux")]
    let pid = unsafe { libc::gettid() };
    #[cfg(not(target_os = "linux"))]
    let pid = tgid;
    CallerIdentity::new(pid, tgid)
}
