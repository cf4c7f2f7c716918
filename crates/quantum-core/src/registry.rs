//! Mutex-guarded, insertion-ordered registry of distinct caller identities.
//!
//! One coarse lock guards the whole collection. The registry is
//! low-cardinality and low-frequency compared to command traffic, so a single
//! exclusive lock over a vector is the whole concurrency story: no per-entry
//! locking, no sharding.

use crate::types::CallerIdentity;
use std::sync::Mutex;
use tracing::warn;

/// Outcome of a [`Registry::find_or_insert`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// First sighting; the identity was appended at the tail.
    Inserted,
    /// The identity was already recorded; nothing changed.
    AlreadyPresent,
    /// Storage could not be grown; the record was dropped. Non-fatal: the
    /// command that triggered the insert still succeeds.
    Dropped,
}

/// Insertion-ordered collection of unique caller identities.
///
/// Grows on first sighting of a new identity and never shrinks except at
/// [`Registry::drain_and_report`]. Vector order is discovery order.
pub struct Registry {
    entries: Mutex<Vec<CallerIdentity>>,
    capacity_limit: Option<usize>,
}

impl Registry {
    /// Create an empty, unbounded registry.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            capacity_limit: None,
        }
    }

    /// Create an empty registry that refuses to grow beyond `limit` entries.
    ///
    /// Exceeding the limit behaves exactly like an allocation failure: the
    /// record is dropped with a warning and the caller's command succeeds.
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            capacity_limit: Some(limit),
        }
    }

    /// Record `caller` if it has not been seen before.
    ///
    /// Scans the whole collection under the lock; duplicates are detected on
    /// the full (pid, tgid) pair. New identities are appended at the tail so
    /// discovery order is preserved.
    pub fn find_or_insert(&self, caller: CallerIdentity) -> InsertOutcome {
        let mut entries = self.entries.lock().unwrap();

        if entries.iter().any(|entry| *entry == caller) {
            return InsertOutcome::AlreadyPresent;
        }

        if let Some(limit) = self.capacity_limit {
            if entries.len() >= limit {
                warn!(
                    pid = caller.pid,
                    tgid = caller.tgid,
                    limit,
                    "Registry full, dropping caller record"
                );
                return InsertOutcome::Dropped;
            }
        }

        if let Err(e) = entries.try_reserve(1) {
            warn!(
                pid = caller.pid,
                tgid = caller.tgid,
                error = %e,
                "Registry allocation failed, dropping caller record"
            );
            return InsertOutcome::Dropped;
        }

        entries.push(caller);
        InsertOutcome::Inserted
    }

    /// Number of distinct identities currently recorded.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the recorded identities in discovery order.
    pub fn callers(&self) -> Vec<CallerIdentity> {
        self.entries.lock().unwrap().clone()
    }

    /// Drain the registry, invoking `report` once per entry with a 1-based
    /// sequence number in discovery order. Returns the number of entries
    /// reported.
    ///
    /// The collection is taken in a single pass under the lock, so a
    /// concurrent `find_or_insert` lands either before the drain (and is
    /// reported) or after it (into the emptied registry). A second call
    /// finds an empty registry and reports nothing.
    pub fn drain_and_report<F>(&self, mut report: F) -> usize
    where
        F: FnMut(usize, CallerIdentity),
    {
        let drained = {
            let mut entries = self.entries.lock().unwrap();
            std::mem::take(&mut *entries)
        };

        for (index, caller) in drained.iter().enumerate() {
            report(index + 1, *caller);
        }
        drained.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sighting_inserts() {
        let registry = Registry::new();
        assert_eq!(
            registry.find_or_insert(CallerIdentity::new(10, 10)),
            InsertOutcome::Inserted
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_is_not_reinserted() {
        let registry = Registry::new();
        registry.find_or_insert(CallerIdentity::new(10, 10));
        assert_eq!(
            registry.find_or_insert(CallerIdentity::new(10, 10)),
            InsertOutcome::AlreadyPresent
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn pair_is_the_uniqueness_key() {
        let registry = Registry::new();
        registry.find_or_insert(CallerIdentity::new(10, 10));
        registry.find_or_insert(CallerIdentity::new(10, 11));
        registry.find_or_insert(CallerIdentity::new(11, 10));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn capacity_limit_drops_without_failing() {
        let registry = Registry::with_capacity_limit(2);
        assert_eq!(
            registry.find_or_insert(CallerIdentity::new(1, 1)),
            InsertOutcome::Inserted
        );
        assert_eq!(
            registry.find_or_insert(CallerIdentity::new(2, 2)),
            InsertOutcome::Inserted
        );
        assert_eq!(
            registry.find_or_insert(CallerIdentity::new(3, 3)),
            InsertOutcome::Dropped
        );
        // Known identities still dedupe above the limit
        assert_eq!(
            registry.find_or_insert(CallerIdentity::new(1, 1)),
            InsertOutcome::AlreadyPresent
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn drain_reports_in_discovery_order() {
        let registry = Registry::new();
        registry.find_or_insert(CallerIdentity::new(30, 30));
        registry.find_or_insert(CallerIdentity::new(10, 10));
        registry.find_or_insert(CallerIdentity::new(20, 20));

        let mut reported = Vec::new();
        let count = registry.drain_and_report(|seq, caller| reported.push((seq, caller)));

        assert_eq!(count, 3);
        assert_eq!(
            reported,
            vec![
                (1, CallerIdentity::new(30, 30)),
                (2, CallerIdentity::new(10, 10)),
                (3, CallerIdentity::new(20, 20)),
            ]
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn second_drain_is_a_noop() {
        let registry = Registry::new();
        registry.find_or_insert(CallerIdentity::new(1, 1));

        assert_eq!(registry.drain_and_report(|_, _| {}), 1);

        let mut called = false;
        assert_eq!(
            registry.drain_and_report(|_, _| {
                called = true;
            }),
            0
        );
        assert!(!called);
    }

    #[test]
    fn drain_on_empty_registry_is_a_noop() {
        let registry = Registry::new();
        assert_eq!(registry.drain_and_report(|_, _| panic!("no entries")), 0);
    }

    #[test]
    fn callers_returns_a_copy() {
        let registry = Registry::new();
        registry.find_or_insert(CallerIdentity::new(5, 5));

        let callers = registry.callers();
        assert_eq!(callers, vec![CallerIdentity::new(5, 5)]);

        // The copy is detached from the registry
        registry.find_or_insert(CallerIdentity::new(6, 6));
        assert_eq!(callers.len(), 1);
    }
}
