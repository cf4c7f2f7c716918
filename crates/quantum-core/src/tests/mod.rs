//! Behavior tests for the quantum control plane, organized by concern:
//!
//! - `commands`: each command's effect and calling convention
//! - `registry`: caller deduplication, ordering, and drain
//! - `validation`: selector/argument rejection before any effect
//! - `concurrency`: shared dispatcher under parallel callers

mod concurrency;
mod registry;

use crate::{CallerIdentity, CommandOutput, Dispatcher, StubSched, DEFAULT_QUANTUM};
use std::sync::Arc;

pub(crate) fn dispatcher() -> Dispatcher {
    Dispatcher::new(Arc::new(StubSched::new()))
}

#[test]
fn basic_workflow() {
    let d = dispatcher();

    // Fresh state: the compile-time default.
    assert_eq!(
        d.dispatch("quantum.query", None).unwrap(),
        CommandOutput::Value(DEFAULT_QUANTUM)
    );

    // Store, observe, swap, restore.
    d.dispatch("quantum.set", Some(&serde_json::json!(8192)))
        .unwrap();
    assert_eq!(
        d.dispatch("quantum.get", None).unwrap(),
        CommandOutput::WriteBack(8192)
    );
    assert_eq!(
        d.dispatch("quantum.exchange", Some(&serde_json::json!(99)))
            .unwrap(),
        CommandOutput::WriteBack(8192)
    );
    d.dispatch("quantum.reset", None).unwrap();
    assert_eq!(d.quantum(), DEFAULT_QUANTUM);

    // One identified caller ends up in the registry exactly once.
    let arg = serde_json::json!({"pid": 42, "tgid": 40});
    d.dispatch("caller.identify", Some(&arg)).unwrap();
    d.dispatch("caller.identify", Some(&arg)).unwrap();
    assert_eq!(d.registry().callers(), vec![CallerIdentity::new(42, 40)]);
}
