//! Parallel callers against one shared dispatcher. These pin down the
//! whole-operation guarantees: no torn reads, no lost swap values, no
//! duplicated or dropped registry entries.

use super::dispatcher;
use crate::{CommandOutput, DEFAULT_QUANTUM};
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

#[test]
fn parallel_identify_records_every_distinct_caller() {
    let d = Arc::new(dispatcher());
    let mut handles = Vec::new();

    for i in 0..8i32 {
        let d = Arc::clone(&d);
        handles.push(thread::spawn(move || {
            let arg = json!({"pid": 1000 + i, "tgid": 1000});
            for _ in 0..3 {
                d.dispatch("caller.identify", Some(&arg)).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let callers = d.registry().callers();
    assert_eq!(callers.len(), 8);
    let pids: BTreeSet<i32> = callers.iter().map(|c| c.pid).collect();
    assert_eq!(pids, (1000..1008).collect());
}

#[test]
fn parallel_identify_of_one_caller_records_it_once() {
    let d = Arc::new(dispatcher());
    let mut handles = Vec::new();

    for _ in 0..8 {
        let d = Arc::clone(&d);
        handles.push(thread::spawn(move || {
            for _ in 0..10 {
                d.dispatch("caller.identify", Some(&json!({"pid": 77, "tgid": 77})))
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(d.registry().len(), 1);
}

#[test]
fn concurrent_exchanges_never_lose_a_value() {
    let d = Arc::new(dispatcher());
    let mut handles = Vec::new();

    for i in 1..=8i32 {
        let d = Arc::clone(&d);
        handles.push(thread::spawn(move || {
            match d.dispatch("quantum.exchange", Some(&json!(i))).unwrap() {
                CommandOutput::WriteBack(old) => old,
                other => panic!("unexpected output {other:?}"),
            }
        }));
    }

    let mut observed: Vec<i32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    observed.push(d.quantum());
    observed.sort_unstable();

    // Every value enters the cell exactly once and leaves exactly once,
    // either through a swap or as the final resting value.
    let mut expected: Vec<i32> = (1..=8).collect();
    expected.push(DEFAULT_QUANTUM);
    expected.sort_unstable();
    assert_eq!(observed, expected);
}

#[test]
fn readers_only_observe_whole_values() {
    let d = Arc::new(dispatcher());
    let allowed: BTreeSet<i32> = [DEFAULT_QUANTUM, 111, 222, 333].into_iter().collect();
    let mut handles = Vec::new();

    for value in [111, 222, 333] {
        let d = Arc::clone(&d);
        handles.push(thread::spawn(move || {
            for _ in 0..50 {
                d.dispatch("quantum.tell", Some(&json!(value))).unwrap();
            }
        }));
    }
    for _ in 0..3 {
        let d = Arc::clone(&d);
        let allowed = allowed.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..50 {
                match d.dispatch("quantum.query", None).unwrap() {
                    CommandOutput::Value(v) => assert!(allowed.contains(&v), "torn read: {v}"),
                    other => panic!("unexpected output {other:?}"),
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(allowed.contains(&d.quantum()));
}
