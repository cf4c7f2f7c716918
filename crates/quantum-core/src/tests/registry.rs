//! Registry behavior as seen through IDENTIFY: deduplication on the full
//! identity pair, first-seen ordering, and the drain-once report.

use super::dispatcher;
use crate::{CallerIdentity, Registry};
use serde_json::json;

fn identify(d: &crate::Dispatcher, pid: i32, tgid: i32) {
    d.dispatch("caller.identify", Some(&json!({"pid": pid, "tgid": tgid})))
        .unwrap();
}

#[test]
fn each_distinct_pair_is_recorded_once() {
    let d = dispatcher();

    identify(&d, 10, 10);
    identify(&d, 11, 11);
    identify(&d, 10, 10);
    identify(&d, 12, 12);

    assert_eq!(
        d.registry().callers(),
        vec![
            CallerIdentity::new(10, 10),
            CallerIdentity::new(11, 11),
            CallerIdentity::new(12, 12),
        ]
    );
}

#[test]
fn dedup_compares_the_whole_pair() {
    let d = dispatcher();

    // Threads of one process share a tgid but differ in pid; both count.
    identify(&d, 100, 100);
    identify(&d, 101, 100);
    // Same pid under a different tgid is likewise distinct.
    identify(&d, 100, 99);

    assert_eq!(d.registry().len(), 3);
}

#[test]
fn drain_reports_in_first_seen_order_with_one_based_sequence() {
    let d = dispatcher();
    identify(&d, 3, 3);
    identify(&d, 1, 1);
    identify(&d, 2, 2);

    let mut reported = Vec::new();
    let count = d.registry().drain_and_report(|seq, caller| {
        reported.push((seq, caller));
    });

    assert_eq!(count, 3);
    assert_eq!(
        reported,
        vec![
            (1, CallerIdentity::new(3, 3)),
            (2, CallerIdentity::new(1, 1)),
            (3, CallerIdentity::new(2, 2)),
        ]
    );
}

#[test]
fn drain_empties_the_registry_and_a_second_drain_reports_nothing() {
    let d = dispatcher();
    identify(&d, 8, 8);

    assert_eq!(d.registry().drain_and_report(|_, _| {}), 1);
    assert!(d.registry().is_empty());

    let count = d.registry().drain_and_report(|_, _| {
        panic!("second drain must not report");
    });
    assert_eq!(count, 0);
}

#[test]
fn identify_works_again_after_a_drain() {
    let d = dispatcher();
    identify(&d, 5, 5);
    d.registry().drain_and_report(|_, _| {});

    identify(&d, 5, 5);
    assert_eq!(d.registry().callers(), vec![CallerIdentity::new(5, 5)]);
}

#[test]
fn drain_on_a_never_used_registry_is_a_no_op() {
    let registry = Registry::new();
    assert_eq!(registry.drain_and_report(|_, _| {}), 0);
}
