//! # Statistics Tests

use weakmem_core::stats::WeakMemStats;
use weakmem_core::{Config, MemoryOrder};

use crate::common::harness::{machine, machine_with, on};

#[test]
fn test_counters_track_paths() {
    let (mut wm, x) = machine_with(&Config::default(), vec![1]);
    on(&mut wm, 0).store(x, 1, 32, MemoryOrder::MONOTONIC).unwrap();
    let _ = wm.load(x, 32, MemoryOrder::MONOTONIC).unwrap();
    let _ = on(&mut wm, 1).load(x, 32, MemoryOrder::MONOTONIC).unwrap();

    let stats = wm.stats();
    assert_eq!(stats.stores_buffered, 1);
    assert_eq!(stats.loads, 2);
    assert_eq!(stats.loads_forwarded, 1);
    assert_eq!(stats.choice_points, 1);
    assert_eq!(stats.partial_flushes, 1);
}

#[test]
fn test_json_report() {
    let (mut wm, x) = machine();
    wm.store(x, 1, 32, MemoryOrder::SEQ_CST).unwrap();
    let json: serde_json::Value = serde_json::from_str(&wm.stats().to_json()).unwrap();
    assert_eq!(json["stores_direct"], 1);
    assert_eq!(json["stores_buffered"], 0);
}

#[test]
fn test_display_lists_every_counter() {
    let text = WeakMemStats::default().to_string();
    assert!(text.starts_with("weakmem statistics"));
    assert_eq!(text.lines().count(), 13);
}

#[test]
fn test_dump_includes_counters() {
    let (mut wm, x) = machine();
    wm.store(x, 1, 32, MemoryOrder::MONOTONIC).unwrap();
    let text = wm.dump();
    assert!(text.contains("T0: ["));
    assert!(text.contains("stores buffered"));
}
