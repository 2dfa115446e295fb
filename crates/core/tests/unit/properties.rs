//! # Property Tests
//!
//! Random programs checked against invariants that must hold for every
//! choice sequence.

use proptest::prelude::*;
use weakmem_core::common::width;
use weakmem_core::{Addr, Config, MemoryOrder, ThreadId};

use crate::common::harness::{OBJECT_SIZE, machine_with, on};

/// One operation of a random program.
#[derive(Clone, Debug)]
enum Op {
    Store { tid: u64, offset: u64, value: u64, bitwidth: u32, order: MemoryOrder },
    Load { tid: u64, offset: u64, bitwidth: u32 },
    Fence { tid: u64, order: MemoryOrder },
}

fn order() -> impl Strategy<Value = MemoryOrder> {
    prop_oneof![
        4 => Just(MemoryOrder::MONOTONIC),
        1 => Just(MemoryOrder::RELEASE),
        1 => Just(MemoryOrder::SEQ_CST),
        1 => Just(MemoryOrder::NOT_ATOMIC),
    ]
}

fn access() -> impl Strategy<Value = (u64, u32)> {
    (1u32..=64).prop_flat_map(|bitwidth| {
        let size = width::byte_size(bitwidth);
        (0..=OBJECT_SIZE - size, Just(bitwidth))
    })
}

fn op(threads: u64) -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..threads, access(), any::<u64>(), order()).prop_map(|(tid, (offset, bitwidth), value, order)| {
            Op::Store { tid, offset, value, bitwidth, order }
        }),
        2 => (0..threads, access()).prop_map(|(tid, (offset, bitwidth))| Op::Load { tid, offset, bitwidth }),
        1 => (0..threads, order()).prop_map(|(tid, order)| Op::Fence { tid, order }),
    ]
}

fn shadow_store(shadow: &mut [u8], offset: u64, value: u64, bitwidth: u32) {
    let value = value & width::mask(bitwidth);
    for i in 0..width::byte_size(bitwidth) {
        shadow[(offset + i) as usize] = width::byte_of(value, i);
    }
}

fn shadow_load(shadow: &[u8], offset: u64, bitwidth: u32) -> u64 {
    let start = offset as usize;
    let end = start + width::byte_size(bitwidth) as usize;
    width::assemble(&shadow[start..end]) & width::mask(bitwidth)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// A single thread always reads its own latest writes, whatever the width,
    /// alignment, or eviction pattern.
    #[test]
    fn prop_single_thread_is_sequential(ops in prop::collection::vec(op(1), 1..40)) {
        let (mut wm, obj) = machine_with(&Config::default(), Vec::new());
        let mut shadow = vec![0u8; OBJECT_SIZE as usize];
        for op in ops {
            match op {
                Op::Store { offset, value, bitwidth, order, .. } => {
                    wm.store(obj.offset(offset), value, bitwidth, order).unwrap();
                    shadow_store(&mut shadow, offset, value, bitwidth);
                }
                Op::Load { offset, bitwidth, .. } => {
                    let got = wm.load(obj.offset(offset), bitwidth, MemoryOrder::MONOTONIC).unwrap();
                    prop_assert_eq!(got, shadow_load(&shadow, offset, bitwidth));
                }
                Op::Fence { order, .. } => wm.fence(order),
            }
        }
    }

    /// Buffers never exceed their capacity and sequence counters stay
    /// consistent, for any program and any choice script.
    #[test]
    fn prop_capacity_and_sequencing(
        ops in prop::collection::vec(op(3), 1..40),
        script in prop::collection::vec(0usize..8, 0..40),
        capacity in 1usize..4,
    ) {
        let mut config = Config::default();
        config.buffer.capacity = capacity;
        let (mut wm, obj) = machine_with(&config, script);
        for op in ops {
            match op {
                Op::Store { tid, offset, value, bitwidth, order } => {
                    on(&mut wm, tid).store(obj.offset(offset), value, bitwidth, order).unwrap();
                }
                Op::Load { tid, offset, bitwidth } => {
                    let _ = on(&mut wm, tid).load(obj.offset(offset), bitwidth, MemoryOrder::MONOTONIC).unwrap();
                }
                Op::Fence { tid, order } => on(&mut wm, tid).fence(order),
            }
            for (_, buf) in wm.table().iter() {
                prop_assert!(buf.store_count() <= capacity);
                prop_assert!(!buf.is_empty());
            }
            prop_assert!(wm.table().sequence_invariants_hold());
        }
        prop_assert!(wm.host().faults().is_empty());
    }

    /// After `cleanup`, no line of the calling thread points into the object.
    #[test]
    fn prop_cleanup_leaves_nothing_behind(
        ops in prop::collection::vec(op(2), 1..30),
        script in prop::collection::vec(0usize..4, 0..30),
    ) {
        let (mut wm, obj) = machine_with(&Config::default(), script);
        for op in ops {
            if let Op::Store { tid, offset, value, bitwidth, order } = op {
                on(&mut wm, tid).store(obj.offset(offset), value, bitwidth, order).unwrap();
            }
        }
        on(&mut wm, 0).cleanup(&[obj]).unwrap();
        if let Some(buf) = wm.table().buffer(ThreadId(0)) {
            prop_assert!(buf.iter().all(|l| !l.addr.is_some_and(|a| a.within(obj, OBJECT_SIZE))));
        }
    }

    /// A compare-and-swap against the visible value succeeds and the new value
    /// is then read back.
    #[test]
    fn prop_cas_success_is_read_back(
        prior in prop::collection::vec((0u64..8, any::<u32>()), 0..6),
        new in any::<u32>(),
        slot in 0u64..8,
    ) {
        let (mut wm, obj) = machine_with(&Config::default(), Vec::new());
        for (s, v) in prior {
            wm.store(obj.offset(s * 4), u64::from(v), 32, MemoryOrder::MONOTONIC).unwrap();
        }
        let addr: Addr = obj.offset(slot * 4);
        let current = wm.load(addr, 32, MemoryOrder::ACQUIRE).unwrap();
        let (value, ok) = wm
            .cas(addr, current, u64::from(new), 32, MemoryOrder::ACQ_REL, MemoryOrder::ACQUIRE)
            .unwrap();
        prop_assert!(ok);
        prop_assert_eq!(value, u64::from(new));
        prop_assert_eq!(wm.load(addr, 32, MemoryOrder::MONOTONIC).unwrap(), u64::from(new));
    }
}
