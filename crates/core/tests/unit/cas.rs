//! # Compare-and-Swap Tests

use mockall::predicate::eq;
use weakmem_core::buffer::Buffer;
use weakmem_core::{Addr, Config, ControlFlags, Host, Memory, MemoryOrder, ThreadId, WeakMem};

use crate::common::harness::{machine, machine_with, on};
use crate::common::mocks::host::kernel;

#[test]
fn test_success_replaces_value() {
    let (mut wm, x) = machine();
    wm.store(x, 7, 32, MemoryOrder::MONOTONIC).unwrap();
    let result = wm
        .cas(x, 7, 9, 32, MemoryOrder::ACQ_REL, MemoryOrder::ACQUIRE)
        .unwrap();
    assert_eq!(result, (9, true));
    assert_eq!(wm.load(x, 32, MemoryOrder::MONOTONIC).unwrap(), 9);
}

#[test]
fn test_mismatch_returns_observed() {
    let (mut wm, x) = machine();
    wm.store(x, 3, 32, MemoryOrder::MONOTONIC).unwrap();
    let result = wm
        .cas(x, 7, 9, 32, MemoryOrder::ACQ_REL, MemoryOrder::ACQUIRE)
        .unwrap();
    assert_eq!(result, (3, false));
    assert_eq!(wm.load(x, 32, MemoryOrder::MONOTONIC).unwrap(), 3);
    assert_eq!(wm.stats().cas_value_failures, 1);
}

#[test]
fn test_success_store_is_atomic() {
    let (mut wm, x) = machine();
    let _ = wm
        .cas(x, 0, 1, 32, MemoryOrder::MONOTONIC, MemoryOrder::MONOTONIC)
        .unwrap();
    let line = *wm.table().buffer(ThreadId(0)).unwrap().newest().unwrap();
    assert!(line.order.is_atomic_op());
    assert_eq!(line.at_seq, 1);
}

#[test]
fn test_seq_cst_success_is_visible_immediately() {
    let (mut wm, x) = machine();
    let _ = on(&mut wm, 1)
        .cas(x, 0, 5, 32, MemoryOrder::SEQ_CST, MemoryOrder::SEQ_CST)
        .unwrap();
    assert_eq!(wm.host_mut().read_u32(x), 5);
}

#[test]
fn test_observed_value_depends_on_visibility_choice() {
    for (choice, expected) in [(0usize, (0u64, false)), (1, (2, true))] {
        let (mut wm, x) = machine_with(&Config::default(), vec![choice]);
        on(&mut wm, 1).store(x, 1, 32, MemoryOrder::MONOTONIC).unwrap();
        let result = on(&mut wm, 2)
            .cas(x, 1, 2, 32, MemoryOrder::ACQ_REL, MemoryOrder::ACQUIRE)
            .unwrap();
        assert_eq!(result, expected);
    }
}

#[test]
fn test_weak_cas_can_fail_spuriously() {
    let x = Addr::new(0x4000);
    let mut host = kernel(ControlFlags::NONE, ThreadId(0));
    let _ = host.expect_read_u32().with(eq(x)).times(1).return_const(7u32);
    let _ = host.expect_choose().with(eq(2)).times(1).return_const(1usize);
    let _ = host.expect_write_u32().never();
    let mut wm = WeakMem::with_defaults(host);

    let order = MemoryOrder::ACQ_REL | MemoryOrder::WEAK_CAS;
    let result = wm.cas(x, 7, 8, 32, order, MemoryOrder::ACQUIRE).unwrap();
    assert_eq!(result, (7, false));
    assert_eq!(wm.stats().cas_spurious_failures, 1);
    assert!(wm.table().is_empty());
}

#[test]
fn test_weak_cas_may_also_succeed() {
    let x = Addr::new(0x4000);
    let mut host = kernel(ControlFlags::NONE, ThreadId(0));
    let _ = host.expect_read_u32().return_const(7u32);
    let _ = host.expect_choose().with(eq(2)).times(1).return_const(0usize);
    let mut wm = WeakMem::with_defaults(host);

    let order = MemoryOrder::ACQ_REL | MemoryOrder::WEAK_CAS;
    assert_eq!(wm.cas(x, 7, 8, 32, order, MemoryOrder::ACQUIRE).unwrap(), (8, true));
    assert_eq!(wm.table().buffer(ThreadId(0)).map(Buffer::len), Some(1));
}

#[test]
fn test_bypassed_cas_writes_memory() {
    let (mut wm, x) = machine();
    wm.host_mut().set_control_flags(ControlFlags::KERNEL_MODE);
    let result = wm
        .cas(x, 0, 4, 16, MemoryOrder::MONOTONIC, MemoryOrder::MONOTONIC)
        .unwrap();
    assert_eq!(result, (4, true));
    assert_eq!(wm.host_mut().read_u16(x), 4);
    assert!(wm.table().is_empty());
}
