//! # Interrupt Mask Tests
//!
//! Every operation masks interrupts for its duration and restores the caller's
//! mask state afterwards; kernel and debug modes go straight to memory.

use mockall::Sequence;
use mockall::predicate::eq;
use rstest::rstest;
use weakmem_core::mask::InterruptMask;
use weakmem_core::{Addr, ControlFlags, Fault, Host, MemoryOrder, ThreadId, WeakMem};

use crate::common::harness::machine;
use crate::common::mocks::host::{MockKernel, kernel};

#[test]
fn test_store_masks_then_restores() {
    let mut host = MockKernel::new();
    let mut seq = Sequence::new();
    let _ = host.expect_control_flags().return_const(ControlFlags::NONE);
    let _ = host.expect_thread_id().return_const(ThreadId(0));
    let _ = host
        .expect_set_control_flags()
        .with(eq(ControlFlags::MASK))
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    let _ = host
        .expect_set_control_flags()
        .with(eq(ControlFlags::NONE))
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    let _ = host.expect_write_u32().never();

    let mut wm = WeakMem::with_defaults(host);
    wm.store(Addr::new(0x100), 1, 32, MemoryOrder::MONOTONIC).unwrap();
    assert_eq!(wm.table().thread_count(), 1);
}

#[rstest]
#[case(ControlFlags::KERNEL_MODE)]
#[case(ControlFlags::DEBUG_MODE)]
#[case(ControlFlags::WEAKMEM_BYPASS)]
fn test_bypass_modes_access_memory_directly(#[case] mode: ControlFlags) {
    let x = Addr::new(0x200);
    let mut host = kernel(mode, ThreadId(0));
    let _ = host
        .expect_write_u32()
        .with(eq(x), eq(5u32))
        .times(1)
        .return_const(());
    let _ = host.expect_read_u32().with(eq(x)).times(1).return_const(5u32);

    let mut wm = WeakMem::with_defaults(host);
    wm.store(x, 5, 32, MemoryOrder::MONOTONIC).unwrap();
    assert_eq!(wm.load(x, 32, MemoryOrder::MONOTONIC).unwrap(), 5);
    wm.fence(MemoryOrder::RELEASE);
    assert!(wm.table().is_empty());
}

#[test]
fn test_mask_restored_on_fault() {
    let (mut wm, _) = machine();
    assert_eq!(
        wm.store(Addr::NULL, 1, 8, MemoryOrder::MONOTONIC),
        Err(Fault::NullAddress)
    );
    assert_eq!(wm.host().control_flags(), ControlFlags::NONE);
}

#[test]
fn test_already_masked_caller_stays_masked() {
    let (mut wm, x) = machine();
    wm.host_mut().set_control_flags(ControlFlags::MASK);
    wm.store(x, 1, 8, MemoryOrder::MONOTONIC).unwrap();
    assert_eq!(wm.host().control_flags(), ControlFlags::MASK);
}

#[test]
fn test_guard_exposes_saved_flags() {
    let (mut wm, _) = machine();
    wm.host_mut().set_control_flags(ControlFlags::KERNEL_MODE);
    let guard = InterruptMask::new(wm.host_mut());
    assert!(guard.bypassed());
    assert_eq!(guard.saved(), ControlFlags::KERNEL_MODE);
    assert!(guard.control_flags().contains(ControlFlags::MASK));
    drop(guard);
    assert_eq!(wm.host().control_flags(), ControlFlags::KERNEL_MODE);
}
