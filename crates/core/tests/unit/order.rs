//! # Memory Order Tests
//!
//! Containment in the order lattice and the side flags.

use rstest::rstest;
use weakmem_core::MemoryOrder;

#[rstest]
#[case(MemoryOrder::UNORDERED, MemoryOrder::MONOTONIC, true)]
#[case(MemoryOrder::MONOTONIC, MemoryOrder::ACQUIRE, true)]
#[case(MemoryOrder::MONOTONIC, MemoryOrder::RELEASE, true)]
#[case(MemoryOrder::ACQUIRE, MemoryOrder::RELEASE, false)]
#[case(MemoryOrder::RELEASE, MemoryOrder::ACQUIRE, false)]
#[case(MemoryOrder::RELEASE, MemoryOrder::ACQ_REL, true)]
#[case(MemoryOrder::ACQ_REL, MemoryOrder::SEQ_CST, true)]
#[case(MemoryOrder::SEQ_CST, MemoryOrder::ACQ_REL, false)]
#[case(MemoryOrder::NOT_ATOMIC, MemoryOrder::NOT_ATOMIC, true)]
#[case(MemoryOrder::UNORDERED, MemoryOrder::NOT_ATOMIC, false)]
fn test_subseteq(#[case] need: MemoryOrder, #[case] have: MemoryOrder, #[case] expected: bool) {
    assert_eq!(MemoryOrder::subseteq(need, have), expected);
}

#[test]
fn test_raw_values() {
    assert_eq!(MemoryOrder::NOT_ATOMIC.bits(), 0x00);
    assert_eq!(MemoryOrder::UNORDERED.bits(), 0x01);
    assert_eq!(MemoryOrder::MONOTONIC.bits(), 0x03);
    assert_eq!(MemoryOrder::ACQUIRE.bits(), 0x07);
    assert_eq!(MemoryOrder::RELEASE.bits(), 0x0b);
    assert_eq!(MemoryOrder::ACQ_REL.bits(), 0x0f);
    assert_eq!(MemoryOrder::SEQ_CST.bits(), 0x1f);
    assert_eq!(MemoryOrder::ATOMIC_OP.bits(), 0x20);
    assert_eq!(MemoryOrder::WEAK_CAS.bits(), 0x40);
}

#[test]
fn test_side_flags_do_not_strengthen() {
    let order = MemoryOrder::MONOTONIC | MemoryOrder::ATOMIC_OP | MemoryOrder::WEAK_CAS;
    assert!(order.is_atomic_op());
    assert!(order.is_weak_cas());
    assert!(!order.at_least(MemoryOrder::ACQUIRE));
    assert_eq!(order.strength(), MemoryOrder::MONOTONIC);
    assert_eq!(order.to_string(), "Monotonic|AtomicOp|WeakCAS");
}

#[test]
fn test_from_bits_drops_unknown() {
    assert_eq!(MemoryOrder::from_bits(0x80 | 0x07), MemoryOrder::ACQUIRE);
}
