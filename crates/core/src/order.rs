//! Memory order lattice.
//!
//! Orders are bit sets. Each stronger order contains every bit of the orders
//! below it, so "is this at least Release" is a containment test:
//!
//! ```text
//! Unordered  = 0b0000_0001
//! Monotonic  = 0b0000_0011   (Unordered + bit 1)
//! Acquire    = 0b0000_0111   (Monotonic + bit 2)
//! Release    = 0b0000_1011   (Monotonic + bit 3)
//! AcqRel     = 0b0000_1111
//! SeqCst     = 0b0001_1111   (AcqRel + bit 4)
//! AtomicOp   = 0b0010_0000   side flag: read-modify-write component
//! WeakCAS    = 0b0100_0000   side flag: compare-and-swap may fail spuriously
//! ```

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A memory order, possibly tagged with side flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MemoryOrder(u8);

impl MemoryOrder {
    /// Plain, non-atomic access.
    pub const NOT_ATOMIC: Self = Self(0);
    /// Atomic without ordering or coherence guarantees.
    pub const UNORDERED: Self = Self(0b0000_0001);
    /// Relaxed atomic (per-location coherence).
    pub const MONOTONIC: Self = Self(0b0000_0010 | Self::UNORDERED.0);
    /// Acquire.
    pub const ACQUIRE: Self = Self(0b0000_0100 | Self::MONOTONIC.0);
    /// Release.
    pub const RELEASE: Self = Self(0b0000_1000 | Self::MONOTONIC.0);
    /// Acquire and release.
    pub const ACQ_REL: Self = Self(Self::ACQUIRE.0 | Self::RELEASE.0);
    /// Sequentially consistent.
    pub const SEQ_CST: Self = Self(0b0001_0000 | Self::ACQ_REL.0);
    /// Side flag: the access belongs to an atomic read-modify-write.
    pub const ATOMIC_OP: Self = Self(0b0010_0000);
    /// Side flag: a compare-and-swap may fail even when the value matches.
    pub const WEAK_CAS: Self = Self(0b0100_0000);

    const ALL: u8 = Self::SEQ_CST.0 | Self::ATOMIC_OP.0 | Self::WEAK_CAS.0;

    /// Builds an order from raw bits, dropping unknown bits.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL)
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if every bit of `need` is set in `have`.
    ///
    /// `subseteq(MemoryOrder::RELEASE, order)` reads "order is at least Release".
    #[inline]
    pub const fn subseteq(need: Self, have: Self) -> bool {
        need.0 & have.0 == need.0
    }

    /// Returns true if `self` contains every bit of `need`.
    #[inline]
    pub const fn at_least(self, need: Self) -> bool {
        Self::subseteq(need, self)
    }

    /// Returns the order with the side flags removed.
    pub const fn strength(self) -> Self {
        Self(self.0 & Self::SEQ_CST.0)
    }

    /// Returns true if the atomic read-modify-write flag is set.
    pub const fn is_atomic_op(self) -> bool {
        Self::subseteq(Self::ATOMIC_OP, self)
    }

    /// Returns true if the weak compare-and-swap flag is set.
    pub const fn is_weak_cas(self) -> bool {
        Self::subseteq(Self::WEAK_CAS, self)
    }

    /// Returns true if the order is at least sequentially consistent.
    pub const fn is_seq_cst(self) -> bool {
        Self::subseteq(Self::SEQ_CST, self)
    }
}

impl BitOr for MemoryOrder {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for MemoryOrder {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for MemoryOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.strength() {
            Self::NOT_ATOMIC => "NotAtomic",
            Self::UNORDERED => "Unordered",
            Self::MONOTONIC => "Monotonic",
            Self::ACQUIRE => "Acquire",
            Self::RELEASE => "Release",
            Self::ACQ_REL => "AcqRel",
            Self::SEQ_CST => "SeqCst",
            _ => "Mixed",
        };
        f.write_str(name)?;
        if self.is_atomic_op() {
            f.write_str("|AtomicOp")?;
        }
        if self.is_weak_cas() {
            f.write_str("|WeakCAS")?;
        }
        Ok(())
    }
}
