//! Guest address type.
//!
//! This module defines a strong type for addresses issued by instrumented code. It provides:
//! 1. **Type Safety:** Keeps guest addresses apart from sizes, values, and bit widths.
//! 2. **Range Arithmetic:** Half-open byte-range containment and overlap tests.

use std::fmt;

/// An address in the guest program's address space.
///
/// Addresses are opaque to this crate; all reads and writes go through the
/// host's [`Memory`](crate::host::Memory) implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Addr(pub u64);

impl Addr {
    /// The null address.
    pub const NULL: Self = Self(0);

    /// Creates a new address from a raw 64-bit value.
    ///
    /// # Arguments
    ///
    /// * `addr` - The raw 64-bit address value.
    ///
    /// # Returns
    ///
    /// A new `Addr` wrapping the provided value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(self) -> u64 {
        self.0
    }

    /// Returns true if this is the null address.
    #[inline(always)]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Returns the address `bytes` past this one (wrapping).
    #[inline(always)]
    pub const fn offset(self, bytes: u64) -> Self {
        Self(self.0.wrapping_add(bytes))
    }

    /// Returns true if `[self, self + size)` and `[other, other + other_size)` share a byte.
    ///
    /// The test is symmetric; empty ranges never overlap.
    pub const fn overlaps(self, size: u64, other: Self, other_size: u64) -> bool {
        size != 0
            && other_size != 0
            && self.0 < other.0.wrapping_add(other_size)
            && other.0 < self.0.wrapping_add(size)
    }

    /// Returns true if this address lies within `[base, base + size)`.
    pub const fn within(self, base: Self, size: u64) -> bool {
        self.0 >= base.0 && self.0 - base.0 < size
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for Addr {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}
