//! Host interface.
//!
//! This module defines the traits implemented by the virtual machine hosting the
//! simulation layer. It provides:
//! 1. **Memory:** Raw 8/16/32/64-bit reads and writes of guest memory.
//! 2. **Choice:** The nondeterministic branch primitive the model checker forks on.
//! 3. **Faults:** The fatal error hook.
//! 4. **Control Flags:** The VM control register (interrupt mask, kernel/debug/bypass modes).
//! 5. **Identity:** The running thread and the bounds of heap objects.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use crate::common::width;
use crate::common::{Addr, FaultKind};

/// Identity of a logical thread as assigned by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(pub u64);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// The VM control-flag register.
///
/// Only the bits below are interpreted; other bits are preserved verbatim.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ControlFlags(pub u64);

impl ControlFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Interrupts (thread switches) are suppressed.
    pub const MASK: Self = Self(1 << 0);
    /// The VM is executing kernel code.
    pub const KERNEL_MODE: Self = Self(1 << 1);
    /// The VM is executing debug-only code.
    pub const DEBUG_MODE: Self = Self(1 << 2);
    /// Memory operations bypass the store buffers.
    pub const WEAKMEM_BYPASS: Self = Self(1 << 3);

    /// Returns true if every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if any bit of `other` is set.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns true if memory operations must go straight to memory.
    pub const fn bypassed(self) -> bool {
        self.intersects(Self(
            Self::KERNEL_MODE.0 | Self::DEBUG_MODE.0 | Self::WEAKMEM_BYPASS.0,
        ))
    }
}

impl BitOr for ControlFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for ControlFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for ControlFlags {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

/// Raw access to guest memory.
///
/// All multi-byte accesses are little-endian and may be unaligned.
pub trait Memory {
    /// Reads one byte.
    fn read_u8(&mut self, addr: Addr) -> u8;
    /// Reads two bytes.
    fn read_u16(&mut self, addr: Addr) -> u16;
    /// Reads four bytes.
    fn read_u32(&mut self, addr: Addr) -> u32;
    /// Reads eight bytes.
    fn read_u64(&mut self, addr: Addr) -> u64;
    /// Writes one byte.
    fn write_u8(&mut self, addr: Addr, val: u8);
    /// Writes two bytes.
    fn write_u16(&mut self, addr: Addr, val: u16);
    /// Writes four bytes.
    fn write_u32(&mut self, addr: Addr, val: u32);
    /// Writes eight bytes.
    fn write_u64(&mut self, addr: Addr, val: u64);

    /// Reads a `bitwidth`-bit value using the narrowest access that holds it.
    ///
    /// The result is masked to `bitwidth` bits.
    fn read_width(&mut self, addr: Addr, bitwidth: u32) -> u64 {
        let raw = match width::byte_size(bitwidth) {
            1 => u64::from(self.read_u8(addr)),
            2 => u64::from(self.read_u16(addr)),
            4 => u64::from(self.read_u32(addr)),
            _ => self.read_u64(addr),
        };
        raw & width::mask(bitwidth)
    }

    /// Writes the low `bitwidth` bits of `value` using the narrowest access that holds them.
    fn write_width(&mut self, addr: Addr, bitwidth: u32, value: u64) {
        let value = value & width::mask(bitwidth);
        match width::byte_size(bitwidth) {
            1 => self.write_u8(addr, value as u8),
            2 => self.write_u16(addr, value as u16),
            4 => self.write_u32(addr, value as u32),
            _ => self.write_u64(addr, value),
        }
    }
}

/// Services provided by the hosting virtual machine.
pub trait Host: Memory {
    /// Forks exploration over `n` branches and returns the index of the one taken.
    ///
    /// Called only with `n >= 1`; the result is in `0..n`.
    fn choose(&mut self, n: usize) -> usize;

    /// Reports a fatal fault. The host abandons the current execution.
    fn fault(&mut self, kind: FaultKind, message: &str);

    /// Returns the current control flags.
    fn control_flags(&self) -> ControlFlags;

    /// Replaces the control flags.
    fn set_control_flags(&mut self, flags: ControlFlags);

    /// Returns the identity of the running thread.
    fn thread_id(&self) -> ThreadId;

    /// Returns `(base, size)` of the heap object containing `ptr`, if any.
    fn object_bounds(&self, ptr: Addr) -> Option<(Addr, u64)>;
}
