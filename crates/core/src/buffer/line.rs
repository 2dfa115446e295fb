//! A single store-buffer entry.
//!
//! A line is either a pending store (address, value, width) or a fence marker
//! (no address). Lines move through a small lifecycle:
//! 1. **Normal:** Pushed and not yet visible to other threads.
//! 2. **Committed:** Already written to memory but kept in place because an
//!    older position in program order still matters for bookkeeping.
//!
//! A line leaves the buffer when it is flushed, evicted, or cleaned.

use crate::common::width;
use crate::common::Addr;
use crate::host::Memory;
use crate::order::MemoryOrder;

/// Lifecycle state of a buffer line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LineStatus {
    /// Pending; memory does not hold this value yet.
    #[default]
    Normal,
    /// Written to memory; retained for ordering bookkeeping.
    Committed,
}

/// One pending store or fence marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BufferLine {
    /// Target address; `None` marks a fence.
    pub addr: Option<Addr>,
    /// Stored value, masked to `bitwidth`.
    pub value: u64,
    /// Store width in bits (`1..=64`); 0 for fences.
    pub bitwidth: u8,
    /// Order the operation was issued with.
    pub order: MemoryOrder,
    /// Position among sequentially consistent operations (0 = none).
    pub sc_seq: i16,
    /// Position among atomic operations on this location (0 = none).
    pub at_seq: i16,
    /// Lifecycle state.
    pub status: LineStatus,
}

impl BufferLine {
    /// Creates a pending store line. `bitwidth` must already be validated.
    pub const fn new_store(addr: Addr, value: u64, bitwidth: u32, order: MemoryOrder) -> Self {
        Self {
            addr: Some(addr),
            value: value & width::mask(bitwidth),
            bitwidth: bitwidth as u8,
            order,
            sc_seq: 0,
            at_seq: 0,
            status: LineStatus::Normal,
        }
    }

    /// Creates a fence marker.
    pub const fn new_fence(order: MemoryOrder) -> Self {
        Self {
            addr: None,
            value: 0,
            bitwidth: 0,
            order,
            sc_seq: 0,
            at_seq: 0,
            status: LineStatus::Normal,
        }
    }

    /// Returns true for fence markers.
    #[inline]
    pub const fn is_fence(&self) -> bool {
        self.addr.is_none()
    }

    /// Returns true for stores.
    #[inline]
    pub const fn is_store(&self) -> bool {
        self.addr.is_some()
    }

    /// Returns true if the line has already been written to memory.
    #[inline]
    pub fn is_committed(&self) -> bool {
        self.status == LineStatus::Committed
    }

    /// Returns the store width in bits.
    #[inline]
    pub const fn bitwidth(&self) -> u32 {
        self.bitwidth as u32
    }

    /// Returns the number of bytes the store touches (0 for fences).
    #[inline]
    pub const fn size(&self) -> u64 {
        width::byte_size(self.bitwidth as u32)
    }

    /// Returns true if this store's bytes overlap `[addr, addr + size)`.
    ///
    /// Fences never match.
    pub const fn matches(&self, addr: Addr, size: u64) -> bool {
        match self.addr {
            Some(own) => own.overlaps(self.size(), addr, size),
            None => false,
        }
    }

    /// Returns true if this store targets exactly `addr` with exactly `bitwidth`.
    pub fn same_location(&self, addr: Addr, bitwidth: u32) -> bool {
        self.addr == Some(addr) && self.bitwidth() == bitwidth
    }

    /// Returns the buffered byte landing on `target`, if this store covers it.
    pub const fn byte_at(&self, target: Addr) -> Option<u8> {
        match self.addr {
            Some(own) => width::covering_byte(own, self.bitwidth as u32, self.value, target),
            None => None,
        }
    }

    /// Writes the line to memory and marks it committed.
    ///
    /// Does nothing for fences or lines that are already committed.
    ///
    /// # Returns
    ///
    /// `true` if memory was written.
    pub fn store<M: Memory + ?Sized>(&mut self, mem: &mut M) -> bool {
        let Some(addr) = self.addr else {
            return false;
        };
        if self.is_committed() {
            return false;
        }
        mem.write_width(addr, self.bitwidth(), self.value);
        self.status = LineStatus::Committed;
        true
    }

    /// Formats the line for debug output.
    pub fn dump(&self) -> String {
        let status = match self.status {
            LineStatus::Normal => "",
            LineStatus::Committed => " committed",
        };
        match self.addr {
            Some(addr) => format!(
                "[{addr} = {:#x} i{} {} sc={} at={}{status}]",
                self.value, self.bitwidth, self.order, self.sc_seq, self.at_seq
            ),
            None => format!(
                "[fence {} sc={} at={}{status}]",
                self.order, self.sc_seq, self.at_seq
            ),
        }
    }
}
