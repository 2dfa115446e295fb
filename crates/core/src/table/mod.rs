//! Process-wide buffer table.
//!
//! The table owns one store buffer per thread, kept in insertion order. It provides:
//! 1. **Lookup:** Finding, creating, and pruning per-thread buffers.
//! 2. **Sequencing:** `sc_seq` / `at_seq` assignment and renumbering (this file).
//! 3. **Flushing:** Push with capacity eviction and full/partial flushes ([`flush`]).
//! 4. **Visibility:** The choice-driven cross-thread read protocol and value
//!    reconstruction ([`visibility`]).
//!
//! A buffer is created by a thread's first buffered store and removed as soon as
//! it becomes empty.

/// Push, eviction, and flush operations.
pub mod flush;

/// Cross-thread visibility resolution and load reconstruction.
pub mod visibility;

use std::cmp::Reverse;

use crate::buffer::{Buffer, BufferLine};
use crate::common::width;
use crate::common::{Addr, Fault};
use crate::host::ThreadId;
use crate::stats::WeakMemStats;

/// Map from thread identity to store buffer.
#[derive(Clone, Debug, Default)]
pub struct BufferTable {
    buffers: Vec<(ThreadId, Buffer)>,
    capacity: usize,
    stats: WeakMemStats,
}

impl BufferTable {
    /// Creates an empty table whose buffers hold at most `capacity` stores.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffers: Vec::new(),
            capacity,
            stats: WeakMemStats::default(),
        }
    }

    /// Returns the per-thread store capacity.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the operation counters.
    pub const fn stats(&self) -> &WeakMemStats {
        &self.stats
    }

    /// Returns the operation counters mutably.
    pub fn stats_mut(&mut self) -> &mut WeakMemStats {
        &mut self.stats
    }

    /// Returns the number of threads that own a buffer.
    pub fn thread_count(&self) -> usize {
        self.buffers.len()
    }

    /// Returns true if no thread owns a buffer.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Returns true if a thread other than `tid` owns a buffer.
    pub fn has_foreign_buffers(&self, tid: ThreadId) -> bool {
        self.buffers.iter().any(|(owner, _)| *owner != tid)
    }

    /// Iterates `(thread, buffer)` pairs in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (ThreadId, &Buffer)> {
        self.buffers.iter().map(|(tid, buf)| (*tid, buf))
    }

    /// Returns the buffer of `tid`, if it has one.
    pub fn buffer(&self, tid: ThreadId) -> Option<&Buffer> {
        self.buffers
            .iter()
            .find(|(owner, _)| *owner == tid)
            .map(|(_, buf)| buf)
    }

    fn buffer_mut(&mut self, tid: ThreadId) -> Option<&mut Buffer> {
        self.buffers
            .iter_mut()
            .find(|(owner, _)| *owner == tid)
            .map(|(_, buf)| buf)
    }

    fn buffer_or_insert(&mut self, tid: ThreadId) -> &mut Buffer {
        let index = match self.buffers.iter().position(|(owner, _)| *owner == tid) {
            Some(index) => index,
            None => {
                self.buffers.push((tid, Buffer::new()));
                self.buffers.len() - 1
            }
        };
        &mut self.buffers[index].1
    }

    /// Drops every empty buffer.
    fn prune(&mut self) {
        self.buffers.retain(|(_, buf)| !buf.is_empty());
    }

    fn lines(&self) -> impl Iterator<Item = &BufferLine> {
        self.buffers.iter().flat_map(|(_, buf)| buf.iter())
    }

    fn lines_mut(&mut self) -> impl Iterator<Item = &mut BufferLine> {
        self.buffers.iter_mut().flat_map(|(_, buf)| buf.iter_mut())
    }

    /// Returns the sequence number for a new sequentially consistent line.
    ///
    /// # Errors
    ///
    /// `Fault::SequenceOverflow` if the counter space is exhausted.
    pub fn next_sc_seq(&self) -> Result<i16, Fault> {
        self.lines()
            .map(|l| l.sc_seq)
            .max()
            .unwrap_or(0)
            .max(0)
            .checked_add(1)
            .ok_or(Fault::SequenceOverflow("sc_seq"))
    }

    /// Returns the sequence number for a new atomic line on `addr`/`bitwidth`.
    ///
    /// # Errors
    ///
    /// `Fault::OverlappingAtomics` if a buffered atomic line overlaps the
    /// location without being exactly the same location, and
    /// `Fault::SequenceOverflow` if the location's counter space is exhausted.
    pub fn next_at_seq(&self, addr: Addr, bitwidth: u32) -> Result<i16, Fault> {
        let size = width::byte_size(bitwidth);
        let mut max = 0;
        for line in self.lines().filter(|l| l.at_seq != 0) {
            if line.same_location(addr, bitwidth) {
                max = max.max(line.at_seq);
            } else if let Some(other) = line.addr
                && line.matches(addr, size)
            {
                return Err(Fault::OverlappingAtomics {
                    addr,
                    bitwidth,
                    other,
                    other_bitwidth: line.bitwidth(),
                });
            }
        }
        max.checked_add(1).ok_or(Fault::SequenceOverflow("at_seq"))
    }

    /// Renumbers `sc_seq` after `retired` left the table.
    ///
    /// Every remaining line ordered after the retired one moves down by one, so
    /// counters stay dense and relative order is unchanged.
    pub fn fix_sc_seq(&mut self, retired: &BufferLine) {
        let seq = retired.sc_seq;
        if seq == 0 {
            return;
        }
        for line in self.lines_mut().filter(|l| l.sc_seq > seq) {
            line.sc_seq -= 1;
        }
    }

    /// Renumbers `at_seq` on the retired line's location after it left the table.
    pub fn fix_at_seq(&mut self, retired: &BufferLine) {
        let (seq, Some(addr)) = (retired.at_seq, retired.addr) else {
            return;
        };
        if seq == 0 {
            return;
        }
        let bitwidth = retired.bitwidth();
        for line in self
            .lines_mut()
            .filter(|l| l.at_seq > seq && l.same_location(addr, bitwidth))
        {
            line.at_seq -= 1;
        }
    }

    /// Renumbers both counters for every line in `retired`.
    ///
    /// Counters are released from the highest down so each renumbering sees
    /// the values it was assigned against.
    pub(crate) fn retire(&mut self, retired: &[BufferLine]) {
        let mut ordered: Vec<BufferLine> = retired.to_vec();
        ordered.sort_by_key(|l| Reverse(l.sc_seq));
        for line in &ordered {
            self.fix_sc_seq(line);
        }
        ordered.sort_by_key(|l| Reverse(l.at_seq));
        for line in &ordered {
            self.fix_at_seq(line);
        }
    }

    /// Returns true if sequence counters are consistent across the table.
    ///
    /// Nonzero `sc_seq` values are distinct and increase in program order within
    /// each buffer; nonzero `at_seq` values are distinct per location and increase
    /// in program order.
    pub fn sequence_invariants_hold(&self) -> bool {
        let mut sc: Vec<i16> = self.lines().map(|l| l.sc_seq).filter(|s| *s != 0).collect();
        let sc_total = sc.len();
        sc.sort_unstable();
        sc.dedup();
        if sc.len() != sc_total || sc.iter().any(|s| *s < 0) {
            return false;
        }
        for (_, buf) in &self.buffers {
            let mut last_sc = 0;
            for line in buf.iter().filter(|l| l.sc_seq != 0) {
                if line.sc_seq <= last_sc {
                    return false;
                }
                last_sc = line.sc_seq;
            }
        }
        let atomics: Vec<&BufferLine> = self.lines().filter(|l| l.at_seq != 0).collect();
        for (i, a) in atomics.iter().enumerate() {
            for b in &atomics[i + 1..] {
                if a.addr == b.addr && a.bitwidth == b.bitwidth && a.at_seq == b.at_seq {
                    return false;
                }
            }
        }
        for (_, buf) in &self.buffers {
            let owned: Vec<&BufferLine> = buf.iter().filter(|l| l.at_seq != 0).collect();
            for (i, a) in owned.iter().enumerate() {
                if owned[i + 1..]
                    .iter()
                    .any(|b| a.addr == b.addr && a.bitwidth == b.bitwidth && b.at_seq <= a.at_seq)
                {
                    return false;
                }
            }
        }
        true
    }

    /// Formats every buffer for debug output.
    pub fn dump(&self) -> String {
        if self.buffers.is_empty() {
            return String::from("weakmem: no buffered lines");
        }
        self.buffers
            .iter()
            .map(|(tid, buf)| format!("{tid}: {}", buf.dump()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
