//! Push, eviction, and flush operations on the buffer table.
//!
//! Stores enter a thread's buffer through [`BufferTable::push`]. When a buffer
//! holds more stores than the configured capacity, the oldest line is forced
//! to memory, after giving other threads' pending stores to the same location
//! the chance to land first. Flushes come in two shapes:
//! 1. **Full:** Every store of one buffer is written in program order and the
//!    buffer is cleared (SeqCst stores and fences, debug fences).
//! 2. **Partial:** Only a prefix up to a chosen line is made visible, used by
//!    the visibility protocol.

use tracing::{debug, trace};

use super::BufferTable;
use crate::buffer::{Buffer, BufferLine};
use crate::common::width;
use crate::common::{Addr, Fault};
use crate::host::{Host, Memory, ThreadId};

impl BufferTable {
    /// Assigns sequence numbers to `line` and appends it to the buffer of `tid`.
    ///
    /// AtomicOp lines get an `at_seq`, SeqCst lines an `sc_seq`.
    ///
    /// # Errors
    ///
    /// `Fault::OverlappingAtomics` if an atomic line collides with a buffered
    /// atomic line on an overlapping but different location, and
    /// `Fault::SequenceOverflow` if a counter would overflow.
    pub fn push<H: Host>(&mut self, host: &mut H, tid: ThreadId, mut line: BufferLine) -> Result<(), Fault> {
        if let Some(addr) = line.addr
            && line.order.is_atomic_op()
        {
            line.at_seq = self.next_at_seq(addr, line.bitwidth())?;
        }
        if line.order.is_seq_cst() {
            line.sc_seq = self.next_sc_seq()?;
        }
        self.push_tso(host, tid, line);
        Ok(())
    }

    /// Appends `line` to the buffer of `tid` and evicts until it fits.
    ///
    /// Each evicted store first resolves cross-thread visibility of its location
    /// (the owner's buffer excluded), then is written to memory.
    pub fn push_tso<H: Host>(&mut self, host: &mut H, tid: ThreadId, line: BufferLine) {
        trace!(thread = %tid, line = %line.dump(), "push");
        if line.is_store() {
            self.stats.stores_buffered += 1;
        }
        self.buffer_or_insert(tid).push(line);

        loop {
            let Some(oldest) = self
                .buffer(tid)
                .filter(|buf| buf.store_count() > self.capacity)
                .and_then(Buffer::oldest)
                .copied()
            else {
                break;
            };
            if let Some(addr) = oldest.addr
                && !oldest.is_committed()
            {
                self.tso_load(host, tid, addr, oldest.bitwidth(), true);
            }

            let Some(buf) = self.buffer_mut(tid) else {
                break;
            };
            let mut retired = Vec::new();
            if let Some(mut evicted) = buf.erase(0) {
                let _ = evicted.store(host);
                debug!(thread = %tid, line = %evicted.dump(), "evict");
                retired.push(evicted);
            }
            retired.extend(buf.clean_old_and_flushed());
            self.stats.evictions += 1;
            self.retire(&retired);
        }
        self.prune();
    }

    /// Appends a fence marker to the buffer of `tid`.
    ///
    /// Nothing is recorded when the thread has no buffered lines, since the
    /// marker would have nothing to order. A fence directly behind another
    /// fence is folded into it.
    ///
    /// # Returns
    ///
    /// `true` if a new marker was appended.
    pub fn push_fence(&mut self, tid: ThreadId, line: BufferLine) -> bool {
        let Some(buf) = self.buffer_mut(tid).filter(|buf| !buf.is_empty()) else {
            return false;
        };
        if let Some(newest) = buf.newest_mut().filter(|l| l.is_fence()) {
            newest.order |= line.order;
            return false;
        }
        buf.push(line);
        self.stats.fences_buffered += 1;
        true
    }

    /// Writes every store of `tid`'s buffer in program order and clears it.
    pub fn flush<M: Memory + ?Sized>(&mut self, mem: &mut M, tid: ThreadId) {
        let Some(buf) = self.buffer_mut(tid) else {
            return;
        };
        let mut lines = buf.clear();
        for line in &mut lines {
            let _ = line.store(mem);
        }
        debug!(thread = %tid, lines = lines.len(), "flush");
        self.stats.full_flushes += 1;
        self.retire(&lines);
        self.prune();
    }

    /// Makes the prefix of `tid`'s buffer ending at line `up_to` visible.
    ///
    /// Lines after `up_to` are kept verbatim. Stores at or before it are written
    /// in program order: those overlapping `addr`/`bitwidth` are dropped, the
    /// rest are marked committed and kept until eviction reaches them. Fences
    /// are kept. The buffer is then compacted and leading fences are cleaned.
    ///
    /// Empty buffers are left in place; callers prune once they are done
    /// walking the table.
    pub fn flush_upto<M: Memory + ?Sized>(
        &mut self,
        mem: &mut M,
        tid: ThreadId,
        up_to: usize,
        addr: Addr,
        bitwidth: u32,
    ) {
        let size = width::byte_size(bitwidth);
        let Some(buf) = self.buffer_mut(tid) else {
            return;
        };

        let mut kept = Vec::with_capacity(buf.len());
        let mut dropped = Vec::new();
        for (i, mut line) in buf.clear().into_iter().enumerate() {
            if i > up_to || line.is_fence() {
                kept.push(line);
                continue;
            }
            let _ = line.store(mem);
            if line.matches(addr, size) {
                dropped.push(line);
            } else {
                kept.push(line);
            }
        }
        *buf = Buffer::from(kept);
        dropped.extend(buf.clean_old_and_flushed());

        debug!(thread = %tid, up_to, %addr, bitwidth, dropped = dropped.len(), "partial flush");
        self.stats.partial_flushes += 1;
        self.retire(&dropped);
    }

    /// Drops lines whose address lies in `[base, base + size)`.
    ///
    /// With `only` set, just that thread's buffer is searched; otherwise every
    /// buffer is. Dropped lines are discarded without being written.
    ///
    /// # Returns
    ///
    /// The number of lines dropped.
    pub fn evict_range(&mut self, only: Option<ThreadId>, base: Addr, size: u64) -> usize {
        let mut dropped = Vec::new();
        let mut count = 0;
        for (tid, buf) in &mut self.buffers {
            if only.is_some_and(|t| t != *tid) {
                continue;
            }
            let evicted = buf.evict(|l| !l.addr.is_some_and(|a| a.within(base, size)));
            count += evicted.len();
            dropped.extend(evicted);
            dropped.extend(buf.clean_old_and_flushed());
        }
        if count > 0 {
            debug!(%base, size, count, "evict range");
        }
        self.stats.lines_evicted_by_free += count as u64;
        self.retire(&dropped);
        self.prune();
        count
    }
}
