//! Cross-thread visibility resolution and load reconstruction.
//!
//! A load may observe a store still sitting in another thread's buffer. Before
//! the value is read, [`BufferTable::tso_load`] asks the host to pick how far
//! each foreign buffer has drained and which buffer wrote last; the chosen
//! prefixes are then flushed so memory holds the observed value.
//! [`BufferTable::do_load`] afterwards merges the reader's own pending bytes on
//! top of memory.
//!
//! # Choice encoding
//!
//! Buffer `i` with `m_i` pending matching stores can be drained to `todo_i =
//! m_i + 1` states (nothing, up to the 1st match, ..., up to the last). A single
//! `choose(Π todo_i)` is decoded as a mixed-radix number, first buffer as the
//! least significant digit.

use tracing::{debug, trace};

use super::BufferTable;
use crate::common::Addr;
use crate::common::width;
use crate::host::{Host, ThreadId};

/// One buffer's contribution to a visibility decision.
#[derive(Debug)]
struct Candidate {
    tid: ThreadId,
    matches: Vec<usize>,
    has_committed: bool,
}

impl Candidate {
    fn states(&self) -> usize {
        self.matches.len() + 1
    }
}

impl BufferTable {
    /// Resolves which buffered stores to `addr`/`bitwidth` become visible.
    ///
    /// With `skip_local`, the buffer of `reader` takes no part; its stores
    /// reach the reader through forwarding instead.
    ///
    /// The host is consulted once for the drain state of every buffer and, when
    /// more than one buffer is a candidate, once more for the last writer.
    /// Nothing is chosen if no buffer holds a pending matching store.
    pub fn tso_load<H: Host>(
        &mut self,
        host: &mut H,
        reader: ThreadId,
        addr: Addr,
        bitwidth: u32,
        skip_local: bool,
    ) {
        let size = width::byte_size(bitwidth);
        let candidates: Vec<Candidate> = self
            .buffers
            .iter()
            .filter(|(tid, _)| !(skip_local && *tid == reader))
            .map(|(tid, buf)| Candidate {
                tid: *tid,
                matches: buf.pending_matches(addr, size),
                has_committed: buf.has_committed_match(addr, size),
            })
            .collect();
        if candidates.iter().all(|c| c.matches.is_empty()) {
            return;
        }

        let total = candidates
            .iter()
            .fold(1usize, |acc, c| acc.saturating_mul(c.states()));
        let mut choice = host.choose(total);
        self.stats.choice_points += 1;
        trace!(thread = %reader, %addr, bitwidth, total, choice, "visibility choice");

        let mut selected: Vec<(&Candidate, usize)> = Vec::new();
        for cand in &candidates {
            let states = cand.states();
            let index = choice % states;
            choice /= states;
            if index > 0 || cand.has_committed {
                selected.push((cand, index));
            }
        }
        if selected.is_empty() {
            return;
        }

        let source = if selected.len() > 1 {
            host.choose(selected.len())
        } else {
            0
        };
        debug!(
            thread = %reader,
            %addr,
            candidates = selected.len(),
            source = %selected[source].0.tid,
            "visibility resolved"
        );

        for (i, (cand, index)) in selected.iter().enumerate() {
            if i != source && *index > 0 {
                self.flush_upto(host, cand.tid, cand.matches[index - 1], addr, bitwidth);
            }
        }
        let (cand, index) = selected[source];
        if index > 0 {
            self.flush_upto(host, cand.tid, cand.matches[index - 1], addr, bitwidth);
        }
        self.prune();
    }

    /// Reconstructs the value `tid` reads at `addr`/`bitwidth`.
    ///
    /// The newest own store at the same address that is at least as wide
    /// answers the load directly. Otherwise every byte is taken from the newest
    /// pending own store covering it, falling back to `mem_value` (the value
    /// already read from memory).
    ///
    /// # Returns
    ///
    /// The loaded value masked to `bitwidth`.
    pub fn do_load(&mut self, tid: ThreadId, addr: Addr, bitwidth: u32, mem_value: u64) -> u64 {
        let size = width::byte_size(bitwidth);
        let mask = width::mask(bitwidth);
        let Some((_, buf)) = self.buffers.iter().find(|(owner, _)| *owner == tid) else {
            return mem_value & mask;
        };

        let mut bytes: [Option<u8>; 8] = [None; 8];
        let mut overlapped = false;
        for line in buf.iter().rev() {
            if line.is_fence() || line.is_committed() || !line.matches(addr, size) {
                continue;
            }
            if !overlapped && line.addr == Some(addr) && line.bitwidth() >= bitwidth {
                self.stats.loads_forwarded += 1;
                return line.value & mask;
            }
            overlapped = true;
            for (i, slot) in bytes.iter_mut().enumerate().take(size as usize) {
                if slot.is_none() {
                    *slot = line.byte_at(addr.offset(i as u64));
                }
            }
        }
        if !overlapped {
            return mem_value & mask;
        }

        let merged: Vec<u8> = bytes
            .iter()
            .take(size as usize)
            .enumerate()
            .map(|(i, b)| b.unwrap_or_else(|| width::byte_of(mem_value, i as u64)))
            .collect();
        width::assemble(&merged) & mask
    }
}
