//! Public memory operations.
//!
//! `WeakMem` owns the host and the buffer table and implements the operations
//! instrumented code calls in place of plain memory accesses:
//! 1. **Store / Load:** Buffered stores, forwarded and reconstructed loads.
//! 2. **Fence:** SeqCst drains the caller's buffer, Release leaves a marker.
//! 3. **Compare-and-swap:** One load and one conditional atomic store under a
//!    single interrupt mask.
//! 4. **Deallocation:** `cleanup` and `resize` drop lines that would otherwise
//!    be written into freed memory.
//! 5. **Debugging:** `dump` and `debug_fence`.
//!
//! Every operation holds an [`InterruptMask`] for its whole duration. When the
//! caller runs in kernel or debug mode (or with the bypass flag) the buffers are
//! ignored and memory is accessed directly.

use tracing::{debug, info};

use crate::buffer::BufferLine;
use crate::common::width;
use crate::common::{Addr, Fault};
use crate::config::Config;
use crate::host::Host;
use crate::mask::InterruptMask;
use crate::order::MemoryOrder;
use crate::stats::WeakMemStats;
use crate::table::BufferTable;

/// Weak-memory simulation state bound to a host.
#[derive(Debug)]
pub struct WeakMem<H: Host> {
    host: H,
    table: BufferTable,
    config: Config,
    min_ordering: MemoryOrder,
}

impl<H: Host> WeakMem<H> {
    /// Creates the simulation layer for `host`.
    pub fn new(host: H, config: Config) -> Self {
        Self {
            host,
            table: BufferTable::new(config.buffer.capacity),
            min_ordering: config.ordering.min_order(),
            config,
        }
    }

    /// Creates the simulation layer with the default configuration.
    pub fn with_defaults(host: H) -> Self {
        Self::new(host, Config::default())
    }

    /// Returns the host.
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Returns the host mutably (thread switching, allocation in tests).
    pub const fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consumes the layer and returns the host. Buffered stores are discarded.
    pub fn into_host(self) -> H {
        self.host
    }

    /// Returns the buffer table.
    pub const fn table(&self) -> &BufferTable {
        &self.table
    }

    /// Returns the operation counters.
    pub const fn stats(&self) -> &WeakMemStats {
        self.table.stats()
    }

    /// Returns the active configuration.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the per-thread store capacity.
    pub const fn buffer_size(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the order united with every requested order.
    pub const fn min_ordering(&self) -> MemoryOrder {
        self.min_ordering
    }

    fn trace_operations(&self) -> bool {
        cfg!(feature = "always-trace") || self.config.general.trace_operations
    }

    /// Stores the low `bitwidth` bits of `value` at `addr`.
    ///
    /// # Errors
    ///
    /// `NullAddress`, `InvalidBitWidth`, or `OverlappingAtomics` for an
    /// atomic store that collides with a differently shaped atomic store.
    pub fn store(&mut self, addr: Addr, value: u64, bitwidth: u32, order: MemoryOrder) -> Result<(), Fault> {
        let order = order | self.min_ordering;
        if self.trace_operations() {
            info!(thread = %self.host.thread_id(), %addr, value, bitwidth, %order, "store");
        }
        let mut host = InterruptMask::new(&mut self.host);
        let bypassed = host.bypassed();
        store_in(&mut self.table, &mut *host, bypassed, addr, value, bitwidth, order)
    }

    /// Loads `bitwidth` bits from `addr` as seen by the running thread.
    ///
    /// # Errors
    ///
    /// `NullAddress` or `InvalidBitWidth`.
    pub fn load(&mut self, addr: Addr, bitwidth: u32, order: MemoryOrder) -> Result<u64, Fault> {
        let order = order | self.min_ordering;
        let trace = self.trace_operations();
        let mut host = InterruptMask::new(&mut self.host);
        let bypassed = host.bypassed();
        let value = load_in(&mut self.table, &mut *host, bypassed, addr, bitwidth)?;
        if trace {
            info!(thread = %host.thread_id(), %addr, bitwidth, %order, value, "load");
        }
        Ok(value)
    }

    /// Issues a fence.
    ///
    /// SeqCst writes out the running thread's buffer. Release appends a marker
    /// that keeps later stores behind earlier ones. Acquire alone is a no-op,
    /// since buffered loads never run ahead of earlier loads.
    pub fn fence(&mut self, order: MemoryOrder) {
        let order = order | self.min_ordering;
        let trace = self.trace_operations();
        let mut host = InterruptMask::new(&mut self.host);
        if host.bypassed() {
            return;
        }
        let tid = host.thread_id();
        if trace {
            info!(thread = %tid, %order, "fence");
        }
        if order.is_seq_cst() {
            self.table.flush(&mut *host, tid);
        } else if order.at_least(MemoryOrder::RELEASE) {
            let _ = self.table.push_fence(tid, BufferLine::new_fence(order));
        }
    }

    /// Atomically compares the value at `addr` with `expected` and, if equal,
    /// replaces it with `value`.
    ///
    /// The load uses `order_fail`; the store uses `order_succ` tagged as part of
    /// an atomic operation. With `MemoryOrder::WEAK_CAS` in `order_succ` the
    /// host may pick a spurious failure even when the values match.
    ///
    /// # Returns
    ///
    /// `(value, true)` on success, `(observed, false)` on failure.
    ///
    /// # Errors
    ///
    /// As for [`WeakMem::load`] and [`WeakMem::store`].
    pub fn cas(
        &mut self,
        addr: Addr,
        expected: u64,
        value: u64,
        bitwidth: u32,
        order_succ: MemoryOrder,
        order_fail: MemoryOrder,
    ) -> Result<(u64, bool), Fault> {
        let order_succ = order_succ | self.min_ordering;
        let order_fail = order_fail | self.min_ordering;
        let trace = self.trace_operations();
        let mut host = InterruptMask::new(&mut self.host);
        let bypassed = host.bypassed();

        let observed = load_in(&mut self.table, &mut *host, bypassed, addr, bitwidth)?;
        let mask = width::mask(bitwidth);
        let tid = host.thread_id();

        if observed != expected & mask {
            self.table.stats_mut().cas_value_failures += 1;
            if trace {
                info!(thread = %tid, %addr, expected, observed, %order_fail, "cas failed");
            }
            return Ok((observed, false));
        }
        if !bypassed && order_succ.is_weak_cas() && host.choose(2) == 1 {
            self.table.stats_mut().cas_spurious_failures += 1;
            if trace {
                info!(thread = %tid, %addr, observed, "cas failed spuriously");
            }
            return Ok((observed, false));
        }

        store_in(
            &mut self.table,
            &mut *host,
            bypassed,
            addr,
            value,
            bitwidth,
            order_succ | MemoryOrder::ATOMIC_OP,
        )?;
        if trace {
            info!(thread = %tid, %addr, expected, value, %order_succ, "cas");
        }
        Ok((value & mask, true))
    }

    /// Drops the running thread's buffered stores into freed objects.
    ///
    /// Every non-null pointer in `ptrs` names a heap object about to be
    /// released; lines whose address lies inside it are discarded unwritten.
    ///
    /// # Errors
    ///
    /// `UnknownObject` if the host cannot resolve a pointer to an object.
    pub fn cleanup(&mut self, ptrs: &[Addr]) -> Result<(), Fault> {
        let host = InterruptMask::new(&mut self.host);
        let tid = host.thread_id();
        for ptr in ptrs.iter().copied().filter(|p| !p.is_null()) {
            let (base, size) = host.object_bounds(ptr).ok_or(Fault::UnknownObject(ptr))?;
            let dropped = self.table.evict_range(Some(tid), base, size);
            debug!(thread = %tid, %base, size, dropped, "cleanup");
        }
        Ok(())
    }

    /// Drops buffered stores past the new end of a shrinking object.
    ///
    /// Must be called while the host still reports the object's original size.
    /// Lines in `[base + newsize, base + size)` are discarded from every buffer.
    /// Growing (or keeping) the size does nothing, as does a null `ptr`.
    ///
    /// # Errors
    ///
    /// `UnknownObject` if the host cannot resolve `ptr` to an object.
    pub fn resize(&mut self, ptr: Addr, newsize: u64) -> Result<(), Fault> {
        if ptr.is_null() {
            return Ok(());
        }
        let host = InterruptMask::new(&mut self.host);
        let (base, size) = host.object_bounds(ptr).ok_or(Fault::UnknownObject(ptr))?;
        if newsize >= size {
            return Ok(());
        }
        let dropped = self.table.evict_range(None, base.offset(newsize), size - newsize);
        debug!(%base, size, newsize, dropped, "resize");
        Ok(())
    }

    /// Writes out the running thread's buffer without resolving visibility.
    ///
    /// Only for debugging; it changes which executions are reachable.
    pub fn debug_fence(&mut self) {
        let mut host = InterruptMask::new(&mut self.host);
        let tid = host.thread_id();
        self.table.flush(&mut *host, tid);
    }

    /// Renders the buffer table and counters, then behaves like [`WeakMem::debug_fence`].
    ///
    /// # Returns
    ///
    /// The rendering taken before the flush.
    pub fn dump(&mut self) -> String {
        let rendered = format!("{}\n{}", self.table.dump(), self.table.stats());
        debug!("{rendered}");
        self.debug_fence();
        rendered
    }
}

fn checked(addr: Addr, bitwidth: u32) -> Result<u32, Fault> {
    if addr.is_null() {
        return Err(Fault::NullAddress);
    }
    width::validate(bitwidth)
}

fn store_in<H: Host>(
    table: &mut BufferTable,
    host: &mut H,
    bypassed: bool,
    addr: Addr,
    value: u64,
    bitwidth: u32,
    order: MemoryOrder,
) -> Result<(), Fault> {
    let bitwidth = checked(addr, bitwidth)?;
    if bypassed {
        host.write_width(addr, bitwidth, value);
        table.stats_mut().stores_direct += 1;
        return Ok(());
    }
    let tid = host.thread_id();
    if order.is_seq_cst() {
        table.flush(host, tid);
        host.write_width(addr, bitwidth, value);
        table.stats_mut().stores_direct += 1;
        return Ok(());
    }
    table.push(host, tid, BufferLine::new_store(addr, value, bitwidth, order))
}

fn load_in<H: Host>(
    table: &mut BufferTable,
    host: &mut H,
    bypassed: bool,
    addr: Addr,
    bitwidth: u32,
) -> Result<u64, Fault> {
    let bitwidth = checked(addr, bitwidth)?;
    table.stats_mut().loads += 1;
    if bypassed {
        return Ok(host.read_width(addr, bitwidth));
    }
    let tid = host.thread_id();
    if table.has_foreign_buffers(tid) {
        table.tso_load(host, tid, addr, bitwidth, true);
    }
    let mem_value = host.read_width(addr, bitwidth);
    Ok(table.do_load(tid, addr, bitwidth, mem_value))
}
