//! Weak-memory store-buffer simulation library.
//!
//! This crate models relaxed memory for an explicit-state model checker. It provides:
//! 1. **Orders:** The `MemoryOrder` lattice and its containment test.
//! 2. **Buffers:** Per-thread FIFO store buffers holding pending stores and fence markers.
//! 3. **Visibility:** A choice-driven protocol deciding which foreign stores a load observes.
//! 4. **Operations:** Store, load, fence, compare-and-swap, cleanup, resize, and dump.
//! 5. **Host:** Traits for the hosting VM plus a simulated reference host for testing.

/// Common types (addresses, bit widths, faults).
pub mod common;
/// Configuration (buffer capacity, minimum ordering, tracing).
pub mod config;
/// Host interface (memory, choice, faults, control flags, threads).
pub mod host;
/// Scoped interrupt mask guard.
pub mod mask;
/// Memory order lattice.
pub mod order;
/// Store buffer lines and per-thread buffers.
pub mod buffer;
/// Reference host (mmap arena, scripted choices).
pub mod sim;
/// Operation counters.
pub mod stats;
/// Process-wide buffer table (sequencing, flushing, visibility).
pub mod table;
/// Public memory operations.
pub mod weakmem;

/// Fatal fault raised by an operation; report it through [`Host::fault`].
pub use crate::common::{Addr, Fault, FaultKind};
/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Traits implemented by the hosting virtual machine.
pub use crate::host::{ControlFlags, Host, Memory, ThreadId};
/// Memory order bit flags.
pub use crate::order::MemoryOrder;
/// Top-level simulation state; construct with `WeakMem::new`.
pub use crate::weakmem::WeakMem;
