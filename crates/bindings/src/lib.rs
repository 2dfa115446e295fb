//! C bindings for the weak-memory simulation layer.
//!
//! A model checker links this library and routes every instrumented memory
//! access through it. It provides:
//! 1. **Host vtable:** `HostVTable`, the callbacks the model checker supplies
//!    (choice, fault, control register, thread identity, object bounds).
//! 2. **Entry points:** `weakmem_init` / `weakmem_teardown` and one
//!    `extern "C"` function per memory operation.
//! 3. **State:** The process-wide simulation state behind a mutex.
//! 4. **Logging:** A `tracing` subscriber filtered by `WEAKMEM_LOG`.
//!
//! Faults are never returned to the caller; they are reported through the
//! host's fault callback, which is expected not to return control to the
//! faulting execution.

/// `extern "C"` entry points.
pub mod ffi;
/// Host callbacks and raw memory access.
pub mod host;
/// Log subscriber installation.
pub mod logging;
/// Process-wide simulation state.
pub mod state;

pub use ffi::CasResult;
pub use host::{HostVTable, VTableHost};
