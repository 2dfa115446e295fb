//! `extern "C"` entry points.
//!
//! Widths and orders cross the boundary as plain integers; orders are the raw
//! `MemoryOrder` bits. Every function except the accessors masks interrupts in
//! the host for its duration. Calls made before `weakmem_init` are logged and
//! ignored.

use std::ffi::CStr;
use std::slice;

use libc::{c_char, c_int};
use tracing::{info, warn};
use weakmem_core::{Addr, Config, Fault, MemoryOrder, WeakMem};

use crate::host::{HostVTable, VTableHost};
use crate::{logging, state};

/// `weakmem_init` succeeded.
pub const INIT_OK: c_int = 0;
/// `weakmem_init` was given a null vtable.
pub const INIT_NULL_VTABLE: c_int = -1;
/// `weakmem_init` could not parse the configuration.
pub const INIT_BAD_CONFIG: c_int = -2;

/// Result of [`weakmem_cas`].
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CasResult {
    /// New value on success, observed value on failure.
    pub value: u64,
    /// Whether the swap happened.
    pub success: bool,
}

fn order(bits: u32) -> MemoryOrder {
    MemoryOrder::from_bits(bits as u8)
}

fn parse_config(text: &CStr) -> Result<Config, String> {
    let json = text.to_str().map_err(|e| e.to_string())?;
    Config::from_json(json).map_err(|e| e.to_string())
}

/// Initialises the layer.
///
/// `config_json` may be null for the default configuration. Calling this twice
/// discards all buffered stores of the first session.
///
/// # Returns
///
/// [`INIT_OK`], [`INIT_NULL_VTABLE`], or [`INIT_BAD_CONFIG`].
///
/// # Safety
///
/// `vtable` must point to a valid `HostVTable` whose callbacks stay callable
/// until [`weakmem_teardown`]. `config_json`, if not null, must point to a
/// NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn weakmem_init(vtable: *const HostVTable, config_json: *const c_char) -> c_int {
    logging::init();
    // SAFETY: the caller guarantees `vtable` is null or valid.
    let Some(vtable) = (unsafe { vtable.as_ref() }).copied() else {
        warn!("weakmem_init called without a host vtable");
        return INIT_NULL_VTABLE;
    };

    let config = if config_json.is_null() {
        Config::default()
    } else {
        // SAFETY: the caller guarantees a NUL-terminated string.
        let text = unsafe { CStr::from_ptr(config_json) };
        match parse_config(text) {
            Ok(config) => config,
            Err(err) => {
                warn!(%err, "rejecting weakmem configuration");
                return INIT_BAD_CONFIG;
            }
        }
    };

    info!(
        capacity = config.buffer.capacity,
        min_ordering = %config.ordering.min_order(),
        "weakmem initialised"
    );
    state::install(WeakMem::new(VTableHost::new(vtable), config));
    INIT_OK
}

/// Drops all simulation state. Buffered stores are discarded unwritten.
#[unsafe(no_mangle)]
pub extern "C" fn weakmem_teardown() {
    if state::teardown() {
        info!("weakmem torn down");
    }
}

/// Stores the low `bitwidth` bits of `value` at `addr`.
///
/// # Safety
///
/// `addr` must be valid for writes of `bitwidth` bits whenever the store is
/// written to memory, which may happen during this or any later call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn weakmem_store(addr: u64, value: u64, bitwidth: u32, order_bits: u32) {
    let _ = state::run("store", |wm| wm.store(Addr::new(addr), value, bitwidth, order(order_bits)));
}

/// Loads `bitwidth` bits from `addr`.
///
/// # Returns
///
/// The loaded value, or 0 if the load faulted.
///
/// # Safety
///
/// `addr` must be valid for reads of `bitwidth` bits; buffered stores of any
/// thread may be written to memory during the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn weakmem_load(addr: u64, bitwidth: u32, order_bits: u32) -> u64 {
    state::run("load", |wm| wm.load(Addr::new(addr), bitwidth, order(order_bits))).unwrap_or(0)
}

/// Issues a fence.
///
/// # Safety
///
/// Every address in the calling thread's buffer must still be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn weakmem_fence(order_bits: u32) {
    let _ = state::with("fence", |wm| wm.fence(order(order_bits)));
}

/// Compare-and-swap on `addr`.
///
/// # Safety
///
/// As for [`weakmem_load`] and [`weakmem_store`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn weakmem_cas(
    addr: u64,
    expected: u64,
    value: u64,
    bitwidth: u32,
    order_succ: u32,
    order_fail: u32,
) -> CasResult {
    state::run("cas", |wm| {
        wm.cas(Addr::new(addr), expected, value, bitwidth, order(order_succ), order(order_fail))
    })
    .map_or_else(CasResult::default, |(value, success)| CasResult { value, success })
}

/// Drops the calling thread's buffered stores into `count` objects about to be freed.
///
/// Null entries are skipped. A negative `count` is reported as a fault.
///
/// # Safety
///
/// `ptrs` must point to `count` readable `u64` values (it may be null when
/// `count` is 0).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn weakmem_cleanup(count: c_int, ptrs: *const u64) {
    let Ok(len) = usize::try_from(count) else {
        if let Some(mut host) = state::host() {
            state::fault_to_host(&mut host, "cleanup", &Fault::InvalidCleanupCount(i64::from(count)));
        }
        return;
    };
    if len == 0 {
        return;
    }
    if ptrs.is_null() {
        if let Some(mut host) = state::host() {
            state::fault_to_host(&mut host, "cleanup", &Fault::NullAddress);
        }
        return;
    }
    // SAFETY: the caller guarantees `count` readable entries.
    let raw = unsafe { slice::from_raw_parts(ptrs, len) };
    let objects: Vec<Addr> = raw.iter().copied().map(Addr::new).collect();
    let _ = state::run("cleanup", |wm| wm.cleanup(&objects));
}

/// Drops buffered stores past `newsize` bytes into the object at `ptr`.
///
/// Call before the host records the new size.
#[unsafe(no_mangle)]
pub extern "C" fn weakmem_resize(ptr: u64, newsize: u64) {
    let _ = state::run("resize", |wm| wm.resize(Addr::new(ptr), newsize));
}

/// Logs the buffer table and counters to stderr, then writes out the calling
/// thread's buffer.
///
/// # Safety
///
/// Every address in the calling thread's buffer must still be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn weakmem_dump() {
    if let Some(text) = state::with("dump", WeakMem::dump) {
        eprintln!("{text}");
    }
}

/// Writes out the calling thread's buffer without resolving visibility.
///
/// # Safety
///
/// Every address in the calling thread's buffer must still be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn weakmem_debug_fence() {
    let _ = state::with("debug_fence", WeakMem::debug_fence);
}

/// Returns the per-thread store capacity (2 unless configured).
#[unsafe(no_mangle)]
pub extern "C" fn weakmem_buffer_size() -> c_int {
    state::with("buffer_size", |wm| wm.buffer_size())
        .map_or(-1, |n| c_int::try_from(n).unwrap_or(c_int::MAX))
}

/// Returns the minimum ordering bits (0 unless configured).
#[unsafe(no_mangle)]
pub extern "C" fn weakmem_min_ordering() -> c_int {
    state::with("min_ordering", |wm| c_int::from(wm.min_ordering().bits())).unwrap_or(-1)
}
