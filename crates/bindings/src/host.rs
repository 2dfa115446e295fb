//! Host callbacks and raw memory access.
//!
//! The model checker hands over a table of `extern "C"` callbacks at
//! initialisation. Guest memory itself is not behind a callback: addresses
//! passed to the entry points are real pointers into the checker's address
//! space and are read and written in place.

use std::ffi::CString;

use libc::c_char;
use weakmem_core::{Addr, ControlFlags, FaultKind, Host, Memory, ThreadId};

/// Callbacks supplied by the model checker.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct HostVTable {
    /// Forks exploration over `n` branches; returns the branch taken (`0..n`).
    pub choose: unsafe extern "C" fn(n: usize) -> usize,
    /// Reports a fatal fault (`kind` is 1 for validation, 2 for consistency).
    pub fault: unsafe extern "C" fn(kind: u32, message: *const c_char),
    /// Reads the control register.
    pub control_flags: unsafe extern "C" fn() -> u64,
    /// Writes the control register.
    pub set_control_flags: unsafe extern "C" fn(flags: u64),
    /// Returns the running thread's identity.
    pub thread_id: unsafe extern "C" fn() -> u64,
    /// Resolves `ptr` to its heap object; writes `base`/`size` and returns true
    /// if `ptr` lies inside a live object.
    pub object_bounds: unsafe extern "C" fn(ptr: u64, base: *mut u64, size: *mut u64) -> bool,
}

/// [`Host`] implementation calling through a [`HostVTable`].
#[derive(Clone, Copy, Debug)]
pub struct VTableHost {
    vtable: HostVTable,
}

impl VTableHost {
    /// Wraps the callbacks.
    pub const fn new(vtable: HostVTable) -> Self {
        Self { vtable }
    }
}

// SAFETY (all accessors): addresses reach this crate only from instrumented
// code, which issues them for objects it owns; the host guarantees they stay
// mapped for the width of the access. No alignment is assumed.
impl Memory for VTableHost {
    fn read_u8(&mut self, addr: Addr) -> u8 {
        unsafe { (addr.val() as *const u8).read_unaligned() }
    }

    fn read_u16(&mut self, addr: Addr) -> u16 {
        unsafe { (addr.val() as *const u16).read_unaligned() }
    }

    fn read_u32(&mut self, addr: Addr) -> u32 {
        unsafe { (addr.val() as *const u32).read_unaligned() }
    }

    fn read_u64(&mut self, addr: Addr) -> u64 {
        unsafe { (addr.val() as *const u64).read_unaligned() }
    }

    fn write_u8(&mut self, addr: Addr, val: u8) {
        unsafe { (addr.val() as *mut u8).write_unaligned(val) }
    }

    fn write_u16(&mut self, addr: Addr, val: u16) {
        unsafe { (addr.val() as *mut u16).write_unaligned(val) }
    }

    fn write_u32(&mut self, addr: Addr, val: u32) {
        unsafe { (addr.val() as *mut u32).write_unaligned(val) }
    }

    fn write_u64(&mut self, addr: Addr, val: u64) {
        unsafe { (addr.val() as *mut u64).write_unaligned(val) }
    }
}

// SAFETY (all callbacks): the vtable is supplied by the host at init and its
// functions stay valid until teardown.
impl Host for VTableHost {
    fn choose(&mut self, n: usize) -> usize {
        let chosen = unsafe { (self.vtable.choose)(n) };
        chosen.min(n.saturating_sub(1))
    }

    fn fault(&mut self, kind: FaultKind, message: &str) {
        let message = CString::new(message.replace('\0', " ")).unwrap_or_default();
        // `message` outlives the call.
        unsafe { (self.vtable.fault)(kind as u32, message.as_ptr()) };
    }

    fn control_flags(&self) -> ControlFlags {
        ControlFlags(unsafe { (self.vtable.control_flags)() })
    }

    fn set_control_flags(&mut self, flags: ControlFlags) {
        unsafe { (self.vtable.set_control_flags)(flags.0) }
    }

    fn thread_id(&self) -> ThreadId {
        ThreadId(unsafe { (self.vtable.thread_id)() })
    }

    fn object_bounds(&self, ptr: Addr) -> Option<(Addr, u64)> {
        let mut base = 0u64;
        let mut size = 0u64;
        let found = unsafe { (self.vtable.object_bounds)(ptr.val(), &raw mut base, &raw mut size) };
        found.then_some((Addr::new(base), size))
    }
}
