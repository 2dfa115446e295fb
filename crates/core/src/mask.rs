//! Scoped interrupt mask.
//!
//! Buffer bookkeeping must be atomic with respect to the model checker's
//! interleaving points, however many raw bytes it writes. `InterruptMask` sets
//! the mask bit in the host's control register for its lifetime and restores the
//! previous mask state when dropped, on every exit path including `?`.

use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::host::{ControlFlags, Host};

/// Guard holding the host with interrupts masked.
///
/// Dereferences to the host so operations run through the guard.
pub struct InterruptMask<'a, H: Host> {
    host: &'a mut H,
    saved: ControlFlags,
}

impl<'a, H: Host> InterruptMask<'a, H> {
    /// Captures the control flags and masks interrupts.
    pub fn new(host: &'a mut H) -> Self {
        let saved = host.control_flags();
        host.set_control_flags(saved | ControlFlags::MASK);
        Self { host, saved }
    }

    /// Returns the flags captured when the guard was taken.
    pub const fn saved(&self) -> ControlFlags {
        self.saved
    }

    /// Returns true if the caller runs in a mode that bypasses the buffers.
    pub const fn bypassed(&self) -> bool {
        self.saved.bypassed()
    }
}

impl<H: Host> Deref for InterruptMask<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.host
    }
}

impl<H: Host> DerefMut for InterruptMask<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.host
    }
}

impl<H: Host> Drop for InterruptMask<'_, H> {
    fn drop(&mut self) {
        let now = self.host.control_flags();
        let restored = (now & !ControlFlags::MASK) | (self.saved & ControlFlags::MASK);
        self.host.set_control_flags(restored);
    }
}

impl<H: Host> fmt::Debug for InterruptMask<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptMask")
            .field("saved", &self.saved)
            .finish_non_exhaustive()
    }
}
