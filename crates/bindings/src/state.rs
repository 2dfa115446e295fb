//! Process-wide simulation state.
//!
//! The state lives in a static mutex between `weakmem_init` and
//! `weakmem_teardown`. Operations run with the lock held; fault reporting
//! happens after the lock is released, since the host's fault callback may
//! never return.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;
use weakmem_core::{Fault, Host, WeakMem};

use crate::host::VTableHost;

static STATE: Mutex<Option<WeakMem<VTableHost>>> = Mutex::new(None);

fn lock() -> MutexGuard<'static, Option<WeakMem<VTableHost>>> {
    STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Replaces the state with `wm`, discarding any previous buffers.
pub fn install(wm: WeakMem<VTableHost>) {
    if lock().replace(wm).is_some() {
        warn!("weakmem initialised twice; previous buffers discarded");
    }
}

/// Drops the state.
///
/// # Returns
///
/// `true` if there was state to drop.
pub fn teardown() -> bool {
    lock().take().is_some()
}

/// Returns true between init and teardown.
pub fn is_initialised() -> bool {
    lock().is_some()
}

/// Runs `f` on the state.
///
/// # Returns
///
/// `None` (with a warning naming `op`) if the layer is not initialised.
pub fn with<R>(op: &str, f: impl FnOnce(&mut WeakMem<VTableHost>) -> R) -> Option<R> {
    let mut guard = lock();
    let Some(wm) = guard.as_mut() else {
        warn!(op, "weakmem operation before initialisation");
        return None;
    };
    Some(f(wm))
}

/// Runs a fallible operation and reports its fault to the host.
///
/// # Returns
///
/// The operation's value, or `None` if it faulted or the layer is not initialised.
pub fn run<R>(op: &str, f: impl FnOnce(&mut WeakMem<VTableHost>) -> Result<R, Fault>) -> Option<R> {
    let (result, mut host) = with(op, |wm| (f(wm), *wm.host()))?;
    match result {
        Ok(value) => Some(value),
        Err(fault) => {
            fault_to_host(&mut host, op, &fault);
            None
        }
    }
}

/// Logs `fault` and passes it to the host's fault callback.
pub fn fault_to_host(host: &mut VTableHost, op: &str, fault: &Fault) {
    warn!(op, %fault, "reporting fault to host");
    host.fault(fault.kind(), &fault.to_string());
}

/// Returns a copy of the host, if initialised.
///
/// Used to report faults without holding the lock.
pub fn host() -> Option<VTableHost> {
    lock().as_ref().map(|wm| *wm.host())
}
