//! Reference host for exercising the weak-memory layer without a VM.
//!
//! The simulated host replays a scripted sequence of choices and records every
//! choice point it is asked for. Feeding [`next_script`] the recorded trace of
//! one run yields the script of the next run in depth-first order, so a driver
//! loop visits every execution exactly once.

/// mmap-backed memory arena.
pub mod arena;

/// Simulated host implementation.
pub mod host;

pub use arena::Arena;
pub use host::{ChoicePoint, DEFAULT_BASE, SimHost};

/// Returns the choice script of the next execution after `trace`.
///
/// The deepest choice point that still has an untried branch is advanced and
/// everything after it is dropped (later calls default to branch 0).
///
/// # Returns
///
/// `None` once every branch of every choice point has been taken.
pub fn next_script(trace: &[ChoicePoint]) -> Option<Vec<usize>> {
    let last = trace.iter().rposition(|cp| cp.chosen + 1 < cp.n)?;
    let mut script: Vec<usize> = trace[..last].iter().map(|cp| cp.chosen).collect();
    script.push(trace[last].chosen + 1);
    Some(script)
}
