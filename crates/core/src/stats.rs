//! Operation statistics.
//!
//! Counts how often each path of the simulation layer is taken. The counters
//! are bookkeeping only and never influence which executions are explored.

use std::fmt;

use serde::Serialize;

/// Counters for the weak-memory layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WeakMemStats {
    /// Stores appended to a store buffer.
    pub stores_buffered: u64,
    /// Stores written straight to memory (bypass or SeqCst).
    pub stores_direct: u64,
    /// Loads served.
    pub loads: u64,
    /// Loads answered entirely from the reader's own buffer.
    pub loads_forwarded: u64,
    /// Lines forced out because a buffer exceeded its capacity.
    pub evictions: u64,
    /// Whole-buffer flushes.
    pub full_flushes: u64,
    /// Partial flushes performed while resolving visibility.
    pub partial_flushes: u64,
    /// Visibility resolutions that had to ask the host for a choice.
    pub choice_points: u64,
    /// Fence markers appended.
    pub fences_buffered: u64,
    /// Compare-and-swap failures because the value differed.
    pub cas_value_failures: u64,
    /// Compare-and-swap failures chosen spuriously for weak CAS.
    pub cas_spurious_failures: u64,
    /// Lines dropped by cleanup or resize.
    pub lines_evicted_by_free: u64,
}

impl WeakMemStats {
    /// Serializes the counters as a JSON object.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl fmt::Display for WeakMemStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "weakmem statistics")?;
        writeln!(f, "  stores buffered     {:>10}", self.stores_buffered)?;
        writeln!(f, "  stores direct       {:>10}", self.stores_direct)?;
        writeln!(f, "  loads               {:>10}", self.loads)?;
        writeln!(f, "  loads forwarded     {:>10}", self.loads_forwarded)?;
        writeln!(f, "  evictions           {:>10}", self.evictions)?;
        writeln!(f, "  full flushes        {:>10}", self.full_flushes)?;
        writeln!(f, "  partial flushes     {:>10}", self.partial_flushes)?;
        writeln!(f, "  choice points       {:>10}", self.choice_points)?;
        writeln!(f, "  fences buffered     {:>10}", self.fences_buffered)?;
        writeln!(f, "  cas value failures  {:>10}", self.cas_value_failures)?;
        writeln!(f, "  cas spurious fails  {:>10}", self.cas_spurious_failures)?;
        write!(f, "  lines freed         {:>10}", self.lines_evicted_by_free)
    }
}
