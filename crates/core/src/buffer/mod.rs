//! Per-thread store buffer.
//!
//! A `Buffer` is the program-ordered sequence of lines one thread has issued but
//! not yet made globally visible. Index 0 is the oldest line. The buffer provides:
//! 1. **Queries:** Store count, oldest/newest line, iteration.
//! 2. **Removal:** Erase by index, predicate eviction, truncation, full drain.
//! 3. **Cleaning:** Dropping leading fences that no longer order anything.
//!
//! Committed stores stay in place and count towards capacity until eviction
//! pushes them out.
//!
//! Every removal returns the dropped lines so the owning table can renumber
//! sequence counters.

/// Buffer line type and lifecycle state.
pub mod line;

pub use line::{BufferLine, LineStatus};

use crate::common::Addr;

/// Program-ordered store buffer of one thread.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Buffer {
    lines: Vec<BufferLine>,
}

impl Buffer {
    /// Creates an empty buffer.
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Returns the number of lines, fences included.
    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if the buffer holds no lines.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the number of store lines (fences excluded).
    pub fn store_count(&self) -> usize {
        self.lines.iter().filter(|l| l.is_store()).count()
    }

    /// Returns the most recently pushed line.
    pub fn newest(&self) -> Option<&BufferLine> {
        self.lines.last()
    }

    /// Returns the most recently pushed line mutably.
    pub fn newest_mut(&mut self) -> Option<&mut BufferLine> {
        self.lines.last_mut()
    }

    /// Returns the oldest line.
    pub fn oldest(&self) -> Option<&BufferLine> {
        self.lines.first()
    }

    /// Returns the line at `index`.
    pub fn get(&self, index: usize) -> Option<&BufferLine> {
        self.lines.get(index)
    }

    /// Returns the line at `index` mutably.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut BufferLine> {
        self.lines.get_mut(index)
    }

    /// Iterates lines from oldest to newest.
    pub fn iter(&self) -> std::slice::Iter<'_, BufferLine> {
        self.lines.iter()
    }

    /// Iterates lines mutably from oldest to newest.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, BufferLine> {
        self.lines.iter_mut()
    }

    /// Appends a line (program order).
    pub fn push(&mut self, line: BufferLine) {
        self.lines.push(line);
    }

    /// Removes the line at `index`, shifting later lines down.
    pub fn erase(&mut self, index: usize) -> Option<BufferLine> {
        (index < self.lines.len()).then(|| self.lines.remove(index))
    }

    /// Keeps the lines for which `keep` holds and drops the rest.
    ///
    /// Relative order of the kept lines is preserved.
    ///
    /// # Returns
    ///
    /// The dropped lines, oldest first.
    pub fn evict<F>(&mut self, mut keep: F) -> Vec<BufferLine>
    where
        F: FnMut(&BufferLine) -> bool,
    {
        let mut dropped = Vec::new();
        let mut write = 0;
        for read in 0..self.lines.len() {
            let line = self.lines[read];
            if keep(&line) {
                self.lines[write] = line;
                write += 1;
            } else {
                dropped.push(line);
            }
        }
        self.lines.truncate(write);
        dropped
    }

    /// Truncates the buffer to its first `n` lines.
    ///
    /// # Returns
    ///
    /// The removed lines, oldest first.
    pub fn shrink(&mut self, n: usize) -> Vec<BufferLine> {
        if n >= self.lines.len() {
            return Vec::new();
        }
        self.lines.split_off(n)
    }

    /// Removes every line.
    ///
    /// # Returns
    ///
    /// The removed lines, oldest first.
    pub fn clear(&mut self) -> Vec<BufferLine> {
        std::mem::take(&mut self.lines)
    }

    /// Drops leading fences.
    ///
    /// # Returns
    ///
    /// The dropped lines, oldest first.
    pub fn clean_old_and_flushed(&mut self) -> Vec<BufferLine> {
        let keep_from = self
            .lines
            .iter()
            .position(BufferLine::is_store)
            .unwrap_or(self.lines.len());
        self.lines.drain(..keep_from).collect()
    }

    /// Returns the indices of pending (not committed) stores overlapping `[addr, addr + size)`.
    pub fn pending_matches(&self, addr: Addr, size: u64) -> Vec<usize> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.is_committed() && l.matches(addr, size))
            .map(|(i, _)| i)
            .collect()
    }

    /// Returns true if a committed store overlaps `[addr, addr + size)`.
    pub fn has_committed_match(&self, addr: Addr, size: u64) -> bool {
        self.lines
            .iter()
            .any(|l| l.is_committed() && l.matches(addr, size))
    }

    /// Formats every line for debug output, oldest first.
    pub fn dump(&self) -> String {
        self.lines
            .iter()
            .map(BufferLine::dump)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<Vec<BufferLine>> for Buffer {
    fn from(lines: Vec<BufferLine>) -> Self {
        Self { lines }
    }
}

impl<'a> IntoIterator for &'a Buffer {
    type Item = &'a BufferLine;
    type IntoIter = std::slice::Iter<'a, BufferLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}
