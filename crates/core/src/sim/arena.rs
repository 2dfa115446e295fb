//! Raw memory arena for the reference host.
//!
//! This module provides a wrapper around a raw allocation that stands in for
//! guest memory. On Unix it is mapped with `mmap`, so pages are only backed by
//! the OS once touched and large arenas cost nothing up front. Elsewhere it
//! falls back to a zeroed `Vec`.

use std::io;
use std::slice;

/// Byte arena backing simulated memory.
pub struct Arena {
    ptr: *mut u8,
    size: usize,
    is_mmap: bool,
}

// SAFETY: the arena exclusively owns its allocation; every access goes through
// `&self`/`&mut self` and is bounds checked.
unsafe impl Send for Arena {}

impl Arena {
    /// Allocates a zeroed arena of `size` bytes.
    ///
    /// # Errors
    ///
    /// The OS error if `mmap` fails.
    pub fn new(size: usize) -> io::Result<Self> {
        #[cfg(unix)]
        {
            use std::ptr;
            // SAFETY: anonymous private mapping with no address hint; the
            // result is checked against MAP_FAILED before use.
            let ptr = unsafe {
                libc::mmap(
                    ptr::null_mut(),
                    size.max(1),
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                    -1,
                    0,
                )
            };
            if ptr == libc::MAP_FAILED {
                return Err(io::Error::last_os_error());
            }
            Ok(Self {
                ptr: ptr as *mut u8,
                size,
                is_mmap: true,
            })
        }

        #[cfg(not(unix))]
        {
            let mut vec = vec![0u8; size];
            let ptr = vec.as_mut_ptr();
            std::mem::forget(vec);
            Ok(Self {
                ptr,
                size,
                is_mmap: false,
            })
        }
    }

    /// Returns the size of the arena in bytes.
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Returns true if the arena holds no bytes.
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns true if `[offset, offset + len)` lies inside the arena.
    pub const fn contains(&self, offset: usize, len: usize) -> bool {
        match offset.checked_add(len) {
            Some(end) => end <= self.size,
            None => false,
        }
    }

    /// Returns `len` bytes starting at `offset`, or `None` if out of bounds.
    pub fn read_slice(&self, offset: usize, len: usize) -> Option<&[u8]> {
        if !self.contains(offset, len) {
            return None;
        }
        // SAFETY: the range was bounds checked and the mapping lives as long as `self`.
        Some(unsafe { slice::from_raw_parts(self.ptr.add(offset), len) })
    }

    /// Copies `data` to `offset`.
    ///
    /// # Returns
    ///
    /// `false` (and nothing written) if the range is out of bounds.
    pub fn write_slice(&mut self, offset: usize, data: &[u8]) -> bool {
        if !self.contains(offset, data.len()) {
            return false;
        }
        // SAFETY: the destination range was bounds checked and cannot overlap
        // `data`, which is borrowed separately from the arena.
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), self.ptr.add(offset), data.len());
        }
        true
    }

    /// Zeroes `[offset, offset + len)`.
    pub fn zero(&mut self, offset: usize, len: usize) -> bool {
        if !self.contains(offset, len) {
            return false;
        }
        // SAFETY: bounds checked above.
        unsafe {
            std::ptr::write_bytes(self.ptr.add(offset), 0, len);
        }
        true
    }
}

impl Drop for Arena {
    /// Unmaps the arena, or rebuilds the `Vec` so its destructor runs.
    fn drop(&mut self) {
        if self.is_mmap {
            #[cfg(unix)]
            // SAFETY: `ptr`/`size` describe the mapping created in `new`.
            unsafe {
                let _ = libc::munmap(self.ptr.cast(), self.size.max(1));
            }
        } else {
            #[cfg(not(unix))]
            // SAFETY: `ptr` came from a `Vec` of exactly `size` elements.
            unsafe {
                let _ = Vec::from_raw_parts(self.ptr, self.size, self.size);
            }
        }
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("size", &self.size)
            .field("is_mmap", &self.is_mmap)
            .finish()
    }
}
