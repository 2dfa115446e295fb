//! Simulated host.
//!
//! `SimHost` plays the role of the virtual machine around the weak-memory
//! layer. It provides:
//! 1. **Memory:** An [`Arena`] mapped at a fixed guest base address.
//! 2. **Heap:** A bump allocator with an object registry for `object_bounds`.
//! 3. **Threads:** A current-thread register switched by the caller.
//! 4. **Choices:** Replay of a scripted choice sequence; every call is recorded
//!    so an explorer can enumerate all executions depth first.
//! 5. **Faults:** Reported faults are collected instead of aborting.

use std::collections::BTreeMap;
use std::io;

use super::arena::Arena;
use crate::common::{Addr, FaultKind};
use crate::host::{ControlFlags, Host, Memory, ThreadId};

/// Guest address the arena is mapped at.
pub const DEFAULT_BASE: u64 = 0x1000_0000;

/// Alignment of objects returned by [`SimHost::allocate`].
const ALLOC_ALIGN: u64 = 8;

/// One recorded call to [`Host::choose`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChoicePoint {
    /// Number of branches offered.
    pub n: usize,
    /// Branch taken.
    pub chosen: usize,
}

/// Reference host backed by an arena.
#[derive(Debug)]
pub struct SimHost {
    arena: Arena,
    base: Addr,
    brk: u64,
    objects: BTreeMap<Addr, u64>,
    flags: ControlFlags,
    current: ThreadId,
    script: Vec<usize>,
    trace: Vec<ChoicePoint>,
    faults: Vec<(FaultKind, String)>,
}

impl SimHost {
    /// Creates a host with `size` bytes of memory at [`DEFAULT_BASE`].
    ///
    /// # Errors
    ///
    /// Propagates the arena allocation failure.
    pub fn new(size: usize) -> io::Result<Self> {
        Ok(Self {
            arena: Arena::new(size)?,
            base: Addr::new(DEFAULT_BASE),
            brk: 0,
            objects: BTreeMap::new(),
            flags: ControlFlags::NONE,
            current: ThreadId(0),
            script: Vec::new(),
            trace: Vec::new(),
            faults: Vec::new(),
        })
    }

    /// Replaces the choice script; replay starts from the first entry.
    ///
    /// Calls beyond the script take branch 0.
    #[must_use]
    pub fn with_choices(mut self, script: Vec<usize>) -> Self {
        self.script = script;
        self.trace.clear();
        self
    }

    /// Returns the guest base address.
    pub const fn base(&self) -> Addr {
        self.base
    }

    /// Allocates a zeroed object of `size` bytes.
    ///
    /// # Returns
    ///
    /// The object's address, or `None` once the arena is exhausted.
    pub fn allocate(&mut self, size: u64) -> Option<Addr> {
        let start = self.brk.next_multiple_of(ALLOC_ALIGN);
        let end = start.checked_add(size.max(1))?;
        if !self.arena.contains(start as usize, (end - start) as usize) {
            return None;
        }
        let _ = self.arena.zero(start as usize, (end - start) as usize);
        self.brk = end;
        let addr = self.base.offset(start);
        let _ = self.objects.insert(addr, size);
        Some(addr)
    }

    /// Forgets the object starting at `addr`.
    ///
    /// The weak-memory layer must be told separately via `cleanup`.
    ///
    /// # Returns
    ///
    /// The object's size if it was live.
    pub fn free(&mut self, addr: Addr) -> Option<u64> {
        self.objects.remove(&addr)
    }

    /// Changes the recorded size of the object starting at `addr`.
    pub fn set_object_size(&mut self, addr: Addr, size: u64) -> bool {
        match self.objects.get_mut(&addr) {
            Some(slot) => {
                *slot = size;
                true
            }
            None => false,
        }
    }

    /// Makes `tid` the running thread.
    pub const fn switch_to(&mut self, tid: ThreadId) {
        self.current = tid;
    }

    /// Returns the choices made so far.
    pub fn trace(&self) -> &[ChoicePoint] {
        &self.trace
    }

    /// Takes the recorded choices, leaving the trace empty.
    pub fn take_trace(&mut self) -> Vec<ChoicePoint> {
        std::mem::take(&mut self.trace)
    }

    /// Returns the faults reported so far.
    pub fn faults(&self) -> &[(FaultKind, String)] {
        &self.faults
    }

    /// Reads `N` bytes at `addr`; out-of-range reads record a fault and yield zeros.
    fn load_bytes<const N: usize>(&mut self, addr: Addr) -> [u8; N] {
        let mut out = [0u8; N];
        if let Some(bytes) = self.translate(addr, N).and_then(|off| self.arena.read_slice(off, N)) {
            out.copy_from_slice(bytes);
        } else {
            self.out_of_range(addr, N);
        }
        out
    }

    fn store_bytes(&mut self, addr: Addr, bytes: &[u8]) {
        let written = self
            .translate(addr, bytes.len())
            .is_some_and(|off| self.arena.write_slice(off, bytes));
        if !written {
            self.out_of_range(addr, bytes.len());
        }
    }

    fn translate(&self, addr: Addr, len: usize) -> Option<usize> {
        let off = usize::try_from(addr.val().checked_sub(self.base.val())?).ok()?;
        self.arena.contains(off, len).then_some(off)
    }

    fn out_of_range(&mut self, addr: Addr, len: usize) {
        self.faults.push((
            FaultKind::Validation,
            format!("simulated access of {len} bytes at {addr} is outside memory"),
        ));
    }
}

impl Memory for SimHost {
    fn read_u8(&mut self, addr: Addr) -> u8 {
        u8::from_le_bytes(self.load_bytes(addr))
    }

    fn read_u16(&mut self, addr: Addr) -> u16 {
        u16::from_le_bytes(self.load_bytes(addr))
    }

    fn read_u32(&mut self, addr: Addr) -> u32 {
        u32::from_le_bytes(self.load_bytes(addr))
    }

    fn read_u64(&mut self, addr: Addr) -> u64 {
        u64::from_le_bytes(self.load_bytes(addr))
    }

    fn write_u8(&mut self, addr: Addr, val: u8) {
        self.store_bytes(addr, &val.to_le_bytes());
    }

    fn write_u16(&mut self, addr: Addr, val: u16) {
        self.store_bytes(addr, &val.to_le_bytes());
    }

    fn write_u32(&mut self, addr: Addr, val: u32) {
        self.store_bytes(addr, &val.to_le_bytes());
    }

    fn write_u64(&mut self, addr: Addr, val: u64) {
        self.store_bytes(addr, &val.to_le_bytes());
    }
}

impl Host for SimHost {
    fn choose(&mut self, n: usize) -> usize {
        let scripted = self.script.get(self.trace.len()).copied().unwrap_or(0);
        let chosen = scripted.min(n.saturating_sub(1));
        self.trace.push(ChoicePoint { n, chosen });
        chosen
    }

    fn fault(&mut self, kind: FaultKind, message: &str) {
        self.faults.push((kind, message.to_owned()));
    }

    fn control_flags(&self) -> ControlFlags {
        self.flags
    }

    fn set_control_flags(&mut self, flags: ControlFlags) {
        self.flags = flags;
    }

    fn thread_id(&self) -> ThreadId {
        self.current
    }

    fn object_bounds(&self, ptr: Addr) -> Option<(Addr, u64)> {
        let (base, size) = self.objects.range(..=ptr).next_back()?;
        ptr.within(*base, *size).then_some((*base, *size))
    }
}
