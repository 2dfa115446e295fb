use mockall::mock;
use weakmem_core::{Addr, ControlFlags, FaultKind, Host, Memory, ThreadId};

mock! {
    pub Kernel {}
    impl Memory for Kernel {
        fn read_u8(&mut self, addr: Addr) -> u8;
        fn read_u16(&mut self, addr: Addr) -> u16;
        fn read_u32(&mut self, addr: Addr) -> u32;
        fn read_u64(&mut self, addr: Addr) -> u64;
        fn write_u8(&mut self, addr: Addr, val: u8);
        fn write_u16(&mut self, addr: Addr, val: u16);
        fn write_u32(&mut self, addr: Addr, val: u32);
        fn write_u64(&mut self, addr: Addr, val: u64);
    }
    impl Host for Kernel {
        fn choose(&mut self, n: usize) -> usize;
        fn fault(&mut self, kind: FaultKind, message: &str);
        fn control_flags(&self) -> ControlFlags;
        fn set_control_flags(&mut self, flags: ControlFlags);
        fn thread_id(&self) -> ThreadId;
        fn object_bounds(&self, ptr: Addr) -> Option<(Addr, u64)>;
    }
}

/// Returns a kernel whose control register always reads `flags` and whose
/// running thread is `tid`. Writes to the register are accepted and ignored.
pub fn kernel(flags: ControlFlags, tid: ThreadId) -> MockKernel {
    let mut mock = MockKernel::new();
    let _ = mock.expect_control_flags().return_const(flags);
    let _ = mock.expect_set_control_flags().return_const(());
    let _ = mock.expect_thread_id().return_const(tid);
    mock
}
