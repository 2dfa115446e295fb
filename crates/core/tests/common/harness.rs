use std::collections::BTreeSet;

use weakmem_core::sim::{SimHost, next_script};
use weakmem_core::{Addr, Config, ThreadId, WeakMem};

/// Bytes of simulated memory per machine.
pub const MEMORY_SIZE: usize = 64 * 1024;

/// Size of the shared object handed to every test body.
pub const OBJECT_SIZE: u64 = 64;

/// Installs a test-friendly tracing subscriber (filter from `RUST_LOG`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builds a machine with `config`, replaying `script`, and one shared object.
pub fn machine_with(config: &Config, script: Vec<usize>) -> (WeakMem<SimHost>, Addr) {
    init_tracing();
    let mut host = SimHost::new(MEMORY_SIZE).unwrap().with_choices(script);
    let obj = host.allocate(OBJECT_SIZE).unwrap();
    (WeakMem::new(host, config.clone()), obj)
}

/// Builds a default machine with one shared object.
pub fn machine() -> (WeakMem<SimHost>, Addr) {
    machine_with(&Config::default(), Vec::new())
}

/// Makes `tid` the running thread.
pub fn on(wm: &mut WeakMem<SimHost>, tid: u64) -> &mut WeakMem<SimHost> {
    wm.host_mut().switch_to(ThreadId(tid));
    wm
}

/// Result of enumerating every execution of a test body.
#[derive(Debug)]
pub struct Exploration<T> {
    /// Distinct outcomes observed.
    pub outcomes: BTreeSet<T>,
    /// Number of executions run.
    pub executions: usize,
}

/// Runs `body` once per reachable combination of host choices.
///
/// Each execution starts from a fresh machine. The body must be deterministic
/// apart from the host's choices, and must not fault.
pub fn explore<T, F>(config: &Config, mut body: F) -> Exploration<T>
where
    T: Ord,
    F: FnMut(&mut WeakMem<SimHost>, Addr) -> T,
{
    let mut outcomes = BTreeSet::new();
    let mut executions = 0;
    let mut script = Vec::new();
    loop {
        let (mut wm, obj) = machine_with(config, script);
        let _ = outcomes.insert(body(&mut wm, obj));
        executions += 1;
        assert!(wm.host().faults().is_empty(), "{:?}", wm.host().faults());
        match next_script(wm.host().trace()) {
            Some(next) => script = next,
            None => break,
        }
    }
    Exploration { outcomes, executions }
}
