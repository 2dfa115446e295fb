//! Log subscriber installation.
//!
//! The subscriber writes to stderr and is filtered by the `WEAKMEM_LOG`
//! environment variable (same syntax as `RUST_LOG`), defaulting to `warn`.
//! If the embedding process already installed a global subscriber, that one
//! is kept.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "WEAKMEM_LOG";

static INIT: Once = Once::new();

/// Installs the subscriber. Only the first call has any effect.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
