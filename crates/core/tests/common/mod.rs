//! Shared test infrastructure.

/// Machine setup and execution explorer.
pub mod harness;
