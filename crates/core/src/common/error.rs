//! Fault definitions.
//!
//! This module defines the error handling for the simulation layer. It provides:
//! 1. **Faults:** Every condition that aborts an operation. All of them are fatal
//!    to the explored execution and are reported through the host's fault hook.
//! 2. **Classification:** `FaultKind` separates malformed requests from
//!    consistency violations so the host can file them differently.
//! 3. **Configuration Errors:** Failures while loading a `Config`.
//!
//! A failed compare-and-swap is not a fault; it is an ordinary return value.

use thiserror::Error;

use super::addr::Addr;

/// Class of a fault, as reported to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum FaultKind {
    /// Malformed request: null address, bad bit width, bad cleanup count.
    Validation = 1,
    /// Atomic operations disagree about the shape of a location.
    Consistency = 2,
}

/// Fatal fault raised by a memory operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Fault {
    /// The operation was issued against the null address.
    #[error("weakmem: access through a null address")]
    NullAddress,

    /// The bit width is outside `1..=64`.
    #[error("weakmem: invalid bit width {0} (expected 1..=64)")]
    InvalidBitWidth(u32),

    /// `cleanup` was called with a negative object count.
    #[error("weakmem: invalid cleanup count {0}")]
    InvalidCleanupCount(i64),

    /// The host does not know the object a pointer belongs to.
    #[error("weakmem: {0} does not point into a live object")]
    UnknownObject(Addr),

    /// Two atomic operations touch overlapping but different locations.
    #[error(
        "weakmem: atomic access to {addr}/{bitwidth} overlaps atomic access to {other}/{other_bitwidth}"
    )]
    OverlappingAtomics {
        /// Address of the new atomic operation.
        addr: Addr,
        /// Width of the new atomic operation.
        bitwidth: u32,
        /// Address of the buffered atomic operation it collides with.
        other: Addr,
        /// Width of the buffered atomic operation.
        other_bitwidth: u32,
    },

    /// More buffered lines are sequenced than the counter can number.
    #[error("weakmem: sequence counter overflow at {0}")]
    SequenceOverflow(&'static str),
}

impl Fault {
    /// Returns the class under which this fault is reported.
    pub const fn kind(&self) -> FaultKind {
        match self {
            Self::OverlappingAtomics { .. } | Self::SequenceOverflow(_) => FaultKind::Consistency,
            Self::NullAddress
            | Self::InvalidBitWidth(_)
            | Self::InvalidCleanupCount(_)
            | Self::UnknownObject(_) => FaultKind::Validation,
        }
    }
}

/// Error raised while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration text is not valid JSON for `Config`.
    #[error("invalid weakmem configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("cannot read weakmem configuration: {0}")]
    Io(#[from] std::io::Error),

    /// A field holds a value outside its legal range.
    #[error("invalid weakmem configuration: {0}")]
    Invalid(String),
}
