//! Common utilities and types shared by every part of the simulation layer.
//!
//! This module provides the fundamental building blocks used throughout the crate. It includes:
//! 1. **Address Type:** A strong type for guest addresses and byte-range arithmetic.
//! 2. **Bit Widths:** Validation, byte sizes, masks, and little-endian byte helpers.
//! 3. **Error Handling:** Fatal validation and consistency faults.

/// Address type definition.
pub mod addr;

/// Error types and fault classification.
pub mod error;

/// Bit-width helpers for narrow and unaligned accesses.
pub mod width;

pub use addr::Addr;
pub use error::{ConfigError, Fault, FaultKind};
