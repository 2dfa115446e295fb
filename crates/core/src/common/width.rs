//! Bit-width handling for narrow and unaligned accesses.
//!
//! Every access carries a bit width in `1..=64`. Widths are dispatched to the
//! smallest of the 8/16/32/64-bit host accesses that holds them, and values are
//! laid out little-endian when individual bytes have to be merged.

use super::addr::Addr;
use super::error::Fault;

/// Largest supported access width in bits.
pub const MAX_BITWIDTH: u32 = 64;

/// Checks that `bitwidth` lies in `1..=64`.
///
/// # Returns
///
/// The width unchanged, or `Fault::InvalidBitWidth`.
pub const fn validate(bitwidth: u32) -> Result<u32, Fault> {
    if bitwidth == 0 || bitwidth > MAX_BITWIDTH {
        Err(Fault::InvalidBitWidth(bitwidth))
    } else {
        Ok(bitwidth)
    }
}

/// Returns the number of bytes a `bitwidth`-bit access touches (1, 2, 4 or 8).
///
/// A zero width (fence marker) touches no bytes.
#[inline]
pub const fn byte_size(bitwidth: u32) -> u64 {
    match bitwidth {
        0 => 0,
        1..=8 => 1,
        9..=16 => 2,
        17..=32 => 4,
        _ => 8,
    }
}

/// Returns a mask selecting the low `bitwidth` bits.
#[inline]
pub const fn mask(bitwidth: u32) -> u64 {
    if bitwidth >= 64 {
        u64::MAX
    } else {
        (1u64 << bitwidth) - 1
    }
}

/// Extracts byte `index` (little-endian) of `value`.
#[inline]
pub const fn byte_of(value: u64, index: u64) -> u8 {
    (value >> (index * 8)) as u8
}

/// Reassembles `bytes` (little-endian, at most eight) into a value.
pub fn assemble(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .enumerate()
        .fold(0, |acc, (i, b)| acc | (u64::from(*b) << (i * 8)))
}

/// Returns the byte of a buffered value that lands on `target`, if any.
///
/// # Arguments
///
/// * `line_addr` - Address the buffered value was stored at.
/// * `line_bitwidth` - Width of the buffered store.
/// * `value` - The buffered value.
/// * `target` - The byte address being reconstructed.
pub const fn covering_byte(line_addr: Addr, line_bitwidth: u32, value: u64, target: Addr) -> Option<u8> {
    if target.within(line_addr, byte_size(line_bitwidth)) {
        Some(byte_of(value, target.val() - line_addr.val()))
    } else {
        None
    }
}
