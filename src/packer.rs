//! ## Packed register codec
//! A register packs the leading-one position of a hash window together with `r` retained
//! (mantissa) bits into a single integer:
//!
//! - 0..r bits         - store the mantissa
//! - r..r+6 bits       - store the leading-one position (`0` means the register was never set)
//!
//! Narrow (32-bit) and wide (64-bit) stores share this codec, registers are widened to `u64`
//! when packed or unpacked.

use crate::error::{Result, SketchError};

/// Number of bits reserved for the leading-one position (`q` in the HyperMinHash paper).
pub const POSITION_BITS: u32 = 6;
/// Largest leading-one position which fits into the reserved bits.
pub const MAX_POSITION: u32 = (1 << POSITION_BITS) - 1;
/// Largest number of retained bits which fits a narrow (32-bit) register.
pub const NARROW_MAX_RETAINED_BITS: u32 = 25;
/// Largest number of retained bits which fits a wide (64-bit) register.
pub const WIDE_MAX_RETAINED_BITS: u32 = 57;

/// Pack `position` and `mantissa` into a register, validating both fit.
pub fn pack(position: u32, mantissa: u64, r: u32) -> Result<u64> {
    if r == 0 || r > WIDE_MAX_RETAINED_BITS {
        return Err(SketchError::Validation(format!(
            "retained bits must be in [1..{}], got {}",
            WIDE_MAX_RETAINED_BITS, r
        )));
    }
    if position > MAX_POSITION {
        return Err(SketchError::Validation(format!(
            "position of first one must fit into {} bits, got {}",
            POSITION_BITS, position
        )));
    }
    if mantissa > mantissa_mask(r) {
        return Err(SketchError::Validation(format!(
            "mantissa must fit into {} bits, got {:#x}",
            r, mantissa
        )));
    }
    Ok(pack_unchecked(position, mantissa, r))
}

/// Pack without validation; callers guarantee `position <= MAX_POSITION` and `mantissa < 2^r`.
#[inline]
pub(crate) fn pack_unchecked(position: u32, mantissa: u64, r: u32) -> u64 {
    debug_assert!(position <= MAX_POSITION);
    debug_assert!(mantissa <= mantissa_mask(r));
    (u64::from(position) << r) | mantissa
}

/// Return the leading-one position stored in `register`
#[inline]
pub fn unpack_position(register: u64, r: u32) -> u32 {
    (register >> r) as u32
}

/// Return the mantissa stored in `register`
#[inline]
pub fn unpack_mantissa(register: u64, r: u32) -> u64 {
    register & mantissa_mask(r)
}

/// Whether `candidate` dominates `current`: a greater position wins, equal positions are
/// broken in favour of the smaller mantissa.
#[inline]
pub fn dominates(candidate: u64, current: u64, r: u32) -> bool {
    let candidate_position = unpack_position(candidate, r);
    let current_position = unpack_position(current, r);
    candidate_position > current_position
        || (candidate_position == current_position
            && unpack_mantissa(candidate, r) < unpack_mantissa(current, r))
}

#[inline]
fn mantissa_mask(r: u32) -> u64 {
    (1u64 << r) - 1
}
