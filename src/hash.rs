//! Hash-to-register mapping.
//!
//! Items are hashed into 128 bits (two 64-bit halves). The first half selects the register and
//! the leading-one position, the second half provides the retained mantissa bits:
//!
//! - h0[0..p]          - register index (top `p` bits)
//! - h0[p..64]         - zero-search window, terminated by a sentinel one-bit
//! - h1[0..r]          - mantissa (top `r` bits)

use wyhash::wyhash;

use crate::packer::pack_unchecked;

/// Seeds of the two independent 64-bit hash halves
const SEED_0: u64 = 0xd88e_ca97_da5d_8dc7;
const SEED_1: u64 = 0xf391_6301_e0c4_3300;

/// Hash `item` into two 64-bit halves.
#[inline]
pub fn hash128(item: &[u8]) -> (u64, u64) {
    (wyhash(item, SEED_0), wyhash(item, SEED_1))
}

/// Map `item` to its register index and candidate register for sketch parameters `(p, r)`.
#[inline]
pub(crate) fn bucket_and_register(item: &[u8], p: u32, r: u32) -> (usize, u64) {
    let (h0, h1) = hash128(item);
    split_hash(h0, h1, p, r)
}

/// Split hash halves into register index and candidate register.
#[inline]
fn split_hash(h0: u64, h1: u64, p: u32, r: u32) -> (usize, u64) {
    let idx = (h0 >> (64 - p)) as usize;
    // Shift out index bits and set a sentinel one right below the window, so an all-zero
    // window still terminates with position `65 - p`.
    let window = (h0 << p) | (1u64 << (p - 1));
    let position = window.leading_zeros() + 1;
    let mantissa = h1 >> (64 - r);
    (idx, pack_unchecked(position, mantissa, r))
}
