//! ## Register store
//! Indexed array of `2^p` packed registers (see [`crate::packer`]). The backing integer is
//! chosen once at construction:
//! - `r <= 25` - narrow store backed by `u32` registers
//! - `r > 25`  - wide store backed by `u64` registers
//!
//! Registers only move towards greater dominance: `update_if_dominant` is the sole mutation
//! entry point, so inserts and merges are commutative and idempotent per register.

use std::mem::size_of;

use enum_dispatch::enum_dispatch;

use crate::error::{Result, SketchError};
use crate::packer::{dominates, NARROW_MAX_RETAINED_BITS, WIDE_MAX_RETAINED_BITS};

/// Backing width of a `RegisterStore`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterWidth {
    /// 32-bit registers
    Narrow,
    /// 64-bit registers
    Wide,
}

impl RegisterWidth {
    /// Width required to hold registers with `r` retained bits.
    #[inline]
    pub fn for_retained_bits(r: u32) -> Self {
        if r > NARROW_MAX_RETAINED_BITS {
            RegisterWidth::Wide
        } else {
            RegisterWidth::Narrow
        }
    }

    /// Number of bytes a single register occupies when serialized.
    #[inline]
    pub fn bytes(self) -> usize {
        match self {
            RegisterWidth::Narrow => size_of::<u32>(),
            RegisterWidth::Wide => size_of::<u64>(),
        }
    }
}

/// Register store variants supported by sketches
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[enum_dispatch]
pub enum RegisterStore {
    Narrow(NarrowRegisters),
    Wide(WideRegisters),
}

/// Operations shared by all register store variants.
#[enum_dispatch(RegisterStore)]
pub trait RegisterStoreTrait {
    /// Return register at `idx`, widened to `u64`
    fn get(&self, idx: usize) -> u64;
    /// Replace register at `idx` with `candidate` iff `candidate` dominates it.
    /// Returns whether the register changed.
    fn update_if_dominant(&mut self, idx: usize, candidate: u64) -> bool;
    /// Return number of registers which were never updated
    fn count_zero_registers(&self) -> usize;
    /// Return number of registers
    fn len(&self) -> usize;
    /// Return number of mantissa bits retained in each register
    fn retained_bits(&self) -> u32;
    /// Return backing width
    fn width(&self) -> RegisterWidth;
}

impl RegisterStore {
    /// Create zero-filled store of `2^p` registers, picking the width from `r`.
    pub fn new(p: u32, r: u32) -> Result<Self> {
        if !(1..=WIDE_MAX_RETAINED_BITS).contains(&r) {
            return Err(SketchError::Validation(format!(
                "retained bits (r) must be in [1..{}], got {}",
                WIDE_MAX_RETAINED_BITS, r
            )));
        }
        if p >= usize::BITS - 1 {
            return Err(SketchError::Validation(format!(
                "precision (p) {} is too large",
                p
            )));
        }
        let len = 1usize << p;
        Ok(match RegisterWidth::for_retained_bits(r) {
            RegisterWidth::Narrow => NarrowRegisters::new(len, r)?.into(),
            RegisterWidth::Wide => WideRegisters::new(len, r).into(),
        })
    }

    /// Return `p` such that this store holds `2^p` registers
    #[inline]
    pub fn precision(&self) -> u32 {
        self.len().trailing_zeros()
    }

    /// Whether all registers are zero
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count_zero_registers() == self.len()
    }

    /// Iterate over registers, widened to `u64`
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.len()).map(move |idx| self.get(idx))
    }

    /// Fold every register of `other` into `self`. Returns number of changed registers.
    pub(crate) fn merge(&mut self, other: &RegisterStore) -> usize {
        debug_assert_eq!(self.len(), other.len());
        debug_assert_eq!(self.retained_bits(), other.retained_bits());
        let mut changed = 0;
        for (idx, register) in other.iter().enumerate() {
            if register != 0 && self.update_if_dominant(idx, register) {
                changed += 1;
            }
        }
        changed
    }
}

/// Store backed by `u32` registers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NarrowRegisters {
    registers: Vec<u32>,
    r: u32,
}

impl NarrowRegisters {
    /// Create zero-filled narrow store, failing when `r` does not fit 32-bit registers.
    pub fn new(len: usize, r: u32) -> Result<Self> {
        if r > NARROW_MAX_RETAINED_BITS {
            return Err(SketchError::Validation(format!(
                "r cannot be greater than {} when using narrow registers, got {}",
                NARROW_MAX_RETAINED_BITS, r
            )));
        }
        Ok(Self::zeroed(len, r))
    }

    /// Create zero-filled narrow store; callers guarantee `r` fits 32-bit registers.
    pub(crate) fn zeroed(len: usize, r: u32) -> Self {
        debug_assert!(r <= NARROW_MAX_RETAINED_BITS);
        Self {
            registers: vec![0; len],
            r,
        }
    }
}

impl RegisterStoreTrait for NarrowRegisters {
    #[inline]
    fn get(&self, idx: usize) -> u64 {
        u64::from(self.registers[idx])
    }

    #[inline]
    fn update_if_dominant(&mut self, idx: usize, candidate: u64) -> bool {
        let current = u64::from(self.registers[idx]);
        if dominates(candidate, current, self.r) {
            // Narrow registers hold at most 6 + 25 bits, so the candidate always fits.
            debug_assert!(candidate <= u64::from(u32::MAX));
            self.registers[idx] = candidate as u32;
            return true;
        }
        false
    }

    #[inline]
    fn count_zero_registers(&self) -> usize {
        self.registers.iter().filter(|&&r| r == 0).count()
    }

    #[inline]
    fn len(&self) -> usize {
        self.registers.len()
    }

    #[inline]
    fn retained_bits(&self) -> u32 {
        self.r
    }

    #[inline]
    fn width(&self) -> RegisterWidth {
        RegisterWidth::Narrow
    }
}

/// Store backed by `u64` registers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WideRegisters {
    registers: Vec<u64>,
    r: u32,
}

impl WideRegisters {
    /// Create zero-filled wide store
    pub fn new(len: usize, r: u32) -> Self {
        Self {
            registers: vec![0; len],
            r,
        }
    }
}

impl RegisterStoreTrait for WideRegisters {
    #[inline]
    fn get(&self, idx: usize) -> u64 {
        self.registers[idx]
    }

    #[inline]
    fn update_if_dominant(&mut self, idx: usize, candidate: u64) -> bool {
        if dominates(candidate, self.registers[idx], self.r) {
            self.registers[idx] = candidate;
            return true;
        }
        false
    }

    #[inline]
    fn count_zero_registers(&self) -> usize {
        self.registers.iter().filter(|&&r| r == 0).count()
    }

    #[inline]
    fn len(&self) -> usize {
        self.registers.len()
    }

    #[inline]
    fn retained_bits(&self) -> u32 {
        self.r
    }

    #[inline]
    fn width(&self) -> RegisterWidth {
        RegisterWidth::Wide
    }
}
