//! BetaMinHash: HyperMinHash with fixed parameters and LogLog-Beta cardinality estimation.
//!
//! LogLog-Beta is almost identical in accuracy to HyperLogLog++, but needs neither bias
//! tables nor linear counting: the bias is corrected by a polynomial in the number of zero
//! registers. The polynomial coefficients are fitted for `P = 14`, so the parameters of this
//! sketch are fixed. `Q` and `R` follow the HyperMinHash paper suggestion, which is accurate for
//! cardinalities up to 2^89.

use crate::estimator::loglog_beta;
use crate::hash::bucket_and_register;
use crate::packer::NARROW_MAX_RETAINED_BITS;
use crate::registers::{NarrowRegisters, RegisterStore, RegisterStoreTrait};
use crate::sketch::{sealed, IntersectionSketch};

/// BetaMinHash sketch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BetaMinHash {
    registers: RegisterStore,
}

impl BetaMinHash {
    /// Number of register index bits
    pub const P: u32 = 14;
    /// Number of bits reserved for the leading-one position
    pub const Q: u32 = 6;
    /// Number of retained mantissa bits
    pub const R: u32 = 10;
    /// Number of registers
    pub const NUM_REGISTERS: usize = 1 << Self::P;
    /// Serialization format version
    pub(crate) const VERSION: u8 = 1;

    /// Creates new empty sketch
    pub fn new() -> Self {
        Self {
            registers: Self::empty_registers(),
        }
    }

    /// Wrap decoded registers into a sketch
    pub(crate) fn from_registers(registers: RegisterStore) -> Self {
        debug_assert_eq!(registers.len(), Self::NUM_REGISTERS);
        debug_assert_eq!(registers.retained_bits(), Self::R);
        Self { registers }
    }

    /// Return zero-filled store for the fixed parameters
    fn empty_registers() -> RegisterStore {
        NarrowRegisters::zeroed(Self::NUM_REGISTERS, Self::R).into()
    }
}

const _: () = assert!(BetaMinHash::R <= NARROW_MAX_RETAINED_BITS);

impl Default for BetaMinHash {
    fn default() -> Self {
        Self::new()
    }
}

impl IntersectionSketch for BetaMinHash {
    #[inline]
    fn precision(&self) -> u32 {
        Self::P
    }

    #[inline]
    fn retained_bits(&self) -> u32 {
        Self::R
    }

    #[inline]
    fn offer(&mut self, item: &[u8]) -> bool {
        let (idx, candidate) = bucket_and_register(item, Self::P, Self::R);
        self.registers.update_if_dominant(idx, candidate)
    }

    #[inline]
    fn cardinality(&self) -> u64 {
        loglog_beta(&self.registers)
    }

    #[inline]
    fn registers(&self) -> &RegisterStore {
        &self.registers
    }
}

impl sealed::RegistersMut for BetaMinHash {
    #[inline]
    fn registers_mut(&mut self) -> &mut RegisterStore {
        &mut self.registers
    }
}
