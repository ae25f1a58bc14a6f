//! HyperMinHash sketch with runtime precision `p` and retained bits `r`.
//!
//! [HyperMinHash paper](https://arxiv.org/pdf/1710.08436.pdf)
//!
//! - `p`: precision parameter in [4..30) range, which defines number of bits used
//!   for register indices (`2^p` registers).
//! - `r`: number of mantissa (minhash) bits retained in every register, in (1..58) range.
//!   Larger `r` reduces accidental register collisions and improves similarity estimates
//!   for small Jaccard indices, `r > 25` switches registers from 32 to 64 bits.
//!
//! Expected cardinality error is about `1.04 / sqrt(2^p)`:
//!   p = 10: 3.25%
//!   p = 14: 0.81%
//!   p = 18: 0.20%

use log::debug;

use crate::error::{Result, SketchError};
use crate::estimator::{hyperloglog, BiasTable};
use crate::hash::bucket_and_register;
use crate::registers::{RegisterStore, RegisterStoreTrait};

/// Smallest supported precision
pub const MIN_PRECISION: u32 = 4;
/// Largest supported precision (exclusive)
pub const MAX_PRECISION: u32 = 30;
/// Smallest supported number of retained bits (exclusive)
pub const MIN_RETAINED_BITS: u32 = 1;
/// Largest supported number of retained bits (exclusive)
pub const MAX_RETAINED_BITS: u32 = 58;

pub(crate) mod sealed {
    use crate::registers::RegisterStore;

    /// Mutable register access. Unreachable outside of this crate, so registers only move
    /// through `offer` and [`crate::combiner::union`] and keep the sketch's `(p, r)`.
    pub trait RegistersMut {
        fn registers_mut(&mut self) -> &mut RegisterStore;
    }
}

/// Sketch supporting cardinality estimation and, through [`crate::combiner`], union,
/// similarity and intersection estimation.
///
/// The trait is sealed and the register store can only be read from outside of this crate:
///
/// ```compile_fail
/// use hyperminhash::{HyperMinHash, IntersectionSketch, RegisterStore};
///
/// let mut sketch = HyperMinHash::new(14, 35).unwrap();
/// *sketch.registers_mut() = RegisterStore::new(4, 40).unwrap();
/// ```
pub trait IntersectionSketch: Clone + sealed::RegistersMut {
    /// Return number of register index bits `p`
    fn precision(&self) -> u32;

    /// Return number of mantissa bits `r`
    fn retained_bits(&self) -> u32;

    /// Insert `item` into the sketch.
    /// Returns false when the sketch state is unaffected by the insert.
    fn offer(&mut self, item: &[u8]) -> bool;

    /// Return cardinality estimate
    fn cardinality(&self) -> u64;

    /// Return underlying registers
    fn registers(&self) -> &RegisterStore;
}

/// HyperMinHash sketch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HyperMinHash {
    p: u32,
    r: u32,
    registers: RegisterStore,
}

impl HyperMinHash {
    /// Serialization format version
    pub(crate) const VERSION: u8 = 1;

    /// Creates new empty sketch with precision `p` and `r` retained bits.
    pub fn new(p: u32, r: u32) -> Result<Self> {
        validate_params(p, r)?;
        let registers = RegisterStore::new(p, r)?;
        debug!(
            "created HyperMinHash p = {}, r = {}, width = {:?}",
            p,
            r,
            registers.width()
        );
        Ok(Self { p, r, registers })
    }

    /// Wrap decoded registers into a sketch
    pub(crate) fn from_registers(p: u32, r: u32, registers: RegisterStore) -> Result<Self> {
        validate_params(p, r)?;
        if registers.precision() != p || registers.retained_bits() != r {
            return Err(SketchError::IncompatibleParameters {
                expected_p: p,
                expected_r: r,
                found_p: registers.precision(),
                found_r: registers.retained_bits(),
            });
        }
        Ok(Self { p, r, registers })
    }

    /// Return cardinality estimate with the basic estimate corrected against `table`.
    pub fn cardinality_with_bias_correction(&self, table: &BiasTable) -> Result<u64> {
        if table.precision() != self.p {
            return Err(SketchError::IncompatibleParameters {
                expected_p: self.p,
                expected_r: self.r,
                found_p: table.precision(),
                found_r: self.r,
            });
        }
        if self.registers.is_empty() {
            return Ok(0);
        }
        let corrected = table.correct(hyperloglog(&self.registers));
        Ok(corrected.max(0.0).round() as u64)
    }
}

impl IntersectionSketch for HyperMinHash {
    #[inline]
    fn precision(&self) -> u32 {
        self.p
    }

    #[inline]
    fn retained_bits(&self) -> u32 {
        self.r
    }

    #[inline]
    fn offer(&mut self, item: &[u8]) -> bool {
        let (idx, candidate) = bucket_and_register(item, self.p, self.r);
        self.registers.update_if_dominant(idx, candidate)
    }

    #[inline]
    fn cardinality(&self) -> u64 {
        hyperloglog(&self.registers).round() as u64
    }

    #[inline]
    fn registers(&self) -> &RegisterStore {
        &self.registers
    }
}

impl sealed::RegistersMut for HyperMinHash {
    #[inline]
    fn registers_mut(&mut self) -> &mut RegisterStore {
        &mut self.registers
    }
}

/// Ensure that `p` and `r` are in the supported ranges
pub(crate) fn validate_params(p: u32, r: u32) -> Result<()> {
    if !(MIN_PRECISION..MAX_PRECISION).contains(&p) {
        return Err(SketchError::Validation(format!(
            "precision (p) must be in [{}..{}), got {}",
            MIN_PRECISION, MAX_PRECISION, p
        )));
    }
    if !(r > MIN_RETAINED_BITS && r < MAX_RETAINED_BITS) {
        return Err(SketchError::Validation(format!(
            "retained bits (r) must be in ({}..{}), got {}",
            MIN_RETAINED_BITS, MAX_RETAINED_BITS, r
        )));
    }
    Ok(())
}
