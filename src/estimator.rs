//! Cardinality estimators over a [`RegisterStore`].
//!
//! Two algorithms are provided:
//! - LogLog-Beta: closed-form estimate with fixed polynomial bias correction (`p = 14`).
//!   [Paper](https://arxiv.org/pdf/1612.02284.pdf)
//! - HyperLogLog: harmonic-mean estimate with linear counting for small ranges, optionally
//!   corrected against an empirical [`BiasTable`] as done in HyperLogLog++.
//!   [Paper](https://static.googleusercontent.com/media/research.google.com/en//pubs/archive/40671.pdf)
//!
//! Both return `0` for a store without any set register.

use crate::beta::beta_horner;
use crate::error::{Result, SketchError};
use crate::packer::unpack_position;
use crate::registers::{RegisterStore, RegisterStoreTrait};

/// Parameter for bias correction
#[inline]
fn alpha(m: usize) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / (m as f64)),
    }
}

/// Return harmonic sum `Σ 2^-position` over all registers and number of unset registers.
#[inline]
fn harmonic_sum_and_zeros(registers: &RegisterStore) -> (f64, usize) {
    let r = registers.retained_bits();
    let mut sum = 0.0;
    let mut zeros = 0;
    for register in registers.iter() {
        let position = unpack_position(register, r);
        zeros += usize::from(position == 0);
        sum += 1.0 / ((1u64 << position) as f64);
    }
    (sum, zeros)
}

/// Return LogLog-Beta cardinality estimate
pub(crate) fn loglog_beta(registers: &RegisterStore) -> u64 {
    let m = registers.len();
    let (sum, zeros) = harmonic_sum_and_zeros(registers);
    let estimate =
        alpha(m) * ((m * (m - zeros)) as f64) / (beta_horner(zeros as f64) + sum);
    estimate.max(0.0).floor() as u64
}

/// Return basic HyperLogLog cardinality estimate, falling back to linear counting when the
/// raw estimate is small and some registers are still unset.
pub(crate) fn hyperloglog(registers: &RegisterStore) -> f64 {
    let m = registers.len() as f64;
    let (sum, zeros) = harmonic_sum_and_zeros(registers);
    let raw = alpha(registers.len()) * m * m / sum;
    if raw <= 2.5 * m && zeros > 0 {
        m * (m / zeros as f64).ln()
    } else {
        raw
    }
}

/// Empirical bias of basic estimates for one precision, as `(raw estimate, bias)` pairs sorted
/// by raw estimate. Tables are produced offline (e.g. the HyperLogLog++ published data) and
/// injected by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct BiasTable {
    precision: u32,
    raw_estimates: Vec<f64>,
    biases: Vec<f64>,
}

impl BiasTable {
    /// Create bias table for sketches of precision `p`.
    ///
    /// `raw_estimates` must be strictly ascending and of the same non-zero length as `biases`.
    pub fn new(precision: u32, raw_estimates: Vec<f64>, biases: Vec<f64>) -> Result<Self> {
        if raw_estimates.is_empty() || raw_estimates.len() != biases.len() {
            return Err(SketchError::Validation(format!(
                "bias table needs equally sized non-empty columns, got {} raw estimates and {} biases",
                raw_estimates.len(),
                biases.len()
            )));
        }
        if raw_estimates.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(SketchError::Validation(
                "bias table raw estimates must be strictly ascending".to_string(),
            ));
        }
        if raw_estimates.iter().chain(&biases).any(|v| !v.is_finite()) {
            return Err(SketchError::Validation(
                "bias table must only hold finite values".to_string(),
            ));
        }
        Ok(Self {
            precision,
            raw_estimates,
            biases,
        })
    }

    /// Return precision this table was built for
    #[inline]
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Return bias interpolated between the two raw estimates bracketing `estimate`.
    /// Estimates outside of the table take the bias of the nearest edge.
    pub fn bias(&self, estimate: f64) -> f64 {
        let len = self.raw_estimates.len();
        let hi = self.raw_estimates.partition_point(|&raw| raw <= estimate);
        if hi == 0 {
            return self.biases[0];
        }
        if hi == len {
            return self.biases[len - 1];
        }
        let lo = hi - 1;
        let slope = (self.biases[hi] - self.biases[lo])
            / (self.raw_estimates[hi] - self.raw_estimates[lo]);
        self.biases[lo] + slope * (estimate - self.raw_estimates[lo])
    }

    /// Return `estimate` with its interpolated bias removed
    #[inline]
    pub fn correct(&self, estimate: f64) -> f64 {
        estimate - self.bias(estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::pack;
    use test_case::test_case;

    #[test_case(16 => 0.673)]
    #[test_case(32 => 0.697)]
    #[test_case(64 => 0.709)]
    fn test_alpha_small(m: usize) -> f64 {
        alpha(m)
    }

    #[test]
    fn test_alpha_large() {
        assert!((alpha(16384) - 0.7213 / (1.0 + 1.079 / 16384.0)).abs() < 1e-12);
    }

    #[test_case(4, 10; "narrow p4")]
    #[test_case(14, 10; "narrow p14")]
    #[test_case(14, 35; "wide p14")]
    fn test_empty_store_estimates_zero(p: u32, r: u32) {
        let store = RegisterStore::new(p, r).unwrap();
        assert_eq!(hyperloglog(&store), 0.0);
        assert_eq!(loglog_beta(&store), 0);
    }

    #[test]
    fn test_harmonic_sum_and_zeros() {
        let r = 10;
        let mut store = RegisterStore::new(4, r).unwrap();
        store.update_if_dominant(0, pack(1, 0, r).unwrap());
        store.update_if_dominant(1, pack(2, 5, r).unwrap());
        store.update_if_dominant(2, pack(3, 1023, r).unwrap());

        let (sum, zeros) = harmonic_sum_and_zeros(&store);
        assert_eq!(zeros, 13);
        assert_eq!(sum, 13.0 + 0.5 + 0.25 + 0.125);
    }

    #[test]
    fn test_hyperloglog_linear_counting() {
        let r = 10;
        let mut store = RegisterStore::new(10, r).unwrap();
        for idx in 0..24 {
            store.update_if_dominant(idx, pack(1, 0, r).unwrap());
        }
        let expected = 1024.0 * (1024.0f64 / 1000.0).ln();
        assert!((hyperloglog(&store) - expected).abs() < 1e-9);
    }

    fn small_table() -> BiasTable {
        BiasTable::new(
            4,
            vec![0.0, 5.0, 10.0, 15.0],
            vec![1.0, 3.0, -2.0, 4.0],
        )
        .unwrap()
    }

    #[test]
    fn test_bias_correction() {
        let table = small_table();
        // Interpolated between (5, 3) and (10, -2)
        assert!((table.correct(7.0) - 6.0).abs() < 1e-4);
        assert!((table.bias(5.0) - 3.0).abs() < 1e-12);
        assert!((table.bias(12.5) - 1.0).abs() < 1e-12);
    }

    #[test_case(-1.0 => 1.0; "below table clamps to first bias")]
    #[test_case(15.0 => 4.0; "last raw estimate")]
    #[test_case(100.0 => 4.0; "above table clamps to last bias")]
    fn test_bias_clamps(estimate: f64) -> f64 {
        let table = small_table();
        table.bias(estimate)
    }

    #[test_case(vec![], vec![]; "empty")]
    #[test_case(vec![1.0, 2.0], vec![1.0]; "length mismatch")]
    #[test_case(vec![2.0, 1.0], vec![1.0, 1.0]; "not ascending")]
    #[test_case(vec![1.0, 1.0], vec![1.0, 1.0]; "duplicate raw estimate")]
    #[test_case(vec![1.0, f64::NAN], vec![1.0, 1.0]; "nan")]
    fn test_invalid_bias_table(raw: Vec<f64>, biases: Vec<f64>) {
        assert!(matches!(
            BiasTable::new(14, raw, biases),
            Err(SketchError::Validation(_))
        ));
    }
}
