//! Set operations over sketches sharing the same parameters.
//!
//! All operations are pure: input sketches are never mutated and results are freshly
//! allocated.
//!
//! Similarity follows algorithm 2.1.4 of the HyperMinHash paper: the share of non-empty
//! registers which are bit-identical across all sketches, corrected by the number of registers
//! expected to match by chance (algorithm 2.1.5).

use log::debug;

use crate::error::{Result, SketchError};
use crate::packer::POSITION_BITS;
use crate::registers::RegisterStoreTrait;
use crate::sketch::sealed::RegistersMut;
use crate::sketch::IntersectionSketch;

/// Largest number of retained bits for which expected collisions are summed exactly.
const EXACT_COLLISION_MAX_BITS: u32 = 10;

/// Return a sketch representing the union of the sets represented by `sketches`.
/// A single sketch yields a deep copy.
pub fn union<S: IntersectionSketch>(sketches: &[&S]) -> Result<S> {
    let first = check_params(sketches)?;
    let mut merged = first.clone();
    for sketch in &sketches[1..] {
        merged.registers_mut().merge(sketch.registers());
    }
    debug!("merged {} sketches into union", sketches.len());
    Ok(merged)
}

/// Return an estimate of the Jaccard index of the sets represented by `sketches`, that is
/// the cardinality of their intersection divided by the cardinality of their union.
pub fn similarity<S: IntersectionSketch>(sketches: &[&S]) -> Result<f64> {
    let first = check_params(sketches)?;
    if sketches.len() == 1 {
        return Ok(1.0);
    }

    let (c, n) = matching_and_occupied(sketches);
    if c == 0 || n == 0 {
        return Ok(0.0);
    }

    let cardinalities: Vec<f64> = sketches.iter().map(|s| s.cardinality() as f64).collect();
    let expected = expected_collisions(first.precision(), first.retained_bits(), &cardinalities);
    debug!(
        "similarity of {} sketches: matching = {}, occupied = {}, expected collisions = {:.4}",
        sketches.len(),
        c,
        n,
        expected
    );

    let c = c as f64;
    if c < expected {
        return Ok(0.0);
    }
    Ok((c - expected) / n as f64)
}

/// Return the Jaccard index estimate without expected collision correction.
///
/// Cheaper than [`similarity`], but overestimates small Jaccard indices when few bits are
/// retained.
pub fn similarity_uncorrected<S: IntersectionSketch>(sketches: &[&S]) -> Result<f64> {
    check_params(sketches)?;
    if sketches.len() == 1 {
        return Ok(1.0);
    }
    let (c, n) = matching_and_occupied(sketches);
    if c == 0 || n == 0 {
        return Ok(0.0);
    }
    Ok(c as f64 / n as f64)
}

/// Return an estimate of the cardinality of the intersection of the sets represented by
/// `sketches`.
pub fn intersection_cardinality<S: IntersectionSketch>(sketches: &[&S]) -> Result<u64> {
    let similarity = similarity(sketches)?;
    let union = union(sketches)?;
    Ok((similarity * union.cardinality() as f64).round() as u64)
}

/// Ensure `sketches` is non-empty and all sketches share parameters. Returns the first sketch.
fn check_params<'a, S: IntersectionSketch>(sketches: &[&'a S]) -> Result<&'a S> {
    let first = *sketches.first().ok_or(SketchError::EmptyInput)?;
    let (p, r) = (first.precision(), first.retained_bits());
    for sketch in &sketches[1..] {
        if sketch.precision() != p || sketch.retained_bits() != r {
            return Err(SketchError::IncompatibleParameters {
                expected_p: p,
                expected_r: r,
                found_p: sketch.precision(),
                found_r: sketch.retained_bits(),
            });
        }
    }
    Ok(first)
}

/// Count registers which are set and bit-identical in all sketches (`C`) and registers which
/// are set in at least one sketch (`N`).
fn matching_and_occupied<S: IntersectionSketch>(sketches: &[&S]) -> (u64, u64) {
    let first = sketches[0].registers();
    let mut c = 0;
    let mut n = 0;
    for idx in 0..first.len() {
        let register = first.get(idx);
        let mut all_match = register != 0;
        let mut any_set = register != 0;
        for sketch in &sketches[1..] {
            let other = sketch.registers().get(idx);
            all_match &= other == register;
            any_set |= other != 0;
        }
        c += u64::from(all_match);
        n += u64::from(any_set);
    }
    (c, n)
}

/// Return number of registers expected to be identical across sketches of the given
/// cardinalities by chance.
///
/// The double sum has `2^q * 2^r` terms, so for `r` above [`EXACT_COLLISION_MAX_BITS`] it is
/// evaluated at that width and scaled down: every mantissa term carries a `2^-r` factor per
/// sketch, of which `2^r` terms are summed.
fn expected_collisions(p: u32, r: u32, cardinalities: &[f64]) -> f64 {
    let summed_r = r.min(EXACT_COLLISION_MAX_BITS);
    let sketches = cardinalities.len() as i32;
    let scale = 2f64.powi(-(sketches - 1) * (r - summed_r) as i32);
    collision_sum(p, POSITION_BITS, summed_r, cardinalities) * scale
}

/// Algorithm 2.1.5 of the HyperMinHash paper, generalised to any number of sketches.
fn collision_sum(p: u32, q: u32, r: u32, cardinalities: &[f64]) -> f64 {
    let two_q = 1u32 << q;
    let two_r = 1u32 << r;

    let mut x = 0.0;
    for i in 1..=two_q {
        for j in 1..=two_r {
            let (b1, b2) = if i != two_q {
                let den = 2f64.powi((p + r + i) as i32);
                (f64::from(two_r + j) / den, f64::from(two_r + j + 1) / den)
            } else {
                let den = 2f64.powi((p + r + i - 1) as i32);
                (f64::from(j) / den, f64::from(j + 1) / den)
            };
            x += cardinalities
                .iter()
                .map(|&n| interval_probability(n, b1, b2))
                .product::<f64>();
        }
    }
    x * 2f64.powi(p as i32)
}

/// Probability that the smallest of `n` uniform draws falls into `[b1, b2)`:
/// `(1 - b1)^n - (1 - b2)^n`, evaluated without rounding `1 - b` to `1` for tiny `b`.
#[inline]
fn interval_probability(n: f64, b1: f64, b2: f64) -> f64 {
    let a1 = n * (-b1).ln_1p();
    let a2 = n * (-b2).ln_1p();
    -a1.exp() * (a2 - a1).exp_m1()
}
