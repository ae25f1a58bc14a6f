/// Computes LogLog-Beta estimate bias correction using Horner's method.
///
/// Paper: https://arxiv.org/pdf/1612.02284.pdf
/// Wikipedia: https://en.wikipedia.org/wiki/Horner%27s_method
#[inline]
pub(crate) fn beta_horner(z: f64) -> f64 {
    let zl = (z + 1.0).ln();
    let mut res = 0.0;
    for i in (1..8).rev() {
        res = res * zl + BETA[i];
    }
    res * zl + BETA[0] * z
}

/// LogLog-Beta polynomial coefficients for p = 14 and 6-bit leading-one positions.
/// `BETA[0]` multiplies the number of zero registers, `BETA[1..8]` multiply powers of
/// `ln(zeros + 1)`.
const BETA: [f64; 8] = [
    -0.370393911,
    0.070471823,
    0.17393686,
    0.16339839,
    -0.09237745,
    0.03738027,
    -0.005384159,
    0.00042419,
];
