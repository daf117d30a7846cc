//! Density and likelihood helpers shared by the samplers.

use itertools::izip;
use nalgebra::DMatrix;

use crate::consts::{HALF_LN_2PI, LN_2PI, SQRT_2PI};

/// Gaussian log-likelihood of a matrix sequence under entrywise noise.
///
/// Every entry of `observed` is modeled as a normal draw centered at the
/// matching entry of `field` with variance `variance`, so the quadratic term
/// is the squared Frobenius norm of the residual summed over the whole
/// sequence.
///
/// # Example
///
/// ```
/// use nalgebra::DMatrix;
/// use gwp::stats::log_lik_frob;
///
/// let observed = vec![DMatrix::<f64>::identity(2, 2); 2];
/// let field = vec![DMatrix::<f64>::zeros(2, 2); 2];
///
/// // Eight entries, four of them off by one
/// let ll = log_lik_frob(&observed, &field, 1.0);
/// assert!((ll + 9.351_508_265_637_381).abs() < 1e-12);
/// ```
pub fn log_lik_frob(
    observed: &[DMatrix<f64>],
    field: &[DMatrix<f64>],
    variance: f64,
) -> f64 {
    assert_eq!(observed.len(), field.len(), "sequence lengths differ");
    let (count, sq_norm) = izip!(observed, field).fold(
        (0_usize, 0.0),
        |(count, sq_norm), (s, v)| (count + s.len(), sq_norm + (s - v).norm_squared()),
    );
    -0.5 * ((count as f64) * (LN_2PI + variance.ln()) + sq_norm / variance)
}

/// Log density at `x` of a normal with mean `mean` and *variance*
/// `variance`.
#[inline]
pub fn log_likelihood_normal(x: f64, mean: f64, variance: f64) -> f64 {
    let diff = x - mean;
    -0.5 * (LN_2PI + variance.ln()) - diff * diff / (2.0 * variance)
}

/// Density at `x` of a normal with mean `mean` and standard deviation `sd`.
#[inline]
pub fn normal_pdf(x: f64, mean: f64, sd: f64) -> f64 {
    let d = (x - mean) / sd;
    (-0.5 * d * d).exp() / (sd * SQRT_2PI)
}

/// Log density at `x > 0` of a log-normal with location `mu` and scale
/// `sigma`.
#[inline]
pub fn lognormal_ln_pdf(x: f64, mu: f64, sigma: f64) -> f64 {
    let d = (x.ln() - mu) / sigma;
    -x.ln() - sigma.ln() - HALF_LN_2PI - 0.5 * d * d
}

/// Density at `x > 0` of a log-normal with location `mu` and scale `sigma`.
#[inline]
pub fn lognormal_pdf(x: f64, mu: f64, sigma: f64) -> f64 {
    lognormal_ln_pdf(x, mu, sigma).exp()
}

/// Location and scale of the log-normal with mean `mean` and variance
/// `variance`.
///
/// # Example
///
/// ```
/// use gwp::stats::lognstat;
///
/// // A standard log-normal has mean e^½ and variance (e - 1)e
/// let mean = 0.5_f64.exp();
/// let variance = (1.0_f64.exp() - 1.0) * 1.0_f64.exp();
///
/// let (mu, sigma) = lognstat(mean, variance);
/// assert!(mu.abs() < 1e-12);
/// assert!((sigma - 1.0).abs() < 1e-12);
/// ```
pub fn lognstat(mean: f64, variance: f64) -> (f64, f64) {
    let mu = (mean * mean / (variance + mean * mean).sqrt()).ln();
    let sigma = (variance / (mean * mean) + 1.0).ln().sqrt();
    (mu, sigma)
}
