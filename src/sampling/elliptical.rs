//! Elliptical slice sampling for the latent field.
//!
//! Murray, Adams and MacKay, "Elliptical slice sampling", AISTATS 2010,
//! adapted to the Wishart process: the Gaussian prior lives on the latent
//! field and the likelihood is the Frobenius residual of the reconstructed
//! covariance field.

use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::StandardNormal;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::process::{construct_field, GwpState, LatentField};
use crate::stats::log_lik_frob;

/// Tempering factor on the threshold's log-uniform draw
const THRESHOLD_TEMPERING: f64 = 0.001;

/// Gaussian prior specification for the ellipse's auxiliary point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prior<'a> {
    /// A draw from the prior with the same shape as the latent field
    Sample(&'a LatentField),
    /// Lower-triangular Cholesky factor of the `D × D` prior covariance
    /// over the flattened field, `D = v·p·n`
    Cholesky(&'a DMatrix<f64>),
}

/// Controls for [`elliptical_slice`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct SliceParams {
    /// Width of the angle bracket; zero or negative brackets the whole
    /// ellipse
    pub angle_range: f64,
    /// Proposals to evaluate before giving up on the step
    pub max_iter: usize,
}

impl Default for SliceParams {
    fn default() -> Self {
        SliceParams {
            angle_range: 0.0,
            max_iter: 20,
        }
    }
}

/// What a slice-sampling step did
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct SliceOutcome {
    /// Log-likelihood of the state after the step
    pub log_lik: f64,
    /// Whether a proposal was accepted; `false` means the state was left
    /// untouched
    pub accepted: bool,
    /// Number of proposals evaluated
    pub iterations: usize,
}

/// Errors from [`elliptical_slice`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum SliceError {
    /// A sample prior's shape disagrees with the latent field
    PriorSampleShape {
        /// Latent field shape `(v, p, n)`
        expected: (usize, usize, usize),
        /// Prior sample shape
        got: (usize, usize, usize),
    },
    /// A Cholesky prior is not `D × D` for the flattened dimension
    PriorFactorShape {
        /// Flattened dimension `D`
        expected: usize,
        /// Rows and columns given
        got: (usize, usize),
    },
    /// The angle bracket shrank to zero width without an acceptable
    /// point, which a consistent likelihood cannot produce
    BracketCollapsed,
}

/// One elliptical slice sampling update of the state's latent field.
///
/// Draws an auxiliary point `nu` from the Gaussian prior, then walks an
/// angle bracket around the ellipse through the current field and `nu`
/// until a proposal's log-likelihood beats a tempered slice threshold.
/// On acceptance the latent field and both caches are replaced together.
/// When `params.max_iter` proposals all fall short, the state is left
/// untouched and the pre-update log-likelihood comes back with
/// `accepted == false`; the chain keeps its current point for this step.
///
/// `cur_log_lik` short-circuits recomputing the current log-likelihood
/// when the caller already holds it. It must match the state and
/// `noise_variance`: a stale value can put the threshold above every
/// point on the ellipse, which surfaces as
/// [`SliceError::BracketCollapsed`] once the bracket shrinks to nothing.
///
/// # Example
///
/// ```
/// use nalgebra::DMatrix;
/// use rand::rngs::SmallRng;
/// use rand::{Rng, SeedableRng};
/// use rand_distr::StandardNormal;
/// use gwp::process::{GwpState, LatentField};
/// use gwp::sampling::{elliptical_slice, Prior, SliceParams};
///
/// let mut rng = SmallRng::seed_from_u64(0x8c5);
///
/// let latent = LatentField::zeros(2, 2, 3);
/// let observed = vec![DMatrix::identity(2, 2); 3];
/// let mut state =
///     GwpState::new(latent, DMatrix::identity(2, 2), observed).unwrap();
///
/// // auxiliary point drawn from a unit Gaussian prior
/// let nu = LatentField::new(
///     (0..3)
///         .map(|_| {
///             DMatrix::from_fn(2, 2, |_, _| rng.sample::<f64, _>(StandardNormal))
///         })
///         .collect(),
/// )
/// .unwrap();
///
/// let outcome = elliptical_slice(
///     &mut state,
///     Prior::Sample(&nu),
///     None,
///     0.5,
///     SliceParams::default(),
///     &mut rng,
/// )
/// .unwrap();
///
/// assert!(outcome.log_lik.is_finite());
/// assert_eq!(state.latent().shape(), (2, 2, 3));
/// ```
pub fn elliptical_slice<R: Rng>(
    state: &mut GwpState,
    prior: Prior<'_>,
    cur_log_lik: Option<f64>,
    noise_variance: f64,
    params: SliceParams,
    rng: &mut R,
) -> Result<SliceOutcome, SliceError> {
    let shape = state.latent().shape();
    let (v, p, n) = shape;
    let dim = v * p * n;

    // Auxiliary point defining the ellipse, validated before any draw so
    // a bad prior fails without touching the stream.
    let transformed;
    let nu: &LatentField = match prior {
        Prior::Sample(sample) => {
            if sample.shape() != shape {
                return Err(SliceError::PriorSampleShape {
                    expected: shape,
                    got: sample.shape(),
                });
            }
            sample
        }
        Prior::Cholesky(chol) => {
            if chol.shape() != (dim, dim) {
                return Err(SliceError::PriorFactorShape {
                    expected: dim,
                    got: chol.shape(),
                });
            }
            let z = DVector::from_fn(dim, |_, _| rng.sample::<f64, _>(StandardNormal));
            let flat = chol * z;
            transformed = LatentField::from_flat(&flat, v, p, n)
                .expect("factor product has the flattened length");
            &transformed
        }
    };

    let start_log_lik =
        cur_log_lik.unwrap_or_else(|| state.log_lik(noise_variance));

    // Slice threshold sits just under the current likelihood
    let hh = THRESHOLD_TEMPERING * rng.gen::<f64>().ln() + start_log_lik;

    // Angle bracket: the whole ellipse pinned at a first proposal, or a
    // window of the requested width centered at random on the current
    // point.
    let (mut phi_min, mut phi_max, mut phi) = if params.angle_range <= 0.0 {
        let phi = rng.gen::<f64>() * 2.0 * PI;
        (phi - 2.0 * PI, phi, phi)
    } else {
        let phi_min = -params.angle_range * rng.gen::<f64>();
        let phi_max = phi_min + params.angle_range;
        let phi = rng.gen::<f64>() * (phi_max - phi_min) + phi_min;
        (phi_min, phi_max, phi)
    };

    for iteration in 0..params.max_iter {
        // Proposal on the ellipse at the current angle
        let proposal = state.latent().rotate(nu, phi);
        let cross = proposal.cross_products();
        let field = construct_field(&proposal, state.factor(), Some(&cross));
        let log_lik = log_lik_frob(state.observed(), &field, noise_variance);

        if log_lik > hh {
            // On the slice
            state.commit_latent(proposal, cross, field);
            return Ok(SliceOutcome {
                log_lik,
                accepted: true,
                iterations: iteration + 1,
            });
        }

        // Shrink the bracket toward the current point
        if phi > 0.0 {
            phi_max = phi;
        } else if phi < 0.0 {
            phi_min = phi;
        } else {
            return Err(SliceError::BracketCollapsed);
        }
        phi = rng.gen::<f64>() * (phi_max - phi_min) + phi_min;
    }

    // Every proposal fell short; keep the current point for this step
    Ok(SliceOutcome {
        log_lik: start_log_lik,
        accepted: false,
        iterations: params.max_iter,
    })
}

impl std::fmt::Display for SliceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PriorSampleShape { expected, got } => write!(
                f,
                "prior sample is ({}, {}, {}) but the latent field is ({}, {}, {})",
                got.0, got.1, got.2, expected.0, expected.1, expected.2
            ),
            Self::PriorFactorShape { expected, got } => write!(
                f,
                "prior Cholesky factor is {}x{}, expected {}x{}",
                got.0, got.1, expected, expected
            ),
            Self::BracketCollapsed => write!(
                f,
                "angle bracket shrank to zero width without an acceptable \
                 point; the current log-likelihood is stale or inconsistent"
            ),
        }
    }
}

impl std::error::Error for SliceError {}
