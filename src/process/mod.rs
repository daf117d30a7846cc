//! Wishart process construction and the sampler state bundle.

use nalgebra::DMatrix;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

mod latent;
pub use latent::{LatentField, LatentFieldError};

use crate::stats::log_lik_frob;

/// Map a latent field and a triangular factor to the covariance field
/// `V_t = L U_t U_tᵀ Lᵀ`.
///
/// With precomputed cross products `U_t U_tᵀ` the per-time work is two
/// matrix products; without them the same sum over factors is accumulated
/// as `(L U_t)(L U_t)ᵀ`.
pub fn construct_field(
    latent: &LatentField,
    factor: &DMatrix<f64>,
    cross: Option<&[DMatrix<f64>]>,
) -> Vec<DMatrix<f64>> {
    match cross {
        Some(cross) => cross
            .iter()
            .map(|uut| factor * uut * factor.transpose())
            .collect(),
        None => latent
            .slices()
            .iter()
            .map(|u| {
                let lu = factor * u;
                &lu * lu.transpose()
            })
            .collect(),
    }
}

/// State bundle threaded through the samplers.
///
/// Owns the latent field, the lower-triangular factor `L`, the observed
/// matrix sequence `S`, and two caches derived from them: the cross
/// products `U_t U_tᵀ` and the reconstructed covariance field `V`. The
/// caches are private and only move through methods that keep them
/// consistent with the inputs they derive from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct GwpState {
    latent: LatentField,
    factor: DMatrix<f64>,
    observed: Vec<DMatrix<f64>>,
    cross: Vec<DMatrix<f64>>,
    field: Vec<DMatrix<f64>>,
}

/// Errors from building or updating a [`GwpState`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum GwpStateError {
    /// The factor does not match the latent component dimension
    FactorShape {
        /// Expected dimension `p`
        expected: usize,
        /// Rows and columns given
        got: (usize, usize),
    },
    /// The factor has a nonzero entry above the diagonal
    FactorNotLowerTriangular {
        /// Row and column of the offending entry
        index: (usize, usize),
    },
    /// Observed sequence length differs from the latent time count
    ObservedLength {
        /// Latent time count
        expected: usize,
        /// Observed sequence length given
        got: usize,
    },
    /// An observed matrix is not `p × p`
    ObservedShape {
        /// Index of the offending matrix
        index: usize,
        /// Expected dimension `p`
        expected: usize,
        /// Rows and columns given
        got: (usize, usize),
    },
    /// A replacement latent field changes the shape
    LatentShape {
        /// Shape held by the state
        expected: (usize, usize, usize),
        /// Shape given
        got: (usize, usize, usize),
    },
}

impl GwpState {
    /// Create a new state, validating shapes and computing the caches.
    ///
    /// # Example
    ///
    /// ```
    /// use nalgebra::DMatrix;
    /// use gwp::process::{GwpState, LatentField};
    ///
    /// let latent = LatentField::zeros(2, 2, 3);
    /// let factor = DMatrix::identity(2, 2);
    /// let observed = vec![DMatrix::identity(2, 2); 3];
    ///
    /// let state = GwpState::new(latent, factor, observed).unwrap();
    /// assert_eq!(state.field().len(), 3);
    /// ```
    pub fn new(
        latent: LatentField,
        factor: DMatrix<f64>,
        observed: Vec<DMatrix<f64>>,
    ) -> Result<Self, GwpStateError> {
        let p = latent.dim();
        Self::check_factor(&factor, p)?;
        if observed.len() != latent.ntimes() {
            return Err(GwpStateError::ObservedLength {
                expected: latent.ntimes(),
                got: observed.len(),
            });
        }
        for (index, s) in observed.iter().enumerate() {
            if s.shape() != (p, p) {
                return Err(GwpStateError::ObservedShape {
                    index,
                    expected: p,
                    got: s.shape(),
                });
            }
        }
        let cross = latent.cross_products();
        let field = construct_field(&latent, &factor, Some(&cross));
        Ok(GwpState {
            latent,
            factor,
            observed,
            cross,
            field,
        })
    }

    fn check_factor(factor: &DMatrix<f64>, p: usize) -> Result<(), GwpStateError> {
        if factor.shape() != (p, p) {
            return Err(GwpStateError::FactorShape {
                expected: p,
                got: factor.shape(),
            });
        }
        for i in 0..p {
            for j in (i + 1)..p {
                if factor[(i, j)] != 0.0 {
                    return Err(GwpStateError::FactorNotLowerTriangular {
                        index: (i, j),
                    });
                }
            }
        }
        Ok(())
    }

    /// The latent field
    #[inline]
    pub fn latent(&self) -> &LatentField {
        &self.latent
    }

    /// The lower-triangular factor `L`
    #[inline]
    pub fn factor(&self) -> &DMatrix<f64> {
        &self.factor
    }

    /// The observed matrix sequence `S`
    #[inline]
    pub fn observed(&self) -> &[DMatrix<f64>] {
        &self.observed
    }

    /// Cached cross products `U_t U_tᵀ`
    #[inline]
    pub fn cross_products(&self) -> &[DMatrix<f64>] {
        &self.cross
    }

    /// Cached covariance field `V`
    #[inline]
    pub fn field(&self) -> &[DMatrix<f64>] {
        &self.field
    }

    /// Gaussian log-likelihood of the observed sequence under the current
    /// field and the given noise variance.
    pub fn log_lik(&self, noise_variance: f64) -> f64 {
        log_lik_frob(&self.observed, &self.field, noise_variance)
    }

    /// Replace the latent field and refresh both caches.
    pub fn set_latent(&mut self, latent: LatentField) -> Result<(), GwpStateError> {
        if latent.shape() != self.latent.shape() {
            return Err(GwpStateError::LatentShape {
                expected: self.latent.shape(),
                got: latent.shape(),
            });
        }
        self.cross = latent.cross_products();
        self.field = construct_field(&latent, &self.factor, Some(&self.cross));
        self.latent = latent;
        Ok(())
    }

    /// Replace the factor and refresh the field cache. The cross products
    /// depend only on the latent field and stay put.
    pub fn set_factor(&mut self, factor: DMatrix<f64>) -> Result<(), GwpStateError> {
        Self::check_factor(&factor, self.latent.dim())?;
        self.field = construct_field(&self.latent, &factor, Some(&self.cross));
        self.factor = factor;
        Ok(())
    }

    /// Install an accepted slice-sampler proposal. The caller guarantees
    /// the three pieces were computed from one another.
    pub(crate) fn commit_latent(
        &mut self,
        latent: LatentField,
        cross: Vec<DMatrix<f64>>,
        field: Vec<DMatrix<f64>>,
    ) {
        self.latent = latent;
        self.cross = cross;
        self.field = field;
    }
}

impl std::fmt::Display for GwpStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FactorShape { expected, got } => write!(
                f,
                "factor is {}x{} but the latent field has {} components",
                got.0, got.1, expected
            ),
            Self::FactorNotLowerTriangular { index } => write!(
                f,
                "factor entry ({}, {}) above the diagonal is nonzero",
                index.0, index.1
            ),
            Self::ObservedLength { expected, got } => write!(
                f,
                "{} observed matrices for {} latent time points",
                got, expected
            ),
            Self::ObservedShape {
                index,
                expected,
                got,
            } => write!(
                f,
                "observed matrix {} is {}x{}, expected {}x{}",
                index, got.0, got.1, expected, expected
            ),
            Self::LatentShape { expected, got } => write!(
                f,
                "latent field is ({}, {}, {}), state holds ({}, {}, {})",
                got.0, got.1, got.2, expected.0, expected.1, expected.2
            ),
        }
    }
}

impl std::error::Error for GwpStateError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::log_lik_frob;

    fn toy_latent() -> LatentField {
        LatentField::new(vec![
            DMatrix::from_row_slice(2, 2, &[0.3, -1.1, 0.7, 0.2]),
            DMatrix::from_row_slice(2, 2, &[-0.4, 0.9, 1.2, -0.6]),
            DMatrix::from_row_slice(2, 2, &[0.1, 0.5, -0.8, 1.4]),
        ])
        .unwrap()
    }

    fn toy_factor() -> DMatrix<f64> {
        DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.4, 0.8])
    }

    #[test]
    fn construct_field_hand_value() {
        // single factor u = [1, 0]ᵀ and L = [[1, 0], [2, 1]]
        let latent =
            LatentField::new(vec![DMatrix::from_row_slice(2, 1, &[1.0, 0.0])])
                .unwrap();
        let factor = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 2.0, 1.0]);
        let field = construct_field(&latent, &factor, None);
        let expect = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        assert!(field[0].relative_eq(&expect, 1E-12, 1E-12));
    }

    #[test]
    fn construct_field_paths_agree() {
        let latent = toy_latent();
        let factor = toy_factor();
        let direct = construct_field(&latent, &factor, None);
        let cross = latent.cross_products();
        let cached = construct_field(&latent, &factor, Some(&cross));
        for (a, b) in direct.iter().zip(cached.iter()) {
            assert!(a.relative_eq(b, 1E-12, 1E-12));
        }
    }

    #[test]
    fn new_state_computes_consistent_caches() {
        let latent = toy_latent();
        let factor = toy_factor();
        let observed = vec![DMatrix::identity(2, 2); 3];
        let state =
            GwpState::new(latent.clone(), factor.clone(), observed.clone())
                .unwrap();

        let fresh = construct_field(&latent, &factor, None);
        for (a, b) in state.field().iter().zip(fresh.iter()) {
            assert!(a.relative_eq(b, 1E-12, 1E-12));
        }
        assert::close(
            state.log_lik(0.5),
            log_lik_frob(&observed, &fresh, 0.5),
            1E-12,
        );
    }

    #[test]
    fn new_state_rejects_bad_input() {
        let latent = toy_latent();
        let observed = vec![DMatrix::identity(2, 2); 3];

        let res = GwpState::new(
            latent.clone(),
            DMatrix::identity(3, 3),
            observed.clone(),
        );
        assert_eq!(
            res,
            Err(GwpStateError::FactorShape {
                expected: 2,
                got: (3, 3),
            })
        );

        let res = GwpState::new(
            latent.clone(),
            DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.0, 1.0]),
            observed.clone(),
        );
        assert_eq!(
            res,
            Err(GwpStateError::FactorNotLowerTriangular { index: (0, 1) })
        );

        let res = GwpState::new(
            latent.clone(),
            toy_factor(),
            vec![DMatrix::identity(2, 2); 2],
        );
        assert_eq!(
            res,
            Err(GwpStateError::ObservedLength {
                expected: 3,
                got: 2,
            })
        );

        let mut observed_bad = observed;
        observed_bad[1] = DMatrix::identity(3, 3);
        let res = GwpState::new(latent, toy_factor(), observed_bad);
        assert_eq!(
            res,
            Err(GwpStateError::ObservedShape {
                index: 1,
                expected: 2,
                got: (3, 3),
            })
        );
    }

    #[test]
    fn set_factor_refreshes_field() {
        let observed = vec![DMatrix::identity(2, 2); 3];
        let mut state =
            GwpState::new(toy_latent(), toy_factor(), observed.clone()).unwrap();
        let new_factor = DMatrix::from_row_slice(2, 2, &[0.9, 0.0, -0.3, 1.1]);
        state.set_factor(new_factor.clone()).unwrap();

        let fresh = GwpState::new(toy_latent(), new_factor, observed).unwrap();
        assert_eq!(state, fresh);

        assert!(state
            .set_factor(DMatrix::from_row_slice(2, 2, &[1.0, 0.1, 0.0, 1.0]))
            .is_err());
    }

    #[test]
    fn set_latent_refreshes_both_caches() {
        let observed = vec![DMatrix::identity(2, 2); 3];
        let mut state = GwpState::new(
            LatentField::zeros(2, 2, 3),
            toy_factor(),
            observed.clone(),
        )
        .unwrap();
        state.set_latent(toy_latent()).unwrap();

        let fresh = GwpState::new(toy_latent(), toy_factor(), observed).unwrap();
        assert_eq!(state, fresh);

        assert_eq!(
            state.set_latent(LatentField::zeros(2, 2, 4)),
            Err(GwpStateError::LatentShape {
                expected: (2, 2, 3),
                got: (2, 2, 4),
            })
        );
    }
}
