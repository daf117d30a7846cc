//! Covariance kernels over a one-dimensional time grid.

use nalgebra::{DMatrix, DVector};
use std::f64::consts::PI;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Kernel function over a time grid.
///
/// The inverse width stays out of the kernel state on purpose: it is the
/// hyperparameter the Metropolis-Hastings step moves, so it travels with
/// each call instead of living inside the kernel.
pub trait Kernel: std::fmt::Debug + Clone + PartialEq {
    /// Covariance matrix of the process over the grid `t` at the given
    /// inverse width.
    fn covariance(&self, t: &DVector<f64>, inverse_width: f64) -> DMatrix<f64>;
}

/// Errors from kernel construction
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum KernelError {
    /// Parameter out of bounds
    ParameterOutOfBounds {
        /// Name of parameter
        name: String,
        /// Value given
        given: f64,
        /// Lower and upper bounds on value
        bounds: (f64, f64),
    },
}

impl std::error::Error for KernelError {}

impl std::fmt::Display for KernelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParameterOutOfBounds {
                name,
                given,
                bounds,
            } => writeln!(
                f,
                "Parameter {} is out of bounds ({}, {}), given: {}",
                name, bounds.0, bounds.1, given
            ),
        }
    }
}

/// Squared exponential kernel
/// `k(s, t) = exp(-w (s - t)² / 2)`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct SquaredExponential;

impl Kernel for SquaredExponential {
    fn covariance(&self, t: &DVector<f64>, inverse_width: f64) -> DMatrix<f64> {
        let n = t.len();
        let mut cov = DMatrix::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                let d = t[i] - t[j];
                cov[(i, j)] = (-0.5 * inverse_width * d * d).exp();
            }
        }
        cov
    }
}

/// Periodic kernel
/// `k(s, t) = exp(-w sin²(π (s - t) / periodicity) / 2)`
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct Periodic {
    periodicity: f64,
}

impl Periodic {
    /// Create a new periodic kernel
    ///
    /// # Errors
    ///
    /// Returns an error if `periodicity` is not finite and positive.
    pub fn new(periodicity: f64) -> Result<Self, KernelError> {
        if periodicity > 0.0 && periodicity.is_finite() {
            Ok(Periodic { periodicity })
        } else {
            Err(KernelError::ParameterOutOfBounds {
                name: "periodicity".to_owned(),
                given: periodicity,
                bounds: (0.0, f64::INFINITY),
            })
        }
    }

    /// Create a new periodic kernel without checking the periodicity
    pub fn new_unchecked(periodicity: f64) -> Self {
        Periodic { periodicity }
    }

    /// Get the periodicity
    pub fn periodicity(&self) -> f64 {
        self.periodicity
    }
}

impl Default for Periodic {
    fn default() -> Self {
        Periodic { periodicity: 1.0 }
    }
}

impl Kernel for Periodic {
    fn covariance(&self, t: &DVector<f64>, inverse_width: f64) -> DMatrix<f64> {
        let n = t.len();
        let mut cov = DMatrix::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                let s = (PI * (t[i] - t[j]) / self.periodicity).sin();
                cov[(i, j)] = (-0.5 * inverse_width * s * s).exp();
            }
        }
        cov
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    #[test]
    fn squared_exponential_hand_values() {
        let t = dvector![0.0, 1.0, 2.0];
        let cov = SquaredExponential.covariance(&t, 1.0);
        let expect = DMatrix::from_row_slice(
            3,
            3,
            &[
                1.0, 0.606_530_659_712_633_4, 0.135_335_283_236_612_7, //
                0.606_530_659_712_633_4, 1.0, 0.606_530_659_712_633_4, //
                0.135_335_283_236_612_7, 0.606_530_659_712_633_4, 1.0,
            ],
        );
        assert!(cov.relative_eq(&expect, 1E-12, 1E-12));
    }

    #[test]
    fn squared_exponential_narrows_with_inverse_width() {
        let t = dvector![0.0, 1.0];
        let wide = SquaredExponential.covariance(&t, 0.5);
        let narrow = SquaredExponential.covariance(&t, 4.0);
        assert!(narrow[(0, 1)] < wide[(0, 1)]);
        assert::close(narrow[(0, 1)], (-2.0_f64).exp(), 1E-12);
    }

    #[test]
    fn zero_inverse_width_gives_all_ones() {
        let t = dvector![0.0, 0.5, 1.7, 3.0];
        let cov = SquaredExponential.covariance(&t, 0.0);
        assert!(cov.relative_eq(&DMatrix::repeat(4, 4, 1.0), 1E-12, 1E-12));
    }

    #[test]
    fn periodic_is_one_at_integer_lags() {
        let t = dvector![0.0, 1.0, 2.0, 3.0];
        let cov = Periodic::default().covariance(&t, 2.5);
        assert!(cov.relative_eq(&DMatrix::repeat(4, 4, 1.0), 1E-12, 1E-12));
    }

    #[test]
    fn periodic_hand_value_at_half_period() {
        let t = dvector![0.0, 1.0];
        let kern = Periodic::new(2.0).unwrap();
        let cov = kern.covariance(&t, 3.0);
        // sin(π/2) = 1, so the off-diagonal is exp(-3/2)
        assert::close(cov[(0, 1)], (-1.5_f64).exp(), 1E-12);
        assert::close(cov[(0, 0)], 1.0, 1E-12);
    }

    #[test]
    fn periodic_rejects_bad_periodicity() {
        assert!(Periodic::new(0.0).is_err());
        assert!(Periodic::new(-1.0).is_err());
        assert!(Periodic::new(f64::NAN).is_err());
        assert!(Periodic::new(2.0).is_ok());
    }

    #[cfg(feature = "serde1")]
    #[test]
    fn periodic_serde_round_trip() {
        let kern = Periodic::new(2.0).unwrap();
        let json = serde_json::to_string(&kern).unwrap();
        let back: Periodic = serde_json::from_str(&json).unwrap();
        assert_eq!(kern, back);
    }
}
