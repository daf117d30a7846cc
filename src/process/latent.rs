//! The latent Gaussian tensor behind the Wishart process.

use nalgebra::{DMatrix, DVector};

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Rank-3 latent tensor stored as `n` time slices, each a `p × v` matrix
/// whose column `k` holds the factor vector `u_k(t)`.
///
/// Shape is reported as `(v, p, n)`: factors, components, time points.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct LatentField {
    slices: Vec<DMatrix<f64>>,
}

/// Errors from building a [`LatentField`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum LatentFieldError {
    /// No time slices were given, or the slices hold no entries
    Empty,
    /// A slice's shape disagrees with the first slice's
    MismatchedSlice {
        /// Index of the offending slice
        index: usize,
        /// Rows and columns of the first slice
        expected: (usize, usize),
        /// Rows and columns of the offending slice
        got: (usize, usize),
    },
    /// Flat data length does not fill the requested shape
    BadFlatLength {
        /// Requested (factors, components, times) shape
        shape: (usize, usize, usize),
        /// Length of the flat data
        len: usize,
    },
}

impl LatentField {
    /// Create a new latent field from per-time slices.
    ///
    /// # Example
    ///
    /// ```
    /// use nalgebra::DMatrix;
    /// use gwp::process::LatentField;
    ///
    /// // three time points, two components, two factors
    /// let field = LatentField::new(vec![DMatrix::zeros(2, 2); 3]).unwrap();
    /// assert_eq!(field.shape(), (2, 2, 3));
    /// ```
    pub fn new(slices: Vec<DMatrix<f64>>) -> Result<Self, LatentFieldError> {
        if slices.is_empty() || slices[0].is_empty() {
            return Err(LatentFieldError::Empty);
        }
        let expected = slices[0].shape();
        for (index, s) in slices.iter().enumerate() {
            if s.shape() != expected {
                return Err(LatentFieldError::MismatchedSlice {
                    index,
                    expected,
                    got: s.shape(),
                });
            }
        }
        Ok(LatentField { slices })
    }

    /// Create a new latent field without checking the slices
    pub fn new_unchecked(slices: Vec<DMatrix<f64>>) -> Self {
        LatentField { slices }
    }

    /// Field of zeros with `v` factors, `p` components and `n` time points
    pub fn zeros(v: usize, p: usize, n: usize) -> Self {
        LatentField {
            slices: vec![DMatrix::zeros(p, v); n],
        }
    }

    /// Build a field from a flat vector in factor-major order: entry
    /// `(k, j, t)` (factor, component, time) lives at index
    /// `k·p·n + j·n + t`.
    pub fn from_flat(
        flat: &DVector<f64>,
        v: usize,
        p: usize,
        n: usize,
    ) -> Result<Self, LatentFieldError> {
        if v * p * n == 0 || flat.len() != v * p * n {
            return Err(LatentFieldError::BadFlatLength {
                shape: (v, p, n),
                len: flat.len(),
            });
        }
        let slices = (0..n)
            .map(|t| DMatrix::from_fn(p, v, |j, k| flat[k * p * n + j * n + t]))
            .collect();
        Ok(LatentField { slices })
    }

    /// Flat vector in the order of [`LatentField::from_flat`]
    pub fn flatten(&self) -> DVector<f64> {
        let (v, p, n) = self.shape();
        let mut flat = DVector::zeros(v * p * n);
        for (t, slice) in self.slices.iter().enumerate() {
            for k in 0..v {
                for j in 0..p {
                    flat[k * p * n + j * n + t] = slice[(j, k)];
                }
            }
        }
        flat
    }

    /// Number of factors `v`
    #[inline]
    pub fn nfactors(&self) -> usize {
        self.slices[0].ncols()
    }

    /// Number of observed components `p`
    #[inline]
    pub fn dim(&self) -> usize {
        self.slices[0].nrows()
    }

    /// Number of time points `n`
    #[inline]
    pub fn ntimes(&self) -> usize {
        self.slices.len()
    }

    /// Shape as `(v, p, n)`
    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.nfactors(), self.dim(), self.ntimes())
    }

    /// Total number of scalar entries
    #[inline]
    pub fn total_len(&self) -> usize {
        self.nfactors() * self.dim() * self.ntimes()
    }

    /// Time slices, oldest first; slice `t` is `p × v`
    #[inline]
    pub fn slices(&self) -> &[DMatrix<f64>] {
        &self.slices
    }

    /// Point on the ellipse through `self` (angle 0) and `other` (angle
    /// π/2): `self·cos(angle) + other·sin(angle)`, elementwise.
    pub fn rotate(&self, other: &LatentField, angle: f64) -> LatentField {
        assert_eq!(self.shape(), other.shape(), "field shapes differ");
        let (s, c) = angle.sin_cos();
        let slices = self
            .slices
            .iter()
            .zip(other.slices.iter())
            .map(|(a, b)| a * c + b * s)
            .collect();
        LatentField { slices }
    }

    /// Per-time cross products `U_t U_tᵀ`, each `p × p`
    pub fn cross_products(&self) -> Vec<DMatrix<f64>> {
        self.slices.iter().map(|u| u * u.transpose()).collect()
    }

    /// Gram matrix of the time slices under the Frobenius inner product.
    ///
    /// Entry `(a, b)` is `⟨U_a, U_b⟩_F`, summing over factors and
    /// components. This `n × n` matrix carries the Gaussian-process
    /// quadratic form in the kernel posterior.
    pub fn gram(&self) -> DMatrix<f64> {
        let n = self.ntimes();
        let mut g = DMatrix::zeros(n, n);
        for a in 0..n {
            for b in a..n {
                let ip = self.slices[a].dot(&self.slices[b]);
                g[(a, b)] = ip;
                g[(b, a)] = ip;
            }
        }
        g
    }
}

impl std::fmt::Display for LatentFieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => {
                write!(f, "latent field requires at least one nonempty time slice")
            }
            Self::MismatchedSlice {
                index,
                expected,
                got,
            } => write!(
                f,
                "slice {} is {}x{} but the first slice is {}x{}",
                index, got.0, got.1, expected.0, expected.1
            ),
            Self::BadFlatLength { shape, len } => write!(
                f,
                "flat length {} does not fill a ({}, {}, {}) field",
                len, shape.0, shape.1, shape.2
            ),
        }
    }
}

impl std::error::Error for LatentFieldError {}
