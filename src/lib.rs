//! Generalised Wishart processes for time-varying covariance matrices.
//!
//! A generalised Wishart process (GWP) models a sequence of `p × p`
//! covariance matrices over a time grid. Each of `v` latent factors is a
//! matrix of Gaussian-process trajectories, and a lower-triangular factor
//! `L` couples the dimensions:
//!
//! `V_t = L U_t U_tᵀ Lᵀ`
//!
//! Observed covariance snapshots are tied to the field through entrywise
//! Gaussian noise, and posterior inference runs by sweeping three
//! conditional updates: elliptical slice sampling for the latent field,
//! Metropolis-Hastings with a moment-matched log-normal proposal for the
//! kernel inverse width, and an elementwise random-walk sweep for the free
//! elements of `L`.
//!
//! # Design
//!
//! The [`process`] module owns the model state. [`process::GwpState`]
//! bundles the latent field, the factor, and the observed sequence with
//! caches of the cross products `U_t U_tᵀ` and the reconstructed field, and
//! every mutation goes through methods that keep the caches consistent.
//! The [`kernel`] module provides covariance kernels behind the
//! [`kernel::Kernel`] trait, and [`sampling`] holds the three conditional
//! updates as free functions that take the pieces of state they condition
//! on. All randomness enters through a caller-supplied `rand::Rng`, so
//! seeded chains reproduce bit for bit.
//!
//! # Example
//!
//! One sweep of the three conditional updates on a toy problem:
//!
//! ```
//! use gwp::prelude::*;
//! use nalgebra::{dvector, DMatrix, DVector};
//! use rand::rngs::SmallRng;
//! use rand::SeedableRng;
//!
//! let mut rng = SmallRng::seed_from_u64(0x6709);
//!
//! // Two latent factors over three time points in two dimensions
//! let t = dvector![0.0, 0.5, 1.0];
//! let latent = LatentField::new(vec![
//!     DMatrix::from_row_slice(2, 2, &[0.4, -0.3, 0.1, 0.8]),
//!     DMatrix::from_row_slice(2, 2, &[0.2, 0.6, -0.5, 0.3]),
//!     DMatrix::from_row_slice(2, 2, &[-0.1, 0.2, 0.7, 0.4]),
//! ])
//! .unwrap();
//! let factor = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.4, 0.9]);
//! let observed = construct_field(&latent, &factor, None);
//! let mut state = GwpState::new(latent, factor, observed).unwrap();
//!
//! let noise_variance = 0.1;
//! let mut inverse_width = 1.0;
//!
//! // Latent field under a standard normal prior on every entry
//! let prior_chol = DMatrix::<f64>::identity(12, 12);
//! let outcome = elliptical_slice(
//!     &mut state,
//!     Prior::Cholesky(&prior_chol),
//!     None,
//!     noise_variance,
//!     SliceParams::default(),
//!     &mut rng,
//! )
//! .unwrap();
//! assert!(outcome.log_lik.is_finite());
//!
//! // Kernel inverse width
//! let (next_width, _moved) = sample_hyper_kernel(
//!     inverse_width,
//!     0.25,
//!     &t,
//!     state.latent(),
//!     &SquaredExponential,
//!     2.0,
//!     10.0,
//!     &mut rng,
//! );
//! inverse_width = next_width;
//! assert!(inverse_width > 0.0);
//!
//! // Free elements of the factor
//! let mut free = pack_tril(state.factor());
//! sample_factor(
//!     &mut free,
//!     &DVector::from_element(3, 0.05),
//!     state.observed(),
//!     state.latent(),
//!     noise_variance,
//!     &DVector::from_element(3, 0.0),
//!     &DVector::from_element(3, 4.0),
//!     Some(state.cross_products()),
//!     &mut rng,
//! );
//! state.set_factor(unpack_tril(&free, 2)).unwrap();
//! ```

pub mod consts;
pub mod kernel;
pub mod linalg;
pub mod prelude;
pub mod process;
pub mod sampling;
pub mod stats;

doc_comment::doctest!("../README.md");
