//! Re-imports for convenience
#[doc(no_inline)]
pub use crate::kernel::{Kernel, Periodic, SquaredExponential};
#[doc(no_inline)]
pub use crate::linalg::{pack_tril, unpack_tril};
#[doc(no_inline)]
pub use crate::process::{construct_field, GwpState, LatentField};
#[doc(no_inline)]
pub use crate::sampling::{
    elliptical_slice, ln_kernel_posterior, sample_factor, sample_hyper_kernel,
    Prior, SliceError, SliceOutcome, SliceParams,
};
