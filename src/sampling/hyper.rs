//! Metropolis-Hastings update for the kernel inverse width.

use nalgebra::DVector;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::consts::LN_2PI;
use crate::kernel::Kernel;
use crate::linalg::pinvh;
use crate::process::LatentField;
use crate::stats::{lognormal_ln_pdf, lognormal_pdf, lognstat};

/// Unnormalized log-posterior of the kernel inverse width.
///
/// The Gaussian-process prior puts each of the `v·p` scalar trajectories
/// of the latent field under the kernel matrix `K` over `t`, so the
/// posterior collects `v·p` copies of `ln det K`, the field's Gram matrix
/// contracted against `K⁻¹`, and a log-normal prior given by its mean and
/// variance. The inverse and determinant come from one symmetric
/// eigendecomposition, so a nearly singular kernel degrades gracefully
/// instead of blowing up the quadratic form.
pub fn ln_kernel_posterior<K: Kernel>(
    inverse_width: f64,
    t: &DVector<f64>,
    latent: &LatentField,
    kernel: &K,
    prior_mean: f64,
    prior_variance: f64,
) -> f64 {
    let (v, p, n) = latent.shape();
    assert_eq!(
        t.len(),
        n,
        "time grid length differs from the latent time count"
    );

    let cov = kernel.covariance(t, inverse_width);
    let (cov_inv, ln_det) = pinvh(&cov);
    let quad = latent.gram().dot(&cov_inv);

    let ln_gp = -0.5
        * (((v * p) as f64) * ln_det
            + quad
            + (latent.total_len() as f64) * LN_2PI);

    let (mu, sigma) = lognstat(prior_mean, prior_variance);
    ln_gp + lognormal_ln_pdf(inverse_width, mu, sigma)
}

/// One Metropolis-Hastings update of the kernel inverse width.
///
/// The proposal is log-normal, moment-matched so its mean sits on the
/// current value with variance `proposal_variance`; positivity of the
/// inverse width holds by construction. The acceptance ratio carries the
/// forward and reverse proposal densities since that proposal is
/// asymmetric. Returns the new value and whether the step moved.
#[allow(clippy::too_many_arguments)]
pub fn sample_hyper_kernel<K: Kernel, R: Rng>(
    current: f64,
    proposal_variance: f64,
    t: &DVector<f64>,
    latent: &LatentField,
    kernel: &K,
    prior_mean: f64,
    prior_variance: f64,
    rng: &mut R,
) -> (f64, bool) {
    let (mu, sigma) = lognstat(current, proposal_variance);
    let z: f64 = rng.sample(StandardNormal);
    let proposal = (mu + sigma * z).exp();

    let ln_post_proposal = ln_kernel_posterior(
        proposal,
        t,
        latent,
        kernel,
        prior_mean,
        prior_variance,
    );
    let ln_post_current = ln_kernel_posterior(
        current,
        t,
        latent,
        kernel,
        prior_mean,
        prior_variance,
    );

    let q_forward = lognormal_pdf(proposal, mu, sigma);
    let (mu_rev, sigma_rev) = lognstat(proposal, proposal_variance);
    let q_reverse = lognormal_pdf(current, mu_rev, sigma_rev);

    let ratio =
        (ln_post_proposal - ln_post_current).exp() * q_reverse / q_forward;

    if rng.gen::<f64>() < ratio.min(1.0) {
        (proposal, true)
    } else {
        (current, false)
    }
}
