//! Elementwise Metropolis-Hastings sweep over the Cholesky factor.

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::linalg::unpack_tril;
use crate::process::{construct_field, LatentField};
use crate::stats::{log_lik_frob, log_likelihood_normal, normal_pdf};

/// Log-posterior of the packed factor with only the prior term of the
/// element under update.
///
/// The likelihood couples every free element through the reconstructed
/// field, but the independent normal priors factorize, so terms for the
/// elements held fixed cancel in the acceptance ratio and are dropped
/// here.
#[allow(clippy::too_many_arguments)]
fn ln_factor_posterior(
    free: &DVector<f64>,
    index: usize,
    observed: &[DMatrix<f64>],
    latent: &LatentField,
    noise_variance: f64,
    prior_mean: f64,
    prior_variance: f64,
    cross: Option<&[DMatrix<f64>]>,
) -> f64 {
    let factor = unpack_tril(free, latent.dim());
    let field = construct_field(latent, &factor, cross);
    log_lik_frob(observed, &field, noise_variance)
        + log_likelihood_normal(free[index], prior_mean, prior_variance)
}

#[allow(clippy::too_many_arguments)]
fn sample_element<R: Rng>(
    free: &mut DVector<f64>,
    index: usize,
    proposal_variance: f64,
    observed: &[DMatrix<f64>],
    latent: &LatentField,
    noise_variance: f64,
    prior_mean: f64,
    prior_variance: f64,
    cross: Option<&[DMatrix<f64>]>,
    rng: &mut R,
) -> bool {
    let current = free[index];
    let sd = proposal_variance.sqrt();
    let z: f64 = rng.sample(StandardNormal);
    let proposal = current + sd * z;

    let ln_post_current = ln_factor_posterior(
        free,
        index,
        observed,
        latent,
        noise_variance,
        prior_mean,
        prior_variance,
        cross,
    );
    free[index] = proposal;
    let ln_post_proposal = ln_factor_posterior(
        free,
        index,
        observed,
        latent,
        noise_variance,
        prior_mean,
        prior_variance,
        cross,
    );

    // The random-walk proposal is symmetric so this ratio is one; it stays
    // spelled out with the densities it comes from.
    let correction =
        normal_pdf(current, proposal, sd) / normal_pdf(proposal, current, sd);
    let ratio = (ln_post_proposal - ln_post_current).exp() * correction;

    if rng.gen::<f64>() < ratio.min(1.0) {
        true
    } else {
        free[index] = current;
        false
    }
}

/// One sweep of elementwise Metropolis-Hastings updates over the packed
/// lower triangle of the Cholesky factor.
///
/// Each free element gets a normal random-walk proposal with its own
/// variance and an independent normal prior with its own mean and
/// variance, evaluated through the full reconstructed field so the
/// likelihood sees every cross term. Updates accepted early in the sweep
/// feed the posterior of the later elements. Returns the number of
/// accepted moves.
#[allow(clippy::too_many_arguments)]
pub fn sample_factor<R: Rng>(
    free: &mut DVector<f64>,
    proposal_variances: &DVector<f64>,
    observed: &[DMatrix<f64>],
    latent: &LatentField,
    noise_variance: f64,
    prior_means: &DVector<f64>,
    prior_variances: &DVector<f64>,
    cross: Option<&[DMatrix<f64>]>,
    rng: &mut R,
) -> usize {
    let p = latent.dim();
    assert_eq!(
        free.len(),
        p * (p + 1) / 2,
        "free element count does not match the factor triangle"
    );
    assert_eq!(
        observed.len(),
        latent.ntimes(),
        "observed sequence length differs from the latent time count"
    );
    assert_eq!(
        proposal_variances.len(),
        free.len(),
        "one proposal variance per free element"
    );
    assert_eq!(
        prior_means.len(),
        free.len(),
        "one prior mean per free element"
    );
    assert_eq!(
        prior_variances.len(),
        free.len(),
        "one prior variance per free element"
    );

    let mut accepted = 0;
    for index in 0..free.len() {
        if sample_element(
            free,
            index,
            proposal_variances[index],
            observed,
            latent,
            noise_variance,
            prior_means[index],
            prior_variances[index],
            cross,
            rng,
        ) {
            accepted += 1;
        }
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::pack_tril;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    fn setup() -> (LatentField, DMatrix<f64>, Vec<DMatrix<f64>>) {
        let latent = LatentField::new(vec![
            DMatrix::from_row_slice(2, 2, &[0.6, -0.1, 0.2, 0.9]),
            DMatrix::from_row_slice(2, 2, &[0.3, 0.5, -0.4, 0.1]),
        ])
        .unwrap();
        let factor = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.3, 0.8]);
        let observed = construct_field(&latent, &factor, None);
        (latent, factor, observed)
    }

    #[test]
    fn exact_fit_with_tight_noise_rejects_all() {
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let (latent, factor, observed) = setup();
        let mut free = pack_tril(&factor);
        let before = free.clone();
        let accepted = sample_factor(
            &mut free,
            &DVector::from_element(3, 0.1),
            &observed,
            &latent,
            1e-20,
            &DVector::from_element(3, 0.0),
            &DVector::from_element(3, 1.0),
            None,
            &mut rng,
        );
        assert_eq!(accepted, 0);
        assert_eq!(free, before);
    }

    #[test]
    fn diffuse_posterior_accepts_everything() {
        let mut rng = Xoshiro256Plus::seed_from_u64(11);
        let (latent, factor, observed) = setup();
        let mut free = pack_tril(&factor);
        let before = free.clone();
        let accepted = sample_factor(
            &mut free,
            &DVector::from_element(3, 0.1),
            &observed,
            &latent,
            1e8,
            &DVector::from_element(3, 0.0),
            &DVector::from_element(3, 1e8),
            None,
            &mut rng,
        );
        assert_eq!(accepted, 3);
        for index in 0..3 {
            assert_ne!(free[index], before[index]);
        }
    }

    #[test]
    fn cross_products_shortcut_matches_direct_path() {
        let (latent, factor, observed) = setup();
        let cross = latent.cross_products();

        let run = |cross: Option<&[DMatrix<f64>]>| {
            let mut rng = Xoshiro256Plus::seed_from_u64(29);
            let mut free = pack_tril(&factor);
            let accepted = sample_factor(
                &mut free,
                &DVector::from_element(3, 0.05),
                &observed,
                &latent,
                0.5,
                &DVector::from_element(3, 0.0),
                &DVector::from_element(3, 4.0),
                cross,
                &mut rng,
            );
            (free, accepted)
        };

        let (free_direct, accepted_direct) = run(None);
        let (free_cached, accepted_cached) = run(Some(&cross));
        assert_eq!(free_direct, free_cached);
        assert_eq!(accepted_direct, accepted_cached);
    }

    #[test]
    fn fixed_seed_reproduces_the_sweep() {
        let (latent, factor, observed) = setup();
        let run = |seed: u64| {
            let mut rng = Xoshiro256Plus::seed_from_u64(seed);
            let mut free = pack_tril(&factor);
            sample_factor(
                &mut free,
                &DVector::from_element(3, 0.2),
                &observed,
                &latent,
                0.3,
                &DVector::from_element(3, 0.0),
                &DVector::from_element(3, 2.0),
                None,
                &mut rng,
            );
            free
        };
        assert_eq!(run(17), run(17));
    }

    #[test]
    #[should_panic(expected = "one proposal variance per free element")]
    fn proposal_variance_length_is_checked() {
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        let (latent, factor, observed) = setup();
        let mut free = pack_tril(&factor);
        sample_factor(
            &mut free,
            &DVector::zeros(2),
            &observed,
            &latent,
            1.0,
            &DVector::zeros(3),
            &DVector::from_element(3, 1.0),
            None,
            &mut rng,
        );
    }
}
