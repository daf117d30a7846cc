//! Markov chain Monte Carlo updates for the generalised Wishart process.
//!
//! A posterior sweep combines three conditional updates. The latent
//! Gaussian field moves under elliptical slice sampling, the kernel
//! inverse width under Metropolis-Hastings with a moment-matched
//! log-normal proposal, and the free elements of the Cholesky factor
//! under an elementwise random-walk sweep. Chaining the three, each fed
//! the state left by the previous one, gives one iteration of a Gibbs
//! sampler over the full model.

mod elliptical;
pub use self::elliptical::*;

mod factor;
pub use self::factor::*;

mod hyper;
pub use self::hyper::*;
