//! The statlab teaching experiments.
//!
//! Every experiment lives in its own module and follows the same shape: a
//! [`serde`] `Config` whose `Default` holds the classic constants of the exercise,
//! a `run` function and a serializable `Report`. Randomised experiments take the
//! generator as an argument; create it from a [`seed::Seed`] to make a run
//! reproducible.
//!
//! ```
//! use statlab_experiments::{monty_hall, seed::Seed};
//!
//! let mut rng = Seed::from_u128(42).rng();
//! let report = monty_hall::run(&monty_hall::Config::default(), &mut rng);
//! assert!(report.switch_rate > report.stay_rate);
//! ```
//!
//! Experiments are independent of each other; the shared machinery lives in
//! `statlab-stats` and `statlab-data`.

use statlab_data::{text::TextError, tree::TreeError};
use statlab_stats::{distributions::DistributionError, fit::FitError, histogram::HistogramError};

pub mod beam_calorimeter;
pub mod charge;
pub mod chi_square_from_poisson;
pub mod counting_experiment;
pub mod decision_wheel;
pub mod detector_efficiency;
pub mod error_ellipse;
pub mod four_vector;
pub mod least_square_polynomial;
pub mod lethal_horse;
pub mod linear_regression;
pub mod maximum_likelihood;
pub mod monty_hall;
pub mod non_gaussian_fit;
pub mod particle_detection;
pub mod penney_ante;
pub mod radioactive_decay;
pub mod sampling;
pub mod seed;
pub mod transform_variables;
pub mod tree_io;
pub mod variance_check;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ExperimentError {
    #[display("{_0}")]
    Histogram(#[error(source)] HistogramError),
    #[display("{_0}")]
    Distribution(#[error(source)] DistributionError),
    #[display("fit failed: {_0}")]
    Fit(#[error(source)] FitError),
    #[display("{_0}")]
    Tree(#[error(source)] TreeError),
    #[display("{_0}")]
    Text(#[error(source)] TextError),
    #[display("invalid configuration: {message}")]
    Config { message: String },
}

impl ExperimentError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<HistogramError> for ExperimentError {
    fn from(err: HistogramError) -> Self {
        Self::Histogram(err)
    }
}

impl From<DistributionError> for ExperimentError {
    fn from(err: DistributionError) -> Self {
        Self::Distribution(err)
    }
}

impl From<FitError> for ExperimentError {
    fn from(err: FitError) -> Self {
        Self::Fit(err)
    }
}

impl From<TreeError> for ExperimentError {
    fn from(err: TreeError) -> Self {
        Self::Tree(err)
    }
}

impl From<TextError> for ExperimentError {
    fn from(err: TextError) -> Self {
        Self::Text(err)
    }
}
