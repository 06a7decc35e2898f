//! Least-squares and maximum-likelihood fits.
//!
//! Four fitting routines cover the experiments:
//!
//! - [`LineFit`]: closed-form unweighted straight line
//! - [`polynomial_fit`]: weighted linear least squares for polynomials
//! - [`CurveFitter`]: Levenberg–Marquardt χ² minimisation of any [`Model`]
//! - [`fit_histogram_likelihood`]: binned Poisson maximum likelihood
//!
//! All of them, except the straight line, report a [`FitResult`].

use serde::Serialize;

use crate::special::chi_square_probability;

pub use self::{
    curve::{BinMode, CurveFitter, fit_histogram, histogram_points},
    likelihood::{LikelihoodFitter, fit_histogram_likelihood},
    line::LineFit,
    model::{ExponentialDecayModel, GaussianModel, Model, PoissonModel, PolynomialModel},
    polynomial::{chi_square_at, polynomial_fit},
};

mod curve;
mod likelihood;
mod line;
mod model;
mod polynomial;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum FitError {
    #[display("fit needs at least {needed} points, got {got}")]
    TooFewPoints { needed: usize, got: usize },
    #[display("x and y have different lengths ({x_len} vs {y_len})")]
    LengthMismatch { x_len: usize, y_len: usize },
    #[display("model expects {expected} parameters, got {got}")]
    ParameterCount { expected: usize, got: usize },
    #[display("point {index} has a non-positive error {error}")]
    InvalidError { index: usize, error: f64 },
    #[display("the fit matrix is singular")]
    Singular,
    #[display("the objective is not finite at the starting parameters")]
    NonFiniteStart,
}

/// A measurement `y ± error` at abscissa `x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
    pub error: f64,
}

impl DataPoint {
    #[must_use]
    pub fn new(x: f64, y: f64, error: f64) -> Self {
        Self { x, y, error }
    }
}

/// Outcome of a fit.
///
/// For likelihood fits `chi_square` holds the Baker–Cousins likelihood-ratio
/// statistic, which is asymptotically χ² distributed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitResult {
    pub params: Vec<f64>,
    pub errors: Vec<f64>,
    pub chi_square: f64,
    pub ndf: usize,
    pub converged: bool,
    pub iterations: usize,
}

impl FitResult {
    /// Probability of a χ² at least as large as the observed one.
    #[must_use]
    pub fn probability(&self) -> f64 {
        chi_square_probability(self.chi_square, self.ndf)
    }

    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn reduced_chi_square(&self) -> f64 {
        if self.ndf == 0 {
            return f64::NAN;
        }
        self.chi_square / self.ndf as f64
    }

    /// Pull of parameter `index` with respect to its true value.
    #[must_use]
    pub fn pull(&self, index: usize, truth: f64) -> f64 {
        pull(self.params[index], truth, self.errors[index])
    }
}

/// Pull `(estimate − truth) / error`: a standard normal variable when the
/// estimate is unbiased and its error is correct.
#[must_use]
pub fn pull(estimate: f64, truth: f64, error: f64) -> f64 {
    (estimate - truth) / error
}

/// Element-wise [`pull`] of three equally long slices.
#[must_use]
pub fn pulls(estimates: &[f64], truths: &[f64], errors: &[f64]) -> Vec<f64> {
    estimates
        .iter()
        .zip(truths)
        .zip(errors)
        .map(|((&estimate, &truth), &error)| pull(estimate, truth, error))
        .collect()
}

fn check_points(points: &[DataPoint], needed: usize) -> Result<(), FitError> {
    if points.len() < needed {
        return Err(FitError::TooFewPoints {
            needed,
            got: points.len(),
        });
    }
    if let Some((index, point)) = points
        .iter()
        .enumerate()
        .find(|(_, p)| !(p.error > 0.0 && p.error.is_finite()))
    {
        return Err(FitError::InvalidError {
            index,
            error: point.error,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pulls() {
        assert_eq!(pulls(&[1.0, 3.0], &[0.0, 2.0], &[0.5, 2.0]), vec![2.0, 0.5]);
    }

    #[test]
    fn test_fit_result_probability() {
        let result = FitResult {
            params: vec![1.0],
            errors: vec![0.1],
            chi_square: 0.0,
            ndf: 3,
            converged: true,
            iterations: 1,
        };
        assert_eq!(result.probability(), 1.0);
        assert_eq!(result.reduced_chi_square(), 0.0);
        assert!((result.pull(0, 0.8) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_check_points_rejects_zero_error() {
        let points = [DataPoint::new(0.0, 1.0, 1.0), DataPoint::new(1.0, 1.0, 0.0)];
        assert_eq!(
            check_points(&points, 1),
            Err(FitError::InvalidError { index: 1, error: 0.0 })
        );
        assert!(matches!(
            check_points(&points, 3),
            Err(FitError::TooFewPoints { needed: 3, got: 2 })
        ));
    }
}
