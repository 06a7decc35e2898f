use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::{DataPoint, FitError, FitResult, Model, check_points};
use crate::histogram::Histogram;

const LAMBDA_START: f64 = 1e-3;
const LAMBDA_UP: f64 = 10.0;
const LAMBDA_DOWN: f64 = 0.1;
const LAMBDA_MAX: f64 = 1e12;

/// Levenberg–Marquardt minimisation of `χ² = Σ ((y − f(x; p)) / σ)²`.
///
/// The Jacobian is taken by central differences. Each iteration solves
/// `(JᵀJ + λ·diag(JᵀJ)) δ = Jᵀr`; λ shrinks after an accepted step and grows
/// after a rejected one. The fit stops when an accepted step lowers χ² by less
/// than `tolerance · (1 + χ²)` or when no step can lower it any more.
/// Parameter errors are the square roots of the diagonal of `(JᵀJ)⁻¹` at the
/// minimum.
#[derive(Debug, Clone, Copy)]
pub struct CurveFitter {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for CurveFitter {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-10,
        }
    }
}

impl CurveFitter {
    /// Fits `model` to `points` starting from `initial`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use statlab_stats::fit::{CurveFitter, DataPoint, GaussianModel};
    /// # use statlab_stats::distributions::gaussian_normalized;
    /// let points: Vec<_> = (0..20)
    ///     .map(|i| {
    ///         let x = f64::from(i) * 0.2;
    ///         DataPoint::new(x, gaussian_normalized(x, 100.0, 2.0, 0.5), 1.0)
    ///     })
    ///     .collect();
    /// let fit = CurveFitter::default()
    ///     .fit(&GaussianModel, &points, &[80.0, 1.8, 0.7])
    ///     .unwrap();
    /// assert!(fit.converged);
    /// assert!((fit.params[1] - 2.0).abs() < 1e-6);
    /// ```
    pub fn fit<M>(
        &self,
        model: &M,
        points: &[DataPoint],
        initial: &[f64],
    ) -> Result<FitResult, FitError>
    where
        M: Model + ?Sized,
    {
        let num_params = model.num_params();
        if initial.len() != num_params {
            return Err(FitError::ParameterCount {
                expected: num_params,
                got: initial.len(),
            });
        }
        check_points(points, num_params)?;

        let mut params = initial.to_vec();
        let mut chi2 = model_chi_square(model, points, &params);
        if !chi2.is_finite() {
            return Err(FitError::NonFiniteStart);
        }

        let mut lambda = LAMBDA_START;
        let mut converged = false;
        let mut iterations = 0;
        while iterations < self.max_iterations {
            iterations += 1;
            let (jtj, jtr) = normal_system(model, points, &params);
            let mut damped = jtj.clone();
            for j in 0..num_params {
                let diag = damped[(j, j)];
                damped[(j, j)] = if diag > 0.0 { diag * (1.0 + lambda) } else { lambda };
            }
            let Some(step) = damped.lu().solve(&jtr) else {
                lambda *= LAMBDA_UP;
                continue;
            };

            let trial = params
                .iter()
                .zip(step.iter())
                .map(|(p, d)| p + d)
                .collect::<Vec<_>>();
            let trial_chi2 = model_chi_square(model, points, &trial);
            if trial_chi2.is_finite() && trial_chi2 <= chi2 {
                let improvement = chi2 - trial_chi2;
                params = trial;
                chi2 = trial_chi2;
                lambda = (lambda * LAMBDA_DOWN).max(f64::MIN_POSITIVE);
                if improvement <= self.tolerance * (1.0 + chi2) {
                    converged = true;
                    break;
                }
            } else {
                lambda *= LAMBDA_UP;
                if lambda > LAMBDA_MAX {
                    // no descent direction left at this point
                    converged = true;
                    break;
                }
            }
        }

        let (jtj, _) = normal_system(model, points, &params);
        let covariance = jtj.try_inverse().ok_or(FitError::Singular)?;
        let errors = (0..num_params)
            .map(|j| covariance[(j, j)].max(0.0).sqrt())
            .collect();

        Ok(FitResult {
            params,
            errors,
            chi_square: chi2,
            ndf: points.len().saturating_sub(num_params),
            converged,
            iterations,
        })
    }
}

fn model_chi_square<M>(model: &M, points: &[DataPoint], params: &[f64]) -> f64
where
    M: Model + ?Sized,
{
    points
        .iter()
        .map(|p| ((p.y - model.eval(p.x, params)) / p.error).powi(2))
        .sum()
}

/// Builds `JᵀJ` and `Jᵀr` for the weighted residuals `r = (y − f) / σ`.
fn normal_system<M>(model: &M, points: &[DataPoint], params: &[f64]) -> (DMatrix<f64>, DVector<f64>)
where
    M: Model + ?Sized,
{
    let num_params = params.len();
    let mut jacobian = DMatrix::zeros(points.len(), num_params);
    let mut residuals = DVector::zeros(points.len());
    let mut shifted = params.to_vec();
    for (i, point) in points.iter().enumerate() {
        residuals[i] = (point.y - model.eval(point.x, params)) / point.error;
        for j in 0..num_params {
            let h = f64::EPSILON.cbrt() * params[j].abs().max(1e-3);
            shifted[j] = params[j] + h;
            let up = model.eval(point.x, &shifted);
            shifted[j] = params[j] - h;
            let down = model.eval(point.x, &shifted);
            shifted[j] = params[j];
            jacobian[(i, j)] = (up - down) / (2.0 * h) / point.error;
        }
    }
    let jt = jacobian.transpose();
    (&jt * &jacobian, jt * residuals)
}

/// Where a histogram fit evaluates the model for each bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BinMode {
    /// Model value at the bin centre.
    #[default]
    Center,
    /// Model averaged over the bin width.
    Integral,
}

/// Turns histogram bins into data points, skipping bins with zero error.
#[must_use]
pub fn histogram_points(histogram: &Histogram) -> Vec<DataPoint> {
    histogram
        .bins()
        .filter(|bin| bin.error > 0.0)
        .map(|bin| DataPoint::new(bin.center(), bin.content, bin.error))
        .collect()
}

struct BinAveraged<'a, M: ?Sized> {
    model: &'a M,
    width: f64,
}

const BIN_AVERAGE_INTERVALS: u32 = 16;

impl<M: Model + ?Sized> Model for BinAveraged<'_, M> {
    fn num_params(&self) -> usize {
        self.model.num_params()
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        // composite Simpson over [x - w/2, x + w/2]
        let a = x - 0.5 * self.width;
        let h = self.width / f64::from(BIN_AVERAGE_INTERVALS);
        let mut sum = self.model.eval(a, params) + self.model.eval(a + self.width, params);
        for k in 1..BIN_AVERAGE_INTERVALS {
            let weight = if k % 2 == 1 { 4.0 } else { 2.0 };
            sum += weight * self.model.eval(a + f64::from(k) * h, params);
        }
        sum * h / 3.0 / self.width
    }
}

/// χ² fit of `model` to a histogram.
///
/// Bins with zero error carry no information and are left out, as are the
/// underflow and overflow counters.
pub fn fit_histogram<M>(
    histogram: &Histogram,
    model: &M,
    initial: &[f64],
    mode: BinMode,
) -> Result<FitResult, FitError>
where
    M: Model + ?Sized,
{
    let points = histogram_points(histogram);
    let fitter = CurveFitter::default();
    match mode {
        BinMode::Center => fitter.fit(model, &points, initial),
        BinMode::Integral => {
            let averaged = BinAveraged {
                model,
                width: histogram.bin_width(),
            };
            fitter.fit(&averaged, &points, initial)
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::{Rng as _, SeedableRng as _};
    use rand_distr::{Distribution as _, Normal};
    use rand_pcg::Pcg32;

    use super::*;
    use crate::fit::{GaussianModel, PolynomialModel, polynomial_fit};

    #[test]
    fn test_linear_model_matches_closed_form() {
        let mut rng = Pcg32::seed_from_u64(7);
        let points: Vec<_> = (0..15)
            .map(|i| {
                let x = f64::from(i);
                DataPoint::new(x, 0.5 * x - 1.0 + rng.random_range(-0.3..0.3), 0.2)
            })
            .collect();
        let lm = CurveFitter::default()
            .fit(&PolynomialModel { degree: 1 }, &points, &[0.0, 0.0])
            .unwrap();
        let exact = polynomial_fit(&points, 1).unwrap();
        assert!(lm.converged);
        for j in 0..2 {
            assert_relative_eq!(lm.params[j], exact.params[j], epsilon = 1e-5);
            assert_relative_eq!(lm.errors[j], exact.errors[j], max_relative = 1e-4);
        }
        assert_relative_eq!(lm.chi_square, exact.chi_square, max_relative = 1e-8);
    }

    #[test]
    fn test_gaussian_histogram_fit_recovers_parameters() {
        let mut rng = Pcg32::seed_from_u64(42);
        let normal = Normal::new(2.0, 0.5).unwrap();
        let mut histogram = Histogram::new(40, 0.0, 4.0).unwrap();
        for _ in 0..20_000 {
            histogram.fill(normal.sample(&mut rng));
        }
        let initial = GaussianModel::initial_guess(&histogram);
        for mode in [BinMode::Center, BinMode::Integral] {
            let fit = fit_histogram(&histogram, &GaussianModel, &initial, mode).unwrap();
            assert!(fit.converged);
            assert!((fit.params[0] - 2000.0).abs() < 5.0 * fit.errors[0]);
            assert!((fit.params[1] - 2.0).abs() < 5.0 * fit.errors[1]);
            assert!((fit.params[2] - 0.5).abs() < 5.0 * fit.errors[2]);
        }
    }

    #[test]
    fn test_bin_average_of_linear_model_is_centre_value() {
        let averaged = BinAveraged {
            model: &PolynomialModel { degree: 1 },
            width: 0.5,
        };
        assert_relative_eq!(averaged.eval(3.0, &[1.0, 2.0]), 7.0, max_relative = 1e-12);
    }

    #[test]
    fn test_wrong_parameter_count() {
        let points = [DataPoint::new(0.0, 0.0, 1.0); 4];
        assert_eq!(
            CurveFitter::default().fit(&GaussianModel, &points, &[1.0]),
            Err(FitError::ParameterCount { expected: 3, got: 1 })
        );
    }
}
