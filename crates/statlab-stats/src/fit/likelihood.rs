use nalgebra::{DMatrix, DVector};

use super::{FitError, FitResult, Model};
use crate::histogram::Histogram;

/// Binned Poisson maximum-likelihood fit.
///
/// Minimises the Baker–Cousins statistic
/// `−2 ln λ = 2 Σ [μᵢ − nᵢ + nᵢ ln(nᵢ/μᵢ)]` over all bins, empty ones included,
/// with a damped Newton iteration on a finite-difference gradient and Hessian.
/// Since the statistic is `−2 ln L` up to a constant, the parameter covariance
/// is `2 H⁻¹` at the minimum.
#[derive(Debug, Clone, Copy)]
pub struct LikelihoodFitter {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for LikelihoodFitter {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-9,
        }
    }
}

impl LikelihoodFitter {
    pub fn fit<M>(
        &self,
        histogram: &Histogram,
        model: &M,
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
        if histogram.num_bins() < num_params {
            return Err(FitError::TooFewPoints {
                needed: num_params,
                got: histogram.num_bins(),
            });
        }

        let objective = |params: &[f64]| baker_cousins(histogram, model, params);
        let mut params = initial.to_vec();
        let mut value = objective(&params);
        if !value.is_finite() {
            return Err(FitError::NonFiniteStart);
        }

        let mut damping = 1e-3;
        let mut converged = false;
        let mut iterations = 0;
        while iterations < self.max_iterations {
            iterations += 1;
            let (gradient, hessian) = derivatives(&objective, &params, value);
            let mut damped = hessian.clone();
            for j in 0..num_params {
                let diag = damped[(j, j)].abs();
                damped[(j, j)] = diag * (1.0 + damping) + damping;
            }
            let Some(step) = damped.lu().solve(&(-gradient)) else {
                damping *= 10.0;
                continue;
            };

            let trial = params
                .iter()
                .zip(step.iter())
                .map(|(p, d)| p + d)
                .collect::<Vec<_>>();
            let trial_value = objective(&trial);
            if trial_value.is_finite() && trial_value <= value {
                let improvement = value - trial_value;
                params = trial;
                value = trial_value;
                damping = (damping * 0.1).max(1e-12);
                if improvement <= self.tolerance * (1.0 + value.abs()) {
                    converged = true;
                    break;
                }
            } else {
                damping *= 10.0;
                if damping > 1e12 {
                    converged = true;
                    break;
                }
            }
        }

        let (_, hessian) = derivatives(&objective, &params, value);
        let covariance = hessian.try_inverse().ok_or(FitError::Singular)?;
        let errors = (0..num_params)
            .map(|j| (2.0 * covariance[(j, j)]).max(0.0).sqrt())
            .collect();

        Ok(FitResult {
            params,
            errors,
            chi_square: value,
            ndf: histogram.num_bins() - num_params,
            converged,
            iterations,
        })
    }
}

/// Binned likelihood fit with the default [`LikelihoodFitter`].
///
/// # Examples
///
/// ```
/// # use statlab_stats::histogram::Histogram;
/// # use statlab_stats::fit::{PoissonModel, fit_histogram_likelihood};
/// let mut histogram = Histogram::new(11, -0.5, 10.5).unwrap();
/// for (k, count) in [4.0, 15.0, 22.0, 23.0, 16.0, 11.0, 5.0, 2.0, 1.0, 1.0, 0.0].iter().enumerate() {
///     histogram.fill_weighted(k as f64, *count);
/// }
/// let model = PoissonModel { scale: 100.0 };
/// let fit = fit_histogram_likelihood(&histogram, &model, &[histogram.mean()]).unwrap();
/// assert!((fit.params[0] - histogram.mean()).abs() < 0.05);
/// ```
pub fn fit_histogram_likelihood<M>(
    histogram: &Histogram,
    model: &M,
    initial: &[f64],
) -> Result<FitResult, FitError>
where
    M: Model + ?Sized,
{
    LikelihoodFitter::default().fit(histogram, model, initial)
}

fn baker_cousins<M>(histogram: &Histogram, model: &M, params: &[f64]) -> f64
where
    M: Model + ?Sized,
{
    let mut total = 0.0;
    for bin in 0..histogram.num_bins() {
        let observed = histogram.content(bin);
        let expected = model.eval(histogram.bin_center(bin), params);
        if expected <= 0.0 {
            if observed > 0.0 {
                return f64::INFINITY;
            }
            continue;
        }
        total += expected - observed;
        if observed > 0.0 {
            total += observed * (observed / expected).ln();
        }
    }
    2.0 * total
}

fn derivatives<F>(objective: &F, params: &[f64], value: f64) -> (DVector<f64>, DMatrix<f64>)
where
    F: Fn(&[f64]) -> f64,
{
    let n = params.len();
    let steps = params
        .iter()
        .map(|p| 1e-4 * p.abs().max(1e-2))
        .collect::<Vec<_>>();
    let mut shifted = params.to_vec();
    let mut eval_at = |offsets: &[(usize, f64)]| {
        shifted.copy_from_slice(params);
        for &(j, delta) in offsets {
            shifted[j] += delta;
        }
        objective(&shifted)
    };

    let mut gradient = DVector::zeros(n);
    let mut hessian = DMatrix::zeros(n, n);
    for j in 0..n {
        let h = steps[j];
        let up = eval_at(&[(j, h)]);
        let down = eval_at(&[(j, -h)]);
        gradient[j] = (up - down) / (2.0 * h);
        hessian[(j, j)] = (up - 2.0 * value + down) / (h * h);
        for k in 0..j {
            let g = steps[k];
            let pp = eval_at(&[(j, h), (k, g)]);
            let pm = eval_at(&[(j, h), (k, -g)]);
            let mp = eval_at(&[(j, -h), (k, g)]);
            let mm = eval_at(&[(j, -h), (k, -g)]);
            let mixed = (pp - pm - mp + mm) / (4.0 * h * g);
            hessian[(j, k)] = mixed;
            hessian[(k, j)] = mixed;
        }
    }
    (gradient, hessian)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng as _;
    use rand_distr::{Distribution as _, Exp};
    use rand_pcg::Pcg32;

    use super::*;
    use crate::fit::{ExponentialDecayModel, GaussianModel, PolynomialModel};

    #[test]
    fn test_exponential_lifetime() {
        let mut rng = Pcg32::seed_from_u64(3);
        let exp = Exp::new(1.0).unwrap();
        let mut histogram = Histogram::new(100, 0.0, 10.0).unwrap();
        for _ in 0..5_000 {
            histogram.fill(exp.sample(&mut rng));
        }
        let model = ExponentialDecayModel {
            scale: 5_000.0 * histogram.bin_width(),
        };
        let fit = fit_histogram_likelihood(&histogram, &model, &[histogram.mean()]).unwrap();
        assert!(fit.converged);
        assert!((fit.params[0] - 1.0).abs() < 4.0 * fit.errors[0]);
        // error of the mean of an exponential sample is τ/√N
        assert_relative_eq!(fit.errors[0], 1.0 / 5_000f64.sqrt(), max_relative = 0.1);
    }

    #[test]
    fn test_gaussian_shape_with_empty_bins() {
        let mut histogram = Histogram::new(20, -5.0, 5.0).unwrap();
        for (x, w) in [(-1.0, 5.0), (-0.5, 12.0), (0.0, 16.0), (0.5, 11.0), (1.0, 6.0)] {
            histogram.fill_weighted(x + 0.1, w);
        }
        let initial = GaussianModel::initial_guess(&histogram);
        let fit = fit_histogram_likelihood(&histogram, &GaussianModel, &initial).unwrap();
        // likelihood fits preserve the total content
        assert_relative_eq!(fit.params[0] / histogram.bin_width(), 50.0, max_relative = 1e-3);
    }

    #[test]
    fn test_zero_expectation_with_counts_is_rejected() {
        let mut histogram = Histogram::new(3, 0.0, 3.0).unwrap();
        histogram.fill(2.5);
        let flat = PolynomialModel { degree: 0 };
        assert!(baker_cousins(&histogram, &flat, &[0.0]).is_infinite());
        assert_eq!(
            fit_histogram_likelihood(&histogram, &flat, &[0.0]),
            Err(FitError::NonFiniteStart)
        );
        // empty bins with zero expectation contribute nothing
        let empty = Histogram::new(3, 0.0, 3.0).unwrap();
        assert_eq!(baker_cousins(&empty, &flat, &[0.0]), 0.0);
    }
}
