//! Error ellipses of a rotated 2-D Gaussian.
//!
//! The density with `σx = 1`, `σy = 2` is rotated by 30° around its mean. Its
//! contours at `peak·e^{−k²/2}` are ellipses with semi-axes `k·σx` and `k·σy`
//! along the rotated axes, and its covariance is `R·diag(σx², σy²)·Rᵀ`.

use std::f64::consts::{PI, TAU};

use nalgebra::{Matrix2, Vector2};
use rand::Rng;
use rand_distr::{Distribution as _, StandardNormal};
use serde::{Deserialize, Serialize};
use statlab_stats::{
    covariance,
    distributions::{self, Gaussian2dParams},
};

use crate::ExperimentError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gaussian: Gaussian2dParams,
    pub phi_degrees: f64,
    /// Contours in units of sigma, drawn at `peak·e^{−k²/2}`.
    pub contour_sigmas: Vec<f64>,
    pub samples: usize,
    /// Grid points per axis on `[−extent, extent]²` for the density comparison.
    pub grid: usize,
    pub extent: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gaussian: Gaussian2dParams {
                mean_x: 0.0,
                sigma_x: 1.0,
                mean_y: 0.0,
                sigma_y: 2.0,
            },
            phi_degrees: 30.0,
            contour_sigmas: vec![3f64.sqrt(), 2f64.sqrt(), 1.0, 0.0],
            samples: 100_000,
            grid: 100,
            extent: 6.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Contour {
    pub sigmas: f64,
    pub level: f64,
    pub semi_axis_x: f64,
    pub semi_axis_y: f64,
    /// Largest relative difference between the rotated density on the ellipse
    /// and the contour level.
    pub max_deviation: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub config: Config,
    pub peak: f64,
    pub contours: Vec<Contour>,
    pub analytic_covariance: [[f64; 2]; 2],
    pub sampled_covariance: Option<[[f64; 2]; 2]>,
    pub analytic_correlation: f64,
    pub sampled_correlation: Option<f64>,
    /// Largest relative difference on the grid between the back-rotated density
    /// and the bivariate normal built from the analytic covariance.
    pub max_density_deviation: f64,
}

fn rotation(phi: f64) -> Matrix2<f64> {
    let (s, c) = phi.sin_cos();
    Matrix2::new(c, -s, s, c)
}

/// `R·diag(σx², σy²)·Rᵀ`.
#[must_use]
pub fn analytic_covariance(params: &Gaussian2dParams, phi: f64) -> Matrix2<f64> {
    let r = rotation(phi);
    let diag = Matrix2::new(
        params.sigma_x * params.sigma_x,
        0.0,
        0.0,
        params.sigma_y * params.sigma_y,
    );
    r * diag * r.transpose()
}

fn to_array(m: &Matrix2<f64>) -> [[f64; 2]; 2] {
    [[m[(0, 0)], m[(0, 1)]], [m[(1, 0)], m[(1, 1)]]]
}

/// Draws `(x, y)` by rotating independent Gaussian coordinates around the mean.
pub fn sample<R: Rng + ?Sized>(rng: &mut R, params: &Gaussian2dParams, phi: f64) -> [f64; 2] {
    let zx: f64 = StandardNormal.sample(rng);
    let zy: f64 = StandardNormal.sample(rng);
    let rotated = rotation(phi) * Vector2::new(zx * params.sigma_x, zy * params.sigma_y);
    [params.mean_x + rotated.x, params.mean_y + rotated.y]
}

#[expect(clippy::cast_precision_loss)]
pub fn run<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Result<Report, ExperimentError> {
    let params = config.gaussian;
    if !(params.sigma_x > 0.0 && params.sigma_y > 0.0) {
        return Err(ExperimentError::config("widths must be positive"));
    }
    let phi = config.phi_degrees.to_radians();
    let peak = distributions::gaussian_2d(
        params.mean_x,
        params.mean_y,
        params.mean_x,
        params.sigma_x,
        params.mean_y,
        params.sigma_y,
    );

    let r = rotation(phi);
    let contours = config
        .contour_sigmas
        .iter()
        .map(|&k| {
            let level = peak * (-0.5 * k * k).exp();
            let max_deviation = (0..64_u32)
                .map(|i| {
                    let t = TAU * f64::from(i) / 64.0;
                    let offset = r * Vector2::new(
                        k * params.sigma_x * t.cos(),
                        k * params.sigma_y * t.sin(),
                    );
                    let value = distributions::rotated_gaussian_2d(
                        params.mean_x + offset.x,
                        params.mean_y + offset.y,
                        &params,
                        phi,
                    );
                    (value - level).abs() / level
                })
                .fold(0.0, f64::max);
            Contour {
                sigmas: k,
                level,
                semi_axis_x: k * params.sigma_x,
                semi_axis_y: k * params.sigma_y,
                max_deviation,
            }
        })
        .collect();

    let cov = analytic_covariance(&params, phi);
    let inverse = cov
        .try_inverse()
        .ok_or_else(|| ExperimentError::config("degenerate covariance"))?;
    let norm = 1.0 / (2.0 * PI * cov.determinant().sqrt());
    let steps = config.grid.max(2);
    let mut max_density_deviation = 0.0_f64;
    for i in 0..steps {
        for j in 0..steps {
            let x = -config.extent + 2.0 * config.extent * i as f64 / (steps - 1) as f64;
            let y = -config.extent + 2.0 * config.extent * j as f64 / (steps - 1) as f64;
            let d = Vector2::new(x - params.mean_x, y - params.mean_y);
            let expected = norm * (-0.5 * d.dot(&(inverse * d))).exp();
            let value = distributions::rotated_gaussian_2d(x, y, &params, phi);
            if expected > 0.0 {
                max_density_deviation =
                    max_density_deviation.max((value - expected).abs() / expected);
            }
        }
    }

    let samples = (0..config.samples)
        .map(|_| sample(rng, &params, phi))
        .collect::<Vec<_>>();
    let sampled = covariance::covariance_matrix(&samples);

    Ok(Report {
        config: config.clone(),
        peak,
        contours,
        analytic_covariance: to_array(&cov),
        sampled_covariance: sampled.as_ref().map(to_array),
        analytic_correlation: covariance::correlation(&cov, 0, 1),
        sampled_correlation: sampled.as_ref().map(|c| covariance::correlation(c, 0, 1)),
        max_density_deviation,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_contours_lie_on_ellipses() {
        let mut rng = Pcg32::seed_from_u64(16);
        let config = Config {
            samples: 0,
            ..Config::default()
        };
        let report = run(&config, &mut rng).unwrap();
        assert_relative_eq!(report.peak, 1.0 / (4.0 * PI), epsilon = 1e-12);
        assert_eq!(report.contours.len(), 4);
        assert_relative_eq!(
            report.contours[0].level,
            report.peak / 1.5f64.exp(),
            max_relative = 1e-12
        );
        assert_relative_eq!(
            report.contours[1].semi_axis_y,
            2.0 * 2f64.sqrt(),
            epsilon = 1e-12
        );
        for contour in &report.contours {
            assert!(contour.max_deviation < 1e-9);
        }
        assert!(report.max_density_deviation < 1e-9);
        assert!(report.sampled_covariance.is_none());
    }

    #[test]
    fn test_analytic_covariance() {
        let config = Config::default();
        let cov = analytic_covariance(&config.gaussian, 30f64.to_radians());
        // σx'² = cos²φ + 4 sin²φ, σy'² = sin²φ + 4 cos²φ, cov = 3 sinφ cosφ
        assert_relative_eq!(cov[(0, 0)], 1.75, epsilon = 1e-12);
        assert_relative_eq!(cov[(1, 1)], 3.25, epsilon = 1e-12);
        assert_relative_eq!(cov[(0, 1)], 0.75 * 3f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_sampled_covariance_matches() {
        let mut rng = Pcg32::seed_from_u64(17);
        let report = run(&Config::default(), &mut rng).unwrap();
        let sampled = report.sampled_covariance.unwrap();
        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(
                    sampled[i][j],
                    report.analytic_covariance[i][j],
                    epsilon = 0.05
                );
            }
        }
        assert_relative_eq!(
            report.sampled_correlation.unwrap(),
            report.analytic_correlation,
            epsilon = 0.01
        );
    }
}
