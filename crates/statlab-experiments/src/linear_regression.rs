//! Straight-line least squares on a two-column data file.

use rand::Rng;
use rand_distr::{Distribution as _, Normal};
use serde::{Deserialize, Serialize};
use statlab_stats::fit::LineFit;

use crate::ExperimentError;

/// Settings of the synthetic data written by [`generate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    pub slope: f64,
    pub intercept: f64,
    pub sigma: f64,
    pub points: usize,
    pub x_start: f64,
    pub x_step: f64,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            slope: 0.02,
            intercept: -25.0,
            sigma: 0.1,
            points: 30,
            x_start: 1980.0,
            x_step: 1.0,
        }
    }
}

/// `y = slope·x + intercept + N(0, σ)` at equally spaced `x`.
#[expect(clippy::cast_precision_loss)]
pub fn generate<R: Rng + ?Sized>(
    config: &GenerateConfig,
    rng: &mut R,
) -> Result<Vec<(f64, f64)>, ExperimentError> {
    let noise = Normal::new(0.0, config.sigma)
        .map_err(|err| ExperimentError::config(format!("noise: {err}")))?;
    Ok((0..config.points)
        .map(|i| {
            let x = config.x_start + config.x_step * i as f64;
            (x, config.slope * x + config.intercept + noise.sample(rng))
        })
        .collect())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Measurement error of `y`; the χ² is divided by its square.
    pub sigma: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self { sigma: 1.0 }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub config: Config,
    pub points: usize,
    pub fit: LineFit,
    pub chi_square: f64,
    pub ndf: usize,
    pub reduced_chi_square: f64,
    /// Reduced χ² is expected within `1 ± expected_spread`.
    pub expected_spread: f64,
}

#[expect(clippy::cast_precision_loss)]
pub fn run(config: &Config, points: &[(f64, f64)]) -> Result<Report, ExperimentError> {
    if config.sigma.is_nan() || config.sigma <= 0.0 {
        return Err(ExperimentError::config("sigma must be positive"));
    }
    let (xs, ys): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
    let fit = LineFit::from_points(&xs, &ys)?;
    let chi_square = fit.chi_square / (config.sigma * config.sigma);
    log::debug!("line fit: slope {} intercept {}", fit.slope, fit.intercept);
    Ok(Report {
        config: config.clone(),
        points: points.len(),
        chi_square,
        ndf: fit.ndf,
        reduced_chi_square: chi_square / fit.ndf as f64,
        expected_spread: fit.expected_reduced_spread(),
        fit,
    })
}
