//! Weighted polynomial fits of increasing degree and Δχ² scans around the
//! minimum.

use serde::{Deserialize, Serialize};
use statlab_stats::fit::{self, DataPoint, FitResult};

use crate::ExperimentError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Polynomials of degree `0..max_degree` are fitted.
    pub max_degree: usize,
    /// Steps of the one-parameter scan of `pol0` over `p̂₀ ± σ`.
    pub scan_steps: usize,
    /// Steps per axis of the `pol1` scan over `(p̂₀ ± σ₀) × (p̂₁ ± σ₁)`.
    pub grid_steps: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_degree: 5,
            scan_steps: 100,
            grid_steps: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DegreeFit {
    pub degree: usize,
    pub fit: FitResult,
}

/// Δχ² on a rectangular grid; `delta[i][j]` belongs to `(p0[i], p1[j])`.
#[derive(Debug, Clone, Serialize)]
pub struct Grid {
    pub p0: Vec<f64>,
    pub p1: Vec<f64>,
    pub delta: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub config: Config,
    pub fits: Vec<DegreeFit>,
    /// `(p₀, Δχ²)` pairs.
    pub pol0_scan: Vec<(f64, f64)>,
    pub pol1_grid: Grid,
}

#[expect(clippy::cast_precision_loss)]
fn steps_around(centre: f64, half_range: f64, steps: usize) -> Vec<f64> {
    let low = centre - half_range;
    (0..steps)
        .map(|b| low + b as f64 * 2.0 * half_range / steps as f64)
        .collect()
}

pub fn run(config: &Config, points: &[DataPoint]) -> Result<Report, ExperimentError> {
    if config.max_degree < 2 {
        return Err(ExperimentError::config(
            "the Δχ² scans need at least pol0 and pol1",
        ));
    }
    let fits = (0..config.max_degree)
        .map(|degree| {
            let fit = fit::polynomial_fit(points, degree)?;
            log::debug!(
                "pol{degree}: chi2 {:.3} with {} dof",
                fit.chi_square,
                fit.ndf
            );
            Ok(DegreeFit { degree, fit })
        })
        .collect::<Result<Vec<_>, ExperimentError>>()?;

    let pol0 = &fits[0].fit;
    let pol0_scan = steps_around(pol0.params[0], pol0.errors[0], config.scan_steps)
        .into_iter()
        .map(|p0| (p0, fit::chi_square_at(points, &[p0]) - pol0.chi_square))
        .collect();

    let pol1 = &fits[1].fit;
    let p0 = steps_around(pol1.params[0], pol1.errors[0], config.grid_steps);
    let p1 = steps_around(pol1.params[1], pol1.errors[1], config.grid_steps);
    let delta = p0
        .iter()
        .map(|&a| {
            p1.iter()
                .map(|&b| fit::chi_square_at(points, &[a, b]) - pol1.chi_square)
                .collect()
        })
        .collect();

    Ok(Report {
        config: config.clone(),
        fits,
        pol0_scan,
        pol1_grid: Grid { p0, p1, delta },
    })
}
