//! Change of variables from Cartesian to polar coordinates.
//!
//! For an isotropic 2-D Gaussian the radius follows the Rayleigh law obtained by
//! integrating the polar density over the angle. Both densities are checked to
//! integrate to one, and the radius of sampled points is compared with the
//! Rayleigh law.

use std::f64::consts::TAU;

use rand::Rng;
use rand_distr::{Distribution as _, Normal};
use serde::{Deserialize, Serialize};
use statlab_stats::{distributions, histogram::Histogram, special};

use crate::ExperimentError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sigma: f64,
    pub samples: usize,
    pub radius_bins: usize,
    /// Radius range and integration range, in units of sigma.
    pub range: f64,
    /// Grid points per axis of the numerical 2-D integrals.
    pub grid: usize,
    /// Bins expecting fewer entries are left out of the χ².
    pub min_expected: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            samples: 100_000,
            radius_bins: 100,
            range: 5.0,
            grid: 200,
            min_expected: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub config: Config,
    /// Cartesian density integrated over the square `[−range, range]²`.
    pub cartesian_integral: f64,
    /// Polar density integrated over `ρ ∈ [0, range]`, `θ ∈ [0, 2π)`.
    pub polar_integral: f64,
    pub rayleigh_integral: f64,
    pub radius: Histogram,
    pub chi_square: f64,
    pub ndf: usize,
    pub probability: f64,
}

/// Midpoint rule on an `n × n` grid over `[x0, x1] × [y0, y1]`.
#[expect(clippy::cast_precision_loss)]
fn integrate_2d<F>(f: F, (x0, x1): (f64, f64), (y0, y1): (f64, f64), n: usize) -> f64
where
    F: Fn(f64, f64) -> f64,
{
    let n = n.max(1);
    let hx = (x1 - x0) / n as f64;
    let hy = (y1 - y0) / n as f64;
    let mut sum = 0.0;
    for i in 0..n {
        let x = x0 + (i as f64 + 0.5) * hx;
        for j in 0..n {
            let y = y0 + (j as f64 + 0.5) * hy;
            sum += f(x, y);
        }
    }
    sum * hx * hy
}

#[expect(clippy::cast_precision_loss)]
pub fn run<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Result<Report, ExperimentError> {
    let sigma = config.sigma;
    let normal = Normal::new(0.0, sigma)
        .map_err(|err| ExperimentError::config(format!("gaussian: {err}")))?;
    let limit = config.range * sigma;

    let cartesian_integral = integrate_2d(
        |x, y| distributions::isotropic_gaussian_2d(x, y, 0.0, 0.0, sigma),
        (-limit, limit),
        (-limit, limit),
        config.grid,
    );
    // (ρ, θ) are the integration variables; the density already carries the Jacobian ρ
    let polar_integral = integrate_2d(
        |rho, theta| distributions::polar_gaussian(rho * theta.cos(), rho * theta.sin(), sigma),
        (0.0, limit),
        (0.0, TAU),
        config.grid,
    );
    let rayleigh_integral =
        special::integrate(|rho| distributions::rayleigh(rho, sigma), 0.0, limit, 1e-10);

    let mut radius = Histogram::new(config.radius_bins, 0.0, limit)?;
    for _ in 0..config.samples {
        let x: f64 = normal.sample(rng);
        let y: f64 = normal.sample(rng);
        radius.fill(x.hypot(y));
    }

    let scale = config.samples as f64 * radius.bin_width();
    let mut chi_square = 0.0;
    let mut ndf = 0;
    for bin in radius.bins() {
        let expected = scale * distributions::rayleigh(bin.center(), sigma);
        if expected >= config.min_expected {
            chi_square += (bin.content - expected).powi(2) / expected;
            ndf += 1;
        }
    }

    Ok(Report {
        config: config.clone(),
        cartesian_integral,
        polar_integral,
        rayleigh_integral,
        radius,
        chi_square,
        ndf,
        probability: special::chi_square_probability(chi_square, ndf),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_densities_are_normalised() {
        let mut rng = Pcg32::seed_from_u64(14);
        let config = Config {
            samples: 0,
            ..Config::default()
        };
        let report = run(&config, &mut rng).unwrap();
        assert_relative_eq!(report.cartesian_integral, 1.0, epsilon = 1e-4);
        assert_relative_eq!(report.polar_integral, 1.0, epsilon = 1e-4);
        assert_relative_eq!(report.rayleigh_integral, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_radius_follows_rayleigh() {
        let mut rng = Pcg32::seed_from_u64(15);
        let config = Config {
            sigma: 2.0,
            samples: 50_000,
            ..Config::default()
        };
        let report = run(&config, &mut rng).unwrap();
        // mean of the Rayleigh law is σ·sqrt(π/2)
        assert_relative_eq!(
            report.radius.mean(),
            2.0 * (std::f64::consts::FRAC_PI_2).sqrt(),
            max_relative = 0.01
        );
        assert!(report.ndf > 50);
        assert!(report.probability > 1e-4, "chi2 = {}", report.chi_square);
    }
}
