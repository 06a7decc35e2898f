//! The χ² distribution built from Poisson counts.
//!
//! For a count `x` drawn from Poisson(λ) with large λ, `(x − λ)²/x` behaves like
//! a χ² variable with one degree of freedom, and sums of `dof` such terms like a
//! χ² with `dof` degrees of freedom, itself close to `N(dof, 2·dof)`.
//!
//! A zero count has no χ² term. Such draws, and sums containing one, are left
//! out of the moments and histograms and counted in the report.

use std::time::Instant;

use rand::Rng;
use rand_distr::{Distribution as _, Poisson};
use serde::{Deserialize, Serialize};
use statlab_stats::{distributions, histogram::Histogram};

use crate::ExperimentError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub lambda: f64,
    /// Draws for the single-term histograms, and number of sums.
    pub draws: usize,
    /// Terms per sum.
    pub dof: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lambda: 10_000.0,
            draws: 100_000,
            dof: 200,
        }
    }
}

/// Running mean and variance of a stream of values.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Moments {
    pub count: u64,
    pub mean: f64,
    pub variance: f64,
    #[serde(skip)]
    m2: f64,
}

impl Moments {
    #[expect(clippy::cast_precision_loss)]
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
        self.variance = self.m2 / self.count as f64;
    }
}

/// Normalised histogram next to the densities it should follow.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DensityRow {
    pub x: f64,
    pub observed: f64,
    pub chi_square: f64,
    pub gaussian: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub config: Config,
    pub poisson: Histogram,
    pub poisson_moments: Moments,
    pub single: Histogram,
    pub single_moments: Moments,
    pub single_rows: Vec<DensityRow>,
    pub combined: Histogram,
    pub combined_moments: Moments,
    pub combined_rows: Vec<DensityRow>,
    /// Single draws of zero, left out of the single-term statistics.
    pub skipped_draws: u64,
    /// Sums left out because one of their terms was a zero count.
    pub skipped_sums: u64,
}

/// `(x − λ)²/x`, the Neyman χ² term of one count; `None` for `x = 0`.
#[must_use]
pub fn chi_square_term(x: f64, lambda: f64) -> Option<f64> {
    (x > 0.0).then(|| (x - lambda).powi(2) / x)
}

#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn run<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Result<Report, ExperimentError> {
    let poisson_law = Poisson::new(config.lambda)
        .map_err(|err| ExperimentError::config(format!("poisson: {err}")))?;
    if config.dof == 0 {
        return Err(ExperimentError::config("at least one degree of freedom"));
    }
    let sigma = config.lambda.sqrt();

    // 4σ + 1 unit bins centred on the integers around λ
    let half_range = 2.0 * sigma.floor() + 0.5;
    let mut poisson = Histogram::new(
        4 * sigma.floor() as usize + 1,
        config.lambda - half_range,
        config.lambda + half_range,
    )?;
    let mut single = Histogram::new(51, -0.05, 5.05)?;
    let mut poisson_moments = Moments::default();
    let mut single_moments = Moments::default();
    let mut skipped_draws = 0;
    for _ in 0..config.draws {
        let x: f64 = poisson_law.sample(rng);
        poisson.fill(x);
        poisson_moments.push(x);
        match chi_square_term(x, config.lambda) {
            Some(term) => {
                single.fill(term);
                single_moments.push(term);
            }
            None => skipped_draws += 1,
        }
    }

    let dof = config.dof as f64;
    let spread = 3.0 * (2.0 * dof).sqrt();
    let mut combined = Histogram::new(100, (dof - spread).max(0.0), dof + spread)?;
    let mut combined_moments = Moments::default();
    let mut skipped_sums = 0;
    let start = Instant::now();
    for _ in 0..config.draws {
        // all terms are drawn even after a zero
        let terms = (0..config.dof)
            .map(|_| chi_square_term(poisson_law.sample(rng), config.lambda))
            .collect::<Vec<_>>();
        match terms.into_iter().sum::<Option<f64>>() {
            Some(sum) => {
                combined.fill(sum);
                combined_moments.push(sum);
            }
            None => skipped_sums += 1,
        }
    }
    if skipped_draws > 0 || skipped_sums > 0 {
        log::warn!(
            "zero counts at lambda = {}: skipped {skipped_draws} draws and {skipped_sums} sums",
            config.lambda
        );
    }
    log::info!(
        "{} sums of {} terms in {:.2?}",
        config.draws,
        config.dof,
        start.elapsed()
    );

    let single = single.density();
    let single_rows = single
        .bins()
        .map(|bin| DensityRow {
            x: bin.center(),
            observed: bin.content,
            chi_square: distributions::chi_square_one_dof(bin.center()),
            gaussian: None,
        })
        .collect();
    let combined = combined.density();
    let combined_rows = combined
        .bins()
        .map(|bin| DensityRow {
            x: bin.center(),
            observed: bin.content,
            chi_square: distributions::chi_square(bin.center(), config.dof),
            gaussian: Some(distributions::gaussian(bin.center(), dof, (2.0 * dof).sqrt())),
        })
        .collect();

    Ok(Report {
        config: config.clone(),
        poisson,
        poisson_moments,
        single,
        single_moments,
        single_rows,
        combined,
        combined_moments,
        combined_rows,
        skipped_draws,
        skipped_sums,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_moments_match_two_pass() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let mut moments = Moments::default();
        for v in values {
            moments.push(v);
        }
        assert_relative_eq!(moments.mean, 5.0, epsilon = 1e-12);
        assert_relative_eq!(moments.variance, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_histograms_are_normalised() {
        let mut rng = Pcg32::seed_from_u64(18);
        let config = Config {
            draws: 5_000,
            dof: 20,
            ..Config::default()
        };
        let report = run(&config, &mut rng).unwrap();
        assert_eq!(report.poisson.num_bins(), 401);
        assert_relative_eq!(report.poisson_moments.mean, 10_000.0, epsilon = 5.0);
        let area = report.single.integral() * report.single.bin_width();
        assert_relative_eq!(area, 1.0, epsilon = 1e-9);
        assert_eq!(report.combined_rows.len(), 100);
        assert!(report.combined_rows.iter().all(|row| row.gaussian.is_some()));
    }

    #[test]
    fn test_zero_counts_are_skipped() {
        let mut rng = Pcg32::seed_from_u64(1);
        let config = Config {
            lambda: 2.0,
            draws: 1_000,
            dof: 5,
        };
        let report = run(&config, &mut rng).unwrap();
        // P(0) = e⁻² ≈ 0.135 per draw
        assert!((50..300).contains(&report.skipped_draws));
        assert!(report.skipped_sums > 200);
        assert_eq!(
            report.single_moments.count + report.skipped_draws,
            1_000
        );
        assert_eq!(
            report.combined_moments.count + report.skipped_sums,
            1_000
        );
        assert!(report.single_moments.mean.is_finite());
        assert!(report.single_moments.variance.is_finite());
        assert!(report.combined_moments.mean.is_finite());
        assert!(report.combined_moments.variance.is_finite());
    }

    #[test]
    fn test_default_lambda_skips_nothing() {
        let mut rng = Pcg32::seed_from_u64(2);
        let config = Config {
            draws: 1_000,
            dof: 10,
            ..Config::default()
        };
        let report = run(&config, &mut rng).unwrap();
        assert_eq!(report.skipped_draws, 0);
        assert_eq!(report.skipped_sums, 0);
    }

    #[test]
    fn test_zero_dof_is_rejected() {
        let mut rng = Pcg32::seed_from_u64(19);
        let config = Config {
            dof: 0,
            ..Config::default()
        };
        assert!(run(&config, &mut rng).is_err());
    }
}
