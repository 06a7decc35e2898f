//! Binned maximum-likelihood fits of an exponential lifetime.
//!
//! Each experiment histograms 100 decay times drawn from `e^{−t/τ}/τ` (truncated
//! to the histogram range) and fits τ by a binned Poisson likelihood with the
//! normalisation fixed to `measures × bin size`. Over many experiments the pull
//! `(τ̂ − τ)/σ(τ̂)` should be standard normal.

use std::time::Instant;

use rand::Rng;
use rand_distr::{Distribution as _, Exp};
use serde::{Deserialize, Serialize};
use statlab_stats::{
    descriptive::DescriptiveStats,
    distributions,
    fit::{self, ExponentialDecayModel},
    histogram::Histogram,
};

use crate::ExperimentError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tau: f64,
    pub bins: usize,
    pub x_min: f64,
    pub x_max: f64,
    /// Decays per experiment.
    pub measures: usize,
    pub experiments: usize,
    pub pull_bins: usize,
    pub pull_range: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tau: 1.0,
            bins: 1_000,
            x_min: 0.0,
            x_max: 10.0,
            measures: 100,
            experiments: 10_000,
            pull_bins: 100,
            pull_range: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PullRow {
    pub x: f64,
    pub observed: f64,
    /// Standard normal scaled to the number of experiments and the bin width.
    pub expected: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub config: Config,
    pub pulls: Histogram,
    pub rows: Vec<PullRow>,
    pub pull_mean: f64,
    pub pull_std_dev: f64,
    pub mean_estimate: f64,
    pub mean_error: f64,
    pub failed_fits: usize,
}

/// Decay time from `Exp(1/τ)` restricted to `[x_min, x_max)`.
fn decay_time<R: Rng + ?Sized>(config: &Config, exp: &Exp<f64>, rng: &mut R) -> f64 {
    loop {
        let t = exp.sample(rng);
        if (config.x_min..config.x_max).contains(&t) {
            return t;
        }
    }
}

fn validate(config: &Config) -> Result<(), ExperimentError> {
    let range_ok = 0.0 <= config.x_min && config.x_min < config.x_max;
    if config.tau > 0.0 && range_ok && config.x_min < 20.0 * config.tau {
        Ok(())
    } else {
        Err(ExperimentError::config(
            "lifetime and range must leave decays to sample",
        ))
    }
}

/// Runs one experiment and returns `(τ̂, σ(τ̂))`.
#[expect(clippy::cast_precision_loss)]
pub fn experiment<R: Rng + ?Sized>(
    config: &Config,
    rng: &mut R,
) -> Result<(f64, f64), ExperimentError> {
    validate(config)?;
    let exp = Exp::new(config.tau.recip())
        .map_err(|err| ExperimentError::config(format!("lifetime: {err}")))?;
    let mut histogram = Histogram::new(config.bins, config.x_min, config.x_max)?;
    for _ in 0..config.measures {
        histogram.fill(decay_time(config, &exp, rng));
    }
    let model = ExponentialDecayModel {
        scale: histogram.bin_width() * config.measures as f64,
    };
    let result = fit::fit_histogram_likelihood(&histogram, &model, &[config.tau])?;
    Ok((result.params[0], result.errors[0]))
}

#[expect(clippy::cast_precision_loss)]
pub fn run<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Result<Report, ExperimentError> {
    validate(config)?;
    let mut pulls = Histogram::new(config.pull_bins, -config.pull_range, config.pull_range)?;
    let mut pull_values = Vec::with_capacity(config.experiments);
    let mut estimates = Vec::with_capacity(config.experiments);
    let mut errors = Vec::with_capacity(config.experiments);
    let mut failed_fits = 0;
    let start = Instant::now();
    for _ in 0..config.experiments {
        match experiment(config, rng) {
            Ok((tau_hat, error)) => {
                let pull = fit::pull(tau_hat, config.tau, error);
                pulls.fill(pull);
                pull_values.push(pull);
                estimates.push(tau_hat);
                errors.push(error);
            }
            Err(ExperimentError::Fit(err)) => {
                log::debug!("likelihood fit failed: {err}");
                failed_fits += 1;
            }
            Err(err) => return Err(err),
        }
    }
    log::info!(
        "{} experiments fitted in {:.2?}",
        config.experiments,
        start.elapsed()
    );

    let scale = config.experiments as f64 * pulls.bin_width();
    let rows = pulls
        .bins()
        .map(|bin| PullRow {
            x: bin.center(),
            observed: bin.content,
            expected: scale * distributions::gaussian(bin.center(), 0.0, 1.0),
        })
        .collect();
    let pull_stats = DescriptiveStats::new(pull_values);
    Ok(Report {
        config: config.clone(),
        pulls,
        rows,
        pull_mean: pull_stats.as_ref().map_or(f64::NAN, |s| s.mean),
        pull_std_dev: pull_stats.as_ref().map_or(f64::NAN, |s| s.std_dev),
        mean_estimate: DescriptiveStats::new(estimates).map_or(f64::NAN, |s| s.mean),
        mean_error: DescriptiveStats::new(errors).map_or(f64::NAN, |s| s.mean),
        failed_fits,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_single_experiment_error_scales_with_measures() {
        let mut rng = Pcg32::seed_from_u64(25);
        let config = Config {
            measures: 400,
            ..Config::default()
        };
        let (tau, error) = experiment(&config, &mut rng).unwrap();
        assert_relative_eq!(error, tau / 20.0, max_relative = 0.15);
        assert!((tau - 1.0).abs() < 5.0 * error);
    }

    #[test]
    fn test_pulls_are_standard_normal() {
        let mut rng = Pcg32::seed_from_u64(26);
        let config = Config {
            bins: 200,
            experiments: 500,
            ..Config::default()
        };
        let report = run(&config, &mut rng).unwrap();
        assert_eq!(report.failed_fits, 0);
        assert!(report.pull_mean.abs() < 0.25);
        assert!((report.pull_std_dev - 1.0).abs() < 0.15);
        assert_relative_eq!(report.mean_estimate, 1.0, epsilon = 0.03);
    }

    #[test]
    fn test_rejects_empty_range() {
        let mut rng = Pcg32::seed_from_u64(27);
        let config = Config {
            x_min: 5.0,
            x_max: 5.0,
            ..Config::default()
        };
        assert!(run(&config, &mut rng).is_err());
    }
}
