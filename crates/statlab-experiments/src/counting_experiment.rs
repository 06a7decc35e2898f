//! Toy Monte Carlo of a binned counting experiment.
//!
//! Each toy fills a 10-bin histogram with Poisson counts whose expectation follows
//! a Gaussian of area 10000. The expectation per bin is either the integral of the
//! Gaussian over the bin or the approximation `centre value × width`; the bin
//! error is the square root of the expectation. Every toy is fitted with a
//! normalised Gaussian, evaluated the matching way, and the pulls of the three
//! parameters and the χ² of the fit are histogrammed.

use std::time::Instant;

use rand::Rng;
use rand_distr::{Distribution as _, Poisson};
use serde::{Deserialize, Serialize};
use statlab_stats::{
    descriptive::DescriptiveStats,
    distributions,
    fit::{self, BinMode, FitResult, GaussianModel},
    histogram::Histogram,
    special,
};

use crate::ExperimentError;

pub const PARAMETER_NAMES: [&str; 3] = ["norm", "mean", "sigma"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tries: usize,
    pub bins: usize,
    pub x_min: f64,
    pub x_max: f64,
    /// Area of the Gaussian.
    pub norm: f64,
    pub mean: f64,
    pub sigma: f64,
    pub pull_bins: usize,
    /// Pull histograms span `[−pull_range, pull_range]`.
    pub pull_range: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tries: 10_000,
            bins: 10,
            x_min: 1.0,
            x_max: 3.0,
            norm: 10_000.0,
            mean: 2.0,
            sigma: 0.5,
            pull_bins: 100,
            pull_range: 2.5,
        }
    }
}

impl Config {
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn bin_width(&self) -> f64 {
        (self.x_max - self.x_min) / self.bins as f64
    }

    /// True fit parameters: the gausn normalisation is expressed per unit bin
    /// width, so the norm is `area × bin width`.
    #[must_use]
    pub fn true_params(&self) -> [f64; 3] {
        [self.norm * self.bin_width(), self.mean, self.sigma]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterPulls {
    pub name: &'static str,
    pub histogram: Histogram,
    pub sample_mean: f64,
    pub sample_std_dev: f64,
    /// Gaussian fit of the pull histogram, when it converges.
    pub fit: Option<FitResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModeSummary {
    pub mode: BinMode,
    pub pulls: Vec<ParameterPulls>,
    pub chi_square: Histogram,
    pub probability: Histogram,
    pub mean_chi_square: f64,
    pub ndf: usize,
    pub failed_fits: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub config: Config,
    pub true_params: [f64; 3],
    pub modes: Vec<ModeSummary>,
}

/// Expected count in every bin for the given mode.
#[expect(clippy::cast_precision_loss)]
pub fn expectations(config: &Config, mode: BinMode) -> Vec<f64> {
    let width = config.bin_width();
    (0..config.bins)
        .map(|b| {
            let low = config.x_min + b as f64 * width;
            let gauss = |x| {
                distributions::gaussian_normalized(x, config.norm, config.mean, config.sigma)
            };
            match mode {
                BinMode::Integral => special::integrate(gauss, low, low + width, 1e-9),
                BinMode::Center => width * gauss(low + 0.5 * width),
            }
        })
        .collect()
}

/// One toy histogram: Poisson contents with errors `√expectation`.
pub fn toy<R: Rng + ?Sized>(
    config: &Config,
    expectations: &[f64],
    rng: &mut R,
) -> Result<Histogram, ExperimentError> {
    let mut histogram = Histogram::new(config.bins, config.x_min, config.x_max)?;
    for (bin, &expected) in expectations.iter().enumerate() {
        let count = if expected > 0.0 {
            Poisson::new(expected)
                .map_err(|err| ExperimentError::config(format!("poisson: {err}")))?
                .sample(rng)
        } else {
            0.0
        };
        histogram.set_content(bin, count);
        histogram.set_error(bin, expected.sqrt());
    }
    Ok(histogram)
}

struct ModeAccumulator {
    mode: BinMode,
    expectations: Vec<f64>,
    pull_values: [Vec<f64>; 3],
    pulls: [Histogram; 3],
    chi_square: Histogram,
    probability: Histogram,
    chi_square_sum: f64,
    ndf: usize,
    fits: usize,
    failed_fits: usize,
}

impl ModeAccumulator {
    fn new(config: &Config, mode: BinMode) -> Result<Self, ExperimentError> {
        let pull = Histogram::new(config.pull_bins, -config.pull_range, config.pull_range)?;
        Ok(Self {
            mode,
            expectations: expectations(config, mode),
            pull_values: Default::default(),
            pulls: [pull.clone(), pull.clone(), pull],
            chi_square: Histogram::new(100, 0.0, 7.0 + 2.0 * 14f64.sqrt())?,
            probability: Histogram::new(100, 0.0, 1.0)?,
            chi_square_sum: 0.0,
            ndf: config.bins.saturating_sub(3),
            fits: 0,
            failed_fits: 0,
        })
    }

    fn add_toy<R: Rng + ?Sized>(
        &mut self,
        config: &Config,
        truth: &[f64; 3],
        rng: &mut R,
    ) -> Result<(), ExperimentError> {
        let histogram = toy(config, &self.expectations, rng)?;
        let result = match fit::fit_histogram(&histogram, &GaussianModel, truth, self.mode) {
            Ok(result) => result,
            Err(err) => {
                log::debug!("{:?} fit failed: {err}", self.mode);
                self.failed_fits += 1;
                return Ok(());
            }
        };
        for (m, &true_value) in truth.iter().enumerate() {
            let pull = result.pull(m, true_value);
            self.pulls[m].fill(pull);
            self.pull_values[m].push(pull);
        }
        self.chi_square.fill(result.chi_square);
        self.probability.fill(result.probability());
        self.chi_square_sum += result.chi_square;
        self.ndf = result.ndf;
        self.fits += 1;
        Ok(())
    }

    #[expect(clippy::cast_precision_loss)]
    fn finish(self) -> ModeSummary {
        let pulls = PARAMETER_NAMES
            .iter()
            .zip(self.pulls)
            .zip(self.pull_values)
            .map(|((&name, histogram), values)| {
                let stats = DescriptiveStats::new(values);
                let initial = GaussianModel::initial_guess(&histogram);
                let fit =
                    fit::fit_histogram(&histogram, &GaussianModel, &initial, BinMode::Center).ok();
                ParameterPulls {
                    name,
                    sample_mean: stats.as_ref().map_or(f64::NAN, |s| s.mean),
                    sample_std_dev: stats.as_ref().map_or(f64::NAN, |s| s.std_dev),
                    histogram,
                    fit,
                }
            })
            .collect();
        ModeSummary {
            mode: self.mode,
            pulls,
            chi_square: self.chi_square,
            probability: self.probability,
            mean_chi_square: if self.fits == 0 {
                f64::NAN
            } else {
                self.chi_square_sum / self.fits as f64
            },
            ndf: self.ndf,
            failed_fits: self.failed_fits,
        }
    }
}

pub fn run<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Result<Report, ExperimentError> {
    if config.bins < 4 {
        return Err(ExperimentError::config(
            "a three-parameter fit needs at least four bins",
        ));
    }
    let truth = config.true_params();
    let mut integral = ModeAccumulator::new(config, BinMode::Integral)?;
    let mut center = ModeAccumulator::new(config, BinMode::Center)?;
    let start = Instant::now();
    for _ in 0..config.tries {
        integral.add_toy(config, &truth, rng)?;
        center.add_toy(config, &truth, rng)?;
    }
    log::info!("{} toys fitted in {:.2?}", config.tries, start.elapsed());
    if integral.failed_fits + center.failed_fits > 0 {
        log::warn!(
            "{} integral and {} centre fits did not converge",
            integral.failed_fits,
            center.failed_fits
        );
    }

    Ok(Report {
        config: config.clone(),
        true_params: truth,
        modes: vec![integral.finish(), center.finish()],
    })
}
