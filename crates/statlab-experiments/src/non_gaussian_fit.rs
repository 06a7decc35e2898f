//! Least-squares line fits to data with non-Gaussian noise.
//!
//! Twenty points on `y = 0.25·x + 1` get noise of standard deviation 0.5 from a
//! Gaussian, a Laplace or a uniform law, and are fitted with a straight line
//! assuming Gaussian errors of 0.5. The distributions of the reduced χ² and of
//! its probability show how far the usual goodness-of-fit recipe relies on the
//! noise being Gaussian.

use std::time::Instant;

use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};
use statlab_stats::{
    descriptive::DescriptiveStats,
    distributions,
    fit::{self, DataPoint},
    histogram::Histogram,
};

use crate::{ExperimentError, sampling::Laplace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Noise {
    #[default]
    Gaussian,
    Laplace,
    Uniform,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub noise: Noise,
    pub tries: usize,
    pub points: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub slope: f64,
    pub intercept: f64,
    /// Standard deviation of every noise law, also used as the point error.
    pub sigma: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            noise: Noise::Gaussian,
            tries: 500_000,
            points: 20,
            x_min: 0.0,
            x_max: 20.0,
            slope: 0.25,
            intercept: 1.0,
            sigma: 0.5,
        }
    }
}

enum NoiseSampler {
    Gaussian(Normal<f64>),
    Laplace(Laplace),
    Uniform(Uniform<f64>),
}

impl NoiseSampler {
    fn new(noise: Noise, sigma: f64) -> Result<Self, ExperimentError> {
        let invalid = || ExperimentError::config(format!("invalid noise width {sigma}"));
        Ok(match noise {
            Noise::Gaussian => Self::Gaussian(Normal::new(0.0, sigma).map_err(|_| invalid())?),
            // variance 2b²
            Noise::Laplace => {
                Self::Laplace(Laplace::new(0.0, sigma / 2f64.sqrt()).ok_or_else(invalid)?)
            }
            // variance (2h)²/12
            Noise::Uniform => {
                let half = sigma * 3f64.sqrt();
                Self::Uniform(Uniform::new(-half, half).map_err(|_| invalid())?)
            }
        })
    }
}

impl Distribution<f64> for NoiseSampler {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Self::Gaussian(d) => d.sample(rng),
            Self::Laplace(d) => d.sample(rng),
            Self::Uniform(d) => d.sample(rng),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DensityRow {
    pub x: f64,
    pub observed: f64,
    pub expected: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub config: Config,
    pub ndf: usize,
    /// Reduced χ² normalised to unit area.
    pub reduced_chi_square: Histogram,
    pub reduced_chi_square_rows: Vec<DensityRow>,
    /// `P(χ² > obs)` normalised to unit area; flat for Gaussian noise.
    pub probability: Histogram,
    pub mean_reduced_chi_square: f64,
    pub probability_std_dev: f64,
}

#[expect(clippy::cast_precision_loss)]
fn sample_points<R: Rng + ?Sized>(
    config: &Config,
    noise: &NoiseSampler,
    rng: &mut R,
) -> Vec<DataPoint> {
    let step = (config.x_max - config.x_min) / config.points as f64;
    (0..config.points)
        .map(|n| {
            let x = config.x_min + n as f64 * step;
            let y = config.slope * x + config.intercept + noise.sample(rng);
            DataPoint::new(x, y, config.sigma)
        })
        .collect()
}

pub fn run<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Result<Report, ExperimentError> {
    let noise = NoiseSampler::new(config.noise, config.sigma)?;
    let mut reduced = Histogram::new(100, 0.0, 4.0)?;
    let mut probability = Histogram::new(200, 0.0, 1.0)?;
    let mut reduced_values = Vec::with_capacity(config.tries);
    let mut probabilities = Vec::with_capacity(config.tries);
    let mut ndf = config.points.saturating_sub(2);

    let start = Instant::now();
    for _ in 0..config.tries {
        let points = sample_points(config, &noise, rng);
        let result = fit::polynomial_fit(&points, 1)?;
        ndf = result.ndf;
        let value = result.reduced_chi_square();
        reduced.fill(value);
        reduced_values.push(value);
        let p = result.probability();
        probability.fill(p);
        probabilities.push(p);
    }
    log::info!(
        "{} {:?} fits in {:.2?}",
        config.tries,
        config.noise,
        start.elapsed()
    );

    let reduced = reduced.density();
    let reduced_chi_square_rows = reduced
        .bins()
        .map(|bin| DensityRow {
            x: bin.center(),
            observed: bin.content,
            expected: distributions::reduced_chi_square(bin.center(), ndf),
        })
        .collect();

    Ok(Report {
        config: config.clone(),
        ndf,
        reduced_chi_square: reduced,
        reduced_chi_square_rows,
        probability: probability.density(),
        mean_reduced_chi_square: DescriptiveStats::new(reduced_values)
            .map_or(f64::NAN, |s| s.mean),
        probability_std_dev: DescriptiveStats::new(probabilities).map_or(f64::NAN, |s| s.std_dev),
    })
}
