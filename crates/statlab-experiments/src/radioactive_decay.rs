//! Radioactive decay as a Poisson process.
//!
//! A nucleus decays in a given second when its kinetic energy, drawn from
//! `N(5, 1)` MeV, exceeds the 9.2 MeV barrier. Decays and detected alphas per
//! second are histogrammed and fitted with `time · Poisson(x; λ)`.

use std::time::Instant;

use rand::Rng;
use rand_distr::{Distribution as _, Normal};
use serde::{Deserialize, Serialize};
use statlab_stats::{
    distributions,
    fit::{self, BinMode, FitResult, PoissonModel},
    histogram::Histogram,
    special,
};

use crate::ExperimentError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mean kinetic energy in MeV.
    pub mean: f64,
    pub sigma: f64,
    /// Energy a nucleus needs to decay, in MeV.
    pub threshold: f64,
    /// Upper limit of the numerical tail integral.
    pub integration_limit: f64,
    pub nuclei: u64,
    /// Duration in seconds.
    pub time: u32,
    /// Probability that an alpha is detected.
    pub detection_efficiency: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mean: 5.0,
            sigma: 1.0,
            threshold: 9.2,
            integration_limit: 30.0,
            nuclei: 200_000,
            time: 1_000,
            detection_efficiency: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CountSpectrum {
    pub histogram: Histogram,
    pub mean: f64,
    pub fit: FitResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub config: Config,
    /// Decay probability per second from numerical integration of the density.
    pub probability_integrated: f64,
    /// The same probability from the complementary error function.
    pub probability_closed_form: f64,
    /// Nuclei left at the start of every second.
    pub remaining: Vec<u64>,
    pub decays: CountSpectrum,
    pub detected: CountSpectrum,
}

/// Counts per second are binned on 16 unit bins centred on 0..=15.
fn count_histogram() -> Result<Histogram, ExperimentError> {
    Ok(Histogram::new(16, -0.5, 15.5)?)
}

fn fit_counts(histogram: Histogram, time: u32) -> Result<CountSpectrum, ExperimentError> {
    let mean = histogram.mean();
    let model = PoissonModel {
        scale: f64::from(time),
    };
    let fit = fit::fit_histogram(&histogram, &model, &[mean], BinMode::Center)?;
    Ok(CountSpectrum {
        histogram,
        mean,
        fit,
    })
}

#[expect(clippy::cast_precision_loss)]
pub fn run<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Result<Report, ExperimentError> {
    let energy = Normal::new(config.mean, config.sigma)
        .map_err(|err| ExperimentError::config(format!("energy distribution: {err}")))?;
    if !(0.0..=1.0).contains(&config.detection_efficiency) {
        return Err(ExperimentError::config(format!(
            "detection efficiency {} is not a probability",
            config.detection_efficiency
        )));
    }

    let probability_integrated = special::integrate(
        |x| distributions::gaussian(x, config.mean, config.sigma),
        config.threshold,
        config.integration_limit,
        1e-12,
    );
    let probability_closed_form =
        distributions::gaussian_tail_probability(config.threshold, config.mean, config.sigma);
    log::info!(
        "decay probability per second: {probability_integrated:e} (integral), {probability_closed_form:e} (erfc)"
    );

    let start = Instant::now();
    let mut nuclei = config.nuclei;
    let mut remaining = Vec::with_capacity(config.time as usize);
    let mut decays = count_histogram()?;
    let mut detected = count_histogram()?;
    for _ in 0..config.time {
        remaining.push(nuclei);
        let mut decayed = 0_u64;
        let mut seen = 0_u64;
        for _ in 0..nuclei {
            if energy.sample(rng) > config.threshold {
                decayed += 1;
                if rng.random_bool(config.detection_efficiency) {
                    seen += 1;
                }
            }
        }
        nuclei -= decayed;
        decays.fill(decayed as f64);
        detected.fill(seen as f64);
    }
    log::info!("simulated {} s in {:.2?}", config.time, start.elapsed());

    Ok(Report {
        config: config.clone(),
        probability_integrated,
        probability_closed_form,
        remaining,
        decays: fit_counts(decays, config.time)?,
        detected: fit_counts(detected, config.time)?,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_tail_probability_two_ways() {
        let config = Config {
            nuclei: 0,
            time: 0,
            ..Config::default()
        };
        let integrated = special::integrate(
            |x| distributions::gaussian(x, config.mean, config.sigma),
            config.threshold,
            config.integration_limit,
            1e-12,
        );
        let closed = distributions::gaussian_tail_probability(9.2, 5.0, 1.0);
        assert_relative_eq!(integrated, closed, max_relative = 1e-6);
        assert_relative_eq!(closed, 1.3346e-5, max_relative = 1e-3);
    }

    #[test]
    fn test_poisson_rates() {
        let mut rng = Pcg32::seed_from_u64(13);
        let config = Config {
            nuclei: 100_000,
            time: 200,
            ..Config::default()
        };
        let report = run(&config, &mut rng).unwrap();
        let lambda = 100_000.0 * report.probability_closed_form;
        assert_eq!(report.remaining.len(), 200);
        assert_eq!(report.decays.histogram.integral(), 200.0);
        assert!((report.decays.mean - lambda).abs() < 0.3);
        assert!((report.decays.fit.params[0] - lambda).abs() < 0.4);
        assert!((report.detected.mean - 0.6 * lambda).abs() < 0.25);
    }
}
