//! Efficiency of layered detectors and a Monte-Carlo check of the binomial law.

use rand::Rng;
use serde::{Deserialize, Serialize};
use statlab_stats::{distributions, histogram::Histogram, special};

use crate::ExperimentError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Layers needed to fire for a track to be seen.
    pub required_layers: u64,
    /// Detector layouts whose efficiency curves are computed.
    pub layouts: Vec<u64>,
    /// Detector efficiency to reach.
    pub target: f64,
    pub curve_points: usize,
    /// Single-layer efficiency of the simulated detector.
    pub efficiency: f64,
    /// Signals sent through the simulated detector per try.
    pub signals: u64,
    pub tries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            required_layers: 3,
            layouts: vec![3, 4, 5],
            target: 0.99,
            curve_points: 101,
            efficiency: 0.6,
            signals: 15,
            tries: 100_000,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub layers: u64,
    /// `(p, efficiency)` samples on `[0, 1]`.
    pub curve: Vec<(f64, f64)>,
    /// Single-layer efficiency giving the target detector efficiency.
    pub layer_efficiency: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CatchRow {
    pub detected: u64,
    pub observed: f64,
    pub expected: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub config: Config,
    pub layouts: Vec<Layout>,
    pub catches: Histogram,
    pub rows: Vec<CatchRow>,
    pub chi_square: f64,
    pub ndf: usize,
    pub probability: f64,
}

#[expect(clippy::cast_precision_loss)]
pub fn layout(config: &Config, layers: u64) -> Result<Layout, ExperimentError> {
    if config.required_layers > layers {
        return Err(ExperimentError::config(format!(
            "a {layers}-layer detector cannot require {} layers",
            config.required_layers
        )));
    }
    let points = config.curve_points.max(2);
    let curve = (0..points)
        .map(|i| {
            let p = i as f64 / (points - 1) as f64;
            Ok((p, distributions::layer_efficiency(p, layers, config.required_layers)?))
        })
        .collect::<Result<Vec<_>, ExperimentError>>()?;
    let efficiency = |p: f64| {
        distributions::layer_efficiency(p, layers, config.required_layers).unwrap_or(f64::NAN)
    };
    Ok(Layout {
        layers,
        curve,
        layer_efficiency: special::find_root(efficiency, config.target, 0.0, 1.0),
    })
}

/// Counts how many of `signals` independent signals a layer of `efficiency` catches.
pub fn simulate_catches<R: Rng + ?Sized>(rng: &mut R, signals: u64, efficiency: f64) -> u64 {
    (0..signals)
        .map(|_| u64::from(rng.random::<f64>() < efficiency))
        .sum()
}

#[expect(clippy::cast_precision_loss)]
pub fn run<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Result<Report, ExperimentError> {
    let layouts = config
        .layouts
        .iter()
        .map(|&layers| layout(config, layers))
        .collect::<Result<Vec<_>, _>>()?;

    let signals = config.signals as f64;
    let mut catches = Histogram::new(
        usize::try_from(config.signals + 1)
            .map_err(|_| ExperimentError::config("too many signals"))?,
        -0.5,
        signals + 0.5,
    )?;
    for _ in 0..config.tries {
        catches.fill(simulate_catches(rng, config.signals, config.efficiency) as f64);
    }

    let tries = config.tries as f64;
    let mut rows = Vec::new();
    let mut chi_square = 0.0;
    let mut used_bins = 0_usize;
    for (detected, observed) in (0..=config.signals).zip(catches.contents()) {
        let expected = tries * distributions::binomial(detected, config.signals, config.efficiency)?;
        if expected > 0.0 {
            chi_square += (observed - expected).powi(2) / expected;
            used_bins += 1;
        }
        rows.push(CatchRow {
            detected,
            observed: *observed,
            expected,
        });
    }
    // the total is fixed by the number of tries
    let ndf = used_bins.saturating_sub(1);
    Ok(Report {
        config: config.clone(),
        layouts,
        catches,
        rows,
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
    fn test_layer_efficiency_for_99_percent() {
        let config = Config::default();
        let three = layout(&config, 3).unwrap();
        assert_relative_eq!(three.layer_efficiency.unwrap(), 0.99f64.cbrt(), epsilon = 1e-10);
        // more layers relax the single-layer requirement
        let four = layout(&config, 4).unwrap().layer_efficiency.unwrap();
        let five = layout(&config, 5).unwrap().layer_efficiency.unwrap();
        assert!(five < four && four < three.layer_efficiency.unwrap());
        assert_eq!(three.curve.len(), 101);
        assert_eq!(three.curve[100], (1.0, 1.0));
    }

    #[test]
    fn test_impossible_layout() {
        let config = Config::default();
        assert!(matches!(
            layout(&config, 2),
            Err(ExperimentError::Config { .. })
        ));
    }

    #[test]
    fn test_simulation_follows_binomial() {
        let mut rng = Pcg32::seed_from_u64(12);
        let config = Config {
            tries: 20_000,
            ..Config::default()
        };
        let report = run(&config, &mut rng).unwrap();
        assert_eq!(report.catches.integral(), 20_000.0);
        assert_relative_eq!(report.catches.mean(), 9.0, epsilon = 0.05);
        assert_eq!(report.ndf, 15);
        for row in report.rows.iter().filter(|row| row.expected > 50.0) {
            assert!(
                (row.observed - row.expected).abs() < 5.0 * row.expected.sqrt(),
                "{row:?}"
            );
        }
    }
}
