//! Summary statistics of forty energies measured by a beam calorimeter.

use serde::{Deserialize, Serialize};
use statlab_stats::{
    descriptive,
    histogram::{Histogram, HistogramError},
};

use crate::ExperimentError;

/// Measured energies in GeV.
pub const ENERGIES: [f64; 40] = [
    3.8, 6.2, 4.5, 4.9, 4.5, 4.8, 6.8, 4.8, 7.0, 5.0, 4.6, 6.5, 5.1, 6.5, 6.2, 4.9, 4.8, 4.7, 4.9,
    3.8, 6.0, 4.6, 5.8, 5.0, 5.8, 4.9, 4.1, 4.9, 5.0, 4.6, 6.4, 4.0, 5.0, 3.6, 3.9, 3.6, 5.8, 4.3,
    5.6, 4.6,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub energies: Vec<f64>,
    /// Detector resolution, used as the bin width.
    pub resolution: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            energies: ENERGIES.to_vec(),
            resolution: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub config: Config,
    pub histogram: Histogram,
    pub cumulative: Histogram,
    pub mode: f64,
    pub mode_frequency: f64,
    pub median: f64,
    /// Mean over bin centres.
    pub binned_mean: f64,
    /// Mean of the raw values.
    pub data_mean: f64,
    /// Mean accumulated by the histogram while filling.
    pub histogram_mean: f64,
}

pub fn run(config: &Config) -> Result<Report, ExperimentError> {
    let histogram = Histogram::from_values(&config.energies, config.resolution)?;
    let mode_bin = histogram.maximum_bin();
    let data_mean = descriptive::mean(&config.energies).ok_or(HistogramError::EmptyData)?;
    Ok(Report {
        config: config.clone(),
        cumulative: histogram.cumulative(),
        mode: histogram.bin_center(mode_bin),
        mode_frequency: histogram.content(mode_bin),
        median: histogram.bin_center(histogram.median_bin()),
        binned_mean: histogram.binned_mean(),
        data_mean,
        histogram_mean: histogram.mean(),
        histogram,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_default_energies() {
        let report = run(&Config::default()).unwrap();
        assert_eq!(report.histogram.num_bins(), 35);
        // 4.9 appears five times
        assert_relative_eq!(report.mode, 4.9, epsilon = 1e-9);
        assert_eq!(report.mode_frequency, 5.0);
        assert_relative_eq!(report.median, 4.9, epsilon = 1e-9);
        assert_relative_eq!(report.data_mean, 5.045, epsilon = 1e-9);
        assert_relative_eq!(report.histogram_mean, report.data_mean, epsilon = 1e-9);
        assert_relative_eq!(report.binned_mean, report.data_mean, epsilon = 1e-9);
        assert_eq!(report.cumulative.content(34), 40.0);
    }

    #[test]
    fn test_empty_input() {
        let config = Config {
            energies: vec![],
            ..Config::default()
        };
        assert!(matches!(run(&config), Err(ExperimentError::Histogram(_))));
    }
}
