//! Charge spectrum read from a single-column text file, with and without a cut.

use serde::{Deserialize, Serialize};
use statlab_stats::histogram::{Histogram, HistogramError};

use crate::ExperimentError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bin_width: f64,
    /// Values strictly below the cut are kept in the filtered spectrum.
    pub cut: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bin_width: 0.5,
            cut: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Spectrum {
    pub histogram: Histogram,
    pub mean: f64,
    pub rms: f64,
}

impl Spectrum {
    fn new(histogram: Histogram) -> Self {
        Self {
            mean: histogram.mean(),
            rms: histogram.std_dev(),
            histogram,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub config: Config,
    pub count: usize,
    pub all: Spectrum,
    pub cut: Spectrum,
}

/// Spectrum of `charges` on `bins + 2` bins spanning one bin width past the extremes.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn run(config: &Config, charges: &[f64]) -> Result<Report, ExperimentError> {
    if config.bin_width.is_nan() || config.bin_width <= 0.0 {
        return Err(HistogramError::InvalidResolution {
            resolution: config.bin_width,
        }
        .into());
    }
    let min = charges.iter().copied().fold(f64::INFINITY, f64::min);
    let max = charges.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return Err(HistogramError::EmptyData.into());
    }

    let bins = ((max - min) / config.bin_width) as usize;
    let empty = Histogram::new(
        bins + 2,
        min - config.bin_width,
        max + config.bin_width,
    )?;
    let mut all = empty.clone();
    let mut cut = empty;
    for &charge in charges {
        all.fill(charge);
        if charge < config.cut {
            cut.fill(charge);
        }
    }
    log::debug!(
        "charge: {} values, {} below the cut",
        charges.len(),
        cut.entries()
    );
    Ok(Report {
        config: config.clone(),
        count: charges.len(),
        all: Spectrum::new(all),
        cut: Spectrum::new(cut),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_cut_removes_high_tail() {
        let charges = [10.0, 12.0, 14.0, 16.0, 45.0, 50.0];
        let report = run(&Config::default(), &charges).unwrap();
        assert_eq!(report.count, 6);
        assert_eq!(report.all.histogram.num_bins(), 82);
        assert_relative_eq!(report.all.mean, 147.0 / 6.0, epsilon = 1e-9);
        assert_relative_eq!(report.cut.mean, 13.0, epsilon = 1e-9);
        assert_relative_eq!(report.cut.rms, 5f64.sqrt(), epsilon = 1e-9);
        assert_eq!(report.cut.histogram.entries(), 4);
    }

    #[test]
    fn test_rejects_empty_input() {
        assert!(run(&Config::default(), &[]).is_err());
    }
}
