//! Bortkiewicz's deaths by horse kick in the Prussian army, compared with a
//! Poisson law whose mean is taken from the data.

use serde::{Deserialize, Serialize};
use statlab_stats::{distributions, histogram::Histogram, special};

use crate::ExperimentError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of corps-years with `k` deaths, for `k = 0, 1, ...`.
    pub deaths: Vec<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            deaths: vec![109.0, 65.0, 22.0, 3.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Row {
    pub deaths: u64,
    pub observed: f64,
    pub expected: f64,
    pub error: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub config: Config,
    pub histogram: Histogram,
    /// Histogram mean, used as the Poisson mean.
    pub lambda: f64,
    /// Histogram integral, used as the normalisation.
    pub normalisation: f64,
    pub rows: Vec<Row>,
    /// Pearson χ² of the observed counts against the expectation.
    pub chi_square: f64,
    pub ndf: usize,
    pub probability: f64,
}

#[expect(clippy::cast_precision_loss)]
pub fn run(config: &Config) -> Result<Report, ExperimentError> {
    let len = config.deaths.len();
    let mut histogram = Histogram::new(len + 1, -0.5, len as f64 + 0.5)?;
    for (k, &count) in config.deaths.iter().enumerate() {
        histogram.fill_weighted(k as f64, count);
    }
    let lambda = histogram.mean();
    let normalisation = histogram.integral();

    let mut rows = Vec::with_capacity(len);
    let mut chi_square = 0.0;
    for (k, &observed) in (0_u64..).zip(&config.deaths) {
        let expected = normalisation * distributions::poisson(k, lambda)?;
        if expected > 0.0 {
            chi_square += (observed - expected).powi(2) / expected;
        }
        rows.push(Row {
            deaths: k,
            observed,
            expected,
            error: expected.sqrt(),
        });
    }
    // the mean and the normalisation come from the data
    let ndf = len.saturating_sub(2);
    Ok(Report {
        config: config.clone(),
        histogram,
        lambda,
        normalisation,
        rows,
        chi_square,
        ndf,
        probability: special::chi_square_probability(chi_square, ndf),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_bortkiewicz_data() {
        let report = run(&Config::default()).unwrap();
        assert_eq!(report.normalisation, 200.0);
        assert_relative_eq!(report.lambda, 0.61, epsilon = 1e-12);
        assert_relative_eq!(report.rows[0].expected, 108.67, epsilon = 0.01);
        assert_relative_eq!(report.rows[1].expected, 66.29, epsilon = 0.01);
        // the classic example of a good Poisson fit
        assert!(report.chi_square < 1.0);
        assert!(report.probability > 0.5);
    }

    #[test]
    fn test_empty_table() {
        let report = run(&Config { deaths: vec![] }).unwrap();
        assert!(report.rows.is_empty());
        assert_eq!(report.ndf, 0);
    }
}
