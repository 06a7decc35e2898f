//! Binomial counting of detected particles against its Poisson limit.
//!
//! With `n = 2¹²` particles detected with probability `p = 0.989`, the binomial
//! table is built by recursion from `k = n` down. The naive forward recursion
//! from `(1 − p)ⁿ` is computed alongside and underflows to nothing.

use serde::{Deserialize, Serialize};
use statlab_stats::distributions;

use crate::ExperimentError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub n: u64,
    pub p: f64,
    /// Half-width of the reported window in units of `int(√(np))`.
    pub window_sigmas: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            n: 1 << 12,
            p: 0.989,
            window_sigmas: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Row {
    pub k: u64,
    pub binomial: f64,
    pub poisson: f64,
    pub forward: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub config: Config,
    pub mean: f64,
    /// End the recursion starts from: `0` when `p ≤ ½`, otherwise `n`.
    pub start_k: u64,
    /// `P(start_k)`, i.e. `(1 − p)ⁿ` or `pⁿ`.
    pub start_value: f64,
    pub rows: Vec<Row>,
    pub binomial_window_sum: f64,
    pub poisson_window_sum: f64,
    pub binomial_total: f64,
    pub forward_total: f64,
    /// Largest relative difference between the recursion and the closed form
    /// inside the window.
    pub max_recursion_deviation: f64,
}

impl Report {
    #[must_use]
    pub fn forward_underflows(&self) -> bool {
        self.forward_total == 0.0 || !self.forward_total.is_finite()
    }
}

#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn run(config: &Config) -> Result<Report, ExperimentError> {
    let binomial = distributions::binomial_table(config.n, config.p)?;
    let forward = distributions::binomial_table_forward(config.n, config.p)?;
    let mean = config.n as f64 * config.p;
    let half_width = config.window_sigmas * mean.sqrt() as u64;
    let centre = mean.floor() as u64;
    let low = centre.saturating_sub(half_width);
    let high = (centre + half_width).min(config.n);
    let poisson = distributions::poisson_table(mean, high)?;
    let start_k = if config.p <= 0.5 { 0 } else { config.n };

    let mut rows = Vec::new();
    let mut max_recursion_deviation = 0.0_f64;
    for k in low..=high {
        let idx = k as usize;
        let exact = distributions::binomial(k, config.n, config.p)?;
        if exact > 0.0 {
            max_recursion_deviation =
                max_recursion_deviation.max((binomial[idx] - exact).abs() / exact);
        }
        rows.push(Row {
            k,
            binomial: binomial[idx],
            poisson: poisson[idx],
            forward: forward[idx],
        });
    }
    let forward_total = forward.iter().sum::<f64>();
    if forward_total == 0.0 {
        log::info!(
            "forward recursion underflows: (1 - p)^n = {:e}",
            (1.0 - config.p).powf(config.n as f64)
        );
    }

    Ok(Report {
        config: config.clone(),
        mean,
        start_k,
        start_value: binomial[start_k as usize],
        binomial_window_sum: rows.iter().map(|r| r.binomial).sum(),
        poisson_window_sum: rows.iter().map(|r| r.poisson).sum(),
        rows,
        binomial_total: binomial.iter().sum(),
        forward_total,
        max_recursion_deviation,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_default_detector() {
        let report = run(&Config::default()).unwrap();
        assert_relative_eq!(report.binomial_total, 1.0, epsilon = 1e-9);
        assert_eq!(report.start_k, 4096);
        assert_relative_eq!(report.start_value, 0.989f64.powi(4096), max_relative = 1e-9);
        assert!(report.forward_underflows());
        assert!(report.max_recursion_deviation < 1e-7);
        // the binomial is much narrower than the Poisson law of the same mean
        assert!(report.binomial_window_sum > 0.999_999);
        assert!(report.poisson_window_sum < 0.999);
        assert_eq!(report.rows.len(), 379);
    }

    #[test]
    fn test_small_detector_agrees_both_ways() {
        let config = Config {
            n: 20,
            p: 0.3,
            window_sigmas: 3,
        };
        let report = run(&config).unwrap();
        assert!(!report.forward_underflows());
        assert_eq!(report.start_k, 0);
        assert_relative_eq!(report.start_value, 0.7f64.powi(20), max_relative = 1e-12);
        for row in &report.rows {
            assert_relative_eq!(row.binomial, row.forward, max_relative = 1e-12);
        }
    }
}
