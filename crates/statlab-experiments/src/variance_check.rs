//! Three ways of computing a variance, only one of which is right.

use rand::Rng;
use serde::{Deserialize, Serialize};
use statlab_stats::descriptive;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub size: usize,
    /// Values are uniform on `[0, scale]`.
    pub scale: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            size: 100_000,
            scale: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub config: Config,
    pub mean: f64,
    /// `Σx²/n`, forgetting the mean.
    pub bad: f64,
    /// `Σ(x − x̄)²/n`.
    pub good: f64,
    /// `Σ(x² − x̄²)/n`, equal to the good one up to rounding.
    pub dont_know: f64,
    /// `scale²/12`.
    pub expected: f64,
}

pub fn run<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Report {
    let data = (0..config.size)
        .map(|_| config.scale * rng.random::<f64>())
        .collect::<Vec<_>>();
    Report {
        config: config.clone(),
        mean: descriptive::mean(&data).unwrap_or(f64::NAN),
        bad: descriptive::mean_of_squares(&data),
        good: descriptive::two_pass_variance(&data),
        dont_know: descriptive::difference_of_squares_variance(&data),
        expected: config.scale * config.scale / 12.0,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_bad_formula_is_off_by_the_squared_mean() {
        let mut rng = Pcg32::seed_from_u64(10);
        let report = run(&Config::default(), &mut rng);
        assert_relative_eq!(report.good, report.expected, max_relative = 0.02);
        assert_relative_eq!(report.dont_know, report.good, max_relative = 1e-9);
        assert_relative_eq!(
            report.bad,
            report.good + report.mean * report.mean,
            max_relative = 1e-9
        );
    }
}
