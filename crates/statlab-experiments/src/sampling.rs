//! Samplers that `rand_distr` does not provide.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Laplace (double exponential) law with location `mu` and scale `b`,
/// sampled by inverting its CDF.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Laplace {
    mu: f64,
    b: f64,
}

impl Laplace {
    /// Returns `None` unless `b` is positive and finite.
    #[must_use]
    pub fn new(mu: f64, b: f64) -> Option<Self> {
        (b > 0.0 && b.is_finite() && mu.is_finite()).then_some(Self { mu, b })
    }
}

impl Distribution<f64> for Laplace {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        loop {
            let u = rng.random::<f64>() - 0.5;
            if u > -0.5 {
                return self.mu - self.b * u.signum() * (1.0 - 2.0 * u.abs()).ln();
            }
        }
    }
}

/// Moyal law, a closed-form approximation of the Landau energy-loss
/// distribution: `mpv − width · ln Z²` with `Z ~ N(0, 1)`.
///
/// The most probable value is `mpv`; the right tail is long.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moyal {
    mpv: f64,
    width: f64,
}

impl Moyal {
    /// Returns `None` unless `width` is positive and finite.
    #[must_use]
    pub fn new(mpv: f64, width: f64) -> Option<Self> {
        (width > 0.0 && width.is_finite() && mpv.is_finite()).then_some(Self { mpv, width })
    }
}

impl Distribution<f64> for Moyal {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        loop {
            let z: f64 = StandardNormal.sample(rng);
            if z != 0.0 {
                return self.mpv - self.width * (z * z).ln();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;
    use statlab_stats::descriptive::DescriptiveStats;

    use super::*;

    #[test]
    fn test_laplace_moments() {
        let mut rng = Pcg32::seed_from_u64(5);
        let b = 0.5 / 2f64.sqrt();
        let laplace = Laplace::new(1.0, b).unwrap();
        let values: Vec<f64> = (0..200_000).map(|_| laplace.sample(&mut rng)).collect();
        let stats = DescriptiveStats::new(values.iter().copied()).unwrap();
        assert_relative_eq!(stats.mean, 1.0, epsilon = 0.01);
        // variance of a Laplace law is 2b²
        assert_relative_eq!(stats.variance, 2.0 * b * b, max_relative = 0.03);
        assert_relative_eq!(stats.median, 1.0, epsilon = 0.01);
    }

    #[test]
    fn test_moyal_peaks_at_mpv() {
        let mut rng = Pcg32::seed_from_u64(9);
        let moyal = Moyal::new(100.0, 20.0).unwrap();
        let mut histogram =
            statlab_stats::histogram::Histogram::new(60, 0.0, 300.0).unwrap();
        for _ in 0..200_000 {
            histogram.fill(moyal.sample(&mut rng));
        }
        let peak = histogram.bin_center(histogram.maximum_bin());
        assert!((peak - 100.0).abs() <= 10.0, "peak at {peak}");
        // long right tail
        assert!(histogram.mean() > peak);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(Laplace::new(0.0, 0.0).is_none());
        assert!(Moyal::new(f64::NAN, 1.0).is_none());
    }
}
