use nalgebra::SMatrix;

/// Sample covariance matrix of `D`-dimensional samples (population normalisation, `1/n`).
///
/// Computed by the direct double loop over components,
/// `C[i][j] = Σ (xᵢ − x̄ᵢ)(xⱼ − x̄ⱼ) / n`. Returns `None` for an empty sample.
///
/// # Examples
///
/// ```
/// # use statlab_stats::covariance::covariance_matrix;
/// let cov = covariance_matrix(&[[0.0, 0.0], [2.0, 4.0]]).unwrap();
/// assert_eq!(cov[(0, 0)], 1.0);
/// assert_eq!(cov[(0, 1)], 2.0);
/// assert_eq!(cov[(1, 1)], 4.0);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn covariance_matrix<const D: usize>(samples: &[[f64; D]]) -> Option<SMatrix<f64, D, D>> {
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as f64;
    let mut means = [0.0; D];
    for sample in samples {
        for (mean, value) in means.iter_mut().zip(sample) {
            *mean += value / n;
        }
    }

    let mut cov = SMatrix::<f64, D, D>::zeros();
    for i in 0..D {
        for j in 0..D {
            cov[(i, j)] = samples
                .iter()
                .map(|s| (s[i] - means[i]) * (s[j] - means[j]))
                .sum::<f64>()
                / n;
        }
    }
    Some(cov)
}

/// Correlation coefficient `C[i][j] / sqrt(C[i][i]·C[j][j])`.
#[must_use]
pub fn correlation<const D: usize>(cov: &SMatrix<f64, D, D>, i: usize, j: usize) -> f64 {
    cov[(i, j)] / (cov[(i, i)] * cov[(j, j)]).sqrt()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng as _;
    use rand_distr::{Distribution as _, Normal};
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_empty() {
        assert!(covariance_matrix::<2>(&[]).is_none());
    }

    #[test]
    fn test_correlated_gaussians() {
        let mut rng = Pcg32::seed_from_u64(11);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let samples: Vec<[f64; 2]> = (0..50_000)
            .map(|_| {
                let a: f64 = normal.sample(&mut rng);
                let b: f64 = normal.sample(&mut rng);
                [a, 0.6 * a + 0.8 * b]
            })
            .collect();
        let cov = covariance_matrix(&samples).unwrap();
        assert_relative_eq!(cov[(0, 1)], cov[(1, 0)]);
        assert_relative_eq!(correlation(&cov, 0, 1), 0.6, epsilon = 0.02);
        assert_relative_eq!(cov[(1, 1)], 1.0, epsilon = 0.03);
    }
}
