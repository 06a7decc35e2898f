use serde::Serialize;

/// Descriptive statistics summarizing a dataset.
///
/// This structure contains common measures of central tendency, dispersion,
/// and spread for a dataset of `f64` values. The variance is the population
/// variance (divided by `n`).
#[derive(Debug, Clone, Serialize)]
pub struct DescriptiveStats {
    /// The minimum value in the dataset.
    pub min: f64,
    /// The maximum value in the dataset.
    pub max: f64,
    /// The arithmetic mean (average) of the dataset.
    pub mean: f64,
    /// The median value of the dataset.
    pub median: f64,
    /// The variance of the dataset.
    pub variance: f64,
    /// The standard deviation of the dataset.
    pub std_dev: f64,
    /// The normalized standard deviation (`std_dev / range`).
    pub normalized_std_dev: f64,
}

impl DescriptiveStats {
    /// Computes descriptive statistics from unsorted values.
    ///
    /// This method will sort the values internally before computing statistics.
    ///
    /// # Arguments
    ///
    /// * `values` - An iterator over `f64` values. The values will be collected and sorted internally.
    ///
    /// # Returns
    ///
    /// * `Some(DescriptiveStats)` - if the dataset contains at least one value
    /// * `None` - if the dataset is empty
    ///
    /// # Examples
    ///
    /// ```
    /// # use statlab_stats::descriptive::DescriptiveStats;
    /// let values = [5.0, 2.0, 4.0, 1.0, 3.0];
    /// let stats = DescriptiveStats::new(values).unwrap();
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.max, 5.0);
    /// assert_eq!(stats.mean, 3.0);
    /// assert_eq!(stats.median, 3.0);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Computes descriptive statistics from pre-sorted values.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// # use statlab_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::from_sorted(&[1.0, 2.0, 3.0, 4.0]).unwrap();
    /// assert_eq!(stats.median, 2.5);
    /// assert_eq!(stats.variance, 1.25);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let min = *sorted_values.first()?;
        let max = *sorted_values.last()?;
        let n = sorted_values.len() as f64;
        let mean = sorted_values.iter().sum::<f64>() / n;
        let mid = sorted_values.len() / 2;
        let median = if sorted_values.len() % 2 == 0 {
            0.5 * (sorted_values[mid - 1] + sorted_values[mid])
        } else {
            sorted_values[mid]
        };
        let variance = two_pass_variance(sorted_values);
        let std_dev = variance.sqrt();
        let normalized_std_dev = if (max - min).abs() < mean.abs() * f64::EPSILON {
            0.0
        } else {
            std_dev / (max - min)
        };

        Some(Self {
            min,
            max,
            mean,
            median,
            variance,
            std_dev,
            normalized_std_dev,
        })
    }
}

/// Arithmetic mean, `None` for an empty slice.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Unbiased sample variance `Σ(x − x̄)² / (n − 1)`; `None` for fewer than two values.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    Some(two_pass_variance(values) * n / (n - 1.0))
}

/// Standard error of the mean, `s / sqrt(n)`.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn std_error_of_mean(values: &[f64]) -> Option<f64> {
    let variance = sample_variance(values)?;
    Some((variance / values.len() as f64).sqrt())
}

/// Mean of the squares `Σx² / n`.
///
/// This is the "bad" variance estimator: it ignores the mean, so it only agrees
/// with the variance for zero-mean data.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn mean_of_squares(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|x| x * x).sum::<f64>() / values.len() as f64
}

/// Two-pass population variance `Σ(x − x̄)² / n`.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn two_pass_variance(values: &[f64]) -> f64 {
    let Some(mean) = mean(values) else {
        return 0.0;
    };
    values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population variance as `Σ(x² − x̄²) / n`, i.e. `E[x²] − x̄²`.
///
/// Mathematically equal to [`two_pass_variance`] but subtracts two large
/// numbers, losing precision when the mean dominates the spread.
#[must_use]
pub fn difference_of_squares_variance(values: &[f64]) -> f64 {
    let Some(mean) = mean(values) else {
        return 0.0;
    };
    mean_of_squares(values) - mean * mean
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_new_empty() {
        assert!(DescriptiveStats::new(Vec::<f64>::new()).is_none());
    }

    #[test]
    fn test_single_value() {
        let stats = DescriptiveStats::new([4.2]).unwrap();
        assert_eq!(stats.min, 4.2);
        assert_eq!(stats.median, 4.2);
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.normalized_std_dev, 0.0);
    }

    #[test]
    #[should_panic(expected = "values must be sorted")]
    fn test_from_sorted_rejects_unsorted() {
        let _ = DescriptiveStats::from_sorted(&[2.0, 1.0]);
    }

    #[test]
    fn test_variance_formulas_agree_on_easy_data() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(two_pass_variance(&values), 2.0);
        assert_relative_eq!(difference_of_squares_variance(&values), 2.0, epsilon = 1e-12);
        assert_relative_eq!(mean_of_squares(&values), 11.0);
        assert_relative_eq!(sample_variance(&values).unwrap(), 2.5);
        assert_relative_eq!(std_error_of_mean(&values).unwrap(), 0.5_f64.sqrt());
    }

    #[test]
    fn test_difference_of_squares_loses_precision_with_large_offset() {
        let values = [1e9 + 1.0, 1e9 + 2.0, 1e9 + 3.0];
        let good = two_pass_variance(&values);
        let bad = difference_of_squares_variance(&values);
        assert_relative_eq!(good, 2.0 / 3.0, epsilon = 1e-6);
        assert!((bad - good).abs() > 1e-3);
    }
}
