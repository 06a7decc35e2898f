use std::ops::Range;

use serde::Serialize;

/// Errors raised when a histogram cannot be constructed.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum HistogramError {
    #[display("histogram needs at least one bin")]
    NoBins,
    #[display("invalid histogram range [{low}, {high})")]
    InvalidRange { low: f64, high: f64 },
    #[display("bin resolution must be positive and finite, got {resolution}")]
    InvalidResolution { resolution: f64 },
    #[display("cannot derive histogram bounds from an empty dataset")]
    EmptyData,
}

/// A fixed-width one-dimensional histogram.
///
/// The range `[low, high)` is divided into `num_bins` bins of equal width. Values
/// below `low` go to the underflow counter, values at or above `high` go to the
/// overflow counter. Each bin keeps its content (sum of weights) and the sum of
/// squared weights, so that `error(bin) = sqrt(Σw²)`.
///
/// Besides the bin contents, the histogram accumulates the exact fill statistics
/// (`Σw`, `Σw·x`, `Σw·x²`) of in-range fills. [`Histogram::mean`] and
/// [`Histogram::std_dev`] use these when available, which makes them independent of
/// the binning. Editing a bin directly with [`Histogram::set_content`] discards the
/// fill statistics and the moments fall back to bin centres.
///
/// # Examples
///
/// ```
/// use statlab_stats::histogram::Histogram;
///
/// let mut histogram = Histogram::new(4, 0.0, 4.0).unwrap();
/// for x in [0.5, 1.5, 1.7, 3.2, 9.0] {
///     histogram.fill(x);
/// }
/// assert_eq!(histogram.contents(), &[1.0, 2.0, 0.0, 1.0]);
/// assert_eq!(histogram.overflow(), 1.0);
/// assert_eq!(histogram.maximum_bin(), 1);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Histogram {
    low: f64,
    high: f64,
    contents: Vec<f64>,
    #[serde(skip)]
    sum_w2: Vec<f64>,
    underflow: f64,
    overflow: f64,
    entries: u64,
    #[serde(skip)]
    stats: Option<FillStats>,
}

#[derive(Debug, Clone, Copy, Default)]
struct FillStats {
    sum_w: f64,
    sum_wx: f64,
    sum_wx2: f64,
}

/// A single bin as seen through [`Histogram::bins`].
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    /// The range of values covered by this bin (inclusive start, exclusive end).
    pub range: Range<f64>,
    /// Sum of the weights that fell into this bin.
    pub content: f64,
    /// Statistical error of the content.
    pub error: f64,
}

impl HistogramBin {
    #[must_use]
    pub fn center(&self) -> f64 {
        0.5 * (self.range.start + self.range.end)
    }
}

impl Histogram {
    /// Creates an empty histogram with `num_bins` equal bins over `[low, high)`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use statlab_stats::histogram::Histogram;
    /// let histogram = Histogram::new(16, -0.5, 15.5).unwrap();
    /// assert_eq!(histogram.bin_width(), 1.0);
    /// assert_eq!(histogram.bin_center(3), 3.0);
    /// assert!(Histogram::new(0, 0.0, 1.0).is_err());
    /// ```
    pub fn new(num_bins: usize, low: f64, high: f64) -> Result<Self, HistogramError> {
        if num_bins == 0 {
            return Err(HistogramError::NoBins);
        }
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(HistogramError::InvalidRange { low, high });
        }
        Ok(Self {
            low,
            high,
            contents: vec![0.0; num_bins],
            sum_w2: vec![0.0; num_bins],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
            stats: Some(FillStats::default()),
        })
    }

    /// Creates a histogram whose bin width equals `resolution` and fills it with `values`.
    ///
    /// The first bin is centred on the smallest value and the last bin on the largest
    /// one, so the number of bins is `(max - min) / resolution + 1`. This is how a
    /// detector with finite resolution bins its readings.
    ///
    /// # Examples
    ///
    /// ```
    /// # use statlab_stats::histogram::Histogram;
    /// let histogram = Histogram::from_values(&[3.6, 3.8, 4.0, 3.8], 0.1).unwrap();
    /// assert_eq!(histogram.num_bins(), 5);
    /// assert_eq!(histogram.integral(), 4.0);
    /// assert_eq!(histogram.maximum_bin(), 2);
    /// ```
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_values(values: &[f64], resolution: f64) -> Result<Self, HistogramError> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(HistogramError::InvalidResolution { resolution });
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !min.is_finite() || !max.is_finite() {
            return Err(HistogramError::EmptyData);
        }

        // Rounding keeps 3.6..7.0 at 0.1 from losing a bin to 33.999...
        let num_bins = ((max - min) / resolution).round() as usize + 1;
        let low = min - 0.5 * resolution;
        let high = low + resolution * num_bins as f64;
        let mut histogram = Self::new(num_bins, low, high)?;
        for &value in values {
            histogram.fill(value);
        }
        Ok(histogram)
    }

    #[must_use]
    pub fn num_bins(&self) -> usize {
        self.contents.len()
    }

    #[must_use]
    pub fn low(&self) -> f64 {
        self.low
    }

    #[must_use]
    pub fn high(&self) -> f64 {
        self.high
    }

    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn bin_width(&self) -> f64 {
        (self.high - self.low) / self.num_bins() as f64
    }

    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn bin_low_edge(&self, bin: usize) -> f64 {
        self.low + bin as f64 * self.bin_width()
    }

    #[must_use]
    pub fn bin_center(&self, bin: usize) -> f64 {
        self.bin_low_edge(bin) + 0.5 * self.bin_width()
    }

    #[must_use]
    pub fn bin_range(&self, bin: usize) -> Range<f64> {
        self.bin_low_edge(bin)..self.bin_low_edge(bin + 1)
    }

    /// Returns the index of the bin containing `x`, or `None` for out-of-range values.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        if x.is_nan() || x < self.low || x >= self.high {
            return None;
        }
        let idx = ((x - self.low) / self.bin_width()).floor() as usize;
        // x just below `high` may round up to num_bins
        Some(idx.min(self.num_bins() - 1))
    }

    /// Adds one entry with unit weight.
    pub fn fill(&mut self, x: f64) {
        self.fill_weighted(x, 1.0);
    }

    /// Adds one entry with weight `w`.
    ///
    /// NaN values are counted as entries but land in no bin.
    pub fn fill_weighted(&mut self, x: f64, w: f64) {
        self.entries += 1;
        match self.find_bin(x) {
            Some(bin) => {
                self.contents[bin] += w;
                self.sum_w2[bin] += w * w;
                if let Some(stats) = &mut self.stats {
                    stats.sum_w += w;
                    stats.sum_wx += w * x;
                    stats.sum_wx2 += w * x * x;
                }
            }
            None if x < self.low => self.underflow += w,
            None if x >= self.high => self.overflow += w,
            None => {}
        }
    }

    /// Overwrites the content of a bin.
    ///
    /// The bin error is reset to `sqrt(|value|)`; use [`Histogram::set_error`]
    /// afterwards to assign a different one.
    pub fn set_content(&mut self, bin: usize, value: f64) {
        self.contents[bin] = value;
        self.sum_w2[bin] = value.abs();
        self.stats = None;
    }

    pub fn set_error(&mut self, bin: usize, error: f64) {
        self.sum_w2[bin] = error * error;
    }

    #[must_use]
    pub fn content(&self, bin: usize) -> f64 {
        self.contents[bin]
    }

    #[must_use]
    pub fn error(&self, bin: usize) -> f64 {
        self.sum_w2[bin].sqrt()
    }

    #[must_use]
    pub fn contents(&self) -> &[f64] {
        &self.contents
    }

    #[must_use]
    pub fn underflow(&self) -> f64 {
        self.underflow
    }

    #[must_use]
    pub fn overflow(&self) -> f64 {
        self.overflow
    }

    /// Number of `fill` calls, including out-of-range ones.
    #[must_use]
    pub fn entries(&self) -> u64 {
        self.entries
    }

    pub fn bins(&self) -> impl Iterator<Item = HistogramBin> + '_ {
        (0..self.num_bins()).map(|bin| HistogramBin {
            range: self.bin_range(bin),
            content: self.content(bin),
            error: self.error(bin),
        })
    }

    /// Sum of the in-range bin contents.
    #[must_use]
    pub fn integral(&self) -> f64 {
        self.contents.iter().sum()
    }

    /// Mean of the filled values.
    ///
    /// Uses the exact fill statistics when they are available and falls back to
    /// [`Histogram::binned_mean`] otherwise. Returns `0.0` for an empty histogram.
    #[must_use]
    pub fn mean(&self) -> f64 {
        match self.stats {
            Some(stats) if stats.sum_w != 0.0 => stats.sum_wx / stats.sum_w,
            Some(_) => 0.0,
            None => self.binned_mean(),
        }
    }

    /// Standard deviation (RMS around the mean) of the filled values.
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        match self.stats {
            Some(stats) if stats.sum_w != 0.0 => {
                let mean = stats.sum_wx / stats.sum_w;
                (stats.sum_wx2 / stats.sum_w - mean * mean).max(0.0).sqrt()
            }
            Some(_) => 0.0,
            None => self.binned_std_dev(),
        }
    }

    /// Mean computed from bin centres weighted by bin contents.
    #[must_use]
    pub fn binned_mean(&self) -> f64 {
        let norm = self.integral();
        if norm == 0.0 {
            return 0.0;
        }
        self.bins().map(|bin| bin.center() * bin.content).sum::<f64>() / norm
    }

    #[must_use]
    pub fn binned_std_dev(&self) -> f64 {
        let norm = self.integral();
        if norm == 0.0 {
            return 0.0;
        }
        let mean = self.binned_mean();
        let second = self
            .bins()
            .map(|bin| (bin.center() - mean).powi(2) * bin.content)
            .sum::<f64>();
        (second / norm).max(0.0).sqrt()
    }

    /// Index of the first bin holding the maximum content.
    #[must_use]
    pub fn maximum_bin(&self) -> usize {
        self.contents
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |(best, max), (bin, &content)| {
                if content > max {
                    (bin, content)
                } else {
                    (best, max)
                }
            })
            .0
    }

    /// Index of the median bin: the number of leading bins whose cumulative content
    /// stays at or below half of the integral.
    #[must_use]
    pub fn median_bin(&self) -> usize {
        let half = 0.5 * self.integral();
        let mut running = 0.0;
        for (bin, content) in self.contents.iter().enumerate() {
            running += content;
            if running > half {
                return bin;
            }
        }
        self.num_bins() - 1
    }

    /// Returns a histogram whose bins hold the running sum of this one.
    #[must_use]
    pub fn cumulative(&self) -> Self {
        let mut cumulative = self.clone();
        let mut running = 0.0;
        for (bin, content) in self.contents.iter().enumerate() {
            running += content;
            cumulative.contents[bin] = running;
            cumulative.sum_w2[bin] = running.abs();
        }
        cumulative.stats = None;
        cumulative
    }

    /// Returns a copy with every content multiplied by `factor` (errors scale alike).
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        let mut scaled = self.clone();
        for (content, w2) in scaled.contents.iter_mut().zip(&mut scaled.sum_w2) {
            *content *= factor;
            *w2 *= factor * factor;
        }
        scaled.underflow *= factor;
        scaled.overflow *= factor;
        if let Some(stats) = &mut scaled.stats {
            stats.sum_w *= factor;
            stats.sum_wx *= factor;
            stats.sum_wx2 *= factor;
        }
        scaled
    }

    /// Returns a copy normalised to unit area, comparable with a probability density.
    #[must_use]
    pub fn density(&self) -> Self {
        let area = self.integral() * self.bin_width();
        if area == 0.0 {
            return self.clone();
        }
        self.scaled(1.0 / area)
    }

    /// Renders the histogram as a column of text bars, one line per bin.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    #[must_use]
    pub fn render_bars(&self, max_bar_width: usize) -> String {
        let max_content = self
            .contents
            .iter()
            .copied()
            .fold(0.0_f64, f64::max)
            .max(f64::MIN_POSITIVE);
        let mut out = String::new();
        for bin in self.bins() {
            let bar_width = ((bin.content.max(0.0) / max_content) * max_bar_width as f64) as usize;
            out.push_str(&format!(
                "{:>12.4} | {:<10.4} {}\n",
                bin.center(),
                bin.content,
                "#".repeat(bar_width)
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_invalid_construction() {
        assert_eq!(Histogram::new(0, 0.0, 1.0).unwrap_err(), HistogramError::NoBins);
        assert!(matches!(
            Histogram::new(10, 1.0, 1.0),
            Err(HistogramError::InvalidRange { .. })
        ));
        assert!(Histogram::new(10, f64::NAN, 1.0).is_err());
        assert!(Histogram::from_values(&[], 0.1).is_err());
        assert!(Histogram::from_values(&[1.0], 0.0).is_err());
    }

    #[test]
    fn test_fill_edges() {
        let mut histogram = Histogram::new(2, 0.0, 2.0).unwrap();
        histogram.fill(0.0);
        histogram.fill(1.0);
        histogram.fill(2.0);
        histogram.fill(-0.1);
        histogram.fill(f64::NAN);
        assert_eq!(histogram.contents(), &[1.0, 1.0]);
        assert_eq!(histogram.underflow(), 1.0);
        assert_eq!(histogram.overflow(), 1.0);
        assert_eq!(histogram.entries(), 5);
    }

    #[test]
    fn test_weighted_errors() {
        let mut histogram = Histogram::new(1, 0.0, 1.0).unwrap();
        histogram.fill_weighted(0.5, 3.0);
        histogram.fill_weighted(0.5, 4.0);
        assert_relative_eq!(histogram.content(0), 7.0);
        assert_relative_eq!(histogram.error(0), 5.0);
    }

    #[test]
    fn test_mean_uses_exact_values() {
        let mut histogram = Histogram::new(1, 0.0, 10.0).unwrap();
        histogram.fill(1.0);
        histogram.fill(2.0);
        assert_relative_eq!(histogram.mean(), 1.5);
        assert_relative_eq!(histogram.std_dev(), 0.5);
        // bin centre is 5
        assert_relative_eq!(histogram.binned_mean(), 5.0);
    }

    #[test]
    fn test_set_content_switches_to_binned_moments() {
        let mut histogram = Histogram::new(3, -0.5, 2.5).unwrap();
        histogram.fill(2.0);
        histogram.set_content(0, 1.0);
        histogram.set_content(2, 1.0);
        histogram.set_error(2, 0.25);
        assert_relative_eq!(histogram.mean(), 1.0);
        assert_relative_eq!(histogram.std_dev(), 1.0);
        assert_relative_eq!(histogram.error(0), 1.0);
        assert_relative_eq!(histogram.error(2), 0.25);
    }

    #[test]
    fn test_median_and_cumulative() {
        let mut histogram = Histogram::new(4, 0.0, 4.0).unwrap();
        for (x, w) in [(0.5, 1.0), (1.5, 1.0), (2.5, 5.0), (3.5, 1.0)] {
            histogram.fill_weighted(x, w);
        }
        assert_eq!(histogram.median_bin(), 2);
        let cumulative = histogram.cumulative();
        assert_eq!(cumulative.contents(), &[1.0, 2.0, 7.0, 8.0]);
    }

    #[test]
    fn test_density_has_unit_area() {
        let mut histogram = Histogram::new(5, 0.0, 0.5).unwrap();
        for i in 0..50 {
            histogram.fill(f64::from(i) * 0.01);
        }
        let density = histogram.density();
        assert_relative_eq!(density.integral() * density.bin_width(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_from_values_centres_extremes() {
        let values = [3.8, 6.2, 4.5, 7.0, 3.6];
        let histogram = Histogram::from_values(&values, 0.1).unwrap();
        assert_eq!(histogram.num_bins(), 35);
        assert_relative_eq!(histogram.bin_center(0), 3.6, epsilon = 1e-9);
        assert_relative_eq!(histogram.bin_center(34), 7.0, epsilon = 1e-9);
        assert_relative_eq!(histogram.integral(), 5.0);
    }

    #[test]
    fn test_render_bars_has_one_line_per_bin() {
        let mut histogram = Histogram::new(3, 0.0, 3.0).unwrap();
        histogram.fill(1.5);
        let rendered = histogram.render_bars(10);
        assert_eq!(rendered.lines().count(), 3);
        assert!(rendered.lines().nth(1).unwrap().ends_with(&"#".repeat(10)));
    }
}
