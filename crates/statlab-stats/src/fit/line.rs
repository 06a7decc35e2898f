use serde::Serialize;

use super::FitError;

/// Unweighted least-squares straight line `y = slope · x + intercept`.
///
/// The estimators are the closed forms `slope = cov(x, y) / var(x)` and
/// `intercept = ȳ − slope · x̄`. The χ² is accumulated point by point from the
/// residuals rather than from moment formulas, which cancel badly when the data
/// sit far from the origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    /// Standard error of the slope, from the residual variance.
    pub slope_error: f64,
    /// Standard error of the intercept, from the residual variance.
    pub intercept_error: f64,
    /// Sum of squared residuals.
    pub chi_square: f64,
    pub ndf: usize,
}

impl LineFit {
    /// Fits a line through `(xs[i], ys[i])`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use statlab_stats::fit::LineFit;
    /// let fit = LineFit::from_points(&[1.0, 2.0, 3.0], &[2.0, 2.0, 5.0]).unwrap();
    /// assert!((fit.slope - 1.5).abs() < 1e-12);
    /// assert_eq!(fit.ndf, 1);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    pub fn from_points(xs: &[f64], ys: &[f64]) -> Result<Self, FitError> {
        if xs.len() != ys.len() {
            return Err(FitError::LengthMismatch {
                x_len: xs.len(),
                y_len: ys.len(),
            });
        }
        if xs.len() < 3 {
            return Err(FitError::TooFewPoints {
                needed: 3,
                got: xs.len(),
            });
        }

        let n = xs.len() as f64;
        let mean_x = xs.iter().sum::<f64>() / n;
        let mean_y = ys.iter().sum::<f64>() / n;
        let (mut sxx, mut sxy) = (0.0, 0.0);
        for (x, y) in xs.iter().zip(ys) {
            sxx += (x - mean_x) * (x - mean_x);
            sxy += (x - mean_x) * (y - mean_y);
        }
        if sxx == 0.0 {
            return Err(FitError::Singular);
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;
        let chi_square = xs
            .iter()
            .zip(ys)
            .map(|(x, y)| (y - slope * x - intercept).powi(2))
            .sum::<f64>();
        let ndf = xs.len() - 2;
        let residual_variance = chi_square / ndf as f64;
        let mean_x2 = xs.iter().map(|x| x * x).sum::<f64>() / n;

        Ok(Self {
            slope,
            intercept,
            slope_error: (residual_variance / sxx).sqrt(),
            intercept_error: (residual_variance * mean_x2 / sxx).sqrt(),
            chi_square,
            ndf,
        })
    }

    #[must_use]
    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn reduced_chi_square(&self) -> f64 {
        self.chi_square / self.ndf as f64
    }

    /// Expected spread `sqrt(2 / ndf)` of the reduced χ² around one.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn expected_reduced_spread(&self) -> f64 {
        (2.0 / self.ndf as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_exact_line() {
        let xs = [1990.0, 1991.0, 1992.0, 1993.0];
        let ys: Vec<f64> = xs.iter().map(|x| 0.02 * x - 30.0).collect();
        let fit = LineFit::from_points(&xs, &ys).unwrap();
        assert_relative_eq!(fit.slope, 0.02, max_relative = 1e-9);
        assert_relative_eq!(fit.eval(1995.0), 0.02 * 1995.0 - 30.0, max_relative = 1e-9);
        assert!(fit.chi_square < 1e-18);
        assert_relative_eq!(fit.expected_reduced_spread(), 1.0);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            LineFit::from_points(&[1.0, 2.0], &[1.0]),
            Err(FitError::LengthMismatch { .. })
        ));
        assert!(matches!(
            LineFit::from_points(&[1.0, 2.0], &[1.0, 2.0]),
            Err(FitError::TooFewPoints { .. })
        ));
        assert_eq!(
            LineFit::from_points(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]),
            Err(FitError::Singular)
        );
    }
}
