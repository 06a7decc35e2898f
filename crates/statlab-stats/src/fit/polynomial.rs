use nalgebra::{DMatrix, DVector};

use super::{DataPoint, FitError, FitResult, Model as _, PolynomialModel, check_points};

/// Weighted least-squares fit of a polynomial of the given degree.
///
/// Minimises `Σ ((y − p(x)) / σ)²` by solving the normal equations
/// `(AᵀA) β = Aᵀb` with rows of `A` and `b` scaled by `1/σ`. The parameter
/// covariance is `(AᵀA)⁻¹`.
///
/// # Examples
///
/// ```
/// # use statlab_stats::fit::{DataPoint, polynomial_fit};
/// let points: Vec<_> = (0..5)
///     .map(|i| {
///         let x = f64::from(i);
///         DataPoint::new(x, 1.0 + 2.0 * x, 0.1)
///     })
///     .collect();
/// let fit = polynomial_fit(&points, 1).unwrap();
/// assert!((fit.params[0] - 1.0).abs() < 1e-9);
/// assert!((fit.params[1] - 2.0).abs() < 1e-9);
/// assert_eq!(fit.ndf, 3);
/// ```
#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn polynomial_fit(points: &[DataPoint], degree: usize) -> Result<FitResult, FitError> {
    let num_params = degree + 1;
    check_points(points, num_params)?;

    let design = DMatrix::from_fn(points.len(), num_params, |i, j| {
        points[i].x.powi(j as i32) / points[i].error
    });
    let rhs = DVector::from_fn(points.len(), |i, _| points[i].y / points[i].error);
    let normal = design.transpose() * &design;
    let cholesky = normal.cholesky().ok_or(FitError::Singular)?;
    let params = cholesky.solve(&(design.transpose() * rhs));
    let covariance = cholesky.inverse();

    let params = params.iter().copied().collect::<Vec<_>>();
    let errors = (0..num_params)
        .map(|j| covariance[(j, j)].sqrt())
        .collect::<Vec<_>>();

    Ok(FitResult {
        chi_square: chi_square_at(points, &params),
        ndf: points.len() - num_params,
        params,
        errors,
        converged: true,
        iterations: 1,
    })
}

/// χ² of the polynomial with coefficients `params` (constant term first).
#[must_use]
pub fn chi_square_at(points: &[DataPoint], params: &[f64]) -> f64 {
    let model = PolynomialModel {
        degree: params.len().saturating_sub(1),
    };
    points
        .iter()
        .map(|p| ((p.y - model.eval(p.x, params)) / p.error).powi(2))
        .sum()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_constant_fit_is_weighted_mean() {
        let points = [
            DataPoint::new(0.0, 1.0, 1.0),
            DataPoint::new(1.0, 3.0, 0.5),
        ];
        let fit = polynomial_fit(&points, 0).unwrap();
        // weights 1 and 4
        assert_relative_eq!(fit.params[0], (1.0 + 4.0 * 3.0) / 5.0, max_relative = 1e-12);
        assert_relative_eq!(fit.errors[0], (1.0f64 / 5.0).sqrt(), max_relative = 1e-12);
        assert_eq!(fit.ndf, 1);
    }

    #[test]
    fn test_delta_chi_square_of_one_sigma_is_one() {
        let points: Vec<_> = [(0.0, 1.2), (1.0, 0.8), (2.0, 1.1), (3.0, 0.9)]
            .iter()
            .map(|&(x, y)| DataPoint::new(x, y, 0.2))
            .collect();
        let fit = polynomial_fit(&points, 0).unwrap();
        let shifted = chi_square_at(&points, &[fit.params[0] + fit.errors[0]]);
        assert_relative_eq!(shifted - fit.chi_square, 1.0, max_relative = 1e-9);
    }

    #[test]
    fn test_too_few_points() {
        let points = [DataPoint::new(0.0, 1.0, 1.0)];
        assert!(matches!(
            polynomial_fit(&points, 2),
            Err(FitError::TooFewPoints { needed: 3, got: 1 })
        ));
    }
}
