//! Probability density and mass functions.
//!
//! Discrete distributions validate their parameters and return
//! [`DistributionError`]; continuous densities follow the usual closed forms and
//! evaluate to `0.0` outside their support.

use std::f64::consts::{PI, SQRT_2};

use serde::{Deserialize, Serialize};

use crate::special::ln_gamma;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum DistributionError {
    #[display("probability must lie in [0, 1], got {p}")]
    InvalidProbability { p: f64 },
    #[display("{name} must be non-negative and finite, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[display("k = {k} exceeds n = {n}")]
    CountOutOfRange { k: u64, n: u64 },
}

fn check_probability(p: f64) -> Result<(), DistributionError> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(DistributionError::InvalidProbability { p })
    }
}

fn check_rate(name: &'static str, value: f64) -> Result<(), DistributionError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(DistributionError::InvalidParameter { name, value })
    }
}

/// Gaussian density `N(x; mean, sigma)`.
#[must_use]
pub fn gaussian(x: f64, mean: f64, sigma: f64) -> f64 {
    let z = (x - mean) / sigma;
    (-0.5 * z * z).exp() / (sigma * (2.0 * PI).sqrt())
}

/// Gaussian scaled to area `norm`: `norm · N(x; mean, sigma)`.
#[must_use]
pub fn gaussian_normalized(x: f64, norm: f64, mean: f64, sigma: f64) -> f64 {
    norm * gaussian(x, mean, sigma)
}

/// Probability that a `N(mean, sigma)` variable exceeds `threshold`.
///
/// # Examples
///
/// ```
/// # use statlab_stats::distributions::gaussian_tail_probability;
/// assert!((gaussian_tail_probability(5.0, 5.0, 1.0) - 0.5).abs() < 1e-15);
/// ```
#[must_use]
pub fn gaussian_tail_probability(threshold: f64, mean: f64, sigma: f64) -> f64 {
    0.5 * statrs::function::erf::erfc((threshold - mean) / (sigma * SQRT_2))
}

#[expect(clippy::cast_precision_loss)]
fn ln_poisson(k: u64, lambda: f64) -> f64 {
    let k = k as f64;
    k * lambda.ln() - lambda - ln_gamma(k + 1.0)
}

/// Poisson probability `P(k; lambda)`, evaluated in log space so that large
/// `lambda` stays finite.
///
/// # Examples
///
/// ```
/// # use statlab_stats::distributions::poisson;
/// assert!((poisson(0, 2.0).unwrap() - (-2.0f64).exp()).abs() < 1e-15);
/// assert!(poisson(10_000, 10_000.0).unwrap() > 0.0);
/// ```
pub fn poisson(k: u64, lambda: f64) -> Result<f64, DistributionError> {
    check_rate("lambda", lambda)?;
    if lambda == 0.0 {
        return Ok(if k == 0 { 1.0 } else { 0.0 });
    }
    Ok(ln_poisson(k, lambda).exp())
}

/// Poisson density continued to real `x` through Γ(x + 1); zero for `x < 0`.
///
/// Used as a fit model where the abscissa is a bin centre.
#[must_use]
pub fn poisson_density(x: f64, lambda: f64) -> f64 {
    if x < 0.0 || lambda < 0.0 {
        return 0.0;
    }
    if lambda == 0.0 {
        return if x == 0.0 { 1.0 } else { 0.0 };
    }
    (x * lambda.ln() - lambda - ln_gamma(x + 1.0)).exp()
}

/// Table of `P(k; lambda)` for `k = 0..=k_max` by the recursion
/// `P(k + 1) = P(k) · λ / (k + 1)`.
///
/// The recursion is seeded at the mode (or `k_max` if smaller) with a value
/// computed in log space and run in both directions, so that no term underflows
/// before the true probability does.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn poisson_table(lambda: f64, k_max: u64) -> Result<Vec<f64>, DistributionError> {
    check_rate("lambda", lambda)?;
    let len = usize::try_from(k_max).map_or(usize::MAX, |k| k.saturating_add(1));
    let mut table = vec![0.0; len];
    if lambda == 0.0 {
        table[0] = 1.0;
        return Ok(table);
    }
    let start = (lambda.floor() as u64).min(k_max);
    let start_idx = start as usize;
    table[start_idx] = ln_poisson(start, lambda).exp();
    for k in start_idx..table.len() - 1 {
        table[k + 1] = table[k] * lambda / (k + 1) as f64;
    }
    for k in (1..=start_idx).rev() {
        table[k - 1] = table[k] * k as f64 / lambda;
    }
    Ok(table)
}

#[expect(clippy::cast_precision_loss)]
fn ln_choose(n: u64, k: u64) -> f64 {
    ln_gamma(n as f64 + 1.0) - ln_gamma(k as f64 + 1.0) - ln_gamma((n - k) as f64 + 1.0)
}

/// Binomial probability `P(k; n, p)`, evaluated in log space.
///
/// # Examples
///
/// ```
/// # use statlab_stats::distributions::binomial;
/// assert!((binomial(1, 2, 0.5).unwrap() - 0.5).abs() < 1e-12);
/// assert!(binomial(3, 2, 0.5).is_err());
/// ```
#[expect(clippy::cast_precision_loss)]
pub fn binomial(k: u64, n: u64, p: f64) -> Result<f64, DistributionError> {
    check_probability(p)?;
    if k > n {
        return Err(DistributionError::CountOutOfRange { k, n });
    }
    if p == 0.0 {
        return Ok(if k == 0 { 1.0 } else { 0.0 });
    }
    if p == 1.0 {
        return Ok(if k == n { 1.0 } else { 0.0 });
    }
    let (kf, nf) = (k as f64, n as f64);
    Ok((ln_choose(n, k) + kf * p.ln() + (nf - kf) * (1.0 - p).ln()).exp())
}

/// Table of `P(k; n, p)` for `k = 0..=n` by the recursion
/// `P(k + 1) = P(k) · (n − k)/(k + 1) · p/(1 − p)`.
///
/// The recursion starts from the end whose probability is larger: `k = 0`
/// (value `(1 − p)^n`) when `p ≤ ½` and `k = n` (value `p^n`) otherwise, each
/// computed in log space. Starting from the small end would underflow for
/// `p → 1` and large `n`, see [`binomial_table_forward`].
///
/// # Examples
///
/// ```
/// # use statlab_stats::distributions::binomial_table;
/// let table = binomial_table(4096, 0.989).unwrap();
/// let total: f64 = table.iter().sum();
/// assert!((total - 1.0).abs() < 1e-9);
/// ```
#[expect(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn binomial_table(n: u64, p: f64) -> Result<Vec<f64>, DistributionError> {
    check_probability(p)?;
    let len = n as usize + 1;
    let nf = n as f64;
    let mut table = vec![0.0; len];
    if p == 0.0 {
        table[0] = 1.0;
        return Ok(table);
    }
    if p == 1.0 {
        table[len - 1] = 1.0;
        return Ok(table);
    }
    let ratio = p / (1.0 - p);
    if p <= 0.5 {
        table[0] = (nf * (1.0 - p).ln()).exp();
        for k in 0..len - 1 {
            let kf = k as f64;
            table[k + 1] = table[k] * (nf - kf) / (kf + 1.0) * ratio;
        }
    } else {
        table[len - 1] = (nf * p.ln()).exp();
        for k in (1..len).rev() {
            let kf = k as f64;
            // inverse of the forward step from k - 1 to k
            table[k - 1] = table[k] * kf / (nf - kf + 1.0) / ratio;
        }
    }
    Ok(table)
}

/// Naive binomial table: forward recursion from `(1 − p)^n` at `k = 0`.
///
/// Kept to show the failure mode: for `p` close to one and large `n` the start
/// value underflows to zero and the whole table collapses.
#[expect(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn binomial_table_forward(n: u64, p: f64) -> Result<Vec<f64>, DistributionError> {
    check_probability(p)?;
    let len = n as usize + 1;
    let nf = n as f64;
    let mut table = vec![0.0; len];
    if p == 1.0 {
        table[len - 1] = 1.0;
        return Ok(table);
    }
    let ratio = p / (1.0 - p);
    table[0] = (1.0 - p).powf(nf);
    for k in 0..len - 1 {
        let kf = k as f64;
        table[k + 1] = table[k] * (nf - kf) / (kf + 1.0) * ratio;
    }
    Ok(table)
}

/// χ² density with `ndf` degrees of freedom.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn chi_square(x: f64, ndf: usize) -> f64 {
    if x < 0.0 || ndf == 0 {
        return 0.0;
    }
    let half = ndf as f64 / 2.0;
    if x == 0.0 {
        return match ndf {
            1 => f64::INFINITY,
            2 => 0.5,
            _ => 0.0,
        };
    }
    ((half - 1.0) * x.ln() - 0.5 * x - half * 2f64.ln() - ln_gamma(half)).exp()
}

/// Density of `χ²/ndf` for `ndf` degrees of freedom.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn reduced_chi_square(x: f64, ndf: usize) -> f64 {
    let n = ndf as f64;
    n * chi_square(x * n, ndf)
}

/// χ² density for one degree of freedom, `e^{−x/2} / sqrt(2πx)`.
#[must_use]
pub fn chi_square_one_dof(x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    (-0.5 * x).exp() / (2.0 * PI * x).sqrt()
}

/// Laplace (double exponential) density with location `mu` and scale `b`.
#[must_use]
pub fn laplace(x: f64, mu: f64, b: f64) -> f64 {
    (-(x - mu).abs() / b).exp() / (2.0 * b)
}

/// Uniform density on `[a, b]`.
#[must_use]
pub fn uniform(x: f64, a: f64, b: f64) -> f64 {
    if (a..=b).contains(&x) { 1.0 / (b - a) } else { 0.0 }
}

/// Exponential decay density `e^{−t/τ} / τ` for `t ≥ 0`.
#[must_use]
pub fn exponential_decay(t: f64, tau: f64) -> f64 {
    if t < 0.0 {
        return 0.0;
    }
    (-t / tau).exp() / tau
}

/// Parameters of an axis-aligned 2-D Gaussian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gaussian2dParams {
    pub mean_x: f64,
    pub sigma_x: f64,
    pub mean_y: f64,
    pub sigma_y: f64,
}

/// Product of two independent Gaussians in `x` and `y`.
#[must_use]
pub fn gaussian_2d(x: f64, y: f64, mx: f64, sx: f64, my: f64, sy: f64) -> f64 {
    gaussian(x, mx, sx) * gaussian(y, my, sy)
}

/// Density of `params` after rotating the distribution by `phi` around its mean.
///
/// Evaluated as the unrotated density at the point rotated back by `phi`.
#[must_use]
pub fn rotated_gaussian_2d(x: f64, y: f64, params: &Gaussian2dParams, phi: f64) -> f64 {
    let (s, c) = phi.sin_cos();
    let dx = x - params.mean_x;
    let dy = y - params.mean_y;
    let back_x = dx * c + dy * s;
    let back_y = -dx * s + dy * c;
    gaussian_2d(
        params.mean_x + back_x,
        params.mean_y + back_y,
        params.mean_x,
        params.sigma_x,
        params.mean_y,
        params.sigma_y,
    )
}

/// 2-D Gaussian with a common `sigma` in both coordinates.
#[must_use]
pub fn isotropic_gaussian_2d(x: f64, y: f64, mx: f64, my: f64, sigma: f64) -> f64 {
    gaussian_2d(x, y, mx, sigma, my, sigma)
}

/// Centred isotropic Gaussian expressed as a density in polar coordinates (ρ, θ)
/// and evaluated at the Cartesian point `(x, y)`: `ρ·e^{−ρ²/2σ²} / (2πσ²)`.
#[must_use]
pub fn polar_gaussian(x: f64, y: f64, sigma: f64) -> f64 {
    let rho = x.hypot(y);
    let s2 = sigma * sigma;
    rho * (-rho * rho / (2.0 * s2)).exp() / (2.0 * PI * s2)
}

/// Rayleigh density: [`polar_gaussian`] integrated over the angle.
#[must_use]
pub fn rayleigh(rho: f64, sigma: f64) -> f64 {
    if rho < 0.0 {
        return 0.0;
    }
    let s2 = sigma * sigma;
    rho * (-rho * rho / (2.0 * s2)).exp() / s2
}

/// Efficiency of a detector made of `layers` independent layers of efficiency `p`
/// that needs at least `required` of them to fire.
///
/// # Examples
///
/// ```
/// # use statlab_stats::distributions::layer_efficiency;
/// let p: f64 = 0.9;
/// let four = layer_efficiency(p, 4, 3).unwrap();
/// assert!((four - p.powi(3) * (4.0 - 3.0 * p)).abs() < 1e-12);
/// ```
pub fn layer_efficiency(p: f64, layers: u64, required: u64) -> Result<f64, DistributionError> {
    (required..=layers).map(|k| binomial(k, layers, p)).sum()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::special::integrate;

    #[test]
    fn test_binomial_recursion_identity() {
        let (n, p) = (20, 0.3);
        let table = binomial_table(n, p).unwrap();
        for k in 0..20_u32 {
            let kf = f64::from(k);
            let expected = table[k as usize] * (20.0 - kf) / (kf + 1.0) * p / (1.0 - p);
            assert_relative_eq!(table[k as usize + 1], expected, max_relative = 1e-12);
            assert_relative_eq!(
                table[k as usize],
                binomial(u64::from(k), n, p).unwrap(),
                max_relative = 1e-9
            );
        }
    }

    #[test]
    fn test_binomial_table_both_directions_sum_to_one() {
        for p in [0.01, 0.3, 0.5, 0.7, 0.989] {
            let total: f64 = binomial_table(500, p).unwrap().iter().sum();
            assert_relative_eq!(total, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_forward_table_underflows_near_one() {
        let naive = binomial_table_forward(4096, 0.989).unwrap();
        assert!(naive.iter().all(|&v| v == 0.0));
        let stable = binomial_table(4096, 0.989).unwrap();
        assert!(stable[4051] > 0.05);
    }

    #[test]
    fn test_binomial_degenerate() {
        assert_eq!(binomial_table(3, 0.0).unwrap(), vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(binomial_table(3, 1.0).unwrap(), vec![0.0, 0.0, 0.0, 1.0]);
        assert!(binomial(0, 1, 1.5).is_err());
    }

    #[test]
    fn test_poisson_table_matches_direct() {
        let table = poisson_table(4.5, 30).unwrap();
        for (k, value) in table.iter().enumerate() {
            assert_relative_eq!(*value, poisson(k as u64, 4.5).unwrap(), max_relative = 1e-9);
        }
        let large = poisson_table(10_000.0, 20_000).unwrap();
        assert_relative_eq!(large.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        assert!(poisson(1, -1.0).is_err());
    }

    #[test]
    fn test_poisson_density_at_integers() {
        assert_relative_eq!(poisson_density(3.0, 2.0), poisson(3, 2.0).unwrap(), max_relative = 1e-12);
        assert_eq!(poisson_density(-1.0, 2.0), 0.0);
    }

    #[test]
    fn test_continuous_densities_integrate_to_one() {
        let cases: Vec<(Box<dyn Fn(f64) -> f64>, f64, f64)> = vec![
            (Box::new(|x| gaussian(x, 1.0, 2.0)), -30.0, 30.0),
            (Box::new(|x| laplace(x, 0.0, 0.5)), -30.0, 30.0),
            (Box::new(|x| chi_square(x, 5)), 0.0, 100.0),
            (Box::new(|x| reduced_chi_square(x, 18)), 0.0, 5.0),
            (Box::new(|x| exponential_decay(x, 1.5)), 0.0, 100.0),
            (Box::new(|x| rayleigh(x, 1.0)), 0.0, 20.0),
        ];
        for (f, a, b) in cases {
            assert_relative_eq!(integrate(f, a, b, 1e-10), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_one_dof_matches_general_form() {
        for x in [0.1, 1.0, 3.0] {
            assert_relative_eq!(chi_square_one_dof(x), chi_square(x, 1), max_relative = 1e-12);
        }
    }

    #[test]
    fn test_rotation_by_zero_is_identity() {
        let params = Gaussian2dParams {
            mean_x: 1.0,
            sigma_x: 1.0,
            mean_y: -1.0,
            sigma_y: 2.0,
        };
        assert_relative_eq!(
            rotated_gaussian_2d(1.5, 0.5, &params, 0.0),
            gaussian_2d(1.5, 0.5, 1.0, 1.0, -1.0, 2.0)
        );
        // a quarter turn swaps the roles of the axes
        assert_relative_eq!(
            rotated_gaussian_2d(1.0 - 2.0, -1.0, &params, std::f64::consts::FRAC_PI_2),
            gaussian_2d(1.0, -1.0 + 2.0, 1.0, 1.0, -1.0, 2.0),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_layer_efficiency_closed_forms() {
        let p: f64 = 0.95;
        assert_relative_eq!(layer_efficiency(p, 3, 3).unwrap(), p.powi(3), max_relative = 1e-12);
        assert_relative_eq!(
            layer_efficiency(p, 5, 3).unwrap(),
            p.powi(3) * (10.0 - 15.0 * p + 6.0 * p * p),
            max_relative = 1e-12
        );
    }
}
