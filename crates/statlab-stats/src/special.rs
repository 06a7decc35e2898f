//! Special functions and small numerical routines.
//!
//! The gamma family and the χ²/normal distribution functions delegate to `statrs`.
//! Integration is adaptive Simpson and root finding is bisection.

use statrs::distribution::{ChiSquared, ContinuousCDF};

pub use statrs::function::gamma::{gamma, ln_gamma};

/// Upper-tail probability `P(χ² > chi2)` for `ndf` degrees of freedom.
///
/// Follows the usual convention for degenerate input: `ndf == 0` yields `0.0`
/// and a non-positive `chi2` yields `1.0`.
///
/// # Examples
///
/// ```
/// # use statlab_stats::special::chi_square_probability;
/// // the median of χ²(2) is 2 ln 2
/// let p = chi_square_probability(2.0 * 2f64.ln(), 2);
/// assert!((p - 0.5).abs() < 1e-12);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn chi_square_probability(chi2: f64, ndf: usize) -> f64 {
    if ndf == 0 {
        return 0.0;
    }
    if chi2 <= 0.0 {
        return 1.0;
    }
    match ChiSquared::new(ndf as f64) {
        Ok(dist) => dist.sf(chi2),
        Err(_) => f64::NAN,
    }
}

/// Cumulative distribution function of `N(mean, sigma)`.
#[must_use]
pub fn normal_cdf(x: f64, mean: f64, sigma: f64) -> f64 {
    0.5 * statrs::function::erf::erfc(-(x - mean) / (sigma * std::f64::consts::SQRT_2))
}

const MAX_SIMPSON_DEPTH: u32 = 50;

/// Integrates `f` over `[a, b]` with adaptive Simpson quadrature to absolute tolerance `tol`.
///
/// # Examples
///
/// ```
/// # use statlab_stats::special::integrate;
/// let area = integrate(|x| x.sin(), 0.0, std::f64::consts::PI, 1e-10);
/// assert!((area - 2.0).abs() < 1e-9);
/// ```
pub fn integrate<F>(f: F, a: f64, b: f64, tol: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    if a == b {
        return 0.0;
    }
    let fa = f(a);
    let fb = f(b);
    let m = 0.5 * (a + b);
    let fm = f(m);
    let whole = (b - a) / 6.0 * (fa + 4.0 * fm + fb);
    simpson_step(&f, a, b, fa, fm, fb, whole, tol, MAX_SIMPSON_DEPTH)
}

#[expect(clippy::too_many_arguments)]
fn simpson_step<F>(
    f: &F,
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    tol: f64,
    depth: u32,
) -> f64
where
    F: Fn(f64) -> f64,
{
    let m = 0.5 * (a + b);
    let lm = 0.5 * (a + m);
    let rm = 0.5 * (m + b);
    let flm = f(lm);
    let frm = f(rm);
    let left = (m - a) / 6.0 * (fa + 4.0 * flm + fm);
    let right = (b - m) / 6.0 * (fm + 4.0 * frm + fb);
    let delta = left + right - whole;
    if depth == 0 || delta.abs() <= 15.0 * tol {
        return left + right + delta / 15.0;
    }
    simpson_step(f, a, m, fa, flm, fm, left, 0.5 * tol, depth - 1)
        + simpson_step(f, m, b, fm, frm, fb, right, 0.5 * tol, depth - 1)
}

/// Finds `x` in `[a, b]` with `f(x) = target` by bisection.
///
/// Returns `None` when `f(a) - target` and `f(b) - target` have the same sign.
///
/// # Examples
///
/// ```
/// # use statlab_stats::special::find_root;
/// let x = find_root(|x| x * x, 2.0, 0.0, 2.0).unwrap();
/// assert!((x - 2f64.sqrt()).abs() < 1e-10);
/// ```
pub fn find_root<F>(f: F, target: f64, a: f64, b: f64) -> Option<f64>
where
    F: Fn(f64) -> f64,
{
    let g = |x: f64| f(x) - target;
    let (mut lo, mut hi) = (a.min(b), a.max(b));
    let mut g_lo = g(lo);
    let g_hi = g(hi);
    if g_lo == 0.0 {
        return Some(lo);
    }
    if g_hi == 0.0 {
        return Some(hi);
    }
    if g_lo.signum() == g_hi.signum() {
        return None;
    }
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        let g_mid = g(mid);
        if g_mid == 0.0 || hi - lo < 1e-14 * (1.0 + mid.abs()) {
            return Some(mid);
        }
        if g_mid.signum() == g_lo.signum() {
            lo = mid;
            g_lo = g_mid;
        } else {
            hi = mid;
        }
    }
    Some(0.5 * (lo + hi))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_gamma_wrappers() {
        assert_relative_eq!(gamma(5.0), 24.0, epsilon = 1e-9);
        assert_relative_eq!(ln_gamma(11.0), 3_628_800f64.ln(), epsilon = 1e-9);
    }

    #[test]
    fn test_chi_square_probability_edges() {
        assert_eq!(chi_square_probability(3.0, 0), 0.0);
        assert_eq!(chi_square_probability(0.0, 5), 1.0);
        // P(χ²(1) > 1) = 2·(1 − Φ(1))
        let expected = 2.0 * (1.0 - normal_cdf(1.0, 0.0, 1.0));
        assert_relative_eq!(chi_square_probability(1.0, 1), expected, epsilon = 1e-10);
    }

    #[test]
    fn test_normal_cdf() {
        assert_relative_eq!(normal_cdf(5.0, 5.0, 1.0), 0.5);
        assert_relative_eq!(normal_cdf(6.96, 5.0, 1.0), 0.975, epsilon = 1e-4);
    }

    #[test]
    fn test_integrate_gaussian_tail_matches_cdf() {
        let tail = integrate(
            |x| (-0.5 * (x - 5.0) * (x - 5.0)).exp() / (2.0 * std::f64::consts::PI).sqrt(),
            9.2,
            30.0,
            1e-14,
        );
        assert_relative_eq!(tail, 1.0 - normal_cdf(9.2, 5.0, 1.0), max_relative = 1e-6);
    }

    #[test]
    fn test_find_root_without_bracket() {
        assert!(find_root(|x| x * x, -1.0, 0.0, 2.0).is_none());
    }
}
