use crate::{distributions, histogram::Histogram};

/// A parametric function `f(x; params)` that can be fitted to data.
pub trait Model {
    fn num_params(&self) -> usize;

    fn eval(&self, x: f64, params: &[f64]) -> f64;
}

impl<M: Model + ?Sized> Model for &M {
    fn num_params(&self) -> usize {
        (**self).num_params()
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        (**self).eval(x, params)
    }
}

/// Gaussian with free area: `params = [norm, mean, sigma]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaussianModel;

impl GaussianModel {
    /// Starting values taken from the histogram: area, mean and RMS.
    #[must_use]
    pub fn initial_guess(histogram: &Histogram) -> [f64; 3] {
        [
            histogram.integral() * histogram.bin_width(),
            histogram.mean(),
            histogram.std_dev(),
        ]
    }
}

impl Model for GaussianModel {
    fn num_params(&self) -> usize {
        3
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        distributions::gaussian_normalized(x, params[0], params[1], params[2])
    }
}

/// `scale · Poisson(x; λ)` with `params = [λ]` and a fixed scale.
#[derive(Debug, Clone, Copy)]
pub struct PoissonModel {
    pub scale: f64,
}

impl Model for PoissonModel {
    fn num_params(&self) -> usize {
        1
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        self.scale * distributions::poisson_density(x, params[0])
    }
}

/// `scale · e^{−x/τ}/τ` with `params = [τ]` and a fixed scale.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialDecayModel {
    pub scale: f64,
}

impl Model for ExponentialDecayModel {
    fn num_params(&self) -> usize {
        1
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        self.scale * distributions::exponential_decay(x, params[0])
    }
}

/// `Σ params[j] · x^j` for `j = 0..=degree`.
#[derive(Debug, Clone, Copy)]
pub struct PolynomialModel {
    pub degree: usize,
}

impl Model for PolynomialModel {
    fn num_params(&self) -> usize {
        self.degree + 1
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        params.iter().rev().fold(0.0, |acc, &c| acc * x + c)
    }
}
