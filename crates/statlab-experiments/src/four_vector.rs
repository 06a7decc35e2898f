//! Minimal Lorentz four-vectors in `(px, py, pz, E)` order, GeV units.

use std::{f64::consts::PI, ops::Add};

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FourVector {
    pub px: f64,
    pub py: f64,
    pub pz: f64,
    pub e: f64,
}

impl FourVector {
    #[must_use]
    pub const fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self { px, py, pz, e }
    }

    /// A particle of `mass` with three-momentum `(px, py, pz)`.
    #[must_use]
    pub fn with_mass(px: f64, py: f64, pz: f64, mass: f64) -> Self {
        let e = (px * px + py * py + pz * pz + mass * mass).sqrt();
        Self { px, py, pz, e }
    }

    #[must_use]
    pub const fn from_array([px, py, pz, e]: [f64; 4]) -> Self {
        Self { px, py, pz, e }
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 4] {
        [self.px, self.py, self.pz, self.e]
    }

    #[must_use]
    pub fn momentum(&self) -> f64 {
        (self.px * self.px + self.py * self.py + self.pz * self.pz).sqrt()
    }

    /// Invariant mass; negative squared masses from rounding clamp to zero.
    ///
    /// # Examples
    ///
    /// ```
    /// # use statlab_experiments::four_vector::FourVector;
    /// let a = FourVector::new(0.0, 0.0, 1.0, 1.0);
    /// let b = FourVector::new(0.0, 0.0, -1.0, 1.0);
    /// assert_eq!((a + b).mass(), 2.0);
    /// ```
    #[must_use]
    pub fn mass(&self) -> f64 {
        let p = self.momentum();
        ((self.e - p) * (self.e + p)).max(0.0).sqrt()
    }

    /// Velocity `p/E` of the frame in which this vector is at rest.
    #[must_use]
    pub fn boost_vector(&self) -> [f64; 3] {
        [self.px / self.e, self.py / self.e, self.pz / self.e]
    }

    /// Lorentz boost by velocity `beta` (in units of c).
    #[must_use]
    pub fn boosted(&self, beta: [f64; 3]) -> Self {
        let [bx, by, bz] = beta;
        let b2 = bx * bx + by * by + bz * bz;
        if b2 == 0.0 {
            return *self;
        }
        let gamma = (1.0 - b2).sqrt().recip();
        let bp = bx * self.px + by * self.py + bz * self.pz;
        let gamma2 = (gamma - 1.0) / b2;
        let k = gamma2 * bp + gamma * self.e;
        Self {
            px: self.px + k * bx,
            py: self.py + k * by,
            pz: self.pz + k * bz,
            e: gamma * (self.e + bp),
        }
    }
}

impl Add for FourVector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            px: self.px + rhs.px,
            py: self.py + rhs.py,
            pz: self.pz + rhs.pz,
            e: self.e + rhs.e,
        }
    }
}

/// Decays `parent` into two massless daughters, isotropic in the parent rest frame.
pub fn decay_to_photons<R: Rng + ?Sized>(parent: &FourVector, rng: &mut R) -> [FourVector; 2] {
    let half = parent.mass() / 2.0;
    let cos_theta: f64 = rng.random_range(-1.0..=1.0);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi: f64 = rng.random_range(0.0..2.0 * PI);
    let (dx, dy, dz) = (sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);

    let beta = parent.boost_vector();
    let first = FourVector::new(half * dx, half * dy, half * dz, half);
    let second = FourVector::new(-half * dx, -half * dy, -half * dz, half);
    [first.boosted(beta), second.boosted(beta)]
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_boost_preserves_mass() {
        let v = FourVector::with_mass(0.3, -1.2, 4.0, 0.135);
        let boosted = v.boosted([0.1, 0.5, -0.7]);
        assert_relative_eq!(boosted.mass(), 0.135, max_relative = 1e-9);
    }

    #[test]
    fn test_boost_to_rest_frame() {
        let v = FourVector::with_mass(1.0, 2.0, 30.0, 0.5);
        let [bx, by, bz] = v.boost_vector();
        let rest = v.boosted([-bx, -by, -bz]);
        assert!(rest.momentum() < 1e-9);
        assert_relative_eq!(rest.e, 0.5, max_relative = 1e-9);
    }

    #[test]
    fn test_photon_pair_reconstructs_parent() {
        let mut rng = Pcg32::seed_from_u64(31);
        let parent = FourVector::with_mass(0.5, -0.2, 60.0, 0.135);
        for _ in 0..100 {
            let [g1, g2] = decay_to_photons(&parent, &mut rng);
            assert!(g1.mass() < 1e-4 && g2.mass() < 1e-4);
            let sum = g1 + g2;
            assert_relative_eq!(sum.mass(), 0.135, max_relative = 1e-6);
            assert_relative_eq!(sum.e, parent.e, max_relative = 1e-12);
        }
    }
}
