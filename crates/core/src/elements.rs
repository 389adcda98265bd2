//! Heliocentric state in a polar-cylindrical frame.
//!
//! Positions are `(r, theta, z)` in AU/rad/AU and velocities `(vr, vtheta, vz)` in AU/s, where
//! `vtheta` is the tangential speed (not an angular rate). The state is a plain value type:
//! the integrator combines stages with the component-wise arithmetic implemented below.

use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Number of scalar components in an [`OrbitalElements`] state.
pub const STATE_DIM: usize = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    pub r: f64,
    pub theta: f64,
    pub z: f64,
    pub vr: f64,
    pub vtheta: f64,
    pub vz: f64,
}

impl OrbitalElements {
    pub const fn new(r: f64, theta: f64, z: f64, vr: f64, vtheta: f64, vz: f64) -> Self {
        Self {
            r,
            theta,
            z,
            vr,
            vtheta,
            vz,
        }
    }

    /// Components in storage order `(r, theta, z, vr, vtheta, vz)`.
    pub fn to_array(&self) -> [f64; STATE_DIM] {
        [self.r, self.theta, self.z, self.vr, self.vtheta, self.vz]
    }

    pub fn from_array(a: [f64; STATE_DIM]) -> Self {
        Self::new(a[0], a[1], a[2], a[3], a[4], a[5])
    }

    /// Distance from the Sun, `sqrt(r² + z²)`.
    #[inline]
    pub fn distance(&self) -> f64 {
        self.r.hypot(self.z)
    }

    /// Magnitude of the velocity vector.
    #[inline]
    pub fn speed(&self) -> f64 {
        (self.vr * self.vr + self.vtheta * self.vtheta + self.vz * self.vz).sqrt()
    }

    /// Specific mechanical energy for a central body with parameter `mu`.
    pub fn specific_energy(&self, mu: f64) -> f64 {
        0.5 * self.speed().powi(2) - mu / self.distance()
    }

    /// Magnitude of the specific angular momentum `|r × v|`.
    ///
    /// In the local `(r̂, θ̂, ẑ)` basis the position is `(r, 0, z)`, so the cross product is
    /// `(-z·vθ, z·vr - r·vz, r·vθ)`.
    pub fn angular_momentum(&self) -> f64 {
        let hx = -self.z * self.vtheta;
        let hy = self.z * self.vr - self.r * self.vz;
        let hz = self.r * self.vtheta;
        (hx * hx + hy * hy + hz * hz).sqrt()
    }

    /// True when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

impl Add for OrbitalElements {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.r + rhs.r,
            self.theta + rhs.theta,
            self.z + rhs.z,
            self.vr + rhs.vr,
            self.vtheta + rhs.vtheta,
            self.vz + rhs.vz,
        )
    }
}

impl AddAssign for OrbitalElements {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for OrbitalElements {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.r - rhs.r,
            self.theta - rhs.theta,
            self.z - rhs.z,
            self.vr - rhs.vr,
            self.vtheta - rhs.vtheta,
            self.vz - rhs.vz,
        )
    }
}

impl Mul<f64> for OrbitalElements {
    type Output = Self;

    fn mul(self, s: f64) -> Self {
        Self::new(
            self.r * s,
            self.theta * s,
            self.z * s,
            self.vr * s,
            self.vtheta * s,
            self.vz * s,
        )
    }
}

impl Mul<OrbitalElements> for f64 {
    type Output = OrbitalElements;

    fn mul(self, e: OrbitalElements) -> OrbitalElements {
        e * self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_is_component_wise() {
        let a = OrbitalElements::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        let b = OrbitalElements::new(0.5, 0.5, 0.5, 0.5, 0.5, 0.5);
        assert_eq!(
            (a + b).to_array(),
            [1.5, 2.5, 3.5, 4.5, 5.5, 6.5]
        );
        assert_eq!((a - b).to_array(), [0.5, 1.5, 2.5, 3.5, 4.5, 5.5]);
        assert_eq!((2.0 * a).to_array(), [2.0, 4.0, 6.0, 8.0, 10.0, 12.0]);
        assert_eq!(OrbitalElements::from_array(a.to_array()), a);
    }

    #[test]
    fn planar_angular_momentum_reduces_to_r_vtheta() {
        let e = OrbitalElements::new(1.2, 0.3, 0.0, 1e-8, 2e-7, 0.0);
        assert!((e.angular_momentum() - 1.2 * 2e-7).abs() < 1e-20);
    }
}
