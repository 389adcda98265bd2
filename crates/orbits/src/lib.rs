//! Heliocentric dynamics in the polar-cylindrical frame.

use intercept_core::OrbitalElements;
use intercept_core::constants::MU_SUN;

pub mod ephemeris;
pub mod launch;

pub use ephemeris::{EarthEphemeris, EphemerisError};
pub use launch::launch_state;

/// Time derivative of the state under solar gravity plus a thrust acceleration `accel`
/// (AU/s²) steered by the in-plane angle `gamma` and out-of-plane angle `tau`.
pub fn derivatives(y: &OrbitalElements, accel: f64, gamma: f64, tau: f64) -> OrbitalElements {
    let d2 = y.r * y.r + y.z * y.z;
    let grav = MU_SUN / (d2 * d2.sqrt());
    let (sin_gamma, cos_gamma) = gamma.sin_cos();
    let (sin_tau, cos_tau) = tau.sin_cos();

    OrbitalElements {
        r: y.vr,
        theta: y.vtheta / y.r,
        z: y.vz,
        vr: -grav * y.r + y.vtheta * y.vtheta / y.r + accel * cos_tau * sin_gamma,
        vtheta: -y.vr * y.vtheta / y.r + accel * cos_tau * cos_gamma,
        vz: -grav * y.z + accel * sin_tau,
    }
}

/// Unpowered two-body derivative.
#[inline]
pub fn ballistic_derivatives(y: &OrbitalElements) -> OrbitalElements {
    derivatives(y, 0.0, 0.0, 0.0)
}

/// Speed of a circular heliocentric orbit at `r_au`.
pub fn circular_speed(r_au: f64) -> f64 {
    (MU_SUN / r_au).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_orbit_has_no_radial_acceleration() {
        let y = OrbitalElements::new(1.0, 0.0, 0.0, 0.0, circular_speed(1.0), 0.0);
        let dy = ballistic_derivatives(&y);
        assert!(dy.vr.abs() < 1e-28, "radial acceleration {}", dy.vr);
        assert_eq!(dy.vtheta, 0.0);
        assert!((dy.theta - circular_speed(1.0)).abs() < 1e-24);
    }

    #[test]
    fn tangential_thrust_only_changes_vtheta() {
        let y = OrbitalElements::new(1.0, 0.0, 0.0, 0.0, circular_speed(1.0), 0.0);
        let base = ballistic_derivatives(&y);
        let pushed = derivatives(&y, 1e-15, 0.0, 0.0);
        assert!((pushed.vtheta - base.vtheta - 1e-15).abs() < 1e-30);
        assert_eq!(pushed.vr, base.vr);
        assert_eq!(pushed.vz, base.vz);
    }

    #[test]
    fn out_of_plane_thrust_drives_vz() {
        let y = OrbitalElements::new(1.0, 0.0, 0.0, 0.0, circular_speed(1.0), 0.0);
        let dy = derivatives(&y, 2e-15, 0.3, std::f64::consts::FRAC_PI_2);
        assert!((dy.vz - 2e-15).abs() < 1e-28);
    }
}
