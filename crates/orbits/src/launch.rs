//! Spacecraft state at departure from Earth's sphere of influence.

use std::f64::consts::PI;

use intercept_core::OrbitalElements;
use intercept_core::constants::ESOI;

/// Place the craft on the edge of Earth's sphere of influence and add the escape velocity.
///
/// `alpha` sets the position on the sphere, `beta` the in-plane direction of the escape
/// velocity (measured from the tangential axis), and `zeta` its out-of-plane elevation.
pub fn launch_state(
    earth: &OrbitalElements,
    alpha: f64,
    beta: f64,
    zeta: f64,
    v_escape: f64,
) -> OrbitalElements {
    let (sin_zeta, cos_zeta) = zeta.sin_cos();
    let (sin_beta, cos_beta) = beta.sin_cos();
    OrbitalElements {
        r: earth.r + ESOI * alpha.cos(),
        theta: earth.theta + ((PI - alpha).sin() * ESOI / earth.r).asin(),
        z: earth.z,
        vr: earth.vr + cos_zeta * sin_beta * v_escape,
        vtheta: earth.vtheta + cos_zeta * cos_beta * v_escape,
        vz: earth.vz + sin_zeta * v_escape,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_angles_push_prograde_from_outer_edge() {
        let earth = OrbitalElements::new(1.0, 0.25, 0.0, 0.0, 2.0e-7, 0.0);
        let craft = launch_state(&earth, 0.0, 0.0, 0.0, 3.0e-8);
        assert!((craft.r - (1.0 + ESOI)).abs() < 1e-15);
        assert!((craft.theta - 0.25).abs() < 1e-15);
        assert!((craft.vtheta - 2.3e-7).abs() < 1e-20);
        assert_eq!(craft.vr, 0.0);
        assert_eq!(craft.vz, 0.0);
    }

    #[test]
    fn escape_speed_is_preserved_in_any_direction() {
        let earth = OrbitalElements::default();
        let earth = OrbitalElements { r: 1.0, ..earth };
        let craft = launch_state(&earth, 1.1, -0.7, 0.4, 3.0e-8);
        let dv = craft - earth;
        let speed = (dv.vr * dv.vr + dv.vtheta * dv.vtheta + dv.vz * dv.vz).sqrt();
        assert!((speed - 3.0e-8).abs() < 1e-20);
    }
}
