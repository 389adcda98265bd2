//! Core units, constants, and shared primitives for the asteroid intercept workspace.

pub mod elements;

pub use elements::OrbitalElements;

/// Physical constants. Heliocentric quantities use AU and seconds.
pub mod constants {
    /// Metres per astronomical unit.
    pub const AU_M: f64 = 1.495_978_706_91e11;
    /// Heliocentric gravitational parameter (m³/s²).
    pub const MU_SUN_M3_S2: f64 = 1.327_124_400_18e20;
    /// Heliocentric gravitational parameter (AU³/s²).
    pub const MU_SUN: f64 = MU_SUN_M3_S2 / (AU_M * AU_M * AU_M);
    /// Radius of Earth's sphere of influence (AU).
    pub const ESOI: f64 = 6.211_174_738e-3;
    /// Seconds per day.
    pub const SECONDS_PER_DAY: f64 = 86_400.0;
    /// Seconds in a 365-day year. Trip-time mutation scales are expressed in these years.
    pub const SECONDS_PER_YEAR: f64 = 365.0 * SECONDS_PER_DAY;
}

/// Basic unit conversion helpers.
pub mod units {
    use super::constants::AU_M;

    /// Convert metres to astronomical units.
    #[inline]
    pub fn m_to_au(v: f64) -> f64 {
        v / AU_M
    }

    /// Convert km/s to AU/s.
    #[inline]
    pub fn kms_to_au_s(v: f64) -> f64 {
        v * 1_000.0 / AU_M
    }
}

/// Angle helpers.
pub mod angle {
    use std::f64::consts::{PI, TAU};

    /// Wrap an angle into `(-π, π]`.
    #[inline]
    pub fn wrap_pi(a: f64) -> f64 {
        let wrapped = (a + PI).rem_euclid(TAU) - PI;
        if wrapped <= -PI { wrapped + TAU } else { wrapped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mu_sun_in_au_units_matches_reference() {
        assert!((constants::MU_SUN - 3.964_016e-14).abs() < 1e-19);
    }

    #[test]
    fn earth_orbital_speed_in_au_per_second() {
        let v = units::kms_to_au_s(29.78);
        assert!((v - 1.99e-7).abs() < 1e-9);
        assert!((units::m_to_au(constants::AU_M) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn wrap_pi_handles_large_angles() {
        use std::f64::consts::PI;
        assert!((angle::wrap_pi(3.0 * PI - 0.5) - (PI - 0.5)).abs() < 1e-12);
        assert!((angle::wrap_pi(-0.5) + 0.5).abs() < 1e-15);
        assert!((angle::wrap_pi(2.0 * PI + 0.25) - 0.25).abs() < 1e-12);
    }
}
