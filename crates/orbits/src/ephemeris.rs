//! Tabulated Earth states before the impact date.
//!
//! The table is built once per run by integrating Earth's unpowered motion backwards from its
//! impact-date state. Sample `k` holds the state `k · resolution` seconds before impact;
//! queries between samples use cubic Hermite interpolation with slopes taken from the
//! equations of motion, so the lookup is continuous in the trip time.

use intercept_core::OrbitalElements;
use thiserror::Error;

use crate::ballistic_derivatives;

#[derive(Debug, Error, PartialEq)]
pub enum EphemerisError {
    #[error("ephemeris resolution must be positive, got {0} s")]
    InvalidResolution(f64),
    #[error("ephemeris span must be positive, got {0} s")]
    InvalidSpan(f64),
    #[error("trip time {trip_time} s lies outside the tabulated span [0, {span}] s")]
    OutOfRange { trip_time: f64, span: f64 },
}

#[derive(Debug, Clone)]
pub struct EarthEphemeris {
    resolution: f64,
    samples: Vec<OrbitalElements>,
}

fn rk4_step(y: &OrbitalElements, h: f64) -> OrbitalElements {
    let k1 = ballistic_derivatives(y);
    let k2 = ballistic_derivatives(&(*y + k1 * (0.5 * h)));
    let k3 = ballistic_derivatives(&(*y + k2 * (0.5 * h)));
    let k4 = ballistic_derivatives(&(*y + k3 * h));
    *y + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0)
}

impl EarthEphemeris {
    /// Tabulate Earth from `impact_state` back to at least `span_s` seconds before impact.
    pub fn build(
        impact_state: OrbitalElements,
        span_s: f64,
        resolution_s: f64,
    ) -> Result<Self, EphemerisError> {
        if !(resolution_s > 0.0 && resolution_s.is_finite()) {
            return Err(EphemerisError::InvalidResolution(resolution_s));
        }
        if !(span_s > 0.0 && span_s.is_finite()) {
            return Err(EphemerisError::InvalidSpan(span_s));
        }

        let intervals = (span_s / resolution_s).ceil() as usize;
        let mut samples = Vec::with_capacity(intervals + 1);
        let mut state = impact_state;
        samples.push(state);
        for _ in 0..intervals {
            state = rk4_step(&state, -resolution_s);
            samples.push(state);
        }

        Ok(Self {
            resolution: resolution_s,
            samples,
        })
    }

    /// Seconds before impact covered by the table.
    pub fn span(&self) -> f64 {
        (self.samples.len() - 1) as f64 * self.resolution
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Earth state `trip_time` seconds before the impact date, i.e. at launch.
    pub fn state_at(&self, trip_time: f64) -> Result<OrbitalElements, EphemerisError> {
        let span = self.span();
        if !(0.0..=span).contains(&trip_time) {
            return Err(EphemerisError::OutOfRange { trip_time, span });
        }

        let index = ((trip_time / self.resolution).floor() as usize).min(self.samples.len() - 2);
        let s = trip_time / self.resolution - index as f64;
        let p0 = self.samples[index];
        let p1 = self.samples[index + 1];

        // Slopes with respect to the normalized backwards coordinate.
        let m0 = ballistic_derivatives(&p0) * -self.resolution;
        let m1 = ballistic_derivatives(&p1) * -self.resolution;

        let s2 = s * s;
        let s3 = s2 * s;
        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        Ok(p0 * h00 + m0 * h10 + p1 * h01 + m1 * h11)
    }
}
