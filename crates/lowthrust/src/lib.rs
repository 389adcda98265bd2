//! Continuous-thrust steering profiles.
//!
//! A profile is three truncated Fourier series evaluated over the normalized time of flight:
//! the in-plane angle `gamma`, the out-of-plane angle `tau`, and a coast series that switches
//! the engine off whenever it falls below `coast_threshold`.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Number of in-plane coefficients (third-order series).
pub const GAMMA_N: usize = 7;
/// Number of out-of-plane coefficients (first-order series).
pub const TAU_N: usize = 3;
/// Number of coast coefficients (second-order series).
pub const COAST_N: usize = 5;

/// Evaluate `c[0] + Σ c[2i-1]·cos(i·t) + c[2i]·sin(i·t)` for `i = 1..=(N-1)/2`.
///
/// The coefficient count must be odd; even lengths are rejected at compile time.
pub fn fourier_series<const N: usize>(coeffs: &[f64; N], t: f64) -> f64 {
    const { assert!(N % 2 == 1, "Fourier coefficient arrays must have odd length") };
    let mut value = coeffs[0];
    for i in 1..=(N - 1) / 2 {
        let k = i as f64;
        value += coeffs[2 * i - 1] * (k * t).cos() + coeffs[2 * i] * (k * t).sin();
    }
    value
}

/// Map elapsed time onto the series domain, `π · t / trip_time`.
#[inline]
pub fn normalized_phase(time_s: f64, trip_time_s: f64) -> f64 {
    PI * time_s / trip_time_s
}

/// Fourier coefficient set defining one candidate steering law.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrustCoefficients {
    pub gamma: [f64; GAMMA_N],
    pub tau: [f64; TAU_N],
    pub coast: [f64; COAST_N],
    pub coast_threshold: f64,
}

impl Default for ThrustCoefficients {
    fn default() -> Self {
        Self {
            gamma: [0.0; GAMMA_N],
            tau: [0.0; TAU_N],
            coast: [0.0; COAST_N],
            coast_threshold: 0.0,
        }
    }
}

/// Steering state at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrustAngles {
    pub gamma: f64,
    pub tau: f64,
    pub coasting: bool,
}

impl ThrustCoefficients {
    pub fn gamma_at(&self, phase: f64) -> f64 {
        fourier_series(&self.gamma, phase)
    }

    pub fn tau_at(&self, phase: f64) -> f64 {
        fourier_series(&self.tau, phase)
    }

    pub fn coast_at(&self, phase: f64) -> f64 {
        fourier_series(&self.coast, phase)
    }

    /// Thrust is suppressed while the coast series is below the threshold.
    pub fn is_coasting(&self, phase: f64) -> bool {
        self.coast_at(phase) < self.coast_threshold
    }

    /// Steering angles and coast flag at `time_s` into a trip of `trip_time_s` seconds.
    pub fn angles(&self, time_s: f64, trip_time_s: f64) -> ThrustAngles {
        let phase = normalized_phase(time_s, trip_time_s);
        ThrustAngles {
            gamma: self.gamma_at(phase),
            tau: self.tau_at(phase),
            coasting: self.is_coasting(phase),
        }
    }
}
