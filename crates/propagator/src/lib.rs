//! Adaptive-step propagation of a thrusting spacecraft.
//!
//! The state is advanced with an embedded Dormand-Prince 5(4) pair from launch to the end of
//! the trip. Thrust magnitude and propellant flow are frozen over each step at the step's start
//! state; the steering angles are re-evaluated at every stage time. Numerical trouble (step
//! budget exhausted, `r <= 0`, non-finite state) never surfaces as an error: the result is
//! flagged as diverged so the caller can penalise it.

use intercept_core::OrbitalElements;
use intercept_lowthrust::{ThrustAngles, ThrustCoefficients};
use intercept_orbits::derivatives;
use intercept_propulsion::Vehicle;
use serde::{Deserialize, Serialize};

pub mod controller;
pub mod tableau;

pub use controller::StepController;

use tableau::{A, B, C, E, STAGES};

/// Integrator tolerances and step budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropagationSettings {
    /// Relative local error target per step.
    pub rk_tol: f64,
    /// Upper bound on step attempts, accepted and rejected; also sets the smallest step.
    pub max_numsteps: usize,
    /// Sets the largest step, `trip_time / min_numsteps`.
    pub min_numsteps: usize,
}

impl Default for PropagationSettings {
    fn default() -> Self {
        Self {
            rk_tol: 1e-12,
            max_numsteps: 5_000,
            min_numsteps: 400,
        }
    }
}

impl PropagationSettings {
    /// Smallest and largest step for a trip of `trip_time` seconds.
    pub fn step_bounds(&self, trip_time: f64) -> (f64, f64) {
        let h_min = trip_time / self.max_numsteps.max(1) as f64;
        let h_max = trip_time / self.min_numsteps.max(1) as f64;
        (h_min, h_max.max(h_min))
    }
}

/// One recorded sample of a propagated trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub time: f64,
    pub state: OrbitalElements,
    pub gamma: f64,
    pub tau: f64,
    /// Thrust acceleration (AU/s²) applied from this point on.
    pub accel: f64,
    pub fuel_spent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Propagation {
    pub final_state: OrbitalElements,
    pub final_time: f64,
    /// Accepted steps.
    pub steps: usize,
    pub rejected: usize,
    pub fuel_spent: f64,
    pub diverged: bool,
    /// Launch sample plus one sample per accepted step; empty unless requested.
    pub trace: Vec<TrajectoryPoint>,
}

/// Everything that defines one flight besides its initial state.
#[derive(Debug, Clone, Copy)]
pub struct Flight<'a> {
    pub trip_time: f64,
    pub coefficients: &'a ThrustCoefficients,
    pub vehicle: &'a Vehicle,
}

impl Flight<'_> {
    fn angles(&self, time: f64) -> ThrustAngles {
        self.coefficients.angles(time, self.trip_time)
    }

    /// Thrust acceleration and propellant flow held over a step starting at `time`.
    fn thrust(&self, time: f64, y: &OrbitalElements, fuel_spent: f64) -> (f64, f64) {
        if !self.vehicle.thruster.is_active() || self.angles(time).coasting {
            return (0.0, 0.0);
        }
        let out = self.vehicle.output(y.distance(), fuel_spent);
        (out.accel, out.mass_flow)
    }

    fn point(&self, time: f64, state: OrbitalElements, fuel_spent: f64) -> TrajectoryPoint {
        let steering = self.angles(time);
        let (accel, _) = self.thrust(time, &state, fuel_spent);
        TrajectoryPoint {
            time,
            state,
            gamma: steering.gamma,
            tau: steering.tau,
            accel,
            fuel_spent,
        }
    }
}

struct StepAttempt {
    state: OrbitalElements,
    error: f64,
    /// A stage left the valid domain (`r <= 0` or non-finite).
    singular: bool,
}

fn attempt_step(
    flight: &Flight<'_>,
    t: f64,
    y: &OrbitalElements,
    h: f64,
    accel: f64,
    rk_tol: f64,
) -> StepAttempt {
    let mut k = [OrbitalElements::default(); STAGES];
    let mut singular = false;
    for i in 0..STAGES {
        let mut yi = *y;
        for j in 0..i {
            if A[i][j] != 0.0 {
                yi += k[j] * (h * A[i][j]);
            }
        }
        singular |= yi.r <= 0.0 || !yi.is_finite();
        let steering = flight.angles(t + C[i] * h);
        k[i] = derivatives(&yi, accel, steering.gamma, steering.tau);
    }

    let mut next = *y;
    let mut err = OrbitalElements::default();
    for i in 0..STAGES {
        if B[i] != 0.0 {
            next += k[i] * (h * B[i]);
        }
        err += k[i] * (h * E[i]);
    }

    let pos_scale = rk_tol * y.distance();
    let vel_scale = rk_tol * y.speed();
    let ratios = [
        err.r / pos_scale,
        err.theta / rk_tol,
        err.z / pos_scale,
        err.vr / vel_scale,
        err.vtheta / vel_scale,
        err.vz / vel_scale,
    ];
    let error = if singular {
        f64::INFINITY
    } else {
        ratios
            .iter()
            .map(|r| if r.is_nan() { f64::INFINITY } else { r.abs() })
            .fold(0.0, f64::max)
    };

    StepAttempt {
        state: next,
        error,
        singular,
    }
}

fn run(
    initial: &OrbitalElements,
    flight: &Flight<'_>,
    settings: &PropagationSettings,
    record: bool,
) -> Propagation {
    let trip_time = flight.trip_time;
    let mut result = Propagation {
        final_state: *initial,
        final_time: 0.0,
        steps: 0,
        rejected: 0,
        fuel_spent: 0.0,
        diverged: false,
        trace: Vec::new(),
    };

    if !(trip_time > 0.0 && trip_time.is_finite()) || !initial.is_finite() || initial.r <= 0.0 {
        result.diverged = true;
        return result;
    }

    let controller = StepController::default();
    let (h_min, h_max) = settings.step_bounds(trip_time);
    let mut h = (h_max / 10.0).clamp(h_min, h_max);
    let mut t = 0.0;
    let mut y = *initial;
    let mut fuel = 0.0;
    let mut attempts = 0;

    if record {
        result.trace.push(flight.point(t, y, fuel));
    }

    while t < trip_time {
        if attempts >= settings.max_numsteps {
            result.diverged = true;
            break;
        }
        attempts += 1;

        let remaining = trip_time - t;
        let last = remaining <= h * (1.0 + 1e-9);
        let step = if last { remaining } else { h };

        let (accel, mass_flow) = flight.thrust(t, &y, fuel);
        let attempt = attempt_step(flight, t, &y, step, accel, settings.rk_tol);

        if attempt.error <= 1.0 || step <= h_min {
            t = if last { trip_time } else { t + step };
            y = attempt.state;
            fuel = flight.vehicle.spacecraft.burn(fuel, mass_flow, step);
            result.steps += 1;

            if attempt.singular || !y.is_finite() || y.r <= 0.0 {
                result.diverged = true;
                break;
            }
            if record {
                result.trace.push(flight.point(t, y, fuel));
            }
            h = (step * controller.grow(attempt.error)).clamp(h_min, h_max);
        } else {
            result.rejected += 1;
            h = (step * controller.shrink(attempt.error)).max(h_min);
        }
    }

    result.final_state = y;
    result.final_time = t;
    result.fuel_spent = fuel;
    result
}

/// Propagate from `initial` over the whole trip without keeping a trace.
pub fn propagate(
    initial: &OrbitalElements,
    flight: &Flight<'_>,
    settings: &PropagationSettings,
) -> Propagation {
    run(initial, flight, settings, false)
}

/// Propagate and keep one [`TrajectoryPoint`] per accepted step.
pub fn propagate_with_trace(
    initial: &OrbitalElements,
    flight: &Flight<'_>,
    settings: &PropagationSettings,
) -> Propagation {
    run(initial, flight, settings, true)
}
