//! Trajectory evaluation and fitness.

use intercept_config::GeneticConfig;
use intercept_core::OrbitalElements;
use intercept_core::angle::wrap_pi;
use intercept_orbits::{EarthEphemeris, launch_state};
use intercept_propagator::{
    Flight, Propagation, PropagationSettings, propagate, propagate_with_trace,
};
use intercept_propulsion::{Spacecraft, Thruster, Vehicle};
use serde::{Deserialize, Serialize};

use crate::GeneticError;
use crate::genome::RkParameters;

/// Cost assigned to diverged or otherwise unusable trajectories.
pub const DIVERGED_COST: f64 = f64::MAX;

/// Derived fields of an evaluated genome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub launch_state: OrbitalElements,
    pub final_state: OrbitalElements,
    /// Miss distance at the end of the trip (AU).
    pub pos_diff: f64,
    /// Relative speed at the end of the trip (AU/s).
    pub vel_diff: f64,
    pub cost: f64,
    pub diverged: bool,
    pub steps: usize,
}

impl Evaluation {
    /// Penalised result for a genome that could not be propagated.
    pub fn diverged(launch_state: OrbitalElements, final_state: OrbitalElements) -> Self {
        Self {
            launch_state,
            final_state,
            pos_diff: f64::INFINITY,
            vel_diff: f64::INFINITY,
            cost: DIVERGED_COST,
            diverged: true,
            steps: 0,
        }
    }
}

/// Fitness function seam used by the population manager.
pub trait Evaluate {
    fn evaluate(&self, genome: &RkParameters) -> Evaluation;
}

/// Miss distance with the angular separation measured as arc length at the target radius.
pub fn position_difference(state: &OrbitalElements, target: &OrbitalElements) -> f64 {
    let dr = state.r - target.r;
    let arc = target.r * wrap_pi(state.theta - target.theta);
    let dz = state.z - target.z;
    (dr * dr + arc * arc + dz * dz).sqrt()
}

pub fn velocity_difference(state: &OrbitalElements, target: &OrbitalElements) -> f64 {
    let dv = *state - *target;
    (dv.vr * dv.vr + dv.vtheta * dv.vtheta + dv.vz * dv.vz).sqrt()
}

/// Propagates genomes from Earth departure to the impact date and scores the miss.
#[derive(Debug, Clone)]
pub struct Evaluator {
    pub target: OrbitalElements,
    pub ephemeris: EarthEphemeris,
    pub vehicle: Vehicle,
    pub settings: PropagationSettings,
    pub v_escape: f64,
    pub pos_threshold: f64,
    pub speed_threshold: f64,
}

impl Evaluator {
    /// Build the mission context, tabulating Earth over the full trip-time search range.
    pub fn from_config(config: &GeneticConfig) -> Result<Self, GeneticError> {
        let vehicle = Vehicle {
            thruster: Thruster::from_type_code(config.thruster_type)?,
            spacecraft: Spacecraft::new(config.wet_mass, config.dry_mass)?,
        };
        let ephemeris = EarthEphemeris::build(
            config.earth_final_state(),
            config.triptime_max,
            config.time_res,
        )?;
        Ok(Self {
            target: config.target_final_state(),
            ephemeris,
            vehicle,
            settings: PropagationSettings {
                rk_tol: config.rk_tol,
                max_numsteps: config.max_numsteps,
                min_numsteps: config.min_numsteps,
            },
            v_escape: config.v_escape,
            pos_threshold: config.pos_threshold,
            speed_threshold: config.speed_threshold,
        })
    }

    /// Spacecraft state when leaving Earth's sphere of influence, if the trip time is tabulated.
    pub fn launch_state(&self, genome: &RkParameters) -> Option<OrbitalElements> {
        let earth = self.ephemeris.state_at(genome.trip_time).ok()?;
        Some(launch_state(
            &earth,
            genome.alpha,
            genome.beta,
            genome.zeta,
            self.v_escape,
        ))
    }

    fn flight<'a>(&'a self, genome: &'a RkParameters) -> Flight<'a> {
        Flight {
            trip_time: genome.trip_time,
            coefficients: &genome.coefficients,
            vehicle: &self.vehicle,
        }
    }

    /// Full propagation with a per-step trace, for recording a chosen trajectory.
    pub fn trajectory(&self, genome: &RkParameters) -> Option<Propagation> {
        let start = self.launch_state(genome)?;
        Some(propagate_with_trace(
            &start,
            &self.flight(genome),
            &self.settings,
        ))
    }

    /// Score a finished propagation against the target.
    pub fn score(&self, launch: OrbitalElements, propagation: &Propagation) -> Evaluation {
        if propagation.diverged || !propagation.final_state.is_finite() {
            let mut eval = Evaluation::diverged(launch, propagation.final_state);
            eval.steps = propagation.steps;
            return eval;
        }
        let pos_diff = position_difference(&propagation.final_state, &self.target);
        let vel_diff = velocity_difference(&propagation.final_state, &self.target);
        let cost = pos_diff / self.pos_threshold + vel_diff / self.speed_threshold;
        Evaluation {
            launch_state: launch,
            final_state: propagation.final_state,
            pos_diff,
            vel_diff,
            cost: if cost.is_finite() { cost } else { DIVERGED_COST },
            diverged: !cost.is_finite(),
            steps: propagation.steps,
        }
    }
}

impl Evaluate for Evaluator {
    fn evaluate(&self, genome: &RkParameters) -> Evaluation {
        let Some(start) = self.launch_state(genome) else {
            return Evaluation::diverged(OrbitalElements::default(), OrbitalElements::default());
        };
        let propagation = propagate(&start, &self.flight(genome), &self.settings);
        self.score(start, &propagation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intercept_core::constants::SECONDS_PER_YEAR;
    use std::f64::consts::PI;

    #[test]
    fn position_difference_uses_wrapped_arc_length() {
        let target = OrbitalElements::new(2.0, PI - 0.01, 0.0, 0.0, 0.0, 0.0);
        let state = OrbitalElements::new(2.0, -PI + 0.01, 0.0, 0.0, 0.0, 0.0);
        let d = position_difference(&state, &target);
        assert!((d - 0.04).abs() < 1e-12, "wrapped arc should be 2 * 0.02, got {d}");
    }

    #[test]
    fn velocity_difference_is_euclidean() {
        let target = OrbitalElements::new(1.0, 0.0, 0.0, 3e-8, 0.0, 0.0);
        let state = OrbitalElements::new(1.0, 0.0, 0.0, 0.0, 4e-8, 0.0);
        assert!((velocity_difference(&state, &target) - 5e-8).abs() < 1e-22);
    }

    fn small_config() -> GeneticConfig {
        GeneticConfig {
            triptime_min: 0.2 * SECONDS_PER_YEAR,
            triptime_max: 0.4 * SECONDS_PER_YEAR,
            time_res: 86_400.0,
            max_numsteps: 2_000,
            min_numsteps: 100,
            rk_tol: 1e-10,
            ..Default::default()
        }
    }

    #[test]
    fn trip_time_outside_ephemeris_is_penalised() {
        let evaluator = Evaluator::from_config(&small_config()).expect("evaluator");
        let genome = RkParameters::from_array([0.0; crate::genome::OPTIM_VARS], 0.5);
        let mut far = genome;
        far.trip_time = 10.0 * SECONDS_PER_YEAR;
        let eval = evaluator.evaluate(&far);
        assert!(eval.diverged);
        assert_eq!(eval.cost, DIVERGED_COST);
    }

    #[test]
    fn valid_genome_gets_a_finite_cost() {
        let config = small_config();
        let evaluator = Evaluator::from_config(&config).expect("evaluator");
        let mut genome = RkParameters::from_array([0.0; crate::genome::OPTIM_VARS], 0.5);
        genome.trip_time = 0.3 * SECONDS_PER_YEAR;
        genome.coefficients.coast[0] = 1.0;
        let eval = evaluator.evaluate(&genome);
        assert!(!eval.diverged);
        assert!(eval.cost.is_finite() && eval.cost < DIVERGED_COST);
        let expected =
            eval.pos_diff / config.pos_threshold + eval.vel_diff / config.speed_threshold;
        assert!((eval.cost - expected).abs() <= 1e-9 * expected);

        let trace = evaluator.trajectory(&genome).expect("tabulated trip time");
        assert_eq!(trace.final_state, eval.final_state);
        assert_eq!(trace.trace.len(), eval.steps + 1);
    }
}
