//! Annealed point mutation.

use intercept_config::GeneticConfig;
use intercept_core::constants::SECONDS_PER_YEAR;
use intercept_propulsion::Thruster;
use rand::Rng;
use rand::seq::index;

use crate::genome::{GeneGroup, OPTIM_VARS, RkParameters, symmetric};

/// Mutation probabilities and per-group perturbation scales.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MutationSettings {
    /// Chance that a freshly crossed child is mutated at all.
    pub rate: f64,
    /// Cumulative threshold below which two genes are mutated.
    pub double_rate: f64,
    /// Cumulative threshold below which three genes are mutated.
    pub triple_rate: f64,
    pub gamma_scale: f64,
    pub tau_scale: f64,
    pub coast_scale: f64,
    /// In years.
    pub trip_time_scale: f64,
    pub alpha_scale: f64,
    pub beta_scale: f64,
    pub zeta_scale: f64,
}

impl MutationSettings {
    pub fn from_config(config: &GeneticConfig) -> Self {
        Self {
            rate: config.mutation_rate,
            double_rate: config.double_mutate_rate,
            triple_rate: config.triple_mutate_rate,
            gamma_scale: config.gamma_mutate_scale,
            tau_scale: config.tau_mutate_scale,
            coast_scale: config.coast_mutate_scale,
            trip_time_scale: config.triptime_mutate_scale,
            alpha_scale: config.alpha_mutate_scale,
            beta_scale: config.beta_mutate_scale,
            zeta_scale: config.zeta_mutate_scale,
        }
    }

    /// Largest perturbation a gene of `group` can receive at `annealing`, in the gene's units.
    pub fn max_step(&self, group: GeneGroup, annealing: f64) -> f64 {
        let scale = match group {
            GeneGroup::Gamma => self.gamma_scale,
            GeneGroup::Tau => self.tau_scale,
            GeneGroup::Coast => self.coast_scale,
            GeneGroup::TripTime => self.trip_time_scale * SECONDS_PER_YEAR,
            GeneGroup::Alpha => self.alpha_scale,
            GeneGroup::Beta => self.beta_scale,
            GeneGroup::Zeta => self.zeta_scale,
        };
        scale * annealing
    }

    /// Draw whether a new child should be mutated. No randomness is consumed at rate zero.
    pub fn should_mutate<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        self.rate > 0.0 && rng.r#gen::<f64>() < self.rate
    }
}

/// Perturb one, two, or three distinct genes of `genome`.
pub fn mutate<R: Rng + ?Sized>(
    genome: &RkParameters,
    rng: &mut R,
    annealing: f64,
    settings: &MutationSettings,
    thruster: &Thruster,
) -> RkParameters {
    let roll: f64 = rng.r#gen();
    let count = if roll < settings.triple_rate {
        3
    } else if roll < settings.double_rate {
        2
    } else {
        1
    };

    let mut genes = genome.to_array();
    for gene in index::sample(rng, OPTIM_VARS, count).into_iter() {
        let group = GeneGroup::of(gene);
        if group.is_thrust_coefficient() && !thruster.is_active() {
            continue;
        }
        genes[gene] += symmetric(rng, settings.max_step(group, annealing));
    }

    RkParameters::from_array(genes, genome.coefficients.coast_threshold)
}
