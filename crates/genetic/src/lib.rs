//! Genetic search over launch geometry, trip time and thrust steering laws.
//!
//! A [`Population`] of [`Individual`]s is evaluated in parallel, sorted by cost, culled to its
//! survivors and refilled by mask crossover and annealed mutation. [`Optimizer`] drives the
//! generational loop until the best cost converges, stagnates, or the generation budget runs
//! out.

pub mod cost;
pub mod crossover;
pub mod genome;
pub mod individual;
pub mod mask;
pub mod mutation;
pub mod population;

use intercept_config::ConfigError;
use intercept_orbits::EphemerisError;
use intercept_propulsion::PropulsionError;
use thiserror::Error;

pub use cost::{DIVERGED_COST, Evaluate, Evaluation, Evaluator};
pub use crossover::generate_new_individual;
pub use genome::{GeneGroup, InitialRanges, OPTIM_VARS, RkParameters};
pub use individual::{Individual, average_genes};
pub use mask::{Mask, MaskValue};
pub use mutation::{MutationSettings, mutate};
pub use population::{
    GenerationObserver, GenerationReport, Optimizer, Population, RunOutcome, TerminationReason,
};

#[derive(Debug, Error)]
pub enum GeneticError {
    #[error("invalid mask tag {tag} at gene {index}")]
    InvalidMaskTag { index: usize, tag: u8 },
    #[error("genome has {found} genes, expected {expected}")]
    GenomeLength { expected: usize, found: usize },
    #[error("cannot keep {survivors} survivors in a pool of {pool}")]
    PopulationShape { pool: usize, survivors: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Propulsion(#[from] PropulsionError),
    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),
}
