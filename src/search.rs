//! One complete search: build the mission context, evolve a population, and package the
//! records of the winning trajectories.

use intercept_config::GeneticConfig;
use intercept_export::final_record::FinalRecord;
use intercept_genetic::{
    Evaluator, GenerationObserver, GeneticError, Individual, Optimizer, RunOutcome,
};
use intercept_propagator::Propagation;

/// Mission context together with how the search ended.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub evaluator: Evaluator,
    pub outcome: RunOutcome,
}

impl SearchResult {
    /// The first `count` individuals of the final, sorted pool.
    pub fn leaders(&self, count: usize) -> &[Individual] {
        let pool = self.outcome.population.individuals();
        &pool[..count.min(pool.len())]
    }
}

/// Run the generational loop from a freshly seeded population.
pub fn run_search<O: GenerationObserver + ?Sized>(
    config: &GeneticConfig,
    observer: &mut O,
) -> Result<SearchResult, GeneticError> {
    let evaluator = Evaluator::from_config(config)?;
    let outcome = {
        let mut optimizer = Optimizer::new(config, &evaluator)?;
        let population = optimizer.initial_population()?;
        optimizer.run(population, observer)?
    };
    Ok(SearchResult { evaluator, outcome })
}

/// Re-propagate `individual` with a full trace and build its final-optimization record.
///
/// `None` when the trip time lies outside the Earth ephemeris.
pub fn record_individual(
    evaluator: &Evaluator,
    config: &GeneticConfig,
    individual: &Individual,
) -> Option<(FinalRecord, Propagation)> {
    let propagation = evaluator.trajectory(&individual.genome)?;
    let record = FinalRecord {
        target: config.target_final_state(),
        earth: config.earth_final_state(),
        genome: individual.genome,
        steps: propagation.steps,
    };
    Some((record, propagation))
}
