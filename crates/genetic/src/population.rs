//! Selection, breeding and the generational loop.

use intercept_config::{GeneticConfig, SelectionMethod};
use intercept_propulsion::Thruster;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::GeneticError;
use crate::cost::Evaluate;
use crate::crossover::generate_new_individual;
use crate::genome::{InitialRanges, RkParameters};
use crate::individual::Individual;
use crate::mask::Mask;
use crate::mutation::{MutationSettings, mutate};

/// Crossover strategy of one pass over the survivor pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreedingRound {
    WholeRandom,
    Average,
    Bundle,
}

impl BreedingRound {
    fn mask<R: Rng + ?Sized>(self, rng: &mut R) -> Mask {
        match self {
            Self::WholeRandom => Mask::whole_random(rng),
            Self::Average => Mask::average(),
            Self::Bundle => Mask::bundle_vars(rng),
        }
    }
}

/// Rounds are repeated in this order until the pool is full.
const BREEDING_ROUNDS: [BreedingRound; 4] = [
    BreedingRound::WholeRandom,
    BreedingRound::Average,
    BreedingRound::Bundle,
    BreedingRound::Bundle,
];

fn check_shape(pool: usize, survivors: usize) -> Result<(), GeneticError> {
    if survivors < 2 || survivors % 2 != 0 || survivors >= pool {
        return Err(GeneticError::PopulationShape { pool, survivors });
    }
    Ok(())
}

/// Produce exactly `count` children from consecutive survivor pairs.
///
/// Each pair yields a child from a fresh mask and a sibling from the flipped mask; each child
/// is offered to mutation right after it is crossed.
pub fn breed_offspring<R: Rng + ?Sized>(
    survivors: &[Individual],
    count: usize,
    rng: &mut R,
    annealing: f64,
    settings: &MutationSettings,
    thruster: &Thruster,
) -> Vec<RkParameters> {
    let mut offspring = Vec::with_capacity(count);
    if survivors.len() < 2 {
        return offspring;
    }
    let maybe_mutate = |child: RkParameters, rng: &mut R| {
        if settings.should_mutate(rng) {
            mutate(&child, rng, annealing, settings, thruster)
        } else {
            child
        }
    };

    'rounds: for round in BREEDING_ROUNDS.iter().cycle() {
        for pair in survivors.chunks_exact(2) {
            if offspring.len() == count {
                break 'rounds;
            }
            let (p1, p2) = (&pair[0].genome, &pair[1].genome);
            let mask = round.mask(rng);
            let first = generate_new_individual(p1, p2, &mask, thruster);
            offspring.push(maybe_mutate(first, rng));
            if offspring.len() == count {
                break 'rounds;
            }
            let second = generate_new_individual(p1, p2, &mask.flip(), thruster);
            offspring.push(maybe_mutate(second, rng));
        }
    }
    offspring
}

/// Fixed-size pool of candidates, ordered best first after [`Population::sort`].
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    pool: Vec<Individual>,
    survivor_count: usize,
}

impl Population {
    pub fn new(pool: Vec<Individual>, survivor_count: usize) -> Result<Self, GeneticError> {
        check_shape(pool.len(), survivor_count)?;
        Ok(Self {
            pool,
            survivor_count,
        })
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.pool
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn survivor_count(&self) -> usize {
        self.survivor_count
    }

    /// First individual of the pool; the best one once sorted.
    pub fn best(&self) -> &Individual {
        &self.pool[0]
    }

    pub fn worst(&self) -> &Individual {
        &self.pool[self.pool.len() - 1]
    }

    /// Evaluate every individual that has no evaluation yet, in parallel.
    pub fn evaluate<E: Evaluate + Sync + ?Sized>(&mut self, evaluator: &E) {
        self.pool
            .par_iter_mut()
            .filter(|individual| !individual.is_evaluated())
            .for_each(|individual| {
                individual.evaluation = Some(evaluator.evaluate(&individual.genome));
            });
    }

    /// Stable sort: valid before diverged, ascending cost.
    pub fn sort(&mut self) {
        self.pool.sort_by(Individual::rank);
    }

    /// Copy `survivor_count` parents out of a sorted pool. The pool itself is left unchanged.
    pub fn select<R: Rng + ?Sized>(&self, method: SelectionMethod, rng: &mut R) -> Vec<Individual> {
        let wanted = self.survivor_count;
        match method {
            SelectionMethod::Elitist => self.pool[..wanted].to_vec(),
            SelectionMethod::Tournament => {
                // Binary tournaments without replacement; the lower (better) index wins and
                // losers stay in contention for later rounds.
                let mut contenders: Vec<usize> = (0..self.pool.len()).collect();
                let mut chosen = Vec::with_capacity(wanted);
                while chosen.len() < wanted {
                    contenders.shuffle(rng);
                    let mut remaining = Vec::with_capacity(contenders.len());
                    let pairs = contenders.chunks_exact(2);
                    let leftover = pairs.remainder();
                    for pair in pairs {
                        if chosen.len() == wanted {
                            remaining.extend_from_slice(pair);
                            continue;
                        }
                        chosen.push(pair[0].min(pair[1]));
                        remaining.push(pair[0].max(pair[1]));
                    }
                    remaining.extend_from_slice(leftover);
                    contenders = remaining;
                }
                chosen.sort_unstable();
                chosen.into_iter().map(|index| self.pool[index]).collect()
            }
        }
    }

    /// Replace the pool with `survivors` followed by freshly bred, unevaluated offspring.
    pub fn breed<R: Rng + ?Sized>(
        &mut self,
        survivors: &[Individual],
        rng: &mut R,
        annealing: f64,
        settings: &MutationSettings,
        thruster: &Thruster,
    ) -> Result<(), GeneticError> {
        let size = self.pool.len();
        check_shape(size, survivors.len())?;
        let offspring = breed_offspring(
            survivors,
            size - survivors.len(),
            rng,
            annealing,
            settings,
            thruster,
        );
        self.pool.clear();
        self.pool.extend_from_slice(survivors);
        self.pool.extend(offspring.into_iter().map(Individual::new));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    /// Best cost fell below `cost_threshold`.
    Converged,
    /// Best cost did not improve for `change_check` generations.
    Stagnated,
    /// `max_generations` reached.
    Exhausted,
}

/// Snapshot handed to observers at every generation boundary, after sorting.
#[derive(Debug, Clone, Copy)]
pub struct GenerationReport<'a> {
    pub generation: usize,
    pub annealing: f64,
    pub population: &'a Population,
}

impl GenerationReport<'_> {
    pub fn best(&self) -> &Individual {
        self.population.best()
    }

    pub fn worst(&self) -> &Individual {
        self.population.worst()
    }
}

pub trait GenerationObserver {
    fn on_generation(&mut self, report: &GenerationReport<'_>);
}

impl<F: FnMut(&GenerationReport<'_>)> GenerationObserver for F {
    fn on_generation(&mut self, report: &GenerationReport<'_>) {
        self(report)
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub reason: TerminationReason,
    /// Index of the last generation produced.
    pub generations: usize,
    pub annealing: f64,
    pub population: Population,
}

impl RunOutcome {
    pub fn best(&self) -> &Individual {
        self.population.best()
    }
}

/// Generational loop with a single seeded random stream.
pub struct Optimizer<'a, E: ?Sized> {
    config: &'a GeneticConfig,
    evaluator: &'a E,
    thruster: Thruster,
    mutation: MutationSettings,
    ranges: InitialRanges,
    rng: Pcg64,
}

impl<'a, E: Evaluate + Sync + ?Sized> Optimizer<'a, E> {
    pub fn new(config: &'a GeneticConfig, evaluator: &'a E) -> Result<Self, GeneticError> {
        config.validate()?;
        Ok(Self {
            config,
            evaluator,
            thruster: Thruster::from_type_code(config.thruster_type)?,
            mutation: MutationSettings::from_config(config),
            ranges: InitialRanges::from_config(config),
            rng: Pcg64::seed_from_u64(config.time_seed),
        })
    }

    pub fn thruster(&self) -> &Thruster {
        &self.thruster
    }

    /// Random pool drawn within the configured start ranges, evaluated and sorted.
    pub fn initial_population(&mut self) -> Result<Population, GeneticError> {
        let pool = (0..self.config.num_individuals)
            .map(|_| Individual::new(self.ranges.sample(&mut self.rng)))
            .collect();
        let mut population = Population::new(pool, self.config.survivor_count)?;
        population.evaluate(self.evaluator);
        population.sort();
        Ok(population)
    }

    /// Select, breed, evaluate and sort one generation in place.
    pub fn run_generation(
        &mut self,
        population: &mut Population,
        generation: usize,
    ) -> Result<(), GeneticError> {
        let annealing = self.config.annealing_at(generation);
        let survivors = population.select(self.config.selection_method, &mut self.rng);
        population.breed(
            &survivors,
            &mut self.rng,
            annealing,
            &self.mutation,
            &self.thruster,
        )?;
        population.evaluate(self.evaluator);
        population.sort();
        Ok(())
    }

    /// Iterate from a sorted `population` until a termination condition fires.
    ///
    /// The observer sees every generation, starting with the initial pool as generation 0.
    /// A `change_check` of zero disables the stagnation test.
    pub fn run<O: GenerationObserver + ?Sized>(
        &mut self,
        mut population: Population,
        observer: &mut O,
    ) -> Result<RunOutcome, GeneticError> {
        let mut generation = 0;
        let mut best_cost = f64::INFINITY;
        let mut unchanged = 0;

        let reason = loop {
            let annealing = self.config.annealing_at(generation);
            observer.on_generation(&GenerationReport {
                generation,
                annealing,
                population: &population,
            });

            let best = population.best();
            debug!(
                generation,
                cost = best.cost(),
                pos_diff = best.pos_diff(),
                vel_diff = best.vel_diff(),
                annealing,
                "generation complete"
            );

            if best.cost() < self.config.cost_threshold {
                break TerminationReason::Converged;
            }
            if best.cost() < best_cost {
                best_cost = best.cost();
                unchanged = 0;
            } else {
                unchanged += 1;
            }
            if self.config.change_check > 0 && unchanged >= self.config.change_check {
                break TerminationReason::Stagnated;
            }
            if generation >= self.config.max_generations {
                break TerminationReason::Exhausted;
            }

            generation += 1;
            self.run_generation(&mut population, generation)?;
        };

        let annealing = self.config.annealing_at(generation);
        info!(
            ?reason,
            generations = generation,
            cost = population.best().cost(),
            "search finished"
        );
        Ok(RunOutcome {
            reason,
            generations: generation,
            annealing,
            population,
        })
    }
}
