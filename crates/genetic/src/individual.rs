//! Candidate solutions and their ordering.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::cost::{DIVERGED_COST, Evaluation};
use crate::genome::{OPTIM_VARS, RkParameters};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub genome: RkParameters,
    /// `None` until the genome has been propagated.
    pub evaluation: Option<Evaluation>,
}

impl Individual {
    pub fn new(genome: RkParameters) -> Self {
        Self {
            genome,
            evaluation: None,
        }
    }

    pub fn is_evaluated(&self) -> bool {
        self.evaluation.is_some()
    }

    pub fn cost(&self) -> f64 {
        self.evaluation.map_or(DIVERGED_COST, |e| e.cost)
    }

    /// Unevaluated individuals rank with the diverged ones.
    pub fn is_diverged(&self) -> bool {
        self.evaluation.is_none_or(|e| e.diverged)
    }

    pub fn pos_diff(&self) -> f64 {
        self.evaluation.map_or(f64::INFINITY, |e| e.pos_diff)
    }

    pub fn vel_diff(&self) -> f64 {
        self.evaluation.map_or(f64::INFINITY, |e| e.vel_diff)
    }

    /// Total order used to sort the pool: valid before diverged, then ascending cost.
    pub fn rank(&self, other: &Self) -> Ordering {
        self.is_diverged()
            .cmp(&other.is_diverged())
            .then_with(|| self.cost().total_cmp(&other.cost()))
    }
}

/// Gene-wise mean over a set of individuals, for diagnostics. `None` for an empty set.
pub fn average_genes(pool: &[Individual]) -> Option<[f64; OPTIM_VARS]> {
    if pool.is_empty() {
        return None;
    }
    let mut sum = [0.0; OPTIM_VARS];
    for individual in pool {
        for (acc, gene) in sum.iter_mut().zip(individual.genome.to_array()) {
            *acc += gene;
        }
    }
    let n = pool.len() as f64;
    Some(sum.map(|total| total / n))
}
