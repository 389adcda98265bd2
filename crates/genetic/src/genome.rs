//! Genome layout and conversions.
//!
//! ```text
//! [ gamma 0..7 | tau 7..10 | alpha 10 | beta 11 | zeta 12 | tripTime 13 | coast 14..19 ]
//! ```

use intercept_config::GeneticConfig;
use intercept_lowthrust::{COAST_N, GAMMA_N, TAU_N, ThrustCoefficients};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::GeneticError;

pub const GAMMA_OFFSET: usize = 0;
pub const TAU_OFFSET: usize = GAMMA_OFFSET + GAMMA_N;
pub const ALPHA_OFFSET: usize = TAU_OFFSET + TAU_N;
pub const BETA_OFFSET: usize = ALPHA_OFFSET + 1;
pub const ZETA_OFFSET: usize = BETA_OFFSET + 1;
pub const TRIPTIME_OFFSET: usize = ZETA_OFFSET + 1;
pub const COAST_OFFSET: usize = TRIPTIME_OFFSET + 1;
/// Number of free parameters in a genome.
pub const OPTIM_VARS: usize = COAST_OFFSET + COAST_N;

const _: () = assert!(OPTIM_VARS == GAMMA_N + TAU_N + COAST_N + 4);

/// Semantic group a gene belongs to. Bundled crossover and mutation scales work per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneGroup {
    Gamma,
    Tau,
    Alpha,
    Beta,
    Zeta,
    TripTime,
    Coast,
}

impl GeneGroup {
    pub fn of(index: usize) -> Self {
        match index {
            i if i < TAU_OFFSET => Self::Gamma,
            i if i < ALPHA_OFFSET => Self::Tau,
            ALPHA_OFFSET => Self::Alpha,
            BETA_OFFSET => Self::Beta,
            ZETA_OFFSET => Self::Zeta,
            TRIPTIME_OFFSET => Self::TripTime,
            _ => Self::Coast,
        }
    }

    /// Gene indices covered by the group.
    pub fn indices(self) -> std::ops::Range<usize> {
        match self {
            Self::Gamma => GAMMA_OFFSET..TAU_OFFSET,
            Self::Tau => TAU_OFFSET..ALPHA_OFFSET,
            Self::Alpha => ALPHA_OFFSET..ALPHA_OFFSET + 1,
            Self::Beta => BETA_OFFSET..BETA_OFFSET + 1,
            Self::Zeta => ZETA_OFFSET..ZETA_OFFSET + 1,
            Self::TripTime => TRIPTIME_OFFSET..TRIPTIME_OFFSET + 1,
            Self::Coast => COAST_OFFSET..OPTIM_VARS,
        }
    }

    /// Thrust-coefficient genes are inert when the craft carries no thruster.
    pub fn is_thrust_coefficient(self) -> bool {
        matches!(self, Self::Gamma | Self::Tau | Self::Coast)
    }
}

/// One candidate trajectory: launch geometry, time of flight, and steering law.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RkParameters {
    /// Time of flight (s).
    pub trip_time: f64,
    pub alpha: f64,
    pub beta: f64,
    pub zeta: f64,
    pub coefficients: ThrustCoefficients,
}

impl RkParameters {
    /// Genes in layout order.
    pub fn to_array(&self) -> [f64; OPTIM_VARS] {
        let mut genes = [0.0; OPTIM_VARS];
        genes[GeneGroup::Gamma.indices()].copy_from_slice(&self.coefficients.gamma);
        genes[GeneGroup::Tau.indices()].copy_from_slice(&self.coefficients.tau);
        genes[GeneGroup::Coast.indices()].copy_from_slice(&self.coefficients.coast);
        genes[ALPHA_OFFSET] = self.alpha;
        genes[BETA_OFFSET] = self.beta;
        genes[ZETA_OFFSET] = self.zeta;
        genes[TRIPTIME_OFFSET] = self.trip_time;
        genes
    }

    /// Rebuild a genome; the coast threshold is a run constant, not a gene.
    pub fn from_array(genes: [f64; OPTIM_VARS], coast_threshold: f64) -> Self {
        let mut coefficients = ThrustCoefficients {
            coast_threshold,
            ..Default::default()
        };
        coefficients
            .gamma
            .copy_from_slice(&genes[GeneGroup::Gamma.indices()]);
        coefficients
            .tau
            .copy_from_slice(&genes[GeneGroup::Tau.indices()]);
        coefficients
            .coast
            .copy_from_slice(&genes[GeneGroup::Coast.indices()]);
        Self {
            trip_time: genes[TRIPTIME_OFFSET],
            alpha: genes[ALPHA_OFFSET],
            beta: genes[BETA_OFFSET],
            zeta: genes[ZETA_OFFSET],
            coefficients,
        }
    }

    pub fn from_slice(genes: &[f64], coast_threshold: f64) -> Result<Self, GeneticError> {
        let genes: [f64; OPTIM_VARS] =
            genes.try_into().map_err(|_| GeneticError::GenomeLength {
                expected: OPTIM_VARS,
                found: genes.len(),
            })?;
        Ok(Self::from_array(genes, coast_threshold))
    }
}

/// Symmetric uniform draw in `[-max, max)`.
pub(crate) fn symmetric<R: Rng + ?Sized>(rng: &mut R, max: f64) -> f64 {
    (rng.r#gen::<f64>() * 2.0 - 1.0) * max
}

/// Ranges used to seed the initial population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialRanges {
    pub gamma: f64,
    pub tau: f64,
    pub coast: f64,
    pub alpha: f64,
    pub beta: f64,
    pub zeta: f64,
    pub trip_time_min: f64,
    pub trip_time_max: f64,
    pub coast_threshold: f64,
}

impl InitialRanges {
    pub fn from_config(config: &GeneticConfig) -> Self {
        Self {
            gamma: config.gamma_random_start_range,
            tau: config.tau_random_start_range,
            coast: config.coast_random_start_range,
            alpha: config.alpha_random_start_range,
            beta: config.beta_random_start_range,
            zeta: config.zeta_random_start_range,
            trip_time_min: config.triptime_min,
            trip_time_max: config.triptime_max,
            coast_threshold: config.coast_threshold,
        }
    }

    /// Draw a genome: coefficients, then angles, then the trip time.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> RkParameters {
        let mut genes = [0.0; OPTIM_VARS];
        for index in 0..OPTIM_VARS {
            genes[index] = match GeneGroup::of(index) {
                GeneGroup::Gamma => symmetric(rng, self.gamma),
                GeneGroup::Tau => symmetric(rng, self.tau),
                GeneGroup::Coast => symmetric(rng, self.coast),
                GeneGroup::Alpha => symmetric(rng, self.alpha),
                GeneGroup::Beta => symmetric(rng, self.beta),
                GeneGroup::Zeta => symmetric(rng, self.zeta),
                GeneGroup::TripTime => {
                    self.trip_time_min
                        + rng.r#gen::<f64>() * (self.trip_time_max - self.trip_time_min)
                }
            };
        }
        RkParameters::from_array(genes, self.coast_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn layout_offsets() {
        assert_eq!(TAU_OFFSET, 7);
        assert_eq!(ALPHA_OFFSET, 10);
        assert_eq!(BETA_OFFSET, 11);
        assert_eq!(ZETA_OFFSET, 12);
        assert_eq!(TRIPTIME_OFFSET, 13);
        assert_eq!(COAST_OFFSET, 14);
        assert_eq!(OPTIM_VARS, 19);
    }

    #[test]
    fn every_index_has_exactly_one_group() {
        let groups = [
            GeneGroup::Gamma,
            GeneGroup::Tau,
            GeneGroup::Alpha,
            GeneGroup::Beta,
            GeneGroup::Zeta,
            GeneGroup::TripTime,
            GeneGroup::Coast,
        ];
        for index in 0..OPTIM_VARS {
            let owners: Vec<_> = groups
                .iter()
                .filter(|g| g.indices().contains(&index))
                .collect();
            assert_eq!(owners, vec![&GeneGroup::of(index)], "index {index}");
        }
    }

    #[test]
    fn array_conversion_keeps_every_gene() {
        let genes: [f64; OPTIM_VARS] = std::array::from_fn(|i| i as f64 + 0.5);
        let genome = RkParameters::from_array(genes, 0.25);
        assert_eq!(genome.coefficients.gamma[6], 6.5);
        assert_eq!(genome.coefficients.tau[0], 7.5);
        assert_eq!(genome.alpha, 10.5);
        assert_eq!(genome.trip_time, 13.5);
        assert_eq!(genome.coefficients.coast[4], 18.5);
        assert_eq!(genome.coefficients.coast_threshold, 0.25);
        assert_eq!(genome.to_array(), genes);
    }

    #[test]
    fn wrong_length_slice_is_rejected() {
        let err = RkParameters::from_slice(&[0.0; 12], 0.0).unwrap_err();
        assert!(matches!(
            err,
            GeneticError::GenomeLength {
                expected: OPTIM_VARS,
                found: 12
            }
        ));
    }

    #[test]
    fn sampled_genomes_respect_ranges() {
        let ranges = InitialRanges::from_config(&GeneticConfig::default());
        let mut rng = Pcg64::seed_from_u64(11);
        for _ in 0..200 {
            let g = ranges.sample(&mut rng);
            assert!(g.trip_time >= ranges.trip_time_min && g.trip_time < ranges.trip_time_max);
            assert!(g.alpha.abs() <= ranges.alpha);
            assert!(g.coefficients.gamma.iter().all(|c| c.abs() <= ranges.gamma));
            assert_eq!(g.coefficients.coast_threshold, ranges.coast_threshold);
        }
    }
}
