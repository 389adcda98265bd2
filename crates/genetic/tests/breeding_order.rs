use intercept_config::{GeneticConfig, SelectionMethod};
use intercept_core::OrbitalElements;
use intercept_genetic::{
    Evaluate, Evaluation, Individual, Mask, MutationSettings, OPTIM_VARS, Population,
    RkParameters, generate_new_individual,
};
use intercept_propulsion::{NextThruster, Thruster};
use rand::SeedableRng;
use rand_pcg::Pcg64;

struct GeneSum;

impl Evaluate for GeneSum {
    fn evaluate(&self, genome: &RkParameters) -> Evaluation {
        let cost: f64 = genome.to_array().iter().map(|g| g.abs()).sum();
        Evaluation {
            launch_state: OrbitalElements::default(),
            final_state: OrbitalElements::default(),
            pos_diff: cost,
            vel_diff: 0.0,
            cost,
            diverged: false,
            steps: 0,
        }
    }
}

fn distinct_pool(size: usize) -> Vec<Individual> {
    (0..size)
        .map(|i| {
            let genes: [f64; OPTIM_VARS] =
                std::array::from_fn(|g| (i + 1) as f64 * 10.0 + g as f64 * 0.01);
            Individual::new(RkParameters::from_array(genes, 0.5))
        })
        .collect()
}

fn frozen_mutation() -> MutationSettings {
    MutationSettings {
        rate: 0.0,
        ..MutationSettings::from_config(&GeneticConfig::default())
    }
}

fn sorted_population(size: usize) -> Population {
    let mut population = Population::new(distinct_pool(size), 2).expect("shape");
    population.evaluate(&GeneSum);
    population.sort();
    population
}

fn genomes(population: &Population) -> Vec<RkParameters> {
    population.individuals().iter().map(|i| i.genome).collect()
}

#[test]
fn whole_random_pair_then_average_pair_then_bundle() {
    let thruster = Thruster::Next(NextThruster::default());
    let mut population = sorted_population(7);
    let mut selection_rng = Pcg64::seed_from_u64(0);
    let survivors = population.select(SelectionMethod::Elitist, &mut selection_rng);
    let (p1, p2) = (survivors[0].genome, survivors[1].genome);

    let mut rng = Pcg64::seed_from_u64(77);
    population
        .breed(&survivors, &mut rng, 1.0, &frozen_mutation(), &thruster)
        .expect("breed");

    let mut replay = Pcg64::seed_from_u64(77);
    let whole = Mask::whole_random(&mut replay);
    let bundle = Mask::bundle_vars(&mut replay);
    let expected = vec![
        p1,
        p2,
        generate_new_individual(&p1, &p2, &whole, &thruster),
        generate_new_individual(&p1, &p2, &whole.flip(), &thruster),
        generate_new_individual(&p1, &p2, &Mask::average(), &thruster),
        generate_new_individual(&p1, &p2, &Mask::average(), &thruster),
        generate_new_individual(&p1, &p2, &bundle, &thruster),
    ];
    assert_eq!(genomes(&population), expected);
    assert!(population.individuals()[2..].iter().all(|i| !i.is_evaluated()));
    assert!(population.individuals()[..2].iter().all(Individual::is_evaluated));
}

#[test]
fn average_children_sit_between_their_parents() {
    let thruster = Thruster::Next(NextThruster::default());
    let mut population = sorted_population(6);
    let mut rng = Pcg64::seed_from_u64(3);
    let survivors = population.select(SelectionMethod::Elitist, &mut rng);
    population
        .breed(&survivors, &mut rng, 1.0, &frozen_mutation(), &thruster)
        .expect("breed");

    let a = survivors[0].genome.to_array();
    let b = survivors[1].genome.to_array();
    for child in &population.individuals()[4..6] {
        let genes = child.genome.to_array();
        for g in 0..OPTIM_VARS {
            assert!((genes[g] - (a[g] + b[g]) / 2.0).abs() < 1e-12, "gene {g}");
        }
    }
}

#[test]
fn breeding_is_reproducible_for_a_seed() {
    let thruster = Thruster::Next(NextThruster::default());
    let mutation = MutationSettings::from_config(&GeneticConfig::default());
    let bred = |seed: u64| {
        let mut population = sorted_population(10);
        let mut rng = Pcg64::seed_from_u64(seed);
        let survivors = population.select(SelectionMethod::Tournament, &mut rng);
        population
            .breed(&survivors, &mut rng, 0.5, &mutation, &thruster)
            .expect("breed");
        genomes(&population)
    };
    assert_eq!(bred(5), bred(5));
    assert_ne!(bred(5), bred(6));
}
