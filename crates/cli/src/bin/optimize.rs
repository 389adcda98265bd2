use std::path::{Path, PathBuf};

use asteroid_intercept::config::{self, GeneticConfig};
use asteroid_intercept::constants::SECONDS_PER_YEAR;
use asteroid_intercept::export::generations::PROGRESSIVE_STEM;
use asteroid_intercept::export::summary::{self, RunSummary};
use asteroid_intercept::export::{
    GenerationLog, RecordError, artifact_path, final_record, trajectory, write_progressive_analysis,
    writer_for_path,
};
use asteroid_intercept::genetic::{GenerationObserver, GenerationReport};
use asteroid_intercept::propulsion::Thruster;
use asteroid_intercept::search::{SearchResult, record_individual, run_search};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Genetic search for a low-thrust asteroid intercept trajectory"
)]
struct Cli {
    /// Configuration file (key=value, .toml or .yaml)
    #[arg(long, default_value = "configs/genetic.config")]
    config: PathBuf,

    /// Directory receiving the run records
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Override the configured random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the configured generation budget
    #[arg(long)]
    max_generations: Option<usize>,

    /// Reject configuration problems instead of falling back to defaults
    #[arg(long, default_value_t = false)]
    strict: bool,
}

/// Writes the generation logs every `write_freq` generations and reports progress every
/// `disp_freq` generations.
struct Recorder {
    log: Option<GenerationLog>,
    write_freq: usize,
    disp_freq: usize,
}

impl Recorder {
    fn new(config: &GeneticConfig, dir: &Path, thruster_active: bool) -> Self {
        let log = match GenerationLog::create(dir, config.time_seed, thruster_active) {
            Ok(log) => Some(log),
            Err(err) => {
                warn!(%err, dir = %dir.display(), "generation logs disabled");
                None
            }
        };
        Self {
            log,
            write_freq: config.write_freq.max(1),
            disp_freq: config.disp_freq.max(1),
        }
    }

    fn finish(&mut self) {
        if let Some(log) = &mut self.log {
            if let Err(err) = log.flush() {
                warn!(%err, "failed to flush generation logs");
            }
        }
    }
}

impl GenerationObserver for Recorder {
    fn on_generation(&mut self, report: &GenerationReport<'_>) {
        if report.generation % self.write_freq == 0 {
            if let Some(log) = &mut self.log {
                if let Err(err) =
                    log.record(report.generation, report.annealing, report.best(), report.worst())
                {
                    warn!(%err, generation = report.generation, "failed to record generation");
                }
            }
        }
        if report.generation % self.disp_freq == 0 {
            let best = report.best();
            info!(
                generation = report.generation,
                cost = best.cost(),
                pos_diff = best.pos_diff(),
                vel_diff = best.vel_diff(),
                trip_years = best.genome.trip_time / SECONDS_PER_YEAR,
                annealing = report.annealing,
                "best individual"
            );
        }
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = if cli.strict {
        config::load(&cli.config).map_err(|err| {
            anyhow::anyhow!("Invalid configuration '{}': {err}", cli.config.display())
        })?
    } else {
        config::load_or_default(&cli.config)
    };
    if let Some(seed) = cli.seed {
        config.time_seed = seed;
    }
    if let Some(limit) = cli.max_generations {
        config.max_generations = limit;
    }

    let thruster_active = Thruster::from_type_code(config.thruster_type)?.is_active();
    let mut recorder = Recorder::new(&config, &cli.output_dir, thruster_active);
    let result = run_search(&config, &mut recorder)?;
    recorder.finish();

    let outcome = &result.outcome;
    info!(
        reason = ?outcome.reason,
        generations = outcome.generations,
        cost = outcome.best().cost(),
        "search complete"
    );

    if let Err(err) = write_results(&config, &cli.output_dir, &result, thruster_active) {
        warn!(%err, "failed to write final records");
    }
    Ok(())
}

fn write_results(
    config: &GeneticConfig,
    dir: &Path,
    result: &SearchResult,
    thruster_active: bool,
) -> Result<(), RecordError> {
    let seed = config.time_seed;
    let leaders = result.leaders(config.best_count.max(1));

    for (rank, individual) in leaders.iter().enumerate() {
        let suffix = if rank == 0 {
            String::new()
        } else {
            format!("_{}", rank + 1)
        };
        let Some((record, propagation)) = record_individual(&result.evaluator, config, individual)
        else {
            warn!(rank = rank + 1, "trip time outside the ephemeris, trajectory not recorded");
            continue;
        };
        let stem = format!("{}{suffix}", trajectory::FILE_STEM);
        let mut out = writer_for_path(&artifact_path(dir, &stem, seed, "bin"))?;
        trajectory::write_trajectory(&mut out, &propagation.trace)?;

        let stem = format!("{}{suffix}", final_record::FILE_STEM);
        let mut out = writer_for_path(&artifact_path(dir, &stem, seed, "bin"))?;
        record.write_to(&mut out)?;
    }

    let out = writer_for_path(&artifact_path(dir, PROGRESSIVE_STEM, seed, "csv"))?;
    write_progressive_analysis(out, leaders, leaders.len(), thruster_active)?;

    let outcome = &result.outcome;
    let run = RunSummary::new(
        seed,
        outcome.reason,
        outcome.generations,
        outcome.annealing,
        outcome.best(),
    );
    let out = writer_for_path(&artifact_path(dir, summary::FILE_STEM, seed, "json"))?;
    summary::write_summary(out, &run)?;
    Ok(())
}
