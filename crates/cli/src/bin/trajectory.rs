use std::fs::File;
use std::path::PathBuf;

use asteroid_intercept::config;
use asteroid_intercept::export::final_record::FinalRecord;
use asteroid_intercept::export::{trajectory, writer_for_path};
use asteroid_intercept::genetic::{Evaluate, Evaluator};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Re-propagate a recorded genome and write its trajectory record"
)]
struct Cli {
    /// Configuration used for the original search
    #[arg(long, default_value = "configs/genetic.config")]
    config: PathBuf,

    /// finalOptimization record to replay
    #[arg(long = "final")]
    final_record: PathBuf,

    /// Trajectory output path (use '-' for stdout)
    #[arg(long)]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = config::load_or_default(&cli.config);
    let record = FinalRecord::read_from(File::open(&cli.final_record)?)?;
    if record.target != config.target_final_state() || record.earth != config.earth_final_state()
    {
        warn!("recorded mission geometry differs from the configuration; using the record");
        [
            config.r_fin_ast,
            config.theta_fin_ast,
            config.z_fin_ast,
            config.vr_fin_ast,
            config.vtheta_fin_ast,
            config.vz_fin_ast,
        ] = record.target.to_array();
        [
            config.r_fin_earth,
            config.theta_fin_earth,
            config.z_fin_earth,
            config.vr_fin_earth,
            config.vtheta_fin_earth,
            config.vz_fin_earth,
        ] = record.earth.to_array();
    }

    let evaluator = Evaluator::from_config(&config)?;
    let genome = record.genome;
    let propagation = evaluator.trajectory(&genome).ok_or_else(|| {
        anyhow::anyhow!(
            "Trip time {} s lies outside the tabulated Earth ephemeris",
            genome.trip_time
        )
    })?;
    let evaluation = evaluator.evaluate(&genome);

    let mut out = writer_for_path(&cli.output)?;
    trajectory::write_trajectory(&mut out, &propagation.trace)?;
    info!(
        steps = propagation.steps,
        diverged = propagation.diverged,
        pos_diff = evaluation.pos_diff,
        vel_diff = evaluation.vel_diff,
        "trajectory written"
    );
    Ok(())
}
