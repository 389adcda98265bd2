//! Per-generation CSV logs.

use std::io::Write;
use std::path::Path;

use csv::Writer;
use intercept_genetic::{Individual, RkParameters};
use intercept_lowthrust::{COAST_N, GAMMA_N, TAU_N};
use serde::Serialize;

use crate::{RecordError, artifact_path, writer_for_path};

pub const BEST_STEM: &str = "BestInGenerations";
pub const WORST_STEM: &str = "WorstInGenerations";
pub const BEST_THRUST_STEM: &str = "BestThrustGens";
pub const WORST_THRUST_STEM: &str = "WorstThrustGens";
pub const PROGRESSIVE_STEM: &str = "progressiveAnalysis";

/// One individual's outcome in a recorded generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationRow {
    #[serde(rename = "Gen #")]
    pub generation: usize,
    #[serde(rename = "posDiff")]
    pub pos_diff: f64,
    #[serde(rename = "velDiff")]
    pub vel_diff: f64,
    #[serde(rename = "rFinal")]
    pub r_final: f64,
    #[serde(rename = "thetaFinal")]
    pub theta_final: f64,
    #[serde(rename = "zFinal")]
    pub z_final: f64,
    #[serde(rename = "vrFinal")]
    pub vr_final: f64,
    #[serde(rename = "vthetaFinal")]
    pub vtheta_final: f64,
    #[serde(rename = "vzFinal")]
    pub vz_final: f64,
    #[serde(rename = "rInitial")]
    pub r_initial: f64,
    #[serde(rename = "thetaInitial")]
    pub theta_initial: f64,
    #[serde(rename = "zInitial")]
    pub z_initial: f64,
    #[serde(rename = "vrInitial")]
    pub vr_initial: f64,
    #[serde(rename = "vthetaInitial")]
    pub vtheta_initial: f64,
    #[serde(rename = "vzInitial")]
    pub vz_initial: f64,
    pub alpha: f64,
    pub beta: f64,
    pub zeta: f64,
    pub anneal: f64,
    #[serde(rename = "tripTime")]
    pub trip_time: f64,
}

impl GenerationRow {
    pub fn new(generation: usize, annealing: f64, individual: &Individual) -> Self {
        let (launch, arrival) = individual
            .evaluation
            .map(|e| (e.launch_state, e.final_state))
            .unwrap_or_default();
        let genome = &individual.genome;
        Self {
            generation,
            pos_diff: individual.pos_diff(),
            vel_diff: individual.vel_diff(),
            r_final: arrival.r,
            theta_final: arrival.theta,
            z_final: arrival.z,
            vr_final: arrival.vr,
            vtheta_final: arrival.vtheta,
            vz_final: arrival.vz,
            r_initial: launch.r,
            theta_initial: launch.theta,
            z_initial: launch.z,
            vr_initial: launch.vr,
            vtheta_initial: launch.vtheta,
            vz_initial: launch.vz,
            alpha: genome.alpha,
            beta: genome.beta,
            zeta: genome.zeta,
            anneal: annealing,
            trip_time: genome.trip_time,
        }
    }
}

fn numbered(prefix: &'static str, count: usize) -> impl Iterator<Item = String> {
    (0..count).map(move |i| format!("{prefix}{i}"))
}

fn coefficient_header() -> Vec<String> {
    numbered("gamma", GAMMA_N)
        .chain(numbered("tau", TAU_N))
        .chain(numbered("coast", COAST_N))
        .collect()
}

fn coefficient_fields(genome: &RkParameters) -> impl Iterator<Item = String> + '_ {
    let c = &genome.coefficients;
    c.gamma
        .iter()
        .chain(&c.tau)
        .chain(&c.coast)
        .map(|value| value.to_string())
}

type CsvOut = Writer<Box<dyn Write>>;

fn open_csv(dir: &Path, stem: &str, seed: u64) -> Result<CsvOut, RecordError> {
    let path = artifact_path(dir, stem, seed, "csv");
    Ok(Writer::from_writer(writer_for_path(&path)?))
}

struct ThrustLogs {
    best: CsvOut,
    worst: CsvOut,
}

/// Best and worst individual of every recorded generation, plus their steering
/// coefficients when the craft carries a thruster.
pub struct GenerationLog {
    best: CsvOut,
    worst: CsvOut,
    thrust: Option<ThrustLogs>,
}

impl GenerationLog {
    pub fn create(dir: &Path, seed: u64, thruster_active: bool) -> Result<Self, RecordError> {
        let thrust = if thruster_active {
            let mut header = vec!["Gen #".to_string()];
            header.extend(coefficient_header());
            let mut best = open_csv(dir, BEST_THRUST_STEM, seed)?;
            let mut worst = open_csv(dir, WORST_THRUST_STEM, seed)?;
            best.write_record(&header)?;
            worst.write_record(&header)?;
            Some(ThrustLogs { best, worst })
        } else {
            None
        };
        Ok(Self {
            best: open_csv(dir, BEST_STEM, seed)?,
            worst: open_csv(dir, WORST_STEM, seed)?,
            thrust,
        })
    }

    pub fn record(
        &mut self,
        generation: usize,
        annealing: f64,
        best: &Individual,
        worst: &Individual,
    ) -> Result<(), RecordError> {
        self.best
            .serialize(GenerationRow::new(generation, annealing, best))?;
        self.worst
            .serialize(GenerationRow::new(generation, annealing, worst))?;
        if let Some(thrust) = &mut self.thrust {
            for (writer, individual) in [(&mut thrust.best, best), (&mut thrust.worst, worst)] {
                let mut row = vec![generation.to_string()];
                row.extend(coefficient_fields(&individual.genome));
                writer.write_record(&row)?;
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), RecordError> {
        self.best.flush()?;
        self.worst.flush()?;
        if let Some(thrust) = &mut self.thrust {
            thrust.best.flush()?;
            thrust.worst.flush()?;
        }
        Ok(())
    }
}

/// Rank table of the first `best_count` individuals of a sorted pool.
pub fn write_progressive_analysis<W: Write>(
    writer: W,
    pool: &[Individual],
    best_count: usize,
    thruster_active: bool,
) -> Result<(), RecordError> {
    let mut csv = Writer::from_writer(writer);
    let mut header: Vec<String> = [
        "rank", "posDiff", "velDiff", "tripTime", "alpha", "beta", "zeta",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    if thruster_active {
        header.extend(coefficient_header());
    }
    csv.write_record(&header)?;

    for (rank, individual) in pool.iter().take(best_count).enumerate() {
        let genome = &individual.genome;
        let mut row = vec![(rank + 1).to_string()];
        row.extend(
            [
                individual.pos_diff(),
                individual.vel_diff(),
                genome.trip_time,
                genome.alpha,
                genome.beta,
                genome.zeta,
            ]
            .iter()
            .map(|v| v.to_string()),
        );
        if thruster_active {
            row.extend(coefficient_fields(genome));
        }
        csv.write_record(&row)?;
    }
    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use intercept_core::OrbitalElements;
    use intercept_genetic::{Evaluation, OPTIM_VARS};

    fn scored(cost: f64) -> Individual {
        let genes: [f64; OPTIM_VARS] = std::array::from_fn(|i| cost + i as f64);
        Individual {
            genome: RkParameters::from_array(genes, 0.5),
            evaluation: Some(Evaluation {
                launch_state: OrbitalElements::new(1.0, 0.1, 0.0, 0.0, 2e-7, 0.0),
                final_state: OrbitalElements::new(1.1, 2.0, 0.0, 1e-9, 1.9e-7, 0.0),
                pos_diff: cost * 1e-8,
                vel_diff: 0.0,
                cost,
                diverged: false,
                steps: 100,
            }),
        }
    }

    fn read(path: &Path) -> (csv::StringRecord, Vec<csv::StringRecord>) {
        let mut reader = csv::Reader::from_path(path).expect("csv");
        let header = reader.headers().expect("header").clone();
        let rows = reader.records().collect::<Result<Vec<_>, _>>().expect("rows");
        (header, rows)
    }

    #[test]
    fn generation_log_writes_best_worst_and_thrust_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut log = GenerationLog::create(dir.path(), 11, true).expect("log");
        for generation in [0, 5] {
            log.record(generation, 0.9, &scored(1.0), &scored(9.0))
                .expect("record");
        }
        log.flush().expect("flush");

        let (header, rows) = read(&artifact_path(dir.path(), BEST_STEM, 11, "csv"));
        assert_eq!(header.len(), 20);
        assert_eq!(&header[0], "Gen #");
        assert_eq!(&header[19], "tripTime");
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][0], "5");
        assert_eq!(rows[1][3].parse::<f64>().expect("rFinal"), 1.1);

        let (_, worst) = read(&artifact_path(dir.path(), WORST_STEM, 11, "csv"));
        assert_eq!(worst[0][18].parse::<f64>().expect("anneal"), 0.9);

        let (header, rows) = read(&artifact_path(dir.path(), BEST_THRUST_STEM, 11, "csv"));
        assert_eq!(header.len(), 1 + GAMMA_N + TAU_N + COAST_N);
        assert_eq!(&header[1], "gamma0");
        assert_eq!(rows[0][1].parse::<f64>().expect("gamma0"), 1.0);
        assert!(artifact_path(dir.path(), WORST_THRUST_STEM, 11, "csv").exists());
    }

    #[test]
    fn thrust_files_are_skipped_without_a_thruster() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut log = GenerationLog::create(dir.path(), 3, false).expect("log");
        log.record(0, 1.0, &scored(1.0), &scored(2.0)).expect("record");
        log.flush().expect("flush");
        assert!(!artifact_path(dir.path(), BEST_THRUST_STEM, 3, "csv").exists());
    }

    #[test]
    fn progressive_analysis_ranks_the_leading_individuals() {
        let pool = [scored(1.0), scored(2.0), scored(3.0)];
        let mut bytes = Vec::new();
        write_progressive_analysis(&mut bytes, &pool, 2, false).expect("write");
        let text = String::from_utf8(bytes).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("rank,posDiff,velDiff,tripTime"));
        assert!(lines[2].starts_with("2,"));
    }
}
