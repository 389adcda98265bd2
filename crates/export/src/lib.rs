//! Records written by an intercept search: binary trajectory and final-optimization files,
//! per-generation CSV logs, and a JSON run summary.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod generations;

pub use generations::{GenerationLog, GenerationRow, write_progressive_analysis};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("record of {len} bytes is not a whole number of {unit}-byte entries")]
    Truncated { len: usize, unit: usize },
    #[error("unexpected record layout: {0}")]
    Layout(String),
}

/// Create a writer for the target path, handling stdout (`-`) by convention.
pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

/// `<dir>/<stem>-<seed>.<extension>`, the naming used for every run artifact.
pub fn artifact_path(dir: &Path, stem: &str, seed: u64, extension: &str) -> PathBuf {
    dir.join(format!("{stem}-{seed}.{extension}"))
}

fn write_f64s<W: Write + ?Sized>(writer: &mut W, values: &[f64]) -> io::Result<()> {
    for value in values {
        writer.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

fn decode_f64s(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect()
}

/// Step-by-step trajectory record, little-endian doubles.
pub mod trajectory {
    use std::io::{Read, Write};

    use intercept_core::OrbitalElements;
    use intercept_propagator::TrajectoryPoint;

    use super::{RecordError, decode_f64s, write_f64s};

    pub const FILE_STEM: &str = "orbitalMotion";
    /// r, theta, z, vr, vtheta, vz, time, gamma, tau, accel, fuel spent.
    pub const FIELDS_PER_STEP: usize = 11;
    const STEP_BYTES: usize = FIELDS_PER_STEP * 8;

    fn fields(point: &TrajectoryPoint) -> [f64; FIELDS_PER_STEP] {
        let s = point.state;
        [
            s.r,
            s.theta,
            s.z,
            s.vr,
            s.vtheta,
            s.vz,
            point.time,
            point.gamma,
            point.tau,
            point.accel,
            point.fuel_spent,
        ]
    }

    pub fn write_trajectory<W: Write + ?Sized>(
        writer: &mut W,
        points: &[TrajectoryPoint],
    ) -> Result<(), RecordError> {
        for point in points {
            write_f64s(writer, &fields(point))?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read_trajectory<R: Read>(mut reader: R) -> Result<Vec<TrajectoryPoint>, RecordError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        if bytes.len() % STEP_BYTES != 0 {
            return Err(RecordError::Truncated {
                len: bytes.len(),
                unit: STEP_BYTES,
            });
        }
        Ok(decode_f64s(&bytes)
            .chunks_exact(FIELDS_PER_STEP)
            .map(|v| TrajectoryPoint {
                state: OrbitalElements::new(v[0], v[1], v[2], v[3], v[4], v[5]),
                time: v[6],
                gamma: v[7],
                tau: v[8],
                accel: v[9],
                fuel_spent: v[10],
            })
            .collect())
    }
}

/// Summary of the best genome: mission geometry, series sizes, genes, and step count.
pub mod final_record {
    use std::io::{Read, Write};

    use intercept_core::OrbitalElements;
    use intercept_core::elements::STATE_DIM;
    use intercept_genetic::{OPTIM_VARS, RkParameters};
    use intercept_lowthrust::{COAST_N, GAMMA_N, TAU_N};

    use super::{RecordError, decode_f64s, write_f64s};

    pub const FILE_STEM: &str = "finalOptimization";
    /// Target, Earth, coast threshold, three series sizes, genome, step count.
    pub const RECORD_LEN: usize = 2 * STATE_DIM + 1 + 3 + OPTIM_VARS + 1;

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct FinalRecord {
        /// Target state at impact.
        pub target: OrbitalElements,
        /// Earth state at impact.
        pub earth: OrbitalElements,
        pub genome: RkParameters,
        /// Accepted propagation steps of the recorded trajectory.
        pub steps: usize,
    }

    impl FinalRecord {
        pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), RecordError> {
            write_f64s(writer, &self.target.to_array())?;
            write_f64s(writer, &self.earth.to_array())?;
            write_f64s(
                writer,
                &[
                    self.genome.coefficients.coast_threshold,
                    GAMMA_N as f64,
                    TAU_N as f64,
                    COAST_N as f64,
                ],
            )?;
            write_f64s(writer, &self.genome.to_array())?;
            write_f64s(writer, &[self.steps as f64])?;
            writer.flush()?;
            Ok(())
        }

        pub fn read_from<R: Read>(mut reader: R) -> Result<Self, RecordError> {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes)?;
            if bytes.len() != RECORD_LEN * 8 {
                return Err(RecordError::Truncated {
                    len: bytes.len(),
                    unit: RECORD_LEN * 8,
                });
            }
            let v = decode_f64s(&bytes);
            let sizes = [v[13], v[14], v[15]];
            if sizes != [GAMMA_N as f64, TAU_N as f64, COAST_N as f64] {
                return Err(RecordError::Layout(format!(
                    "series sizes {sizes:?} differ from {GAMMA_N}/{TAU_N}/{COAST_N}"
                )));
            }
            let state = |offset: usize| {
                let mut a = [0.0; STATE_DIM];
                a.copy_from_slice(&v[offset..offset + STATE_DIM]);
                OrbitalElements::from_array(a)
            };
            let mut genes = [0.0; OPTIM_VARS];
            genes.copy_from_slice(&v[16..16 + OPTIM_VARS]);
            Ok(Self {
                target: state(0),
                earth: state(STATE_DIM),
                genome: RkParameters::from_array(genes, v[12]),
                steps: v[RECORD_LEN - 1] as usize,
            })
        }
    }
}

/// JSON sidecar describing how a run ended and what it found.
pub mod summary {
    use std::io::Write;

    use intercept_core::constants::SECONDS_PER_YEAR;
    use intercept_genetic::{Individual, RkParameters, TerminationReason};
    use serde::{Deserialize, Serialize};
    use serde_json::to_writer_pretty;

    use super::RecordError;

    pub const FILE_STEM: &str = "runSummary";

    /// Cost and miss distances are `None` when the best individual diverged or was never scored.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct RunSummary {
        pub seed: u64,
        pub reason: TerminationReason,
        pub generations: usize,
        pub annealing: f64,
        pub diverged: bool,
        pub cost: Option<f64>,
        pub pos_diff: Option<f64>,
        pub vel_diff: Option<f64>,
        pub trip_time_years: f64,
        pub genome: RkParameters,
    }

    fn finite(value: f64) -> Option<f64> {
        value.is_finite().then_some(value)
    }

    impl RunSummary {
        pub fn new(
            seed: u64,
            reason: TerminationReason,
            generations: usize,
            annealing: f64,
            best: &Individual,
        ) -> Self {
            let diverged = best.is_diverged();
            Self {
                seed,
                reason,
                generations,
                annealing,
                diverged,
                cost: (!diverged).then(|| best.cost()),
                pos_diff: finite(best.pos_diff()),
                vel_diff: finite(best.vel_diff()),
                trip_time_years: best.genome.trip_time / SECONDS_PER_YEAR,
                genome: best.genome,
            }
        }
    }

    pub fn write_summary<W: Write>(mut writer: W, summary: &RunSummary) -> Result<(), RecordError> {
        to_writer_pretty(&mut writer, summary)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}
