//! Configuration model and loaders for the asteroid intercept optimizer.
//!
//! A [`GeneticConfig`] is read once at start-up and is read-only afterwards. Three document
//! formats are accepted, chosen by file extension: TOML, YAML, and the line-oriented
//! `key=value` format (see [`key_value`]).

use std::path::Path;
use std::str::FromStr;

use intercept_core::OrbitalElements;
use intercept_core::constants::SECONDS_PER_YEAR;
use intercept_core::units::kms_to_au_s;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub mod key_value;

pub use key_value::{ConfigWarning, parse_key_value};

/// Survivor selection policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMethod {
    /// Keep the best `survivor_count` individuals of the sorted pool.
    #[default]
    Elitist,
    /// Binary tournaments drawn without replacement.
    Tournament,
}

impl FromStr for SelectionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "elitist" => Ok(Self::Elitist),
            "tournament" => Ok(Self::Tournament),
            other => Err(format!("unknown selection method '{other}'")),
        }
    }
}

/// Every tunable constant of a run.
///
/// Field names double as configuration keys in all three formats. Distances are in AU,
/// velocities in AU/s, times in seconds, angles in radians, masses in kg. Mutation scales for
/// the trip time are expressed in years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    pub pos_threshold: f64,
    pub speed_threshold: f64,
    /// A best cost below this value ends the search as converged.
    pub cost_threshold: f64,
    /// 0 = no thruster, 1 = NEXT ion thruster.
    pub thruster_type: u32,

    pub anneal_factor: f64,
    pub anneal_initial: f64,
    pub mutation_rate: f64,
    pub double_mutate_rate: f64,
    pub triple_mutate_rate: f64,
    pub gamma_mutate_scale: f64,
    pub tau_mutate_scale: f64,
    pub coast_mutate_scale: f64,
    pub triptime_mutate_scale: f64,
    pub zeta_mutate_scale: f64,
    pub beta_mutate_scale: f64,
    pub alpha_mutate_scale: f64,

    #[serde(deserialize_with = "deserialize_seed")]
    pub time_seed: u64,
    pub best_count: usize,
    pub change_check: usize,
    pub write_freq: usize,
    pub disp_freq: usize,

    pub num_individuals: usize,
    pub survivor_count: usize,
    pub max_generations: usize,
    pub selection_method: SelectionMethod,

    pub rk_tol: f64,
    pub max_numsteps: usize,
    pub min_numsteps: usize,

    pub coast_threshold: f64,
    pub wet_mass: f64,
    pub dry_mass: f64,
    pub v_escape: f64,

    pub r_fin_ast: f64,
    pub theta_fin_ast: f64,
    pub z_fin_ast: f64,
    pub vr_fin_ast: f64,
    pub vtheta_fin_ast: f64,
    pub vz_fin_ast: f64,
    pub r_fin_earth: f64,
    pub theta_fin_earth: f64,
    pub z_fin_earth: f64,
    pub vr_fin_earth: f64,
    pub vtheta_fin_earth: f64,
    pub vz_fin_earth: f64,
    pub triptime_min: f64,
    pub triptime_max: f64,
    pub time_res: f64,

    pub gamma_random_start_range: f64,
    pub tau_random_start_range: f64,
    pub coast_random_start_range: f64,
    pub alpha_random_start_range: f64,
    pub beta_random_start_range: f64,
    pub zeta_random_start_range: f64,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            pos_threshold: 1.0e-8,
            speed_threshold: 1.0e-10,
            cost_threshold: 1.0,
            thruster_type: 1,

            anneal_factor: 0.99,
            anneal_initial: 1.0,
            mutation_rate: 0.5,
            double_mutate_rate: 0.2,
            triple_mutate_rate: 0.05,
            gamma_mutate_scale: 1.0,
            tau_mutate_scale: 0.5,
            coast_mutate_scale: 0.5,
            triptime_mutate_scale: 0.1,
            zeta_mutate_scale: 0.25,
            beta_mutate_scale: 0.5,
            alpha_mutate_scale: 0.5,

            time_seed: 0,
            best_count: 1,
            change_check: 100,
            write_freq: 1,
            disp_freq: 10,

            num_individuals: 100,
            survivor_count: 20,
            max_generations: 5_000,
            selection_method: SelectionMethod::Elitist,

            rk_tol: 1.0e-12,
            max_numsteps: 5_000,
            min_numsteps: 400,

            coast_threshold: 0.5,
            wet_mass: 3_000.0,
            dry_mass: 2_700.0,
            v_escape: kms_to_au_s(4.0),

            r_fin_ast: 1.025_310_9,
            theta_fin_ast: 2.187_145_3,
            z_fin_ast: -1.191_844_7e-3,
            vr_fin_ast: -2.051_384_6e-9,
            vtheta_fin_ast: 1.954_178_2e-7,
            vz_fin_ast: 3.014_286_7e-10,
            r_fin_earth: 1.000_431_7,
            theta_fin_earth: 2.083_642_9,
            z_fin_earth: -1.532_714_1e-5,
            vr_fin_earth: -1.172_094_4e-10,
            vtheta_fin_earth: 1.990_713_4e-7,
            vz_fin_earth: 1.038_514_2e-12,
            triptime_min: SECONDS_PER_YEAR,
            triptime_max: 3.0 * SECONDS_PER_YEAR,
            time_res: 3_600.0,

            gamma_random_start_range: 3.0,
            tau_random_start_range: 1.5,
            coast_random_start_range: 1.0,
            alpha_random_start_range: std::f64::consts::PI,
            beta_random_start_range: std::f64::consts::PI,
            zeta_random_start_range: std::f64::consts::FRAC_PI_2,
        }
    }
}

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("{0}")]
    Line(#[from] ConfigWarning),
    #[error("invalid configuration: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Thruster codes understood by the propulsion model: 0 = none, 1 = NEXT.
pub const THRUSTER_CODES: std::ops::RangeInclusive<u32> = 0..=1;

fn partner_field(field: &str) -> Option<&'static str> {
    match field {
        "survivor_count" => Some("num_individuals"),
        "double_mutate_rate" => Some("triple_mutate_rate"),
        "dry_mass" => Some("wet_mass"),
        "triptime_min" => Some("triptime_max"),
        "min_numsteps" => Some("max_numsteps"),
        _ => None,
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

impl GeneticConfig {
    /// Check cross-field constraints the generational loop relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !THRUSTER_CODES.contains(&self.thruster_type) {
            return Err(invalid(
                "thruster_type",
                format!("unsupported code {}", self.thruster_type),
            ));
        }
        if self.survivor_count < 2 || self.survivor_count % 2 != 0 {
            return Err(invalid(
                "survivor_count",
                format!("must be even and at least 2, got {}", self.survivor_count),
            ));
        }
        if self.survivor_count >= self.num_individuals {
            return Err(invalid(
                "survivor_count",
                format!(
                    "must be smaller than num_individuals ({} >= {})",
                    self.survivor_count, self.num_individuals
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(invalid("mutation_rate", "must lie in [0, 1]"));
        }
        if !(0.0 <= self.triple_mutate_rate
            && self.triple_mutate_rate <= self.double_mutate_rate
            && self.double_mutate_rate <= 1.0)
        {
            return Err(invalid(
                "double_mutate_rate",
                "thresholds must satisfy 0 <= triple <= double <= 1",
            ));
        }
        for (field, value) in [
            ("pos_threshold", self.pos_threshold),
            ("speed_threshold", self.speed_threshold),
            ("rk_tol", self.rk_tol),
            ("time_res", self.time_res),
            ("dry_mass", self.dry_mass),
            ("anneal_initial", self.anneal_initial),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(invalid(field, format!("must be positive, got {value}")));
            }
        }
        if self.dry_mass > self.wet_mass {
            return Err(invalid("dry_mass", "must not exceed wet_mass"));
        }
        if !(self.triptime_min > 0.0 && self.triptime_min < self.triptime_max) {
            return Err(invalid(
                "triptime_min",
                "must be positive and smaller than triptime_max",
            ));
        }
        if self.min_numsteps == 0 || self.min_numsteps > self.max_numsteps {
            return Err(invalid(
                "min_numsteps",
                "must be positive and not exceed max_numsteps",
            ));
        }
        if self.write_freq == 0 {
            return Err(invalid("write_freq", "must be positive"));
        }
        if self.disp_freq == 0 {
            return Err(invalid("disp_freq", "must be positive"));
        }
        Ok(())
    }

    /// Reset every field rejected by [`validate`](Self::validate) to its default, returning the
    /// rejections in the order they were repaired.
    ///
    /// The named field is reset first. If the same check fails again its partner field (the other
    /// side of the comparison) is reset too, and a third failure falls back to the full default.
    pub fn restore_invalid_defaults(&mut self) -> Vec<ConfigError> {
        let defaults = Self::default();
        let mut rejected: Vec<ConfigError> = Vec::new();
        while let Err(err) = self.validate() {
            let ConfigError::Invalid { field, .. } = &err else {
                *self = defaults;
                rejected.push(err);
                break;
            };
            let field = *field;
            let repeats = rejected
                .iter()
                .filter(|prior| {
                    matches!(prior, ConfigError::Invalid { field: f, .. } if *f == field)
                })
                .count();
            match (repeats, partner_field(field)) {
                (0, _) => self.reset_field(field, &defaults),
                (1, Some(partner)) => {
                    self.reset_field(field, &defaults);
                    self.reset_field(partner, &defaults);
                }
                _ => {
                    *self = defaults;
                    rejected.push(err);
                    break;
                }
            }
            rejected.push(err);
        }
        rejected
    }

    fn reset_field(&mut self, field: &str, defaults: &Self) {
        macro_rules! reset {
            ($($name:ident),* $(,)?) => {
                match field {
                    $(stringify!($name) => self.$name = defaults.$name,)*
                    _ => {}
                }
            };
        }
        reset!(
            thruster_type,
            mutation_rate,
            double_mutate_rate,
            triple_mutate_rate,
            pos_threshold,
            speed_threshold,
            rk_tol,
            time_res,
            dry_mass,
            wet_mass,
            anneal_initial,
            triptime_min,
            triptime_max,
            min_numsteps,
            max_numsteps,
            write_freq,
            disp_freq,
            survivor_count,
            num_individuals,
        );
    }

    /// Target body state at the impact date.
    pub fn target_final_state(&self) -> OrbitalElements {
        OrbitalElements::new(
            self.r_fin_ast,
            self.theta_fin_ast,
            self.z_fin_ast,
            self.vr_fin_ast,
            self.vtheta_fin_ast,
            self.vz_fin_ast,
        )
    }

    /// Earth state at the impact date.
    pub fn earth_final_state(&self) -> OrbitalElements {
        OrbitalElements::new(
            self.r_fin_earth,
            self.theta_fin_earth,
            self.z_fin_earth,
            self.vr_fin_earth,
            self.vtheta_fin_earth,
            self.vz_fin_earth,
        )
    }

    /// Annealing factor applied to mutation scales in generation `generation`.
    pub fn annealing_at(&self, generation: usize) -> f64 {
        self.anneal_initial * self.anneal_factor.powi(generation as i32)
    }
}

/// Load a configuration strictly: any I/O, syntax, or line-level problem is an error, and the
/// result must pass [`GeneticConfig::validate`].
pub fn load<P: AsRef<Path>>(path: P) -> Result<GeneticConfig, ConfigError> {
    let (config, warnings) = load_document(path.as_ref())?;
    if let Some(first) = warnings.into_iter().next() {
        return Err(first.into());
    }
    config.validate()?;
    Ok(config)
}

/// Load a configuration leniently.
///
/// Unreadable or unparsable files fall back to [`GeneticConfig::default`]; individual bad lines
/// keep their defaults, and values that parse but fail [`GeneticConfig::validate`] are restored
/// to their defaults. Every problem is logged as a warning, and the result always validates.
pub fn load_or_default<P: AsRef<Path>>(path: P) -> GeneticConfig {
    let path = path.as_ref();
    let mut config = match load_document(path) {
        Ok((config, warnings)) => {
            for warning in &warnings {
                warn!(path = %path.display(), "{warning}");
            }
            config
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "unable to load config, using defaults");
            return GeneticConfig::default();
        }
    };
    for err in config.restore_invalid_defaults() {
        warn!(path = %path.display(), error = %err, "restoring default");
    }
    config
}

fn load_document(path: &Path) -> Result<(GeneticConfig, Vec<ConfigWarning>), ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Ok((toml::from_str(&contents)?, Vec::new())),
        Some("yaml" | "yml") => Ok((serde_yaml::from_str(&contents)?, Vec::new())),
        _ => Ok(parse_key_value(&contents)),
    }
}

/// Current UNIX time in seconds, used when the seed is given as `NONE`.
pub fn wall_clock_seed() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

fn deserialize_seed<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SeedValue {
        Number(u64),
        Text(String),
    }

    match SeedValue::deserialize(deserializer)? {
        SeedValue::Number(seed) => Ok(seed),
        SeedValue::Text(text) if text.eq_ignore_ascii_case("NONE") => {
            let seed = wall_clock_seed();
            info!(seed, "time_seed set from wall clock");
            Ok(seed)
        }
        SeedValue::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        GeneticConfig::default()
            .validate()
            .expect("default configuration should validate");
    }

    #[test]
    fn validate_rejects_odd_survivors() {
        let config = GeneticConfig {
            survivor_count: 7,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "survivor_count",
                ..
            })
        ));
    }

    #[test]
    fn validate_rejects_misordered_mutation_thresholds() {
        let config = GeneticConfig {
            double_mutate_rate: 0.1,
            triple_mutate_rate: 0.3,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn annealing_decays_geometrically() {
        let config = GeneticConfig {
            anneal_initial: 2.0,
            anneal_factor: 0.5,
            ..Default::default()
        };
        assert_eq!(config.annealing_at(0), 2.0);
        assert_eq!(config.annealing_at(3), 0.25);
    }

    #[test]
    fn toml_and_yaml_documents_are_dispatched_by_extension() {
        let dir = tempfile::tempdir().expect("tempdir");

        let toml_path = dir.path().join("run.toml");
        std::fs::write(
            &toml_path,
            "num_individuals = 40\nsurvivor_count = 8\ntime_seed = 7\nselection_method = \"tournament\"\n",
        )
        .expect("write toml");
        let config = load(&toml_path).expect("toml config should load");
        assert_eq!(config.num_individuals, 40);
        assert_eq!(config.survivor_count, 8);
        assert_eq!(config.time_seed, 7);
        assert_eq!(config.selection_method, SelectionMethod::Tournament);

        let yaml_path = dir.path().join("run.yaml");
        std::fs::write(&yaml_path, "mutation_rate: 0.1\ntime_seed: NONE\n").expect("write yaml");
        let config = load(&yaml_path).expect("yaml config should load");
        assert_eq!(config.mutation_rate, 0.1);
        assert!(config.time_seed > 0);
    }

    #[test]
    fn key_value_file_loads_strictly_and_leniently() {
        let mut file = tempfile::Builder::new()
            .suffix(".config")
            .tempfile()
            .expect("tempfile");
        writeln!(file, "// test run").expect("write");
        writeln!(file, "pos_threshold=5e-9").expect("write");
        writeln!(file, "mystery=1").expect("write");

        assert!(matches!(load(file.path()), Err(ConfigError::Line(_))));

        let config = load_or_default(file.path());
        assert_eq!(config.pos_threshold, 5e-9);
    }

    #[test]
    fn validate_rejects_unknown_thruster_codes() {
        let config = GeneticConfig {
            thruster_type: 7,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "thruster_type",
                ..
            })
        ));
    }

    #[test]
    fn lenient_load_restores_rejected_values() {
        let mut file = tempfile::Builder::new()
            .suffix(".config")
            .tempfile()
            .expect("tempfile");
        writeln!(file, "survivor_count=7").expect("write");
        writeln!(file, "thruster_type=7").expect("write");
        writeln!(file, "mutation_rate=0.3").expect("write");

        assert!(matches!(load(file.path()), Err(ConfigError::Invalid { .. })));

        let defaults = GeneticConfig::default();
        let config = load_or_default(file.path());
        config.validate().expect("lenient load should yield a runnable config");
        assert_eq!(config.survivor_count, defaults.survivor_count);
        assert_eq!(config.thruster_type, defaults.thruster_type);
        assert_eq!(config.mutation_rate, 0.3);
    }

    #[test]
    fn conflicting_pair_falls_back_to_both_defaults() {
        let defaults = GeneticConfig::default();
        let mut config = GeneticConfig {
            num_individuals: 6,
            survivor_count: 8,
            best_count: 2,
            ..Default::default()
        };
        let rejected = config.restore_invalid_defaults();
        assert_eq!(rejected.len(), 2);
        config.validate().expect("repaired");
        assert_eq!(config.survivor_count, defaults.survivor_count);
        assert_eq!(config.num_individuals, defaults.num_individuals);
        assert_eq!(config.best_count, 2);
    }

    #[test]
    fn valid_config_needs_no_repair() {
        let mut config = GeneticConfig::default();
        assert!(config.restore_invalid_defaults().is_empty());
        assert_eq!(config, GeneticConfig::default());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_or_default(dir.path().join("absent.config"));
        assert_eq!(config, GeneticConfig::default());
        assert!(matches!(
            load(dir.path().join("absent.config")),
            Err(ConfigError::Io(_))
        ));
    }
}
