//! Line-oriented `key=value` configuration format.
//!
//! ```text
//! // comment lines and blank lines are ignored
//! pos_threshold=1e-8
//! mutation_rate = 0.5   // trailing comments are stripped
//! time_seed=NONE
//! ```

use std::str::FromStr;

use thiserror::Error;
use tracing::info;

use crate::{GeneticConfig, SelectionMethod, wall_clock_seed};

/// Recoverable problem found while reading a `key=value` document.
///
/// Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigWarning {
    #[error("line {line}: unknown variable '{key}'")]
    UnknownKey { line: usize, key: String },
    #[error("line {line}: could not parse '{value}' for '{key}', keeping default")]
    InvalidValue {
        line: usize,
        key: String,
        value: String,
    },
    #[error("line {line}: expected key=value, found '{text}'")]
    MalformedLine { line: usize, text: String },
}

enum AssignError {
    UnknownKey,
    InvalidValue,
}

fn parse_value<T: FromStr>(value: &str) -> Result<T, AssignError> {
    value.parse().map_err(|_| AssignError::InvalidValue)
}

macro_rules! assign_fields {
    ($config:ident, $key:ident, $value:ident, [$($field:ident),* $(,)?]) => {
        $(
            if $key == stringify!($field) {
                $config.$field = parse_value($value)?;
                return Ok(());
            }
        )*
    };
}

impl GeneticConfig {
    /// Assign one textual value. The field is left untouched when the value does not parse.
    fn assign(&mut self, key: &str, value: &str) -> Result<(), AssignError> {
        if key == "time_seed" {
            self.time_seed = if value.eq_ignore_ascii_case("NONE") {
                let seed = wall_clock_seed();
                info!(seed, "time_seed set from wall clock");
                seed
            } else {
                parse_value(value)?
            };
            return Ok(());
        }
        if key == "selection_method" {
            self.selection_method = parse_value::<SelectionMethod>(value)?;
            return Ok(());
        }
        assign_fields!(
            self,
            key,
            value,
            [
                pos_threshold,
                speed_threshold,
                cost_threshold,
                thruster_type,
                anneal_factor,
                anneal_initial,
                mutation_rate,
                double_mutate_rate,
                triple_mutate_rate,
                gamma_mutate_scale,
                tau_mutate_scale,
                coast_mutate_scale,
                triptime_mutate_scale,
                zeta_mutate_scale,
                beta_mutate_scale,
                alpha_mutate_scale,
                best_count,
                change_check,
                write_freq,
                disp_freq,
                num_individuals,
                survivor_count,
                max_generations,
                rk_tol,
                max_numsteps,
                min_numsteps,
                coast_threshold,
                wet_mass,
                dry_mass,
                v_escape,
                r_fin_ast,
                theta_fin_ast,
                z_fin_ast,
                vr_fin_ast,
                vtheta_fin_ast,
                vz_fin_ast,
                r_fin_earth,
                theta_fin_earth,
                z_fin_earth,
                vr_fin_earth,
                vtheta_fin_earth,
                vz_fin_earth,
                triptime_min,
                triptime_max,
                time_res,
                gamma_random_start_range,
                tau_random_start_range,
                coast_random_start_range,
                alpha_random_start_range,
                beta_random_start_range,
                zeta_random_start_range,
            ]
        );
        Err(AssignError::UnknownKey)
    }
}

/// Parse a `key=value` document on top of [`GeneticConfig::default`].
///
/// Never fails: every problem is reported as a [`ConfigWarning`] and the affected field keeps
/// its default.
pub fn parse_key_value(text: &str) -> (GeneticConfig, Vec<ConfigWarning>) {
    let mut config = GeneticConfig::default();
    let mut warnings = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let content = match raw.find("//") {
            Some(pos) => &raw[..pos],
            None => raw,
        }
        .trim();
        if content.is_empty() {
            continue;
        }

        let Some((key, value)) = content.split_once('=') else {
            warnings.push(ConfigWarning::MalformedLine {
                line,
                text: content.to_string(),
            });
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        match config.assign(key, value) {
            Ok(()) => {}
            Err(AssignError::UnknownKey) => warnings.push(ConfigWarning::UnknownKey {
                line,
                key: key.to_string(),
            }),
            Err(AssignError::InvalidValue) => warnings.push(ConfigWarning::InvalidValue {
                line,
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    (config, warnings)
}
