//! Low-thrust asteroid intercept search.
//!
//! The member crates are re-exported under short names so front-ends depend on a single
//! package. [`search`] wires configuration, evaluation and the generational loop together.

pub use intercept_config as config;
pub use intercept_core::{OrbitalElements, angle, constants, units};
pub use intercept_export as export;
pub use intercept_genetic as genetic;
pub use intercept_lowthrust as lowthrust;
pub use intercept_orbits as orbits;
pub use intercept_propagator as propagator;
pub use intercept_propulsion as propulsion;

pub mod search;

/// Returns the version of the library for smoke tests.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
