//! Thruster variants and spacecraft mass properties.
//!
//! The thruster set is closed: a craft either carries no engine or a NEXT-class gridded ion
//! thruster whose input power falls off with the square of heliocentric distance.

use intercept_core::units::m_to_au;
use thiserror::Error;

/// NEXT reference input power at 1 AU (W).
pub const NEXT_P0_W: f64 = 7_330.0;

/// Efficiency polynomial coefficients, highest degree first (degree 6, no constant term).
const NEXT_EFFICIENCY: [f64; 6] = [
    -1.328_086e-23,
    6.207_694e-19,
    -9.991_813e-15,
    7.701_266e-11,
    -3.136_031e-7,
    6.805_225e-4,
];

/// Mass-flow table: `(upper power bound in W, kg/s)`; the last row applies above every bound.
const NEXT_MASS_FLOW: [(f64, f64); 3] = [
    (2_550.0, 1.99e-6),
    (4_500.0, 4.44e-6),
    (f64::INFINITY, 5.73e-6),
];

#[derive(Debug, Error, PartialEq)]
pub enum PropulsionError {
    #[error("unsupported thruster type code {0}")]
    UnsupportedPropulsion(u32),
    #[error("dry mass {dry_kg} kg exceeds wet mass {wet_kg} kg")]
    InvalidMass { dry_kg: f64, wet_kg: f64 },
}

/// NEXT ion thruster performance model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NextThruster {
    /// Available input power at 1 AU (W).
    pub p0_w: f64,
}

impl Default for NextThruster {
    fn default() -> Self {
        Self { p0_w: NEXT_P0_W }
    }
}

impl NextThruster {
    /// Input power at `distance_au` from the Sun, capped at the 1 AU value.
    pub fn input_power(&self, distance_au: f64) -> f64 {
        (self.p0_w / (distance_au * distance_au)).min(self.p0_w)
    }

    /// Propellant mass flow for a given input power (kg/s).
    pub fn mass_flow(&self, power_w: f64) -> f64 {
        NEXT_MASS_FLOW
            .iter()
            .find(|(bound, _)| power_w < *bound)
            .map(|(_, mdot)| *mdot)
            .unwrap_or(NEXT_MASS_FLOW[NEXT_MASS_FLOW.len() - 1].1)
    }

    /// Thruster efficiency for a given input power, clamped to `[0, 1]`.
    pub fn efficiency(&self, power_w: f64) -> f64 {
        let eta = NEXT_EFFICIENCY
            .iter()
            .fold(0.0, |acc, c| (acc + c) * power_w);
        eta.clamp(0.0, 1.0)
    }

    /// Thrust in newtons, `sqrt(2 · η · P · ṁ)`.
    pub fn thrust(&self, power_w: f64) -> f64 {
        (2.0 * self.efficiency(power_w) * power_w * self.mass_flow(power_w)).sqrt()
    }
}

/// Instantaneous engine output.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThrustOutput {
    pub power_w: f64,
    pub thrust_n: f64,
    /// Thrust acceleration in AU/s².
    pub accel: f64,
    /// Propellant consumption in kg/s.
    pub mass_flow: f64,
}

/// Closed set of propulsion variants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Thruster {
    NoThrust,
    Next(NextThruster),
}

impl Thruster {
    /// Build a thruster from its configuration code (0 = none, 1 = NEXT).
    pub fn from_type_code(code: u32) -> Result<Self, PropulsionError> {
        match code {
            0 => Ok(Self::NoThrust),
            1 => Ok(Self::Next(NextThruster::default())),
            other => Err(PropulsionError::UnsupportedPropulsion(other)),
        }
    }

    pub fn type_code(&self) -> u32 {
        match self {
            Self::NoThrust => 0,
            Self::Next(_) => 1,
        }
    }

    /// True when the variant can produce thrust. Coefficient genes only matter for active thrusters.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::NoThrust)
    }

    /// Engine output for a craft of `mass_kg` at `distance_au` from the Sun.
    pub fn output(&self, distance_au: f64, mass_kg: f64) -> ThrustOutput {
        match self {
            Self::NoThrust => ThrustOutput::default(),
            Self::Next(next) => {
                let power_w = next.input_power(distance_au);
                let thrust_n = next.thrust(power_w);
                ThrustOutput {
                    power_w,
                    thrust_n,
                    accel: m_to_au(thrust_n / mass_kg),
                    mass_flow: next.mass_flow(power_w),
                }
            }
        }
    }
}

/// Spacecraft mass budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacecraft {
    pub wet_mass_kg: f64,
    pub dry_mass_kg: f64,
}

impl Spacecraft {
    pub fn new(wet_mass_kg: f64, dry_mass_kg: f64) -> Result<Self, PropulsionError> {
        if dry_mass_kg > wet_mass_kg || dry_mass_kg <= 0.0 {
            return Err(PropulsionError::InvalidMass {
                dry_kg: dry_mass_kg,
                wet_kg: wet_mass_kg,
            });
        }
        Ok(Self {
            wet_mass_kg,
            dry_mass_kg,
        })
    }

    pub fn propellant_kg(&self) -> f64 {
        self.wet_mass_kg - self.dry_mass_kg
    }

    /// Current mass after spending `fuel_spent_kg`, floored at the dry mass.
    pub fn mass(&self, fuel_spent_kg: f64) -> f64 {
        (self.wet_mass_kg - fuel_spent_kg).max(self.dry_mass_kg)
    }

    /// True while propellant remains.
    pub fn has_fuel(&self, fuel_spent_kg: f64) -> bool {
        fuel_spent_kg < self.propellant_kg()
    }

    /// Fuel spent after burning at `mass_flow` kg/s for `dt` seconds, capped at the tank size.
    pub fn burn(&self, fuel_spent_kg: f64, mass_flow: f64, dt: f64) -> f64 {
        (fuel_spent_kg + mass_flow * dt).min(self.propellant_kg())
    }
}

/// Engine plus mass budget of one craft.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vehicle {
    pub thruster: Thruster,
    pub spacecraft: Spacecraft,
}

impl Vehicle {
    /// Thrust state for a craft that has already spent `fuel_spent_kg`. An empty tank yields no thrust.
    pub fn output(&self, distance_au: f64, fuel_spent_kg: f64) -> ThrustOutput {
        if !self.spacecraft.has_fuel(fuel_spent_kg) {
            return ThrustOutput::default();
        }
        self.thruster.output(distance_au, self.spacecraft.mass(fuel_spent_kg))
    }
}
