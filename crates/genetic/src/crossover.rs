//! Mask-driven crossover.

use intercept_propulsion::Thruster;

use crate::genome::{GeneGroup, OPTIM_VARS, RkParameters};
use crate::mask::{Mask, MaskValue};

/// Build a child from two parents according to `mask`.
///
/// The child starts as a copy of `p1`. Without an active thruster the coefficient genes are
/// left as inherited from `p1`, since they never influence the trajectory.
pub fn generate_new_individual(
    p1: &RkParameters,
    p2: &RkParameters,
    mask: &Mask,
    thruster: &Thruster,
) -> RkParameters {
    let a = p1.to_array();
    let b = p2.to_array();
    let mut child = a;

    for index in 0..OPTIM_VARS {
        if !thruster.is_active() && GeneGroup::of(index).is_thrust_coefficient() {
            continue;
        }
        child[index] = match mask.get(index) {
            MaskValue::Partner1 => a[index],
            MaskValue::Partner2 => b[index],
            MaskValue::Average => a[index] / 2.0 + b[index] / 2.0,
        };
    }

    RkParameters::from_array(child, p1.coefficients.coast_threshold)
}
