//! Crossover masks.
//!
//! A mask tags every gene with the parent it is inherited from, or with [`MaskValue::Average`]
//! to blend both parents.

use std::fmt;

use rand::Rng;

use crate::GeneticError;
use crate::genome::{GeneGroup, OPTIM_VARS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskValue {
    Partner1,
    Partner2,
    Average,
}

impl MaskValue {
    /// Legacy numeric tag (`1`, `2`, `3`).
    pub fn tag(self) -> u8 {
        match self {
            Self::Partner1 => 1,
            Self::Partner2 => 2,
            Self::Average => 3,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Partner1),
            2 => Some(Self::Partner2),
            3 => Some(Self::Average),
            _ => None,
        }
    }

    fn coin<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            Self::Partner2
        } else {
            Self::Partner1
        }
    }

    fn flipped(self) -> Self {
        match self {
            Self::Partner1 => Self::Partner2,
            Self::Partner2 => Self::Partner1,
            Self::Average => Self::Average,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mask([MaskValue; OPTIM_VARS]);

impl Mask {
    pub fn new(values: [MaskValue; OPTIM_VARS]) -> Self {
        Self(values)
    }

    /// Decode numeric tags; any length other than [`OPTIM_VARS`] or an unknown tag is rejected.
    pub fn from_tags(tags: &[u8]) -> Result<Self, GeneticError> {
        if tags.len() != OPTIM_VARS {
            return Err(GeneticError::GenomeLength {
                expected: OPTIM_VARS,
                found: tags.len(),
            });
        }
        let mut values = [MaskValue::Partner1; OPTIM_VARS];
        for (index, &tag) in tags.iter().enumerate() {
            values[index] =
                MaskValue::from_tag(tag).ok_or(GeneticError::InvalidMaskTag { index, tag })?;
        }
        Ok(Self(values))
    }

    /// Every gene drawn independently from either parent.
    pub fn whole_random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut values = [MaskValue::Partner1; OPTIM_VARS];
        for value in &mut values {
            *value = MaskValue::coin(rng);
        }
        Self(values)
    }

    /// Every gene blended.
    pub fn average() -> Self {
        Self([MaskValue::Average; OPTIM_VARS])
    }

    /// One parent per semantic group, so Fourier series are inherited whole.
    ///
    /// Partners are drawn in the order gamma, tau, coast, tripTime, alpha, beta, zeta.
    pub fn bundle_vars<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut values = [MaskValue::Partner1; OPTIM_VARS];
        for group in [
            GeneGroup::Gamma,
            GeneGroup::Tau,
            GeneGroup::Coast,
            GeneGroup::TripTime,
            GeneGroup::Alpha,
            GeneGroup::Beta,
            GeneGroup::Zeta,
        ] {
            let partner = MaskValue::coin(rng);
            for index in group.indices() {
                values[index] = partner;
            }
        }
        Self(values)
    }

    /// Swap the parents; averaged genes stay averaged.
    pub fn flip(&self) -> Self {
        Self(self.0.map(MaskValue::flipped))
    }

    pub fn values(&self) -> &[MaskValue; OPTIM_VARS] {
        &self.0
    }

    pub fn get(&self, index: usize) -> MaskValue {
        self.0[index]
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value.tag())?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn generated(rng: &mut Pcg64) -> Vec<Mask> {
        vec![
            Mask::whole_random(rng),
            Mask::average(),
            Mask::bundle_vars(rng),
        ]
    }

    #[test]
    fn flip_is_an_involution_and_keeps_average() {
        let mut rng = Pcg64::seed_from_u64(3);
        for _ in 0..50 {
            for mask in generated(&mut rng) {
                assert_eq!(mask.flip().flip(), mask);
                for (a, b) in mask.values().iter().zip(mask.flip().values()) {
                    if *a == MaskValue::Average {
                        assert_eq!(*b, MaskValue::Average);
                    } else {
                        assert_ne!(a, b);
                    }
                }
            }
        }
    }

    #[test]
    fn bundled_groups_share_one_partner() {
        let mut rng = Pcg64::seed_from_u64(5);
        for _ in 0..50 {
            let mask = Mask::bundle_vars(&mut rng);
            for group in [GeneGroup::Gamma, GeneGroup::Tau, GeneGroup::Coast] {
                let first = mask.get(group.indices().start);
                assert!(group.indices().all(|i| mask.get(i) == first));
                assert_ne!(first, MaskValue::Average);
            }
        }
    }

    #[test]
    fn tags_round_trip_and_reject_garbage() {
        let mask = Mask::average();
        let tags: Vec<u8> = mask.values().iter().map(|v| v.tag()).collect();
        assert_eq!(Mask::from_tags(&tags).expect("valid tags"), mask);

        let mut bad = tags.clone();
        bad[4] = 9;
        assert!(matches!(
            Mask::from_tags(&bad),
            Err(GeneticError::InvalidMaskTag { index: 4, tag: 9 })
        ));
        assert!(Mask::from_tags(&tags[..5]).is_err());
        assert_eq!(mask.to_string().matches('3').count(), OPTIM_VARS);
    }
}
