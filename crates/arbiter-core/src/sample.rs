#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::DeterministicRng;

/// Source of a tick count (runtime, cooldown, repeat budget), re-sampled on every use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TickSampler {
    Constant(u32),
    /// Inclusive on both ends.
    Uniform { min: u32, max: u32 },
}

impl Default for TickSampler {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TickSampler {
    pub const ZERO: Self = Self::Constant(0);

    pub const fn constant(ticks: u32) -> Self {
        Self::Constant(ticks)
    }

    pub const fn uniform(min: u32, max: u32) -> Self {
        Self::Uniform { min, max }
    }

    /// `false` for a `Uniform` range whose bounds are inverted.
    pub fn is_valid(&self) -> bool {
        match *self {
            Self::Constant(_) => true,
            Self::Uniform { min, max } => min <= max,
        }
    }

    pub fn sample<R: DeterministicRng + ?Sized>(&self, rng: &mut R) -> u32 {
        match *self {
            Self::Constant(ticks) => ticks,
            Self::Uniform { min, max } if min >= max => min,
            Self::Uniform { min, max } => {
                let span = u64::from(max - min) + 1;
                min + rng.next_below(span) as u32
            }
        }
    }
}
