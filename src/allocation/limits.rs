//! Per-level share limits and bound sampling

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::Level;

/// Inclusive share bounds for a single entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: u64,
    pub max: u64,
}

impl Bounds {
    /// Create bounds; a `max` below `min` is raised to `min`
    pub fn new(min: u64, max: u64) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn contains(&self, value: u64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn clamp(&self, value: u64) -> u64 {
        value.clamp(self.min, self.max)
    }
}

/// Limits shared by every entity of one level
///
/// `min` is drawn from `[min_low, min_high]`, `max` is `base_max` plus a
/// jitter in `[0, jitter_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelLimits {
    pub min_low: u64,
    pub min_high: u64,
    pub base_max: u64,
    pub jitter_max: u64,
}

impl LevelLimits {
    pub const fn new(min_low: u64, min_high: u64, base_max: u64, jitter_max: u64) -> Self {
        Self {
            min_low,
            min_high,
            base_max,
            jitter_max,
        }
    }

    /// Limits with a fixed minimum and no jitter
    pub const fn fixed(min: u64, max: u64) -> Self {
        Self::new(min, min, max, 0)
    }

    /// Built-in limits for a level
    pub fn for_level(level: Level) -> Self {
        match level {
            Level::Sd => Self::new(90, 168, 1200, 40),
            Level::Smp => Self::new(100, 240, 1500, 50),
            Level::Sma => Self::new(100, 260, 1600, 50),
            Level::Smk => Self::new(120, 300, 2200, 60),
            Level::Slb => Self::new(40, 40, 213, 7),
        }
    }

    /// Draw bounds for one entity
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Bounds {
        let min = if self.min_high > self.min_low {
            rng.gen_range(self.min_low..=self.min_high)
        } else {
            self.min_low
        };
        let jitter = if self.jitter_max > 0 {
            rng.gen_range(0..=self.jitter_max)
        } else {
            0
        };
        Bounds::new(min, self.base_max + jitter)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.min_high < self.min_low {
            return Err(format!(
                "min_high ({}) must not be below min_low ({})",
                self.min_high, self.min_low
            ));
        }
        if self.base_max < self.min_high {
            return Err(format!(
                "base_max ({}) must not be below min_high ({})",
                self.base_max, self.min_high
            ));
        }
        Ok(())
    }
}
