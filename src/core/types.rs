//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Simulated time, in minutes since case start
pub type Minutes = f64;

/// Identifier for an intervention within one case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InterventionId(pub u32);

impl InterventionId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

/// Case difficulty chosen at setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Expert,
}

impl Difficulty {
    /// Multiplier applied to every progression delta
    pub fn deterioration_multiplier(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.7,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.3,
            Difficulty::Expert => 1.6,
        }
    }

    /// Multiplier applied to the randomization variance table
    pub fn variance_multiplier(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.5,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.2,
            Difficulty::Expert => 1.4,
        }
    }
}

/// Resources available to the learner (what can be ordered)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceLevel {
    /// Rural emergency room: fluids, basic drugs, needle procedures
    Basic,
    /// Emergency department with vasoactive drugs and blood
    #[default]
    Standard,
    /// Tertiary ICU: mechanical support, embolectomy
    Advanced,
}

impl fmt::Display for ResourceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceLevel::Basic => "basic",
            ResourceLevel::Standard => "standard",
            ResourceLevel::Advanced => "advanced",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_multipliers_ordered() {
        assert!(Difficulty::Easy.deterioration_multiplier() < Difficulty::Normal.deterioration_multiplier());
        assert!(Difficulty::Hard.deterioration_multiplier() < Difficulty::Expert.deterioration_multiplier());
    }

    #[test]
    fn test_resource_levels_ordered() {
        assert!(ResourceLevel::Basic < ResourceLevel::Standard);
        assert!(ResourceLevel::Standard < ResourceLevel::Advanced);
    }

    #[test]
    fn test_intervention_id_next() {
        assert_eq!(InterventionId::new(3).next(), InterventionId(4));
    }
}
