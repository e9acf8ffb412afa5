//! Simulation configuration with documented constants
//!
//! Tunables that shape pacing and the terminal-state rules live here. The
//! config travels inside the simulation state, so two cases in the same
//! process can run with different settings.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{Result, SimError};

/// Configuration for one simulated case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === CLOCK ===
    /// Default step length in simulated minutes
    pub tick_minutes: f64,

    /// Time compression. Scales the step passed to `step()`, not the
    /// number of ticks, so replays stay deterministic.
    pub speed_multiplier: f64,

    // === PATIENT BODY ===
    /// Body weight used for weight-based doses and insensible losses (kg)
    pub weight_kg: f64,

    /// Body surface area used for cardiac index (m²)
    pub body_surface_area: f64,

    // === HEMODYNAMICS ===
    /// Weight given to the pressure-derived MAP in the per-tick blend.
    ///
    /// The remainder goes to the flow-derived estimate (CO×SVR/80 + CVP).
    /// At 0.5 both estimates count equally.
    pub map_blend_weight: f64,

    /// MAP the baroreflex steers toward (mmHg)
    pub baroreflex_target_map: f64,

    // === OUTCOME ===
    pub outcome: OutcomeThresholds,
}

/// Thresholds of the death/survival state machine (minutes and ticks)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeThresholds {
    /// Contiguous incompatible time that is always fatal
    pub contiguous_minutes: f64,

    /// Consecutive incompatible ticks for the short-window rule
    pub consecutive_ticks: u32,

    /// Cumulative incompatible time required by the short-window rule
    pub short_window_minutes: f64,

    /// Cumulative incompatible time (gaps allowed) that is always fatal
    pub cumulative_minutes: f64,

    /// Contiguous stability required to declare survival
    pub survival_minutes: f64,
}

impl Default for OutcomeThresholds {
    fn default() -> Self {
        Self {
            contiguous_minutes: 30.0,
            consecutive_ticks: 5,
            short_window_minutes: 15.0,
            cumulative_minutes: 60.0,
            survival_minutes: 60.0,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_minutes: 1.0,
            speed_multiplier: 1.0,
            weight_kg: 70.0,
            body_surface_area: 1.8,
            map_blend_weight: 0.5,
            baroreflex_target_map: 75.0,
            outcome: OutcomeThresholds::default(),
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a TOML file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate().map_err(SimError::InvalidConfig)?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(0.0..=1.0).contains(&self.map_blend_weight) {
            return Err(format!(
                "map_blend_weight ({}) must be within [0, 1]",
                self.map_blend_weight
            ));
        }

        if self.tick_minutes <= 0.0 || self.speed_multiplier <= 0.0 {
            return Err("tick_minutes and speed_multiplier must be positive".into());
        }

        if self.weight_kg <= 0.0 || self.body_surface_area <= 0.0 {
            return Err("weight_kg and body_surface_area must be positive".into());
        }

        let o = &self.outcome;
        if o.short_window_minutes > o.cumulative_minutes {
            return Err(format!(
                "short_window_minutes ({}) should be <= cumulative_minutes ({})",
                o.short_window_minutes, o.cumulative_minutes
            ));
        }

        if o.survival_minutes <= 0.0 || o.contiguous_minutes <= 0.0 {
            return Err("outcome windows must be positive".into());
        }

        Ok(())
    }
}
