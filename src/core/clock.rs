//! Simulation clock
//!
//! Tracks simulated minutes and wall-clock seconds separately. The speed
//! multiplier scales the simulated step, never the tick frequency.

use serde::{Deserialize, Serialize};

use crate::core::types::Minutes;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimClock {
    sim_minutes: Minutes,
    real_seconds: f64,
    speed: f64,
}

impl SimClock {
    pub fn new(speed: f64) -> Self {
        Self {
            sim_minutes: 0.0,
            real_seconds: 0.0,
            speed: speed.max(0.0),
        }
    }

    /// Scale a caller-chosen step by the speed multiplier
    pub fn scaled(&self, dt: Minutes) -> Minutes {
        dt * self.speed
    }

    /// Advance by an already-scaled simulated step
    pub fn advance(&mut self, sim_dt: Minutes) {
        self.sim_minutes += sim_dt;
        if self.speed > 0.0 {
            self.real_seconds += sim_dt * 60.0 / self.speed;
        }
    }

    pub fn sim_minutes(&self) -> Minutes {
        self.sim_minutes
    }

    pub fn real_seconds(&self) -> f64 {
        self.real_seconds
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.max(0.0);
    }

    /// Clock label shown to the learner, e.g. "01:05"
    pub fn label(&self) -> String {
        let total = self.sim_minutes.max(0.0).floor() as u64;
        format!("{:02}:{:02}", total / 60, total % 60)
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(1.0)
    }
}
