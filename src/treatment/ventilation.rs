//! Positive-pressure ventilation and its coupling to cardiac output
//!
//! Raised intrathoracic pressure cuts venous return in proportion to mean
//! airway pressure. How much that costs depends on the archetype: it is
//! catastrophic when filling is already obstructed and mildly helpful in a
//! congested failing heart. The offset is tracked so it is applied once
//! and removed on extubation rather than compounding every tick.

use serde::{Deserialize, Serialize};

use crate::physiology::{VitalSigns, VitalsDelta};
use crate::shock::ShockType;
use crate::treatment::medication::oxygen_spo2_delta;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VentilatorSettings {
    /// cmH2O
    pub peep: f64,
    /// mL
    pub tidal_volume: f64,
    /// breaths/min
    pub rate: f64,
    pub fio2: f64,
}

impl Default for VentilatorSettings {
    fn default() -> Self {
        Self {
            peep: 5.0,
            tidal_volume: 450.0,
            rate: 16.0,
            fio2: 0.6,
        }
    }
}

impl VentilatorSettings {
    /// Mean airway pressure estimate (cmH2O)
    pub fn mean_airway_pressure(&self) -> f64 {
        self.peep + self.tidal_volume / 50.0 * 0.33
    }
}

/// CO change this tick and the new applied offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VentilationCoupling {
    pub delta: VitalsDelta,
    pub applied_offset: f64,
}

/// Move the ventilation CO offset toward its target for the current state.
/// When not intubated the target is zero, which gives back what was taken.
pub fn ventilation_coupling(
    vitals: &VitalSigns,
    settings: &VentilatorSettings,
    shock_type: ShockType,
    intubated: bool,
    applied_offset: f64,
    oxygen_multiplier: f64,
    dt: f64,
) -> VentilationCoupling {
    let mut delta = VitalsDelta::zero();
    let target = if intubated {
        let unloaded_co = vitals.cardiac_output - applied_offset;
        -shock_type.ventilation_sensitivity(vitals) * settings.mean_airway_pressure() * unloaded_co
    } else {
        0.0
    };
    delta.cardiac_output = target - applied_offset;

    if intubated {
        delta.spo2 = oxygen_spo2_delta(vitals, settings.fio2, oxygen_multiplier, dt);
        delta.respiratory_rate = settings.rate - vitals.respiratory_rate;
    }

    VentilationCoupling {
        delta,
        applied_offset: target,
    }
}
