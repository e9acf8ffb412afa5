//! Per-tick effects of non-vasoactive medications
//!
//! Antibiotics, steroids and tranexamic acid act through the progression
//! flags rather than directly on the vitals, so their direct effect here is
//! zero.

use crate::physiology::{VitalSigns, VitalsDelta};
use crate::shock::{DistributiveSubtype, ShockType};
use crate::treatment::catalog::Medication;

/// FiO2 of room air
pub const ROOM_AIR_FIO2: f64 = 0.21;

/// Direct effect of one running medication over one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MedicationEffect {
    pub delta: VitalsDelta,
    /// Bicarbonate added to plasma (mEq/L)
    pub hco3: f64,
    /// Multiplier on renal output
    pub urine_multiplier: f64,
}

impl Default for MedicationEffect {
    fn default() -> Self {
        Self {
            delta: VitalsDelta::zero(),
            hco3: 0.0,
            urine_multiplier: 1.0,
        }
    }
}

/// SpO2 gain from supplemental oxygen at `fio2`, before any shunt penalty
pub fn oxygen_spo2_delta(vitals: &VitalSigns, fio2: f64, multiplier: f64, dt: f64) -> f64 {
    let extra = (fio2.clamp(ROOM_AIR_FIO2, 1.0) - ROOM_AIR_FIO2) / (1.0 - ROOM_AIR_FIO2);
    let target = (vitals.spo2 + 12.0 * extra * multiplier).min(100.0);
    VitalsDelta::toward(vitals.spo2, target, 0.2, dt)
}

pub fn medication_effect(
    medication: Medication,
    dose: f64,
    duration: Option<f64>,
    vitals: &VitalSigns,
    shock_type: ShockType,
    oxygen_multiplier: f64,
    dt: f64,
) -> MedicationEffect {
    let mut effect = MedicationEffect::default();
    match medication {
        Medication::Furosemide => {
            effect.urine_multiplier = 3.0;
            // Venodilation before the diuresis
            if vitals.cvp > 4.0 {
                effect.delta.cvp = -0.02 * dt;
                effect.delta.pcwp = -0.03 * dt;
            }
        }
        Medication::SodiumBicarbonate => {
            // 100 mEq raises plasma HCO3 by about 4 mEq/L, spread over the push
            let span = duration.unwrap_or(1.0).max(1.0);
            effect.hco3 = 4.0 * dose / 100.0 * (dt / span).min(1.0);
        }
        Medication::Atropine => {
            // Works on vagal bradycardia; little use with an intact reflex
            let gain = match shock_type {
                ShockType::Distributive(DistributiveSubtype::Neurogenic) => 3.0,
                _ if vitals.heart_rate < 60.0 => 2.0,
                _ => 0.3,
            };
            effect.delta.heart_rate = gain * dose * dt;
        }
        Medication::Oxygen => {
            effect.delta.spo2 = oxygen_spo2_delta(vitals, dose, oxygen_multiplier, dt);
        }
        Medication::Hydrocortisone => {
            // Restores catecholamine sensitivity; small direct tone effect
            if matches!(shock_type, ShockType::Distributive(_)) {
                effect.delta.svr = 1.0 * dt;
            }
        }
        Medication::Antibiotics | Medication::TranexamicAcid => {}
    }
    effect
}
