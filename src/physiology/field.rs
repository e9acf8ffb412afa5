//! Addressable physiological fields
//!
//! Comorbidity deltas and randomization variance tables are keyed by field,
//! so both layers share one accessor instead of duplicating per-field code.

use serde::{Deserialize, Serialize};

use crate::physiology::hemodynamics::HemodynamicState;
use crate::physiology::labs::LabValues;
use crate::physiology::ranges::*;
use crate::physiology::vitals::VitalSigns;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PhysioField {
    HeartRate,
    Systolic,
    Diastolic,
    Spo2,
    RespiratoryRate,
    Temperature,
    Cvp,
    Pcwp,
    Pvr,
    CardiacOutput,
    Svr,
    Contractility,
    Ph,
    Pco2,
    Po2,
    Hco3,
    Lactate,
    Hemoglobin,
    Wbc,
    Platelets,
    Potassium,
    Sodium,
    Magnesium,
    Chloride,
    Creatinine,
    Urea,
}

impl PhysioField {
    pub const ALL: [PhysioField; 26] = [
        PhysioField::HeartRate,
        PhysioField::Systolic,
        PhysioField::Diastolic,
        PhysioField::Spo2,
        PhysioField::RespiratoryRate,
        PhysioField::Temperature,
        PhysioField::Cvp,
        PhysioField::Pcwp,
        PhysioField::Pvr,
        PhysioField::CardiacOutput,
        PhysioField::Svr,
        PhysioField::Contractility,
        PhysioField::Ph,
        PhysioField::Pco2,
        PhysioField::Po2,
        PhysioField::Hco3,
        PhysioField::Lactate,
        PhysioField::Hemoglobin,
        PhysioField::Wbc,
        PhysioField::Platelets,
        PhysioField::Potassium,
        PhysioField::Sodium,
        PhysioField::Magnesium,
        PhysioField::Chloride,
        PhysioField::Creatinine,
        PhysioField::Urea,
    ];

    /// Read a field; `None` when an optional measurement is absent
    pub fn get(&self, vitals: &VitalSigns, labs: &LabValues, hemo: &HemodynamicState) -> Option<f64> {
        use PhysioField::*;
        let value = match self {
            HeartRate => vitals.heart_rate,
            Systolic => vitals.systolic,
            Diastolic => vitals.diastolic,
            Spo2 => vitals.spo2,
            RespiratoryRate => vitals.respiratory_rate,
            Temperature => vitals.temperature,
            Cvp => vitals.cvp,
            Pcwp => return vitals.pcwp,
            Pvr => return vitals.pvr,
            CardiacOutput => vitals.cardiac_output,
            Svr => vitals.svr,
            Contractility => hemo.contractility,
            Ph => labs.gasometry.ph,
            Pco2 => labs.gasometry.pco2,
            Po2 => labs.gasometry.po2,
            Hco3 => labs.gasometry.hco3,
            Lactate => labs.gasometry.lactate,
            Hemoglobin => labs.hematology.hemoglobin,
            Wbc => labs.hematology.wbc,
            Platelets => labs.hematology.platelets,
            Potassium => labs.chemistry.potassium,
            Sodium => labs.chemistry.sodium,
            Magnesium => labs.chemistry.magnesium,
            Chloride => labs.chemistry.chloride,
            Creatinine => labs.chemistry.creatinine,
            Urea => labs.chemistry.urea,
        };
        Some(value)
    }

    /// Write a field. Optional measurements are only written when present.
    pub fn set(&self, vitals: &mut VitalSigns, labs: &mut LabValues, hemo: &mut HemodynamicState, value: f64) {
        use PhysioField::*;
        match self {
            HeartRate => vitals.heart_rate = value,
            Systolic => vitals.systolic = value,
            Diastolic => vitals.diastolic = value,
            Spo2 => vitals.spo2 = value,
            RespiratoryRate => vitals.respiratory_rate = value,
            Temperature => vitals.temperature = value,
            Cvp => vitals.cvp = value,
            Pcwp => {
                if vitals.pcwp.is_some() {
                    vitals.pcwp = Some(value)
                }
            }
            Pvr => {
                if vitals.pvr.is_some() {
                    vitals.pvr = Some(value)
                }
            }
            CardiacOutput => vitals.cardiac_output = value,
            Svr => vitals.svr = value,
            Contractility => hemo.contractility = value,
            Ph => labs.gasometry.ph = value,
            Pco2 => labs.gasometry.pco2 = value,
            Po2 => labs.gasometry.po2 = value,
            Hco3 => labs.gasometry.hco3 = value,
            Lactate => labs.gasometry.lactate = value,
            Hemoglobin => labs.hematology.hemoglobin = value,
            Wbc => labs.hematology.wbc = value,
            Platelets => labs.hematology.platelets = value,
            Potassium => labs.chemistry.potassium = value,
            Sodium => labs.chemistry.sodium = value,
            Magnesium => labs.chemistry.magnesium = value,
            Chloride => labs.chemistry.chloride = value,
            Creatinine => labs.chemistry.creatinine = value,
            Urea => labs.chemistry.urea = value,
        }
    }

    /// Absolute bounds a baseline may never leave, however many
    /// comorbidities stack on it
    pub fn safety_bounds(&self) -> Bounds {
        use PhysioField::*;
        match self {
            HeartRate => SAFETY_HEART_RATE,
            Systolic => SAFETY_SYSTOLIC,
            Diastolic => SAFETY_DIASTOLIC,
            Spo2 => SAFETY_SPO2,
            RespiratoryRate => SAFETY_RESPIRATORY_RATE,
            Temperature => SAFETY_TEMPERATURE,
            Cvp => SAFETY_CVP,
            Pcwp => HARD_PCWP,
            Pvr => HARD_PVR,
            CardiacOutput => SAFETY_CARDIAC_OUTPUT,
            Svr => SAFETY_SVR,
            Contractility => Bounds::new(5.0, 100.0),
            Ph => SAFETY_PH,
            Pco2 => Bounds::new(15.0, 90.0),
            Po2 => Bounds::new(35.0, 500.0),
            Hco3 => Bounds::new(5.0, 40.0),
            Lactate => SAFETY_LACTATE,
            Hemoglobin => SAFETY_HEMOGLOBIN,
            Wbc => Bounds::new(0.5, 50.0),
            Platelets => Bounds::new(10.0, 800.0),
            Potassium => SAFETY_POTASSIUM,
            Sodium => Bounds::new(120.0, 160.0),
            Magnesium => Bounds::new(0.8, 4.0),
            Chloride => Bounds::new(80.0, 125.0),
            Creatinine => SAFETY_CREATININE,
            Urea => Bounds::new(8.0, 300.0),
        }
    }
}

/// Clamp every field of a baseline to its safety bounds
pub fn clamp_to_safety(vitals: &mut VitalSigns, labs: &mut LabValues, hemo: &mut HemodynamicState) {
    for field in PhysioField::ALL {
        if let Some(value) = field.get(vitals, labs, hemo) {
            field.set(vitals, labs, hemo, field.safety_bounds().clamp(value));
        }
    }
    vitals.clamp();
    labs.clamp();
    hemo.clamp();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_roundtrip_every_field() {
        let mut vitals = VitalSigns::normal();
        let mut labs = LabValues::normal();
        let mut hemo = HemodynamicState::normal();
        for field in PhysioField::ALL {
            field.set(&mut vitals, &mut labs, &mut hemo, 42.0);
            assert_eq!(field.get(&vitals, &labs, &hemo), Some(42.0), "{:?}", field);
        }
    }

    #[test]
    fn test_absent_pcwp_stays_absent() {
        let mut vitals = VitalSigns::new(80.0, 110.0, 70.0, 97.0, 16.0, 37.0, 5.0, 5.0, 1000.0);
        let mut labs = LabValues::normal();
        let mut hemo = HemodynamicState::normal();
        PhysioField::Pcwp.set(&mut vitals, &mut labs, &mut hemo, 20.0);
        assert_eq!(vitals.pcwp, None);
    }

    #[test]
    fn test_safety_clamp() {
        let mut vitals = VitalSigns::normal();
        let mut labs = LabValues::normal();
        let mut hemo = HemodynamicState::normal();
        vitals.heart_rate = 215.0;
        labs.gasometry.ph = 6.7;
        clamp_to_safety(&mut vitals, &mut labs, &mut hemo);
        assert_eq!(vitals.heart_rate, 200.0);
        assert_eq!(labs.gasometry.ph, 6.8);
    }
}
