//! Shock profile: an immutable bundle of baseline physiology and response
//! coefficients

use serde::{Deserialize, Serialize};

use crate::physiology::field::PhysioField;
use crate::physiology::labs::{Chemistry, Gasometry, Hematology, LabTimestamps};
use crate::physiology::ranges::henderson_hasselbalch_pco2;
use crate::physiology::{HemodynamicState, LabValues, VitalSigns};

/// How strongly each treatment class works in this archetype (1.0 = textbook)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentResponsiveness {
    pub fluid: f64,
    pub vasopressor: f64,
    pub inotrope: f64,
    pub oxygen: f64,
}

impl Default for TreatmentResponsiveness {
    fn default() -> Self {
        Self {
            fluid: 1.0,
            vasopressor: 1.0,
            inotrope: 1.0,
            oxygen: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShockProfile {
    pub name: String,
    pub vitals: VitalSigns,
    pub hemodynamics: HemodynamicState,
    pub labs: LabValues,
    /// Multiplier on the progression speed
    pub degradation_rate: f64,
    /// 0-1, how much baroreflex reserve the patient starts with
    pub compensation_capacity: f64,
    pub responsiveness: TreatmentResponsiveness,
}

impl ShockProfile {
    pub fn field(&self, field: PhysioField) -> Option<f64> {
        field.get(&self.vitals, &self.labs, &self.hemodynamics)
    }

    pub fn set_field(&mut self, field: PhysioField, value: f64) {
        field.set(&mut self.vitals, &mut self.labs, &mut self.hemodynamics, value);
    }

    /// Recompute derived values after fields were edited
    pub fn refresh_derived(&mut self) {
        self.vitals.clamp();
        self.labs.clamp();
        self.hemodynamics = HemodynamicState::from_vitals(&self.vitals, self.hemodynamics.contractility);
    }
}

/// Blood gas with pCO2 derived from pH and HCO3 so the catalog is always
/// Henderson-Hasselbalch consistent
pub(crate) fn gas(ph: f64, hco3: f64, po2: f64, lactate: f64) -> Gasometry {
    Gasometry {
        ph,
        pco2: henderson_hasselbalch_pco2(hco3, ph),
        po2,
        hco3,
        lactate,
    }
}

pub(crate) fn blood(hemoglobin: f64, wbc: f64, platelets: f64) -> Hematology {
    Hematology {
        hemoglobin,
        hematocrit: 3.0 * hemoglobin,
        wbc,
        platelets,
    }
}

pub(crate) fn chem(potassium: f64, sodium: f64, creatinine: f64, urea: f64) -> Chemistry {
    Chemistry {
        potassium,
        sodium,
        magnesium: 1.9,
        chloride: sodium - 36.0,
        creatinine,
        urea,
    }
}

pub(crate) fn labs(gasometry: Gasometry, hematology: Hematology, chemistry: Chemistry) -> LabValues {
    let mut labs = LabValues {
        gasometry,
        hematology,
        chemistry,
        updated_at: LabTimestamps::default(),
    };
    labs.clamp();
    labs
}

pub(crate) fn assemble(
    name: &str,
    vitals: VitalSigns,
    contractility: f64,
    labs: LabValues,
    degradation_rate: f64,
    compensation_capacity: f64,
    responsiveness: TreatmentResponsiveness,
) -> ShockProfile {
    let hemodynamics = HemodynamicState::from_vitals(&vitals, contractility);
    ShockProfile {
        name: name.to_string(),
        vitals,
        hemodynamics,
        labs,
        degradation_rate,
        compensation_capacity,
        responsiveness,
    }
}
