//! Comorbidity modifier layer
//!
//! Each condition contributes additive baseline deltas and multiplicative
//! response factors. Deltas sum and factors multiply, so the order in which
//! conditions are listed never matters.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::physiology::field::{clamp_to_safety, PhysioField};
use crate::shock::ShockProfile;
use crate::treatment::catalog::InterventionClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comorbidity {
    #[serde(alias = "insuficiencia_cardiaca")]
    HeartFailure,
    #[serde(alias = "drc", alias = "doenca_renal_cronica")]
    ChronicKidneyDisease,
    #[serde(alias = "dpoc")]
    Copd,
    Diabetes,
    #[serde(alias = "hipertensao")]
    Hypertension,
    #[serde(alias = "cirrose")]
    Cirrhosis,
    #[serde(alias = "doenca_coronariana")]
    CoronaryDisease,
    #[serde(alias = "idoso")]
    AdvancedAge,
    Anemia,
    #[serde(alias = "obesidade")]
    Obesity,
    #[serde(alias = "imunossupressao")]
    Immunosuppression,
    #[serde(alias = "betabloqueador")]
    BetaBlocker,
}

/// Multiplicative factors a patient carries into every treatment response.
/// 1.0 everywhere is the identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseModifiers {
    pub fluid: f64,
    pub vasopressor: f64,
    pub inotrope: f64,
    pub oxygen: f64,
    pub deterioration_rate: f64,
    pub complication_risk: f64,
}

impl Default for ResponseModifiers {
    fn default() -> Self {
        Self {
            fluid: 1.0,
            vasopressor: 1.0,
            inotrope: 1.0,
            oxygen: 1.0,
            deterioration_rate: 1.0,
            complication_risk: 1.0,
        }
    }
}

impl ResponseModifiers {
    pub fn combine(&self, other: &ResponseModifiers) -> ResponseModifiers {
        ResponseModifiers {
            fluid: self.fluid * other.fluid,
            vasopressor: self.vasopressor * other.vasopressor,
            inotrope: self.inotrope * other.inotrope,
            oxygen: self.oxygen * other.oxygen,
            deterioration_rate: self.deterioration_rate * other.deterioration_rate,
            complication_risk: self.complication_risk * other.complication_risk,
        }
    }

    /// Factor for a treatment class; medications and procedures are unscaled
    pub fn for_class(&self, class: InterventionClass) -> f64 {
        match class {
            InterventionClass::Fluid => self.fluid,
            InterventionClass::Vasopressor => self.vasopressor,
            InterventionClass::Inotrope => self.inotrope,
            InterventionClass::Medication | InterventionClass::Procedure => 1.0,
        }
    }
}

/// What one condition does to a baseline
#[derive(Debug, Clone, Default)]
pub struct ConditionEffect {
    pub deltas: Vec<(PhysioField, f64)>,
    pub modifiers: ResponseModifiers,
}

impl Comorbidity {
    pub const ALL: [Comorbidity; 12] = [
        Comorbidity::HeartFailure,
        Comorbidity::ChronicKidneyDisease,
        Comorbidity::Copd,
        Comorbidity::Diabetes,
        Comorbidity::Hypertension,
        Comorbidity::Cirrhosis,
        Comorbidity::CoronaryDisease,
        Comorbidity::AdvancedAge,
        Comorbidity::Anemia,
        Comorbidity::Obesity,
        Comorbidity::Immunosuppression,
        Comorbidity::BetaBlocker,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Comorbidity::HeartFailure => "Insuficiência cardíaca",
            Comorbidity::ChronicKidneyDisease => "Doença renal crônica",
            Comorbidity::Copd => "DPOC",
            Comorbidity::Diabetes => "Diabetes mellitus",
            Comorbidity::Hypertension => "Hipertensão arterial",
            Comorbidity::Cirrhosis => "Cirrose hepática",
            Comorbidity::CoronaryDisease => "Doença arterial coronariana",
            Comorbidity::AdvancedAge => "Idade avançada",
            Comorbidity::Anemia => "Anemia crônica",
            Comorbidity::Obesity => "Obesidade",
            Comorbidity::Immunosuppression => "Imunossupressão",
            Comorbidity::BetaBlocker => "Uso crônico de betabloqueador",
        }
    }

    pub fn effect(&self) -> ConditionEffect {
        use PhysioField as F;
        let m = ResponseModifiers::default();
        let (deltas, modifiers) = match self {
            Comorbidity::HeartFailure => (
                vec![(F::Contractility, -10.0), (F::CardiacOutput, -0.5), (F::Pcwp, 4.0), (F::Cvp, 3.0)],
                ResponseModifiers {
                    fluid: 0.6,
                    vasopressor: 0.9,
                    inotrope: 0.8,
                    oxygen: 0.9,
                    deterioration_rate: 1.2,
                    complication_risk: 1.2,
                },
            ),
            Comorbidity::ChronicKidneyDisease => (
                vec![
                    (F::Creatinine, 1.5),
                    (F::Urea, 40.0),
                    (F::Potassium, 0.6),
                    (F::Hemoglobin, -1.5),
                    (F::Hco3, -2.0),
                ],
                ResponseModifiers {
                    fluid: 0.8,
                    deterioration_rate: 1.1,
                    complication_risk: 1.1,
                    ..m
                },
            ),
            Comorbidity::Copd => (
                vec![(F::Spo2, -4.0), (F::Pco2, 8.0), (F::Hco3, 4.0), (F::RespiratoryRate, 4.0)],
                ResponseModifiers {
                    oxygen: 0.7,
                    deterioration_rate: 1.1,
                    complication_risk: 1.2,
                    ..m
                },
            ),
            Comorbidity::Diabetes => (
                vec![(F::Creatinine, 0.3)],
                ResponseModifiers {
                    vasopressor: 0.9,
                    deterioration_rate: 1.1,
                    complication_risk: 1.1,
                    ..m
                },
            ),
            Comorbidity::Hypertension => (
                vec![(F::Systolic, 15.0), (F::Diastolic, 8.0), (F::Svr, 150.0)],
                ResponseModifiers {
                    fluid: 0.9,
                    vasopressor: 0.85,
                    ..m
                },
            ),
            Comorbidity::Cirrhosis => (
                vec![
                    (F::Svr, -150.0),
                    (F::Platelets, -80.0),
                    (F::Hemoglobin, -1.5),
                    (F::Sodium, -4.0),
                    (F::Lactate, 0.8),
                ],
                ResponseModifiers {
                    fluid: 0.7,
                    vasopressor: 0.8,
                    deterioration_rate: 1.2,
                    complication_risk: 1.4,
                    ..m
                },
            ),
            Comorbidity::CoronaryDisease => (
                vec![(F::Contractility, -6.0)],
                ResponseModifiers {
                    inotrope: 0.85,
                    deterioration_rate: 1.15,
                    complication_risk: 1.1,
                    ..m
                },
            ),
            Comorbidity::AdvancedAge => (
                vec![(F::HeartRate, -5.0), (F::Creatinine, 0.3)],
                ResponseModifiers {
                    fluid: 0.85,
                    vasopressor: 0.85,
                    inotrope: 0.85,
                    oxygen: 0.9,
                    deterioration_rate: 1.2,
                    complication_risk: 1.3,
                },
            ),
            Comorbidity::Anemia => (
                vec![(F::Hemoglobin, -3.0), (F::HeartRate, 8.0)],
                ResponseModifiers {
                    oxygen: 0.8,
                    deterioration_rate: 1.1,
                    ..m
                },
            ),
            Comorbidity::Obesity => (
                vec![(F::Spo2, -2.0), (F::RespiratoryRate, 2.0)],
                ResponseModifiers {
                    fluid: 0.9,
                    oxygen: 0.85,
                    complication_risk: 1.2,
                    ..m
                },
            ),
            Comorbidity::Immunosuppression => (
                vec![(F::Wbc, -4.0), (F::Temperature, -0.5)],
                ResponseModifiers {
                    deterioration_rate: 1.25,
                    complication_risk: 1.2,
                    ..m
                },
            ),
            Comorbidity::BetaBlocker => (
                vec![(F::HeartRate, -20.0), (F::Contractility, -4.0)],
                ResponseModifiers {
                    vasopressor: 0.8,
                    inotrope: 0.7,
                    deterioration_rate: 1.1,
                    ..m
                },
            ),
        };
        ConditionEffect { deltas, modifiers }
    }
}

/// A baseline adjusted for the patient's conditions
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustedProfile {
    pub profile: ShockProfile,
    pub modifiers: ResponseModifiers,
}

/// Sum deltas and multiply modifiers across conditions, then clamp every
/// field to its safety bounds. Repeated conditions count once.
pub fn apply_comorbidities(base: &ShockProfile, conditions: &[Comorbidity]) -> AdjustedProfile {
    let mut unique = conditions.to_vec();
    unique.sort();
    unique.dedup();

    let mut totals: AHashMap<PhysioField, f64> = AHashMap::new();
    let mut modifiers = ResponseModifiers::default();
    for condition in &unique {
        let effect = condition.effect();
        for (field, delta) in effect.deltas {
            *totals.entry(field).or_insert(0.0) += delta;
        }
        modifiers = modifiers.combine(&effect.modifiers);
    }

    let mut profile = base.clone();
    for (field, delta) in totals {
        if let Some(value) = profile.field(field) {
            profile.set_field(field, value + delta);
        }
    }
    clamp_to_safety(&mut profile.vitals, &mut profile.labs, &mut profile.hemodynamics);
    profile.refresh_derived();

    AdjustedProfile { profile, modifiers }
}
