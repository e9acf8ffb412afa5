//! Intervention catalog: every orderable agent with its pharmacology and
//! ordering defaults
//!
//! Per-agent numbers are per unit of the agent's own dose unit (mcg/kg/min
//! for catecholamines, U/min for vasopressin, mL for fluids).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::SimError;
use crate::core::types::ResourceLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionClass {
    Fluid,
    Vasopressor,
    Inotrope,
    Medication,
    Procedure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FluidType {
    Crystalloid,
    Colloid,
    Blood,
}

impl FluidType {
    /// Intravascular expansion relative to crystalloid
    pub fn expansion_factor(&self) -> f64 {
        match self {
            FluidType::Crystalloid => 1.0,
            FluidType::Colloid => 1.5,
            FluidType::Blood => 1.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vasopressor {
    Norepinephrine,
    Epinephrine,
    Vasopressin,
    Phenylephrine,
    Dopamine,
}

impl Vasopressor {
    /// Conversion to norepinephrine mcg/kg/min
    pub fn norepinephrine_equivalent(&self, dose: f64) -> f64 {
        let factor = match self {
            Vasopressor::Norepinephrine => 1.0,
            Vasopressor::Epinephrine => 1.0,
            Vasopressor::Vasopressin => 4.0,
            Vasopressor::Phenylephrine => 0.1,
            Vasopressor::Dopamine => 0.01,
        };
        dose * factor
    }

    /// SVR rise per dose unit per minute (dyn·s/cm⁵)
    pub fn svr_gain(&self) -> f64 {
        match self {
            Vasopressor::Norepinephrine => 60.0,
            Vasopressor::Epinephrine => 45.0,
            Vasopressor::Vasopressin => 240.0,
            Vasopressor::Phenylephrine => 6.0,
            Vasopressor::Dopamine => 0.6,
        }
    }

    /// HR change per dose unit per minute, before headroom scaling
    pub fn heart_rate_effect(&self) -> f64 {
        match self {
            Vasopressor::Norepinephrine => 2.0,
            Vasopressor::Epinephrine => 25.0,
            Vasopressor::Vasopressin => 0.0,
            Vasopressor::Phenylephrine => -1.0,
            Vasopressor::Dopamine => 0.5,
        }
    }

    /// Beta-1 inotropy in dobutamine-equivalent units per dose unit
    pub fn inotropy(&self) -> f64 {
        match self {
            Vasopressor::Norepinephrine => 2.0,
            Vasopressor::Epinephrine => 20.0,
            Vasopressor::Vasopressin => 0.0,
            Vasopressor::Phenylephrine => 0.0,
            Vasopressor::Dopamine => 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Inotrope {
    Dobutamine,
    Milrinone,
}

impl Inotrope {
    pub fn dobutamine_equivalent(&self, dose: f64) -> f64 {
        match self {
            Inotrope::Dobutamine => dose,
            Inotrope::Milrinone => dose * 15.0,
        }
    }

    pub fn heart_rate_effect(&self) -> f64 {
        match self {
            Inotrope::Dobutamine => 0.3,
            Inotrope::Milrinone => 2.0,
        }
    }

    /// Vasodilation per dose unit per minute
    pub fn svr_effect(&self) -> f64 {
        match self {
            Inotrope::Dobutamine => -1.5,
            Inotrope::Milrinone => -20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Medication {
    Antibiotics,
    Hydrocortisone,
    Furosemide,
    SodiumBicarbonate,
    Atropine,
    TranexamicAcid,
    /// Dose is FiO2 (0.21-1.0)
    Oxygen,
}

/// Procedures that remove the cause of obstructive shock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitiveIntervention {
    Pericardiocentesis,
    ChestTube,
    Thrombolysis,
    Embolectomy,
    Decompression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Procedure {
    Intubation,
    HemorrhageControl,
    MechanicalSupport,
    Definitive(DefinitiveIntervention),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "class", content = "agent", rename_all = "snake_case")]
pub enum InterventionKind {
    Fluid(FluidType),
    Vasopressor(Vasopressor),
    Inotrope(Inotrope),
    Medication(Medication),
    Procedure(Procedure),
}

/// Ordering defaults for an agent; doses are in the agent's own unit
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AgentDefaults {
    pub dose: Option<f64>,
    pub rate_ml_h: Option<f64>,
    pub volume_ml: Option<f64>,
    pub duration: Option<f64>,
}

impl InterventionKind {
    pub fn class(&self) -> InterventionClass {
        match self {
            InterventionKind::Fluid(_) => InterventionClass::Fluid,
            InterventionKind::Vasopressor(_) => InterventionClass::Vasopressor,
            InterventionKind::Inotrope(_) => InterventionClass::Inotrope,
            InterventionKind::Medication(_) => InterventionClass::Medication,
            InterventionKind::Procedure(_) => InterventionClass::Procedure,
        }
    }

    /// Display name shown to the learner
    pub fn name(&self) -> &'static str {
        use InterventionKind as K;
        match self {
            K::Fluid(FluidType::Crystalloid) => "Ringer lactato",
            K::Fluid(FluidType::Colloid) => "Albumina",
            K::Fluid(FluidType::Blood) => "Concentrado de hemácias",
            K::Vasopressor(Vasopressor::Norepinephrine) => "Noradrenalina",
            K::Vasopressor(Vasopressor::Epinephrine) => "Adrenalina",
            K::Vasopressor(Vasopressor::Vasopressin) => "Vasopressina",
            K::Vasopressor(Vasopressor::Phenylephrine) => "Fenilefrina",
            K::Vasopressor(Vasopressor::Dopamine) => "Dopamina",
            K::Inotrope(Inotrope::Dobutamine) => "Dobutamina",
            K::Inotrope(Inotrope::Milrinone) => "Milrinona",
            K::Medication(Medication::Antibiotics) => "Antibioticoterapia",
            K::Medication(Medication::Hydrocortisone) => "Hidrocortisona",
            K::Medication(Medication::Furosemide) => "Furosemida",
            K::Medication(Medication::SodiumBicarbonate) => "Bicarbonato de sódio",
            K::Medication(Medication::Atropine) => "Atropina",
            K::Medication(Medication::TranexamicAcid) => "Ácido tranexâmico",
            K::Medication(Medication::Oxygen) => "Oxigênio suplementar",
            K::Procedure(Procedure::Intubation) => "Intubação orotraqueal",
            K::Procedure(Procedure::HemorrhageControl) => "Controle da hemorragia",
            K::Procedure(Procedure::MechanicalSupport) => "Balão intra-aórtico",
            K::Procedure(Procedure::Definitive(d)) => match d {
                DefinitiveIntervention::Pericardiocentesis => "Pericardiocentese",
                DefinitiveIntervention::ChestTube => "Drenagem torácica",
                DefinitiveIntervention::Thrombolysis => "Trombólise",
                DefinitiveIntervention::Embolectomy => "Embolectomia",
                DefinitiveIntervention::Decompression => "Descompressão",
            },
        }
    }

    /// Lowest resource level at which the agent can be ordered
    pub fn min_resource_level(&self) -> ResourceLevel {
        use InterventionKind as K;
        match self {
            K::Fluid(FluidType::Crystalloid) => ResourceLevel::Basic,
            K::Fluid(_) => ResourceLevel::Standard,
            K::Vasopressor(Vasopressor::Epinephrine) => ResourceLevel::Basic,
            K::Vasopressor(_) | K::Inotrope(_) => ResourceLevel::Standard,
            K::Medication(_) => ResourceLevel::Basic,
            K::Procedure(Procedure::MechanicalSupport) => ResourceLevel::Advanced,
            K::Procedure(Procedure::Definitive(DefinitiveIntervention::Embolectomy)) => ResourceLevel::Advanced,
            K::Procedure(Procedure::Definitive(DefinitiveIntervention::Thrombolysis)) => ResourceLevel::Standard,
            K::Procedure(_) => ResourceLevel::Basic,
        }
    }

    pub fn is_available(&self, level: ResourceLevel) -> bool {
        level >= self.min_resource_level()
    }

    /// Ordering defaults. `duration: None` means a continuous infusion or a
    /// persistent state (ventilation, mechanical support).
    pub fn defaults(&self) -> AgentDefaults {
        use InterventionKind as K;
        match self {
            K::Fluid(FluidType::Crystalloid) => AgentDefaults {
                volume_ml: Some(500.0),
                duration: Some(15.0),
                ..Default::default()
            },
            K::Fluid(FluidType::Colloid) => AgentDefaults {
                volume_ml: Some(250.0),
                duration: Some(15.0),
                ..Default::default()
            },
            K::Fluid(FluidType::Blood) => AgentDefaults {
                volume_ml: Some(300.0),
                duration: Some(30.0),
                ..Default::default()
            },
            K::Vasopressor(v) => AgentDefaults {
                dose: Some(match v {
                    Vasopressor::Norepinephrine => 0.1,
                    Vasopressor::Epinephrine => 0.05,
                    Vasopressor::Vasopressin => 0.03,
                    Vasopressor::Phenylephrine => 1.0,
                    Vasopressor::Dopamine => 10.0,
                }),
                ..Default::default()
            },
            K::Inotrope(i) => AgentDefaults {
                dose: Some(match i {
                    Inotrope::Dobutamine => 5.0,
                    Inotrope::Milrinone => 0.375,
                }),
                ..Default::default()
            },
            K::Medication(m) => match m {
                Medication::Antibiotics => single_dose(1.0, 30.0),
                Medication::Hydrocortisone => single_dose(200.0, 5.0),
                Medication::Furosemide => single_dose(40.0, 60.0),
                Medication::SodiumBicarbonate => single_dose(100.0, 10.0),
                Medication::Atropine => single_dose(1.0, 5.0),
                Medication::TranexamicAcid => single_dose(1000.0, 10.0),
                Medication::Oxygen => AgentDefaults {
                    dose: Some(0.5),
                    ..Default::default()
                },
            },
            K::Procedure(p) => match p {
                Procedure::Intubation | Procedure::MechanicalSupport => AgentDefaults::default(),
                Procedure::HemorrhageControl => AgentDefaults {
                    duration: Some(20.0),
                    ..Default::default()
                },
                Procedure::Definitive(d) => AgentDefaults {
                    duration: Some(match d {
                        DefinitiveIntervention::Pericardiocentesis => 10.0,
                        DefinitiveIntervention::ChestTube => 15.0,
                        DefinitiveIntervention::Thrombolysis => 120.0,
                        DefinitiveIntervention::Embolectomy => 90.0,
                        DefinitiveIntervention::Decompression => 5.0,
                    }),
                    ..Default::default()
                },
            },
        }
    }
}

fn single_dose(dose: f64, duration: f64) -> AgentDefaults {
    AgentDefaults {
        dose: Some(dose),
        duration: Some(duration),
        ..Default::default()
    }
}

impl fmt::Display for InterventionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for InterventionKind {
    type Err = SimError;

    /// Parse the English agent key used by scripts and the CLI
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use InterventionKind as K;
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "crystalloid" | "ringer" | "saline" => K::Fluid(FluidType::Crystalloid),
            "colloid" | "albumin" => K::Fluid(FluidType::Colloid),
            "blood" | "prbc" => K::Fluid(FluidType::Blood),
            "norepinephrine" | "noradrenaline" => K::Vasopressor(Vasopressor::Norepinephrine),
            "epinephrine" | "adrenaline" => K::Vasopressor(Vasopressor::Epinephrine),
            "vasopressin" => K::Vasopressor(Vasopressor::Vasopressin),
            "phenylephrine" => K::Vasopressor(Vasopressor::Phenylephrine),
            "dopamine" => K::Vasopressor(Vasopressor::Dopamine),
            "dobutamine" => K::Inotrope(Inotrope::Dobutamine),
            "milrinone" => K::Inotrope(Inotrope::Milrinone),
            "antibiotics" => K::Medication(Medication::Antibiotics),
            "hydrocortisone" => K::Medication(Medication::Hydrocortisone),
            "furosemide" => K::Medication(Medication::Furosemide),
            "bicarbonate" => K::Medication(Medication::SodiumBicarbonate),
            "atropine" => K::Medication(Medication::Atropine),
            "tranexamic_acid" | "txa" => K::Medication(Medication::TranexamicAcid),
            "oxygen" => K::Medication(Medication::Oxygen),
            "intubation" => K::Procedure(Procedure::Intubation),
            "hemorrhage_control" => K::Procedure(Procedure::HemorrhageControl),
            "iabp" | "mechanical_support" => K::Procedure(Procedure::MechanicalSupport),
            "pericardiocentesis" => K::Procedure(Procedure::Definitive(DefinitiveIntervention::Pericardiocentesis)),
            "chest_tube" => K::Procedure(Procedure::Definitive(DefinitiveIntervention::ChestTube)),
            "thrombolysis" => K::Procedure(Procedure::Definitive(DefinitiveIntervention::Thrombolysis)),
            "embolectomy" => K::Procedure(Procedure::Definitive(DefinitiveIntervention::Embolectomy)),
            "decompression" => K::Procedure(Procedure::Definitive(DefinitiveIntervention::Decompression)),
            other => return Err(SimError::UnknownAgent(other.to_string())),
        };
        Ok(kind)
    }
}
