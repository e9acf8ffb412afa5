//! Patient case file
//!
//! The flat JSON document the setup form produces and the import/export
//! screens read back. Validation happens here, once, so the engine can
//! assume well-formed input.

use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::core::error::{Result, SimError};
use crate::core::types::{Difficulty, ResourceLevel};
use crate::patient::comorbidity::Comorbidity;
use crate::physiology::ranges::Bounds;
use crate::shock::{DistributiveSubtype, ObstructiveEtiology, ShockCategory, ShockType};

const SVR_INPUT: Bounds = Bounds::new(200.0, 4000.0);
const PVR_INPUT: Bounds = Bounds::new(0.1, 20.0);
const VOLEMIA_INPUT: Bounds = Bounds::new(10.0, 200.0);
const SVI_INPUT: Bounds = Bounds::new(5.0, 100.0);
const CVP_INPUT: Bounds = Bounds::new(0.0, 40.0);
const PCWP_INPUT: Bounds = Bounds::new(0.0, 50.0);
const WEIGHT_INPUT: Bounds = Bounds::new(1.0, 400.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientData {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(alias = "tipoChoque")]
    pub shock_category: ShockCategory,
    #[serde(default)]
    pub distributive_subtype: Option<DistributiveSubtype>,
    #[serde(default)]
    pub obstructive_etiology: Option<ObstructiveEtiology>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub resource_level: ResourceLevel,
    #[serde(default)]
    pub conditions: Vec<Comorbidity>,
    /// Systemic vascular resistance (RVS), dyn·s/cm⁵
    #[serde(default, alias = "RVS")]
    pub rvs: Option<f64>,
    /// Pulmonary vascular resistance (RVP), Wood units
    #[serde(default, alias = "RVP")]
    pub rvp: Option<f64>,
    /// Circulating volume, percent of normal
    #[serde(default)]
    pub volemia: Option<f64>,
    /// Stroke volume index (IVS), mL/m². Applied verbatim.
    #[serde(default, alias = "IVS")]
    pub ivs: Option<f64>,
    /// Central venous pressure (PVC), mmHg. Applied verbatim.
    #[serde(default, alias = "PVC")]
    pub pvc: Option<f64>,
    /// Pulmonary artery occlusion pressure (POAP), mmHg
    #[serde(default, alias = "POAP")]
    pub poap: Option<f64>,
    /// Explicit randomization seed; derived from `id` when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl PatientData {
    pub fn new(shock_type: ShockType) -> Self {
        let (distributive_subtype, obstructive_etiology) = match shock_type {
            ShockType::Distributive(sub) => (Some(sub), None),
            ShockType::Obstructive(etiology) => (None, Some(etiology)),
            _ => (None, None),
        };
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            age: None,
            weight_kg: None,
            shock_category: shock_type.category(),
            distributive_subtype,
            obstructive_etiology,
            difficulty: Difficulty::default(),
            resource_level: ResourceLevel::default(),
            conditions: Vec::new(),
            rvs: None,
            rvp: None,
            volemia: None,
            ivs: None,
            pvc: None,
            poap: None,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_conditions(mut self, conditions: Vec<Comorbidity>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn shock_type(&self) -> ShockType {
        match self.shock_category {
            ShockCategory::Distributive => ShockType::Distributive(self.distributive_subtype.unwrap_or_default()),
            ShockCategory::Cardiogenic => ShockType::Cardiogenic,
            ShockCategory::Hypovolemic => ShockType::Hypovolemic,
            ShockCategory::Obstructive => ShockType::Obstructive(self.obstructive_etiology.unwrap_or_default()),
            ShockCategory::Mixed => ShockType::Mixed,
        }
    }

    /// Randomization seed: explicit, or folded from the patient id so the
    /// same case file always produces the same patient
    pub fn effective_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            let (hi, lo) = self.id.as_u64_pair();
            hi ^ lo
        })
    }

    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("rvs", self.rvs, SVR_INPUT),
            ("rvp", self.rvp, PVR_INPUT),
            ("volemia", self.volemia, VOLEMIA_INPUT),
            ("ivs", self.ivs, SVI_INPUT),
            ("pvc", self.pvc, CVP_INPUT),
            ("poap", self.poap, PCWP_INPUT),
            ("weightKg", self.weight_kg, WEIGHT_INPUT),
        ];
        for (name, value, bounds) in checks {
            if let Some(v) = value {
                if !v.is_finite() || !bounds.contains(v) {
                    return Err(SimError::InvalidPatient(format!(
                        "{} = {} fora do intervalo [{}, {}]",
                        name, v, bounds.min, bounds.max
                    )));
                }
            }
        }

        if self.distributive_subtype.is_some() && self.shock_category != ShockCategory::Distributive {
            return Err(SimError::InvalidPatient(
                "distributiveSubtype só se aplica a choque distributivo".to_string(),
            ));
        }
        if self.obstructive_etiology.is_some() && self.shock_category != ShockCategory::Obstructive {
            return Err(SimError::InvalidPatient(
                "obstructiveEtiology só se aplica a choque obstrutivo".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate
    pub fn from_json(json: &str) -> Result<Self> {
        let data: PatientData =
            serde_json::from_str(json).map_err(|e| SimError::InvalidPatient(e.to_string()))?;
        data.validate()?;
        Ok(data)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_json() {
        let data = PatientData::from_json(r#"{"shockCategory": "Choque hipovolêmico"}"#).unwrap();
        assert_eq!(data.shock_type(), ShockType::Hypovolemic);
        assert_eq!(data.difficulty, Difficulty::Normal);
        assert!(data.conditions.is_empty());
    }

    #[test]
    fn test_full_json_with_aliases() {
        let json = r#"{
            "shockCategory": "Choque distributivo",
            "distributiveSubtype": "septico",
            "difficulty": "hard",
            "resourceLevel": "basic",
            "conditions": ["dpoc", "heart_failure"],
            "RVS": 600,
            "PVC": 3,
            "seed": 7
        }"#;
        let data = PatientData::from_json(json).unwrap();
        assert_eq!(data.shock_type(), ShockType::Distributive(DistributiveSubtype::Septic));
        assert_eq!(data.conditions, vec![Comorbidity::Copd, Comorbidity::HeartFailure]);
        assert_eq!(data.rvs, Some(600.0));
        assert_eq!(data.effective_seed(), 7);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(matches!(
            PatientData::from_json("{not json"),
            Err(SimError::InvalidPatient(_))
        ));
        assert!(PatientData::from_json(r#"{"difficulty": "easy"}"#).is_err());
    }

    #[test]
    fn test_rejects_out_of_range() {
        let json = r#"{"shockCategory": "Choque cardiogênico", "PVC": 80}"#;
        assert!(matches!(PatientData::from_json(json), Err(SimError::InvalidPatient(_))));
    }

    #[test]
    fn test_rejects_mismatched_subtype() {
        let json = r#"{"shockCategory": "Choque cardiogênico", "obstructiveEtiology": "tep"}"#;
        assert!(PatientData::from_json(json).is_err());
    }

    #[test]
    fn test_seed_is_stable_per_id() {
        let data = PatientData::new(ShockType::Cardiogenic);
        assert_eq!(data.effective_seed(), data.clone().effective_seed());
        let json = data.to_json().unwrap();
        let back = PatientData::from_json(&json).unwrap();
        assert_eq!(back.effective_seed(), data.effective_seed());
    }
}
