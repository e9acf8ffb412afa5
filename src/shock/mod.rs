//! Shock archetypes
//!
//! Each archetype lives in its own module and exposes the same set of free
//! functions (baseline, progression, per-class treatment responses,
//! presentation clamps, resolution criteria). `ShockType` is the single
//! dispatch point.

mod cardiogenic;
mod distributive;
mod hypovolemic;
mod mixed;
mod obstructive;
pub mod profile;
pub mod subtype;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::SimError;
use crate::core::types::Minutes;
use crate::physiology::{HemodynamicState, LabValues, VitalSigns, VitalsDelta};
use crate::treatment::catalog::{FluidType, Inotrope, Vasopressor};

pub use cardiogenic::{classify_fluid_tolerance, scai_stage, FluidTolerance, ScaiStage};
pub use hypovolemic::{atls_class, atls_score, frank_starling_factor, AtlsClass};
pub use mixed::{classify_mixed, MixedComponent};
pub use obstructive::{
    complication_probability, recovery_fraction, relieve_obstruction, ComplicationKind,
    ProceduralComplication, Relief, ReliefOutcome,
};
pub use profile::{ShockProfile, TreatmentResponsiveness};
pub use subtype::SubtypeState;

/// Five top-level categories, as labelled in patient files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShockCategory {
    #[serde(rename = "Choque distributivo")]
    Distributive,
    #[serde(rename = "Choque cardiogênico")]
    Cardiogenic,
    #[serde(rename = "Choque hipovolêmico")]
    Hypovolemic,
    #[serde(rename = "Choque obstrutivo")]
    Obstructive,
    #[serde(rename = "Choque misto")]
    Mixed,
}

impl ShockCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ShockCategory::Distributive => "Choque distributivo",
            ShockCategory::Cardiogenic => "Choque cardiogênico",
            ShockCategory::Hypovolemic => "Choque hipovolêmico",
            ShockCategory::Obstructive => "Choque obstrutivo",
            ShockCategory::Mixed => "Choque misto",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributiveSubtype {
    #[default]
    #[serde(alias = "septico")]
    Septic,
    #[serde(alias = "anafilatico")]
    Anaphylactic,
    #[serde(alias = "neurogenico")]
    Neurogenic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstructiveEtiology {
    #[default]
    #[serde(alias = "tamponamento")]
    Tamponade,
    #[serde(alias = "pneumotorax_hipertensivo")]
    TensionPneumothorax,
    #[serde(alias = "tep")]
    PulmonaryEmbolism,
    #[serde(alias = "sindrome_compartimental")]
    AbdominalCompartment,
    #[serde(alias = "hiperinsuflacao_dinamica")]
    DynamicHyperinflation,
}

/// Closed set of shock archetypes with their subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShockType {
    Distributive(DistributiveSubtype),
    Cardiogenic,
    Hypovolemic,
    Obstructive(ObstructiveEtiology),
    Mixed,
}

/// What the progression models need to know about ongoing treatment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterventionFlags {
    pub minutes_since_onset: Minutes,
    /// Norepinephrine-equivalent, mcg/kg/min
    pub vasopressor_dose: f64,
    pub epinephrine_active: bool,
    /// Dobutamine-equivalent, mcg/kg/min
    pub inotrope_dose: f64,
    /// Volume currently running, mL/min
    pub fluid_rate_ml_min: f64,
    pub cumulative_fluids_ml: f64,
    pub mechanical_support: bool,
    pub intubated: bool,
    pub hemorrhage_controlled: bool,
    pub tranexamic_acid: bool,
    pub antibiotics_given: bool,
    pub steroids_given: bool,
    pub atropine_active: bool,
}

/// Inputs shared by every per-class treatment response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseContext {
    /// Shock responsiveness × comorbidity modifier for the class
    pub multiplier: f64,
    pub cumulative_fluids_ml: f64,
    pub dt: Minutes,
}

impl ShockType {
    /// Every concrete archetype/subtype combination
    pub fn all() -> Vec<ShockType> {
        vec![
            ShockType::Distributive(DistributiveSubtype::Septic),
            ShockType::Distributive(DistributiveSubtype::Anaphylactic),
            ShockType::Distributive(DistributiveSubtype::Neurogenic),
            ShockType::Cardiogenic,
            ShockType::Hypovolemic,
            ShockType::Obstructive(ObstructiveEtiology::Tamponade),
            ShockType::Obstructive(ObstructiveEtiology::TensionPneumothorax),
            ShockType::Obstructive(ObstructiveEtiology::PulmonaryEmbolism),
            ShockType::Obstructive(ObstructiveEtiology::AbdominalCompartment),
            ShockType::Obstructive(ObstructiveEtiology::DynamicHyperinflation),
            ShockType::Mixed,
        ]
    }

    pub fn category(&self) -> ShockCategory {
        match self {
            ShockType::Distributive(_) => ShockCategory::Distributive,
            ShockType::Cardiogenic => ShockCategory::Cardiogenic,
            ShockType::Hypovolemic => ShockCategory::Hypovolemic,
            ShockType::Obstructive(_) => ShockCategory::Obstructive,
            ShockType::Mixed => ShockCategory::Mixed,
        }
    }

    pub fn label(&self) -> &'static str {
        self.category().label()
    }

    /// Immutable catalog entry for this archetype
    pub fn baseline_profile(&self) -> ShockProfile {
        match self {
            ShockType::Distributive(sub) => distributive::baseline_profile(*sub),
            ShockType::Cardiogenic => cardiogenic::baseline_profile(),
            ShockType::Hypovolemic => hypovolemic::baseline_profile(),
            ShockType::Obstructive(etiology) => obstructive::baseline_profile(*etiology),
            ShockType::Mixed => mixed::baseline_profile(),
        }
    }

    /// Untreated-course time derivative over `dt`, modulated by treatment flags
    pub fn progress(
        &self,
        vitals: &VitalSigns,
        dt: Minutes,
        flags: &InterventionFlags,
        subtype: Option<&SubtypeState>,
    ) -> VitalsDelta {
        let delta = match self {
            ShockType::Distributive(sub) => distributive::progress(*sub, vitals, dt, flags),
            ShockType::Cardiogenic => cardiogenic::progress(vitals, dt, flags),
            ShockType::Hypovolemic => hypovolemic::progress(vitals, dt, flags, subtype),
            ShockType::Obstructive(etiology) => obstructive::progress(*etiology, vitals, dt, flags, subtype),
            ShockType::Mixed => mixed::progress(vitals, dt, flags),
        };
        delta.clamped_for(vitals)
    }

    pub fn fluid_response(&self, vitals: &VitalSigns, fluid: FluidType, volume_ml: f64, ctx: &ResponseContext) -> VitalsDelta {
        let delta = match self {
            ShockType::Distributive(sub) => distributive::fluid_response(*sub, vitals, fluid, volume_ml, ctx),
            ShockType::Cardiogenic => cardiogenic::fluid_response(vitals, fluid, volume_ml, ctx),
            ShockType::Hypovolemic => hypovolemic::fluid_response(vitals, fluid, volume_ml, ctx),
            ShockType::Obstructive(etiology) => obstructive::fluid_response(*etiology, vitals, fluid, volume_ml, ctx),
            ShockType::Mixed => mixed::fluid_response(vitals, fluid, volume_ml, ctx),
        };
        delta.clamped_for(vitals)
    }

    pub fn vasopressor_response(&self, vitals: &VitalSigns, agent: Vasopressor, dose: f64, ctx: &ResponseContext) -> VitalsDelta {
        let delta = match self {
            ShockType::Distributive(sub) => distributive::vasopressor_response(*sub, vitals, agent, dose, ctx),
            ShockType::Cardiogenic => cardiogenic::vasopressor_response(vitals, agent, dose, ctx),
            ShockType::Hypovolemic => hypovolemic::vasopressor_response(vitals, agent, dose, ctx),
            ShockType::Obstructive(_) => obstructive::vasopressor_response(vitals, agent, dose, ctx),
            ShockType::Mixed => mixed::vasopressor_response(vitals, agent, dose, ctx),
        };
        delta.clamped_for(vitals)
    }

    pub fn inotrope_response(
        &self,
        vitals: &VitalSigns,
        hemo: &HemodynamicState,
        agent: Inotrope,
        dose: f64,
        ctx: &ResponseContext,
    ) -> VitalsDelta {
        let profile = match self {
            ShockType::Distributive(_) => distributive::INOTROPE_PROFILE,
            ShockType::Cardiogenic => cardiogenic::INOTROPE_PROFILE,
            ShockType::Hypovolemic => hypovolemic::INOTROPE_PROFILE,
            ShockType::Obstructive(_) => obstructive::INOTROPE_PROFILE,
            ShockType::Mixed => mixed::INOTROPE_PROFILE,
        };
        profile.response(vitals, hemo, agent, dose, ctx).clamped_for(vitals)
    }

    /// Reassert the hemodynamic pattern that defines this archetype
    pub fn enforce_presentation(&self, vitals: &mut VitalSigns, labs: &mut LabValues) {
        match self {
            ShockType::Distributive(_) => distributive::enforce_presentation(vitals),
            ShockType::Cardiogenic => cardiogenic::enforce_presentation(vitals),
            ShockType::Hypovolemic => hypovolemic::enforce_presentation(vitals, labs),
            ShockType::Obstructive(_) => obstructive::enforce_presentation(vitals),
            ShockType::Mixed => {}
        }
        vitals.clamp();
    }

    /// Shock-specific resolution criteria (one tick; the window is tracked elsewhere)
    pub fn is_resolved(&self, vitals: &VitalSigns, labs: &LabValues, subtype: Option<&SubtypeState>) -> bool {
        match self {
            ShockType::Distributive(_) => distributive::is_resolved(vitals, labs),
            ShockType::Cardiogenic => cardiogenic::is_resolved(vitals, labs),
            ShockType::Hypovolemic => hypovolemic::is_resolved(vitals, labs),
            ShockType::Obstructive(_) => obstructive::is_resolved(vitals, labs, subtype),
            ShockType::Mixed => mixed::is_resolved(vitals, labs),
        }
    }

    /// Fractional CO change per cmH2O of mean airway pressure under
    /// positive-pressure ventilation. Negative means ventilation helps.
    pub fn ventilation_sensitivity(&self, vitals: &VitalSigns) -> f64 {
        match self {
            ShockType::Distributive(_) => 0.012,
            ShockType::Cardiogenic => {
                let overloaded = vitals.cvp > 12.0 || vitals.pcwp.map_or(false, |p| p > 18.0);
                if overloaded {
                    -0.008
                } else {
                    0.005
                }
            }
            ShockType::Hypovolemic => 0.02,
            ShockType::Obstructive(ObstructiveEtiology::Tamponade)
            | ShockType::Obstructive(ObstructiveEtiology::TensionPneumothorax) => 0.05,
            ShockType::Obstructive(_) => 0.04,
            ShockType::Mixed => 0.015,
        }
    }

    /// (heart rate gain, SVR gain) of the baroreflex
    pub fn baroreflex_gains(&self) -> (f64, f64) {
        match self {
            // Sympathetic outflow is interrupted
            ShockType::Distributive(DistributiveSubtype::Neurogenic) => (0.15, 0.2),
            ShockType::Distributive(_) => (1.0, 0.6),
            ShockType::Cardiogenic => (0.8, 1.0),
            ShockType::Hypovolemic => (1.0, 1.0),
            ShockType::Obstructive(_) => (0.6, 0.5),
            ShockType::Mixed => (0.8, 0.7),
        }
    }

    /// Fresh per-archetype state at case start
    pub fn initial_subtype_state(&self, vitals: &VitalSigns) -> Option<SubtypeState> {
        match self {
            ShockType::Hypovolemic => Some(SubtypeState::hypovolemic(vitals)),
            ShockType::Obstructive(_) => Some(SubtypeState::obstructive()),
            ShockType::Mixed => Some(SubtypeState::Mixed {
                components: classify_mixed(vitals),
            }),
            _ => None,
        }
    }

    /// Blood lost to ongoing hemorrhage over `dt` (mL)
    pub fn blood_loss(&self, dt: Minutes, flags: &InterventionFlags, subtype: Option<&SubtypeState>) -> f64 {
        match self {
            ShockType::Hypovolemic => hypovolemic::bleed_rate(flags, subtype) * dt,
            ShockType::Mixed => hypovolemic::bleed_rate(flags, None) * 0.25 * dt,
            _ => 0.0,
        }
    }
}

impl fmt::Display for ShockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShockType::Distributive(sub) => {
                let s = match sub {
                    DistributiveSubtype::Septic => "séptico",
                    DistributiveSubtype::Anaphylactic => "anafilático",
                    DistributiveSubtype::Neurogenic => "neurogênico",
                };
                write!(f, "{} ({})", self.label(), s)
            }
            ShockType::Obstructive(etiology) => {
                let s = match etiology {
                    ObstructiveEtiology::Tamponade => "tamponamento cardíaco",
                    ObstructiveEtiology::TensionPneumothorax => "pneumotórax hipertensivo",
                    ObstructiveEtiology::PulmonaryEmbolism => "tromboembolismo pulmonar",
                    ObstructiveEtiology::AbdominalCompartment => "síndrome compartimental abdominal",
                    ObstructiveEtiology::DynamicHyperinflation => "hiperinsuflação dinâmica",
                };
                write!(f, "{} ({})", self.label(), s)
            }
            _ => write!(f, "{}", self.label()),
        }
    }
}

/// Per-archetype inotrope behaviour: how much CO an inotrope can buy and
/// where it stops helping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InotropeProfile {
    /// Fraction of the remaining gap to `co_ceiling` closed per dose unit per minute
    pub co_gain: f64,
    pub co_ceiling: f64,
    pub contractility_gain: f64,
}

impl InotropeProfile {
    pub fn response(
        &self,
        vitals: &VitalSigns,
        hemo: &HemodynamicState,
        agent: Inotrope,
        dose: f64,
        ctx: &ResponseContext,
    ) -> VitalsDelta {
        let units = agent.dobutamine_equivalent(dose) * ctx.multiplier;
        let dt = ctx.dt;
        let co_gap = (self.co_ceiling - vitals.cardiac_output).max(0.0);
        let contractility_gap = (75.0 - hemo.contractility).max(0.0) / 75.0;
        let hr_room = ((160.0 - vitals.heart_rate) / 100.0).max(0.0);
        let svr = if vitals.svr > 900.0 {
            agent.svr_effect() * dose * dt
        } else {
            0.0
        };
        VitalsDelta {
            cardiac_output: (co_gap * self.co_gain * units * dt).min(co_gap),
            contractility: self.contractility_gain * units * contractility_gap * dt,
            heart_rate: agent.heart_rate_effect() * dose * hr_room * dt,
            svr,
            ..Default::default()
        }
    }
}

impl FromStr for ShockType {
    type Err = SimError;

    /// Parse the English case key used by the CLI, e.g. `septic` or `tamponade`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use DistributiveSubtype as D;
        use ObstructiveEtiology as O;
        let shock = match s.trim().to_ascii_lowercase().as_str() {
            "septic" | "distributive" => ShockType::Distributive(D::Septic),
            "anaphylactic" => ShockType::Distributive(D::Anaphylactic),
            "neurogenic" => ShockType::Distributive(D::Neurogenic),
            "cardiogenic" => ShockType::Cardiogenic,
            "hypovolemic" | "hemorrhagic" => ShockType::Hypovolemic,
            "tamponade" | "obstructive" => ShockType::Obstructive(O::Tamponade),
            "tension_pneumothorax" | "pneumothorax" => ShockType::Obstructive(O::TensionPneumothorax),
            "pulmonary_embolism" | "pe" => ShockType::Obstructive(O::PulmonaryEmbolism),
            "abdominal_compartment" => ShockType::Obstructive(O::AbdominalCompartment),
            "dynamic_hyperinflation" => ShockType::Obstructive(O::DynamicHyperinflation),
            "mixed" => ShockType::Mixed,
            other => return Err(SimError::InvalidPatient(format!("tipo de choque desconhecido: {}", other))),
        };
        Ok(shock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_portuguese() {
        assert_eq!(ShockType::Hypovolemic.label(), "Choque hipovolêmico");
        assert_eq!(
            ShockType::Distributive(DistributiveSubtype::Septic).to_string(),
            "Choque distributivo (séptico)"
        );
    }

    #[test]
    fn test_category_serde_label() {
        let json = serde_json::to_string(&ShockCategory::Hypovolemic).unwrap();
        assert_eq!(json, "\"Choque hipovolêmico\"");
        let back: ShockCategory = serde_json::from_str("\"Choque cardiogênico\"").unwrap();
        assert_eq!(back, ShockCategory::Cardiogenic);
    }

    #[test]
    fn test_parse_case_keys() {
        assert_eq!("septic".parse::<ShockType>().unwrap(), ShockType::Distributive(DistributiveSubtype::Septic));
        assert_eq!(
            " Tamponade ".parse::<ShockType>().unwrap(),
            ShockType::Obstructive(ObstructiveEtiology::Tamponade)
        );
        assert!("burn".parse::<ShockType>().is_err());
    }

    #[test]
    fn test_subtype_aliases() {
        let sub: DistributiveSubtype = serde_json::from_str("\"anafilatico\"").unwrap();
        assert_eq!(sub, DistributiveSubtype::Anaphylactic);
        let etiology: ObstructiveEtiology = serde_json::from_str("\"tep\"").unwrap();
        assert_eq!(etiology, ObstructiveEtiology::PulmonaryEmbolism);
    }

    #[test]
    fn test_every_baseline_within_bounds_and_presentation() {
        for shock in ShockType::all() {
            let profile = shock.baseline_profile();
            assert!(profile.vitals.within_hard_bounds(), "{}", shock);
            assert!(profile.labs.within_hard_bounds(), "{}", shock);
            let mut vitals = profile.vitals.clone();
            let mut labs = profile.labs.clone();
            shock.enforce_presentation(&mut vitals, &mut labs);
            assert_eq!(vitals, profile.vitals, "baseline violates presentation for {}", shock);
        }
    }

    #[test]
    fn test_progression_is_pure() {
        let flags = InterventionFlags {
            minutes_since_onset: 30.0,
            vasopressor_dose: 0.1,
            ..Default::default()
        };
        for shock in ShockType::all() {
            let profile = shock.baseline_profile();
            let subtype = shock.initial_subtype_state(&profile.vitals);
            let a = shock.progress(&profile.vitals, 1.0, &flags, subtype.as_ref());
            let b = shock.progress(&profile.vitals, 1.0, &flags, subtype.as_ref());
            assert_eq!(a, b, "{}", shock);
        }
    }

    #[test]
    fn test_progression_output_clamped() {
        let flags = InterventionFlags::default();
        for shock in ShockType::all() {
            let profile = shock.baseline_profile();
            let subtype = shock.initial_subtype_state(&profile.vitals);
            let delta = shock.progress(&profile.vitals, 600.0, &flags, subtype.as_ref());
            assert!(profile.vitals.apply(&delta).within_hard_bounds(), "{}", shock);
        }
    }

    #[test]
    fn test_neurogenic_blunts_baroreflex_heart_rate() {
        let (hr_gain, _) = ShockType::Distributive(DistributiveSubtype::Neurogenic).baroreflex_gains();
        let (septic_gain, _) = ShockType::Distributive(DistributiveSubtype::Septic).baroreflex_gains();
        assert!(hr_gain < septic_gain);
    }

    #[test]
    fn test_ventilation_catastrophic_in_obstructive() {
        let tamponade = ShockType::Obstructive(ObstructiveEtiology::Tamponade);
        let v = tamponade.baseline_profile().vitals;
        assert!(tamponade.ventilation_sensitivity(&v) > ShockType::Hypovolemic.ventilation_sensitivity(&v));
        let cardio = ShockType::Cardiogenic.baseline_profile().vitals;
        assert!(ShockType::Cardiogenic.ventilation_sensitivity(&cardio) < 0.0);
    }
}
