//! Patient construction: case file → adjusted, randomized starting profile

pub mod comorbidity;
pub mod data;
pub mod randomize;

pub use comorbidity::{apply_comorbidities, AdjustedProfile, Comorbidity, ResponseModifiers};
pub use data::PatientData;
pub use randomize::{randomize, randomize_with};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::physiology::ranges::HARD_CVP;
use crate::physiology::HemodynamicState;
use crate::shock::{ShockProfile, ShockType};

/// Everything the step function needs to know about who is being treated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub data: PatientData,
    pub shock_type: ShockType,
    /// Randomized, comorbidity-adjusted starting point
    pub profile: ShockProfile,
    pub modifiers: ResponseModifiers,
}

impl Patient {
    /// Build the starting profile. User RVS/RVP/POAP/volemia seed the
    /// baseline before jitter; PVC and IVS are applied verbatim afterwards.
    pub fn new(data: PatientData, config: &SimulationConfig) -> Result<Self> {
        data.validate()?;
        let shock_type = data.shock_type();

        let mut base = shock_type.baseline_profile();
        seed_user_parameters(&mut base, &data);

        let adjusted = apply_comorbidities(&base, &data.conditions);
        let mut profile = randomize(
            &adjusted.profile,
            shock_type,
            Some(data.effective_seed()),
            data.difficulty.variance_multiplier(),
        );
        apply_verbatim_parameters(&mut profile, &data, config.body_surface_area);

        debug!(
            shock = %shock_type,
            conditions = data.conditions.len(),
            map = profile.vitals.map,
            "patient profile built"
        );

        Ok(Self {
            shock_type,
            profile,
            modifiers: adjusted.modifiers,
            data,
        })
    }

    pub fn from_shock_type(shock_type: ShockType, seed: u64, config: &SimulationConfig) -> Result<Self> {
        Self::new(PatientData::new(shock_type).with_seed(seed), config)
    }
}

fn seed_user_parameters(profile: &mut ShockProfile, data: &PatientData) {
    if let Some(svr) = data.rvs {
        profile.vitals.svr = svr;
    }
    if let Some(pvr) = data.rvp {
        profile.vitals.pvr = Some(pvr);
    }
    if let Some(pcwp) = data.poap {
        profile.vitals.pcwp = Some(pcwp);
    }
    if let Some(volemia) = data.volemia {
        // Filling pressure and output track circulating volume
        let fraction = volemia / 100.0;
        profile.vitals.cvp *= fraction;
        profile.vitals.cardiac_output *= fraction.sqrt();
    }
    profile.refresh_derived();
}

fn apply_verbatim_parameters(profile: &mut ShockProfile, data: &PatientData, body_surface_area: f64) {
    if let Some(cvp) = data.pvc {
        profile.vitals.cvp = HARD_CVP.clamp(cvp);
    }
    if let Some(svi) = data.ivs {
        let stroke_volume = svi * body_surface_area;
        profile.vitals.cardiac_output = stroke_volume * profile.vitals.heart_rate / 1000.0;
    }
    profile.vitals.clamp();
    profile.hemodynamics = HemodynamicState::from_vitals(&profile.vitals, profile.hemodynamics.contractility);
}
