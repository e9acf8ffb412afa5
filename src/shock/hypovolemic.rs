//! Hypovolemic (hemorrhagic) shock
//!
//! Severity is read back from the vitals as an ATLS class. The class sets
//! the pace of decline; at class IV compensation fails and the heart rate
//! drops paradoxically. Fluids follow a Frank-Starling curve keyed to CVP.

use serde::{Deserialize, Serialize};

use crate::physiology::{LabValues, VitalSigns, VitalsDelta};
use crate::shock::profile::{assemble, blood, chem, gas, labs, ShockProfile, TreatmentResponsiveness};
use crate::shock::{InotropeProfile, InterventionFlags, ResponseContext, SubtypeState};
use crate::treatment::catalog::{FluidType, Vasopressor};

/// Uncontrolled bleeding at case start (mL/min)
pub const DEFAULT_BLEED_RATE_ML_MIN: f64 = 20.0;
/// Residual ooze after surgical control (mL/min)
const CONTROLLED_BLEED_RATE_ML_MIN: f64 = 1.0;

const SVR_CEILING: f64 = 2800.0;

pub(super) const INOTROPE_PROFILE: InotropeProfile = InotropeProfile {
    co_gain: 0.001,
    co_ceiling: 4.5,
    contractility_gain: 0.2,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AtlsClass {
    I,
    II,
    III,
    IV,
}

impl AtlsClass {
    fn index(&self) -> usize {
        match self {
            AtlsClass::I => 0,
            AtlsClass::II => 1,
            AtlsClass::III => 2,
            AtlsClass::IV => 3,
        }
    }

    /// Progression speed for this class
    pub fn rate_multiplier(&self) -> f64 {
        [0.5, 1.0, 1.5, 2.2][self.index()]
    }
}

/// Weighted 0-3 severity score over CVP (0.3), HR (0.4) and MAP (0.3)
pub fn atls_score(v: &VitalSigns) -> f64 {
    let cvp = match v.cvp {
        c if c >= 8.0 => 0.0,
        c if c >= 5.0 => 1.0,
        c if c >= 2.0 => 2.0,
        _ => 3.0,
    };
    let hr = match v.heart_rate {
        h if h < 100.0 => 0.0,
        h if h < 120.0 => 1.0,
        h if h < 140.0 => 2.0,
        _ => 3.0,
    };
    let map = match v.map {
        m if m >= 70.0 => 0.0,
        m if m >= 65.0 => 1.0,
        m if m >= 50.0 => 2.0,
        _ => 3.0,
    };
    0.3 * cvp + 0.4 * hr + 0.3 * map
}

pub fn atls_class(v: &VitalSigns) -> AtlsClass {
    match atls_score(v) {
        s if s < 0.75 => AtlsClass::I,
        s if s < 1.5 => AtlsClass::II,
        s if s < 2.25 => AtlsClass::III,
        _ => AtlsClass::IV,
    }
}

/// Share of a fluid load that turns into stroke volume at this CVP
pub fn frank_starling_factor(cvp: f64) -> f64 {
    1.0 / (1.0 + ((cvp - 10.0) / 2.0).exp())
}

pub(super) fn bleed_rate(flags: &InterventionFlags, subtype: Option<&SubtypeState>) -> f64 {
    if flags.hemorrhage_controlled {
        return CONTROLLED_BLEED_RATE_ML_MIN;
    }
    let base = match subtype {
        Some(SubtypeState::Hypovolemic { bleed_rate_ml_min, .. }) => *bleed_rate_ml_min,
        _ => DEFAULT_BLEED_RATE_ML_MIN,
    };
    if flags.tranexamic_acid {
        base * 0.7
    } else {
        base
    }
}

pub(super) fn baseline_profile() -> ShockProfile {
    assemble(
        "Choque hipovolêmico",
        VitalSigns::new(128.0, 82.0, 62.0, 95.0, 26.0, 36.2, 2.0, 3.4, 1900.0)
            .with_pcwp(5.0)
            .with_pvr(1.4),
        55.0,
        labs(gas(7.30, 15.5, 85.0, 4.5), blood(8.5, 12.0, 180.0), chem(4.4, 141.0, 1.4, 75.0)),
        1.0,
        0.8,
        TreatmentResponsiveness {
            fluid: 1.3,
            vasopressor: 0.5,
            inotrope: 0.4,
            oxygen: 1.0,
        },
    )
}

pub(super) fn progress(
    v: &VitalSigns,
    dt: f64,
    flags: &InterventionFlags,
    subtype: Option<&SubtypeState>,
) -> VitalsDelta {
    let class = atls_class(v);
    let m = class.rate_multiplier();
    let loss_l = bleed_rate(flags, subtype) * dt / 1000.0;

    let mut d = VitalsDelta {
        cvp: -loss_l * 3.0 * m,
        cardiac_output: -loss_l * 1.2 * m,
        pcwp: -loss_l * 3.0 * m,
        temperature: VitalsDelta::toward(v.temperature, 35.8, 0.003, dt),
        ..Default::default()
    };

    let rr_target = [18.0, 24.0, 32.0, 38.0][class.index()];
    d.respiratory_rate = VitalsDelta::toward(v.respiratory_rate, rr_target, 0.03, dt);

    if class == AtlsClass::IV {
        // Decompensation: paradoxical bradycardia and vasomotor collapse
        d.heart_rate = -1.5 * dt;
        d.svr = -(v.svr - 900.0).max(0.0) * 0.02 * dt;
        d.spo2 = -0.1 * dt;
        d.cardiac_output -= 0.01 * dt;
    } else {
        let hr_target = [95.0, 115.0, 135.0][class.index()];
        let svr_target = [1900.0, 2100.0, 2300.0][class.index()];
        d.heart_rate = VitalsDelta::toward(v.heart_rate, hr_target, 0.05, dt);
        d.svr = VitalsDelta::toward(v.svr, svr_target, 0.02, dt);
    }
    d
}

pub(super) fn fluid_response(v: &VitalSigns, fluid: FluidType, volume_ml: f64, ctx: &ResponseContext) -> VitalsDelta {
    let fs = frank_starling_factor(v.cvp);
    let litres = volume_ml / 1000.0 * fluid.expansion_factor() * ctx.multiplier;
    let mut d = VitalsDelta {
        cvp: litres * 5.0 * fs.max(0.3),
        pcwp: litres * 4.0 * fs.max(0.3),
        cardiac_output: litres * 2.0 * fs,
        heart_rate: -litres * 12.0 * fs,
        svr: -litres * 150.0 * fs,
        ..Default::default()
    };
    // Crystalloid past a full tank leaks into the lungs
    if v.cvp > 14.0 && fluid == FluidType::Crystalloid {
        d.spo2 = -litres * 1.5;
    }
    d
}

pub(super) fn vasopressor_response(v: &VitalSigns, agent: Vasopressor, dose: f64, ctx: &ResponseContext) -> VitalsDelta {
    // Squeezing an empty circuit: pressure rises, flow does not
    let raw = agent.svr_gain() * dose * 0.5 * ctx.multiplier * ctx.dt;
    let svr = raw.min((SVR_CEILING - v.svr).max(0.0));
    let hr_room = ((160.0 - v.heart_rate) / 100.0).max(0.0);
    VitalsDelta {
        svr,
        cardiac_output: -svr / 1000.0 * 0.2,
        heart_rate: agent.heart_rate_effect() * dose * hr_room * ctx.dt,
        ..Default::default()
    }
}

/// cvp ≤ 5, svr ≥ 1600, pulse pressure ≤ 35; BUN:Cr > 20
pub(super) fn enforce_presentation(v: &mut VitalSigns, labs: &mut LabValues) {
    v.cvp = v.cvp.min(5.0);
    v.svr = v.svr.max(1600.0);
    if v.pulse_pressure() > 35.0 {
        v.systolic = v.diastolic + 35.0;
    }
    if labs.bun_creatinine_ratio() <= 20.0 {
        labs.chemistry.urea = labs.chemistry.creatinine * 21.0 / crate::physiology::labs::UREA_TO_BUN;
    }
}

/// MAP ≥ 65, lactate cleared, HR < 100, CVP ≥ 6, Hb ≥ 7
pub(super) fn is_resolved(v: &VitalSigns, labs: &LabValues) -> bool {
    v.map >= 65.0
        && labs.gasometry.lactate < 2.0
        && v.heart_rate < 100.0
        && v.cvp >= 6.0
        && labs.hematology.hemoglobin >= 7.0
}
