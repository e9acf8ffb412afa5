//! Cardiogenic shock
//!
//! Pump failure feeds on itself: low output lowers coronary perfusion which
//! lowers output further. Fluids help only until the congestion threshold,
//! after which they flood the lungs. Inotropes and mechanical support are the
//! only reliable way to raise output.

use serde::{Deserialize, Serialize};

use crate::physiology::{LabValues, VitalSigns, VitalsDelta};
use crate::shock::profile::{assemble, blood, chem, gas, labs, ShockProfile, TreatmentResponsiveness};
use crate::shock::{InotropeProfile, InterventionFlags, ResponseContext};
use crate::treatment::catalog::{FluidType, Vasopressor};

pub(super) const INOTROPE_PROFILE: InotropeProfile = InotropeProfile {
    co_gain: 0.004,
    co_ceiling: 5.5,
    contractility_gain: 0.5,
};

/// SVR ceiling under vasopressors (already vasoconstricted)
const SVR_CEILING: f64 = 2800.0;

/// How safely more volume can be given
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FluidTolerance {
    Tolerant,
    Caution,
    HighRisk,
    Contraindicated,
}

/// SCAI cardiogenic shock stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScaiStage {
    /// At risk
    A,
    /// Beginning: hypotension or tachycardia without hypoperfusion
    B,
    /// Classic: hypoperfusion needing one intervention
    C,
    /// Deteriorating despite initial support
    D,
    /// Extremis
    E,
}

pub fn classify_fluid_tolerance(v: &VitalSigns) -> FluidTolerance {
    let pcwp = v.pcwp.unwrap_or(0.0);
    if v.cvp >= 18.0 || pcwp >= 25.0 || v.spo2 < 88.0 {
        FluidTolerance::Contraindicated
    } else if v.cvp >= 15.0 || pcwp >= 20.0 {
        FluidTolerance::HighRisk
    } else if v.cvp >= 12.0 || pcwp >= 18.0 {
        FluidTolerance::Caution
    } else {
        FluidTolerance::Tolerant
    }
}

pub fn scai_stage(v: &VitalSigns, labs: &LabValues, flags: &InterventionFlags) -> ScaiStage {
    let lactate = labs.gasometry.lactate;
    let supports = [
        flags.vasopressor_dose > 0.0,
        flags.inotrope_dose > 0.0,
        flags.mechanical_support,
    ]
    .iter()
    .filter(|s| **s)
    .count();

    if v.map < 50.0 || lactate >= 10.0 || labs.gasometry.ph < 7.0 {
        ScaiStage::E
    } else if lactate >= 5.0 || supports >= 2 {
        ScaiStage::D
    } else if lactate >= 2.0 || supports == 1 {
        ScaiStage::C
    } else if v.map < 65.0 || v.heart_rate > 100.0 {
        ScaiStage::B
    } else {
        ScaiStage::A
    }
}

pub(super) fn baseline_profile() -> ShockProfile {
    assemble(
        "Choque cardiogênico",
        VitalSigns::new(112.0, 78.0, 52.0, 90.0, 26.0, 36.6, 14.0, 3.0, 1750.0)
            .with_pcwp(24.0)
            .with_pvr(2.8),
        22.0,
        labs(gas(7.30, 16.5, 62.0, 4.2), blood(13.0, 11.0, 210.0), chem(4.8, 132.0, 1.6, 60.0)),
        1.1,
        0.35,
        TreatmentResponsiveness {
            fluid: 0.3,
            vasopressor: 0.7,
            inotrope: 1.2,
            oxygen: 0.8,
        },
    )
}

pub(super) fn progress(v: &VitalSigns, dt: f64, flags: &InterventionFlags) -> VitalsDelta {
    let support = ((flags.inotrope_dose / 10.0).min(0.7) + if flags.mechanical_support { 0.5 } else { 0.0 }).min(0.9);
    let coronary = if v.map < 65.0 { 1.0 + (65.0 - v.map) / 20.0 } else { 1.0 };
    let spiral = 1.0 + (4.0 - v.cardiac_output).max(0.0) * 0.4;
    let decline = spiral * coronary * (1.0 - support);

    let mut d = VitalsDelta {
        cardiac_output: -0.006 * decline * dt,
        contractility: -0.03 * decline * dt,
        heart_rate: VitalsDelta::toward(v.heart_rate, 115.0, 0.03, dt),
        cvp: VitalsDelta::toward(v.cvp, 16.0, 0.01 * (1.0 - support), dt),
        pcwp: v.pcwp.map_or(0.0, |p| VitalsDelta::toward(p, 26.0, 0.01 * (1.0 - support), dt)),
        // Neurohormonal vasoconstriction
        svr: VitalsDelta::toward(v.svr, 1900.0, 0.005, dt),
        ..Default::default()
    };

    if flags.mechanical_support {
        d.cardiac_output += (4.5 - v.cardiac_output).max(0.0) * 0.02 * dt;
    }

    let pcwp = v.pcwp.unwrap_or(v.cvp + 6.0);
    let congestion = (pcwp - 18.0).max(0.0) / 10.0 + (v.cvp - 12.0).max(0.0) / 10.0;
    d.spo2 = -0.05 * congestion * dt;
    d.respiratory_rate = VitalsDelta::toward(v.respiratory_rate, 26.0 + 6.0 * congestion, 0.02, dt);

    // Volume running into a congested circulation
    if v.cvp > 12.0 && flags.fluid_rate_ml_min > 0.0 {
        d.spo2 -= flags.fluid_rate_ml_min * 0.004 * dt;
        d.cvp += flags.fluid_rate_ml_min * 0.003 * dt;
    }
    d
}

pub(super) fn fluid_response(v: &VitalSigns, fluid: FluidType, volume_ml: f64, ctx: &ResponseContext) -> VitalsDelta {
    // Harm does not scale down with poor responsiveness, benefit does
    let litres = volume_ml / 1000.0 * fluid.expansion_factor();
    let benefit = litres * ctx.multiplier;
    let (co, cvp, pcwp, spo2, rr) = match classify_fluid_tolerance(v) {
        FluidTolerance::Tolerant => (benefit * 0.6, 3.0, 4.0, 0.0, 0.0),
        FluidTolerance::Caution => (benefit * 0.2, 4.0, 5.0, -1.5, 1.0),
        FluidTolerance::HighRisk => (-litres * 0.1, 5.0, 6.0, -4.0, 4.0),
        FluidTolerance::Contraindicated => (-litres * 0.3, 6.0, 7.0, -6.0, 6.0),
    };
    VitalsDelta {
        cardiac_output: co,
        cvp: litres * cvp,
        pcwp: litres * pcwp,
        spo2: litres * spo2,
        respiratory_rate: litres * rr,
        ..Default::default()
    }
}

pub(super) fn vasopressor_response(v: &VitalSigns, agent: Vasopressor, dose: f64, ctx: &ResponseContext) -> VitalsDelta {
    let raw = agent.svr_gain() * dose * 0.7 * ctx.multiplier * ctx.dt;
    let svr = raw.min((SVR_CEILING - v.svr).max(0.0));
    let hr_room = ((160.0 - v.heart_rate) / 100.0).max(0.0);
    // Afterload costs a failing ventricle output; beta effect pays some back
    let afterload_cost = svr / 1000.0 * 0.3;
    let inotropy = (5.5 - v.cardiac_output).max(0.0) * 0.003 * agent.inotropy() * dose * ctx.multiplier * ctx.dt;
    VitalsDelta {
        svr,
        cardiac_output: inotropy - afterload_cost,
        heart_rate: agent.heart_rate_effect() * dose * hr_room * ctx.dt,
        ..Default::default()
    }
}

/// cvp ≥ 12, CO ≤ 4.0, svr ≥ 1400
pub(super) fn enforce_presentation(v: &mut VitalSigns) {
    v.cvp = v.cvp.max(12.0);
    v.cardiac_output = v.cardiac_output.min(4.0);
    v.svr = v.svr.max(1400.0);
}

/// MAP ≥ 65, lactate cleared, CO ≥ 4.0, wedge ≤ 18, SpO2 ≥ 92
pub(super) fn is_resolved(v: &VitalSigns, labs: &LabValues) -> bool {
    v.map >= 65.0
        && labs.gasometry.lactate < 2.0
        && v.cardiac_output >= 4.0
        && v.pcwp.map_or(true, |p| p <= 18.0)
        && v.spo2 >= 92.0
}
