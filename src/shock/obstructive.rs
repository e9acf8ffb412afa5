//! Obstructive shock
//!
//! Flow is mechanically blocked, so the heart has nothing to compensate
//! with. Medical therapy buys time at best. Only a definitive procedure
//! matched to the etiology reverses the course, each with its own recovery
//! curve and complication risk.

use serde::{Deserialize, Serialize};

use crate::core::types::Minutes;
use crate::physiology::{LabValues, VitalSigns, VitalsDelta};
use crate::shock::profile::{assemble, blood, chem, gas, labs, ShockProfile, TreatmentResponsiveness};
use crate::shock::{InotropeProfile, InterventionFlags, ObstructiveEtiology, ResponseContext, SubtypeState};
use crate::treatment::catalog::{DefinitiveIntervention, FluidType, Vasopressor};

const SVR_CEILING: f64 = 2800.0;
/// Largest share of the decline medical therapy can hold off
const MAX_BRIDGE: f64 = 0.5;
/// Recovery never exceeds this after a complicated procedure
const COMPLICATED_RECOVERY_CAP: f64 = 0.6;

pub(super) const INOTROPE_PROFILE: InotropeProfile = InotropeProfile {
    co_gain: 0.0015,
    co_ceiling: 4.0,
    contractility_gain: 0.2,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplicationKind {
    /// Needle injures the myocardium; arrhythmia and some reaccumulation
    MyocardialPuncture,
    /// Lung re-expands too fast and leaks
    ReexpansionEdema,
    /// Needle relief is incomplete and tension rebuilds
    Reaccumulation,
    /// Lytics or surgery cause significant bleeding
    MajorBleeding,
}

impl ComplicationKind {
    pub fn description(&self) -> &'static str {
        match self {
            ComplicationKind::MyocardialPuncture => "Punção miocárdica com arritmia",
            ComplicationKind::ReexpansionEdema => "Edema pulmonar de reexpansão",
            ComplicationKind::Reaccumulation => "Recidiva da compressão",
            ComplicationKind::MajorBleeding => "Sangramento maior",
        }
    }

    fn for_procedure(intervention: DefinitiveIntervention) -> Self {
        match intervention {
            DefinitiveIntervention::Pericardiocentesis => ComplicationKind::MyocardialPuncture,
            DefinitiveIntervention::ChestTube => ComplicationKind::ReexpansionEdema,
            DefinitiveIntervention::Decompression => ComplicationKind::Reaccumulation,
            DefinitiveIntervention::Thrombolysis | DefinitiveIntervention::Embolectomy => ComplicationKind::MajorBleeding,
        }
    }

    /// Immediate hit the complication adds on top of the relief
    fn penalty(&self) -> VitalsDelta {
        match self {
            ComplicationKind::MyocardialPuncture => VitalsDelta {
                heart_rate: 20.0,
                cardiac_output: -0.5,
                ..Default::default()
            },
            ComplicationKind::ReexpansionEdema => VitalsDelta {
                spo2: -6.0,
                respiratory_rate: 6.0,
                ..Default::default()
            },
            ComplicationKind::Reaccumulation => VitalsDelta {
                cvp: 4.0,
                cardiac_output: -0.4,
                ..Default::default()
            },
            ComplicationKind::MajorBleeding => VitalsDelta {
                heart_rate: 15.0,
                cardiac_output: -0.6,
                cvp: -3.0,
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProceduralComplication {
    pub kind: ComplicationKind,
    pub occurred_at: Minutes,
}

/// A definitive procedure that took effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relief {
    pub intervention: DefinitiveIntervention,
    pub applied_at: Minutes,
    pub complication: Option<ProceduralComplication>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReliefOutcome {
    /// The procedure does not address this etiology
    Ineffective,
    Relieved {
        relief: Relief,
        /// Immediate change to apply to the vitals
        delta: VitalsDelta,
    },
}

fn addresses(etiology: ObstructiveEtiology, intervention: DefinitiveIntervention) -> bool {
    use DefinitiveIntervention as D;
    match etiology {
        ObstructiveEtiology::Tamponade => intervention == D::Pericardiocentesis,
        ObstructiveEtiology::TensionPneumothorax => matches!(intervention, D::ChestTube | D::Decompression),
        ObstructiveEtiology::PulmonaryEmbolism => matches!(intervention, D::Thrombolysis | D::Embolectomy),
        ObstructiveEtiology::AbdominalCompartment | ObstructiveEtiology::DynamicHyperinflation => {
            intervention == D::Decompression
        }
    }
}

/// Chance the procedure goes wrong, scaled by the patient's complication risk
pub fn complication_probability(intervention: DefinitiveIntervention, risk_multiplier: f64) -> f64 {
    let base = match intervention {
        DefinitiveIntervention::Pericardiocentesis => 0.10,
        DefinitiveIntervention::ChestTube => 0.05,
        DefinitiveIntervention::Decompression => 0.05,
        DefinitiveIntervention::Thrombolysis => 0.10,
        DefinitiveIntervention::Embolectomy => 0.15,
    };
    (base * risk_multiplier).clamp(0.0, 0.9)
}

/// Share of full recovery reached `elapsed` minutes after the procedure
pub fn recovery_fraction(intervention: DefinitiveIntervention, elapsed: Minutes) -> f64 {
    if elapsed < 0.0 {
        return 0.0;
    }
    match intervention {
        DefinitiveIntervention::Pericardiocentesis
        | DefinitiveIntervention::ChestTube
        | DefinitiveIntervention::Decompression => 1.0,
        DefinitiveIntervention::Thrombolysis => {
            let x = (elapsed / 75.0).min(1.0);
            x * x * (3.0 - 2.0 * x)
        }
        DefinitiveIntervention::Embolectomy => (elapsed / 20.0).min(1.0),
    }
}

fn is_mechanical(intervention: DefinitiveIntervention) -> bool {
    matches!(
        intervention,
        DefinitiveIntervention::Pericardiocentesis
            | DefinitiveIntervention::ChestTube
            | DefinitiveIntervention::Decompression
    )
}

/// Apply a definitive procedure. `roll` is a uniform draw in [0, 1); the
/// procedure is complicated when it falls below the complication probability.
pub fn relieve_obstruction(
    v: &VitalSigns,
    etiology: ObstructiveEtiology,
    intervention: DefinitiveIntervention,
    now: Minutes,
    roll: f64,
    risk_multiplier: f64,
) -> ReliefOutcome {
    if !addresses(etiology, intervention) {
        return ReliefOutcome::Ineffective;
    }

    let complication = (roll < complication_probability(intervention, risk_multiplier)).then(|| ProceduralComplication {
        kind: ComplicationKind::for_procedure(intervention),
        occurred_at: now,
    });

    let mut delta = VitalsDelta::zero();
    if is_mechanical(intervention) {
        // Filling restored at once
        let (co_factor, co_floor, cvp_drop) = if complication.is_some() {
            (1.5, 3.5, 6.0)
        } else {
            (2.2, 5.0, 12.0)
        };
        delta.cardiac_output = (v.cardiac_output * co_factor).max(co_floor) - v.cardiac_output;
        delta.cvp = (v.cvp - cvp_drop).max(0.0) - v.cvp;
        delta.heart_rate = -(v.heart_rate - 100.0).max(0.0) * 0.3;
        delta.svr = -(v.svr - 1300.0).max(0.0) * 0.3;
        if etiology == ObstructiveEtiology::TensionPneumothorax {
            delta.spo2 = (94.0 - v.spo2).max(0.0) * 0.6;
        }
    }
    if let Some(c) = &complication {
        delta += c.kind.penalty();
    }

    ReliefOutcome::Relieved {
        relief: Relief {
            intervention,
            applied_at: now,
            complication,
        },
        delta: delta.clamped_for(v),
    }
}

struct ObstructionParams {
    co_decline: f64,
    cvp_target: f64,
    hr_target: f64,
    svr_target: f64,
    spo2_decline: f64,
    rr_target: f64,
}

fn params(etiology: ObstructiveEtiology) -> ObstructionParams {
    match etiology {
        ObstructiveEtiology::Tamponade => ObstructionParams {
            co_decline: 0.02,
            cvp_target: 24.0,
            hr_target: 135.0,
            svr_target: 2400.0,
            spo2_decline: 0.02,
            rr_target: 30.0,
        },
        ObstructiveEtiology::TensionPneumothorax => ObstructionParams {
            co_decline: 0.03,
            cvp_target: 22.0,
            hr_target: 140.0,
            svr_target: 2300.0,
            spo2_decline: 0.3,
            rr_target: 36.0,
        },
        ObstructiveEtiology::PulmonaryEmbolism => ObstructionParams {
            co_decline: 0.015,
            cvp_target: 18.0,
            hr_target: 130.0,
            svr_target: 2100.0,
            spo2_decline: 0.1,
            rr_target: 32.0,
        },
        ObstructiveEtiology::AbdominalCompartment => ObstructionParams {
            co_decline: 0.012,
            cvp_target: 20.0,
            hr_target: 125.0,
            svr_target: 2200.0,
            spo2_decline: 0.05,
            rr_target: 30.0,
        },
        ObstructiveEtiology::DynamicHyperinflation => ObstructionParams {
            co_decline: 0.02,
            cvp_target: 20.0,
            hr_target: 130.0,
            svr_target: 2000.0,
            spo2_decline: 0.15,
            rr_target: 14.0,
        },
    }
}

pub(super) fn baseline_profile(etiology: ObstructiveEtiology) -> ShockProfile {
    let responsiveness = TreatmentResponsiveness {
        fluid: 0.5,
        vasopressor: 0.6,
        inotrope: 0.4,
        oxygen: 0.6,
    };
    match etiology {
        ObstructiveEtiology::Tamponade => assemble(
            "Choque obstrutivo (tamponamento cardíaco)",
            VitalSigns::new(128.0, 76.0, 60.0, 92.0, 28.0, 36.6, 20.0, 2.6, 2000.0)
                .with_pcwp(20.0)
                .with_pvr(1.8),
            45.0,
            labs(gas(7.26, 15.0, 68.0, 5.0), blood(12.5, 10.0, 200.0), chem(4.6, 137.0, 1.5, 55.0)),
            1.4,
            0.25,
            responsiveness,
        ),
        ObstructiveEtiology::TensionPneumothorax => assemble(
            "Choque obstrutivo (pneumotórax hipertensivo)",
            VitalSigns::new(135.0, 74.0, 50.0, 84.0, 34.0, 36.5, 18.0, 2.8, 1900.0)
                .with_pcwp(10.0)
                .with_pvr(3.0),
            50.0,
            labs(gas(7.22, 18.0, 50.0, 4.5), blood(13.0, 12.0, 220.0), chem(4.5, 139.0, 1.1, 40.0)),
            1.6,
            0.2,
            responsiveness,
        ),
        ObstructiveEtiology::PulmonaryEmbolism => assemble(
            "Choque obstrutivo (tromboembolismo pulmonar)",
            VitalSigns::new(122.0, 82.0, 56.0, 86.0, 30.0, 37.2, 16.0, 3.0, 1800.0)
                .with_pcwp(8.0)
                .with_pvr(6.0),
            40.0,
            labs(gas(7.36, 18.0, 55.0, 4.0), blood(13.5, 11.0, 180.0), chem(4.3, 138.0, 1.3, 45.0)),
            1.3,
            0.3,
            TreatmentResponsiveness {
                vasopressor: 0.8,
                ..responsiveness
            },
        ),
        ObstructiveEtiology::AbdominalCompartment => assemble(
            "Choque obstrutivo (síndrome compartimental abdominal)",
            VitalSigns::new(118.0, 86.0, 58.0, 91.0, 28.0, 37.4, 17.0, 3.2, 1850.0)
                .with_pcwp(18.0)
                .with_pvr(2.2),
            48.0,
            labs(gas(7.28, 17.0, 65.0, 3.8), blood(11.0, 14.0, 160.0), chem(5.0, 136.0, 2.2, 80.0)),
            1.2,
            0.3,
            responsiveness,
        ),
        ObstructiveEtiology::DynamicHyperinflation => assemble(
            "Choque obstrutivo (hiperinsuflação dinâmica)",
            VitalSigns::new(126.0, 80.0, 52.0, 85.0, 12.0, 36.8, 16.0, 3.0, 1700.0)
                .with_pcwp(14.0)
                .with_pvr(3.5),
            48.0,
            labs(gas(7.18, 26.0, 58.0, 3.0), blood(14.0, 12.0, 250.0), chem(4.8, 140.0, 1.0, 38.0)),
            1.3,
            0.3,
            responsiveness,
        ),
    }
}

/// Share of the decline that vasopressors and volume can hold off
fn bridge(flags: &InterventionFlags) -> f64 {
    let pressor = (flags.vasopressor_dose / 0.3).min(1.0) * 0.3;
    let volume = (flags.fluid_rate_ml_min / 30.0).min(1.0) * 0.2;
    (pressor + volume).min(MAX_BRIDGE)
}

pub(super) fn progress(
    etiology: ObstructiveEtiology,
    v: &VitalSigns,
    dt: f64,
    flags: &InterventionFlags,
    subtype: Option<&SubtypeState>,
) -> VitalsDelta {
    let relief = subtype.and_then(SubtypeState::relief);
    match relief {
        Some(r) => recovering(etiology, v, dt, flags, r),
        None => obstructed(etiology, v, dt, flags),
    }
}

fn obstructed(etiology: ObstructiveEtiology, v: &VitalSigns, dt: f64, flags: &InterventionFlags) -> VitalsDelta {
    let p = params(etiology);
    let mut decline = 1.0 - bridge(flags);
    // Positive pressure traps more air
    if etiology == ObstructiveEtiology::DynamicHyperinflation && flags.intubated {
        decline *= 1.5;
    }

    let mut d = VitalsDelta {
        cardiac_output: -p.co_decline * decline * dt,
        cvp: VitalsDelta::toward(v.cvp, p.cvp_target, 0.02 * decline, dt),
        heart_rate: VitalsDelta::toward(v.heart_rate, p.hr_target, 0.05, dt),
        svr: VitalsDelta::toward(v.svr, p.svr_target, 0.01, dt),
        spo2: -p.spo2_decline * decline * dt,
        respiratory_rate: VitalsDelta::toward(v.respiratory_rate, p.rr_target, 0.03, dt),
        ..Default::default()
    };
    if etiology == ObstructiveEtiology::PulmonaryEmbolism {
        d.pvr = v.pvr.map_or(0.0, |pvr| VitalsDelta::toward(pvr, 9.0, 0.01 * decline, dt));
    }
    d
}

fn recovering(
    etiology: ObstructiveEtiology,
    v: &VitalSigns,
    dt: f64,
    flags: &InterventionFlags,
    relief: &Relief,
) -> VitalsDelta {
    let elapsed = flags.minutes_since_onset - relief.applied_at;
    let mut fraction = recovery_fraction(relief.intervention, elapsed);
    if relief.complication.is_some() {
        fraction = fraction.min(COMPLICATED_RECOVERY_CAP);
    }
    // Unrelieved share of the obstruction keeps pulling down
    let residual = obstructed(etiology, v, dt, flags) * (1.0 - fraction);
    let rate = 0.05 * fraction;

    let mut d = VitalsDelta {
        cardiac_output: VitalsDelta::toward(v.cardiac_output, 5.0, rate, dt),
        cvp: VitalsDelta::toward(v.cvp, 8.0, rate, dt),
        heart_rate: VitalsDelta::toward(v.heart_rate, 95.0, rate, dt),
        svr: VitalsDelta::toward(v.svr, 1100.0, rate, dt),
        spo2: VitalsDelta::toward(v.spo2, 95.0, rate, dt),
        respiratory_rate: VitalsDelta::toward(v.respiratory_rate, 20.0, rate, dt),
        pvr: v.pvr.map_or(0.0, |pvr| VitalsDelta::toward(pvr, 1.5, rate, dt)),
        ..Default::default()
    };
    d += residual;
    d
}

pub(super) fn fluid_response(
    etiology: ObstructiveEtiology,
    v: &VitalSigns,
    fluid: FluidType,
    volume_ml: f64,
    ctx: &ResponseContext,
) -> VitalsDelta {
    let litres = volume_ml / 1000.0 * fluid.expansion_factor();
    let benefit = litres * ctx.multiplier;
    let co = match etiology {
        // A little preload pushes past the compression
        ObstructiveEtiology::Tamponade | ObstructiveEtiology::AbdominalCompartment => benefit * 0.4,
        ObstructiveEtiology::TensionPneumothorax | ObstructiveEtiology::DynamicHyperinflation => benefit * 0.15,
        // A dilated right ventricle pushes the septum over
        ObstructiveEtiology::PulmonaryEmbolism if v.cvp > 18.0 => -litres * 0.3,
        ObstructiveEtiology::PulmonaryEmbolism => benefit * 0.25,
    };
    VitalsDelta {
        cardiac_output: co,
        cvp: litres * 4.0,
        pcwp: litres * 2.0,
        heart_rate: -benefit * 3.0,
        ..Default::default()
    }
}

pub(super) fn vasopressor_response(v: &VitalSigns, agent: Vasopressor, dose: f64, ctx: &ResponseContext) -> VitalsDelta {
    let raw = agent.svr_gain() * dose * 0.8 * ctx.multiplier * ctx.dt;
    let svr = raw.min((SVR_CEILING - v.svr).max(0.0));
    let hr_room = ((160.0 - v.heart_rate) / 100.0).max(0.0);
    // Coronary perfusion pressure keeps the right ventricle going
    let perfusion = (4.0 - v.cardiac_output).max(0.0) * 0.002 * agent.norepinephrine_equivalent(dose) * 10.0 * ctx.dt;
    VitalsDelta {
        svr,
        cardiac_output: perfusion * ctx.multiplier,
        heart_rate: agent.heart_rate_effect() * dose * hr_room * ctx.dt,
        ..Default::default()
    }
}

/// cvp ≥ 14, CO ≤ 3.5
pub(super) fn enforce_presentation(v: &mut VitalSigns) {
    v.cvp = v.cvp.max(14.0);
    v.cardiac_output = v.cardiac_output.min(3.5);
}

/// MAP ≥ 65, lactate cleared, CO ≥ 4, CVP ≤ 12, SpO2 ≥ 92, and the
/// obstruction has been relieved
pub(super) fn is_resolved(v: &VitalSigns, labs: &LabValues, subtype: Option<&SubtypeState>) -> bool {
    subtype.and_then(SubtypeState::relief).is_some()
        && v.map >= 65.0
        && labs.gasometry.lactate < 2.0
        && v.cardiac_output >= 4.0
        && v.cvp <= 12.0
        && v.spo2 >= 92.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tamponade() -> VitalSigns {
        baseline_profile(ObstructiveEtiology::Tamponade).vitals
    }

    #[test]
    fn test_pericardiocentesis_restores_flow() {
        let v = tamponade();
        let outcome = relieve_obstruction(
            &v,
            ObstructiveEtiology::Tamponade,
            DefinitiveIntervention::Pericardiocentesis,
            12.0,
            0.5,
            1.0,
        );
        let ReliefOutcome::Relieved { relief, delta } = outcome else {
            panic!("pericardiocentesis should relieve tamponade");
        };
        assert!(relief.complication.is_none());
        let after = v.apply(&delta);
        assert!(after.cardiac_output > 2.0 * v.cardiac_output);
        assert!(v.cvp - after.cvp >= 10.0);
    }

    #[test]
    fn test_low_roll_complicates() {
        let v = tamponade();
        let outcome = relieve_obstruction(
            &v,
            ObstructiveEtiology::Tamponade,
            DefinitiveIntervention::Pericardiocentesis,
            0.0,
            0.01,
            1.0,
        );
        match outcome {
            ReliefOutcome::Relieved { relief, .. } => {
                assert_eq!(relief.complication.map(|c| c.kind), Some(ComplicationKind::MyocardialPuncture));
            }
            ReliefOutcome::Ineffective => panic!("expected relief"),
        }
    }

    #[test]
    fn test_complicated_pericardiocentesis_relieves_less() {
        let v = tamponade();
        let relieve = |roll| {
            match relieve_obstruction(
                &v,
                ObstructiveEtiology::Tamponade,
                DefinitiveIntervention::Pericardiocentesis,
                0.0,
                roll,
                1.0,
            ) {
                ReliefOutcome::Relieved { relief, delta } => (relief, v.apply(&delta)),
                ReliefOutcome::Ineffective => panic!("expected relief"),
            }
        };
        let (clean, clean_after) = relieve(0.99);
        let (punctured, punctured_after) = relieve(0.0);

        assert!(clean.complication.is_none());
        assert_eq!(
            punctured.complication.map(|c| c.kind),
            Some(ComplicationKind::MyocardialPuncture)
        );
        assert!(punctured_after.cardiac_output < clean_after.cardiac_output);
        assert!(punctured_after.cardiac_output > v.cardiac_output);
        assert!(punctured_after.heart_rate > clean_after.heart_rate);
        assert!(v.cvp - punctured_after.cvp < v.cvp - clean_after.cvp);
    }

    #[test]
    fn test_wrong_procedure_is_ineffective() {
        let outcome = relieve_obstruction(
            &tamponade(),
            ObstructiveEtiology::Tamponade,
            DefinitiveIntervention::ChestTube,
            0.0,
            0.5,
            1.0,
        );
        assert_eq!(outcome, ReliefOutcome::Ineffective);
    }

    #[test]
    fn test_recovery_curves() {
        assert_eq!(recovery_fraction(DefinitiveIntervention::ChestTube, 0.0), 1.0);
        let early = recovery_fraction(DefinitiveIntervention::Thrombolysis, 15.0);
        let mid = recovery_fraction(DefinitiveIntervention::Thrombolysis, 40.0);
        assert!(early < mid && mid < 1.0);
        assert_eq!(recovery_fraction(DefinitiveIntervention::Thrombolysis, 90.0), 1.0);
        assert_eq!(recovery_fraction(DefinitiveIntervention::Embolectomy, 10.0), 0.5);
    }

    #[test]
    fn test_medical_therapy_only_bridges() {
        let v = tamponade();
        let untreated = progress(ObstructiveEtiology::Tamponade, &v, 1.0, &InterventionFlags::default(), None);
        let flags = InterventionFlags {
            vasopressor_dose: 1.0,
            fluid_rate_ml_min: 100.0,
            ..Default::default()
        };
        let treated = progress(ObstructiveEtiology::Tamponade, &v, 1.0, &flags, None);
        assert!(treated.cardiac_output < 0.0);
        assert!(treated.cardiac_output >= untreated.cardiac_output * MAX_BRIDGE - 1e-12);
    }

    #[test]
    fn test_relief_turns_decline_around() {
        let v = tamponade();
        let state = SubtypeState::Obstructive {
            relief: Some(Relief {
                intervention: DefinitiveIntervention::Pericardiocentesis,
                applied_at: 0.0,
                complication: None,
            }),
        };
        let flags = InterventionFlags {
            minutes_since_onset: 5.0,
            ..Default::default()
        };
        let d = progress(ObstructiveEtiology::Tamponade, &v, 1.0, &flags, Some(&state));
        assert!(d.cardiac_output > 0.0);
        assert!(d.cvp < 0.0);
    }

    #[test]
    fn test_not_resolved_without_relief() {
        let v = VitalSigns::normal();
        let labs = LabValues::normal();
        assert!(!is_resolved(&v, &labs, Some(&SubtypeState::obstructive())));
    }

    #[test]
    fn test_complication_risk_scales() {
        let base = complication_probability(DefinitiveIntervention::Embolectomy, 1.0);
        let frail = complication_probability(DefinitiveIntervention::Embolectomy, 2.0);
        assert!((frail - 2.0 * base).abs() < 1e-12);
        assert!(complication_probability(DefinitiveIntervention::Embolectomy, 100.0) <= 0.9);
    }
}
