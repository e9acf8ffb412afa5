//! Distributive shock: septic, anaphylactic and neurogenic
//!
//! Vasodilation drags SVR toward a subtype floor. Vasopressors block the
//! drift strongly, fluids moderately and with diminishing benefit past ~4 L.

use crate::physiology::{VitalSigns, VitalsDelta};
use crate::physiology::LabValues;
use crate::shock::profile::{assemble, blood, chem, gas, labs, ShockProfile, TreatmentResponsiveness};
use crate::shock::{DistributiveSubtype, InotropeProfile, InterventionFlags, ResponseContext};
use crate::treatment::catalog::{FluidType, Vasopressor};

/// Highest SVR vasopressors can push a vasodilated patient to
pub const SVR_CEILING: f64 = 2200.0;
/// Extra vasopressor effect in sepsis
pub const SEPTIC_VASOPRESSOR_BONUS: f64 = 1.25;
/// Cumulative volume past which fluids stop helping much (mL)
pub const FLUID_DIMINISHING_ML: f64 = 4000.0;

pub(super) const INOTROPE_PROFILE: InotropeProfile = InotropeProfile {
    co_gain: 0.002,
    co_ceiling: 7.0,
    contractility_gain: 0.3,
};

struct SubtypeParams {
    svr_floor: f64,
    svr_rate: f64,
    hr_target: f64,
    hr_rate: f64,
    rr_target: f64,
}

fn params(sub: DistributiveSubtype) -> SubtypeParams {
    match sub {
        DistributiveSubtype::Septic => SubtypeParams {
            svr_floor: 450.0,
            svr_rate: 0.012,
            hr_target: 110.0,
            hr_rate: 0.05,
            rr_target: 28.0,
        },
        DistributiveSubtype::Anaphylactic => SubtypeParams {
            svr_floor: 380.0,
            svr_rate: 0.03,
            hr_target: 130.0,
            hr_rate: 0.1,
            rr_target: 32.0,
        },
        DistributiveSubtype::Neurogenic => SubtypeParams {
            svr_floor: 600.0,
            svr_rate: 0.008,
            hr_target: 52.0,
            hr_rate: 0.05,
            rr_target: 14.0,
        },
    }
}

pub(super) fn baseline_profile(sub: DistributiveSubtype) -> ShockProfile {
    let responsiveness = TreatmentResponsiveness {
        fluid: 0.8,
        vasopressor: 1.0,
        inotrope: 0.6,
        oxygen: 0.9,
    };
    match sub {
        DistributiveSubtype::Septic => assemble(
            "Choque distributivo (séptico)",
            VitalSigns::new(118.0, 84.0, 44.0, 93.0, 26.0, 38.9, 4.0, 6.8, 560.0)
                .with_pcwp(8.0)
                .with_pvr(1.5),
            45.0,
            labs(gas(7.28, 14.0, 70.0, 4.8), blood(11.5, 19.0, 110.0), chem(4.6, 136.0, 1.8, 70.0)),
            1.0,
            0.5,
            responsiveness,
        ),
        DistributiveSubtype::Anaphylactic => assemble(
            "Choque distributivo (anafilático)",
            VitalSigns::new(132.0, 72.0, 38.0, 89.0, 30.0, 37.0, 3.0, 5.2, 420.0)
                .with_pcwp(6.0)
                .with_pvr(1.6),
            50.0,
            labs(gas(7.31, 16.0, 60.0, 3.5), blood(14.5, 11.0, 240.0), chem(4.1, 140.0, 1.0, 35.0)),
            1.3,
            0.6,
            TreatmentResponsiveness {
                vasopressor: 1.1,
                ..responsiveness
            },
        ),
        DistributiveSubtype::Neurogenic => assemble(
            "Choque distributivo (neurogênico)",
            VitalSigns::new(52.0, 78.0, 40.0, 96.0, 14.0, 36.0, 3.0, 4.6, 650.0)
                .with_pcwp(6.0)
                .with_pvr(1.2),
            48.0,
            labs(gas(7.34, 20.0, 85.0, 2.4), blood(13.0, 9.0, 230.0), chem(4.0, 139.0, 1.0, 32.0)),
            0.8,
            0.2,
            TreatmentResponsiveness {
                fluid: 0.9,
                ..responsiveness
            },
        ),
    }
}

/// Share of the vasodilation drift that fluids offset; saturates past ~4 L
fn fluid_support(cumulative_ml: f64) -> f64 {
    let early = cumulative_ml.min(FLUID_DIMINISHING_ML) / FLUID_DIMINISHING_ML * 0.3;
    let late = if cumulative_ml > FLUID_DIMINISHING_ML {
        0.05 * (1.0 - (-(cumulative_ml - FLUID_DIMINISHING_ML) / 2000.0).exp())
    } else {
        0.0
    };
    early + late
}

/// Efficiency of each additional litre
fn fluid_efficiency(cumulative_ml: f64) -> f64 {
    if cumulative_ml <= FLUID_DIMINISHING_ML {
        1.0
    } else {
        1.0 / (1.0 + (cumulative_ml - FLUID_DIMINISHING_ML) / 2000.0)
    }
}

pub(super) fn progress(sub: DistributiveSubtype, v: &VitalSigns, dt: f64, flags: &InterventionFlags) -> VitalsDelta {
    let p = params(sub);
    let vaso_block = (flags.vasopressor_dose / 0.25).min(0.9);
    let mut suppression = (vaso_block + fluid_support(flags.cumulative_fluids_ml)).min(0.95);
    let mut svr_rate = p.svr_rate;
    let mut d = VitalsDelta::zero();

    match sub {
        DistributiveSubtype::Septic => {
            if flags.antibiotics_given {
                svr_rate *= 0.6;
            }
            if flags.steroids_given {
                svr_rate *= 0.85;
            }
            let hr_target = (p.hr_target + (v.temperature - 37.0).max(0.0) * 10.0).min(150.0);
            d.heart_rate = VitalsDelta::toward(v.heart_rate, hr_target, p.hr_rate, dt);
            let temp_target = if flags.antibiotics_given { 38.0 } else { 39.2 };
            d.temperature = VitalsDelta::toward(v.temperature, temp_target, 0.01, dt);
            // Hyperdynamic early, septic cardiomyopathy later
            d.cardiac_output = if flags.minutes_since_onset < 180.0 {
                VitalsDelta::toward(v.cardiac_output, 7.0, 0.01, dt)
            } else {
                let block = (flags.inotrope_dose / 10.0).min(0.8);
                VitalsDelta::toward(v.cardiac_output, 3.5, 0.004 * (1.0 - block), dt)
            };
            if flags.fluid_rate_ml_min <= 0.0 {
                d.cvp = VitalsDelta::toward(v.cvp, 2.0, 0.01, dt);
            }
            // Lung injury follows hypoperfusion and an uncontrolled source
            let hypoperfusion = ((70.0 - v.map) / 20.0).clamp(0.0, 1.0);
            let source = if flags.antibiotics_given { 0.0 } else { 0.5 };
            d.spo2 = -0.01 * (hypoperfusion + source).min(1.0) * dt;
            if flags.cumulative_fluids_ml > 5000.0 {
                d.spo2 -= 0.02 * dt;
            }
        }
        DistributiveSubtype::Anaphylactic => {
            if flags.epinephrine_active {
                suppression = 0.95;
                d.svr = VitalsDelta::toward(v.svr, 1100.0, 0.02, dt);
                d.spo2 = VitalsDelta::toward(v.spo2, 96.0, 0.05, dt);
                d.heart_rate = VitalsDelta::toward(v.heart_rate, 115.0, p.hr_rate, dt);
                d.cardiac_output = VitalsDelta::toward(v.cardiac_output, 5.5, 0.02, dt);
            } else {
                // Bronchospasm and laryngeal edema
                d.spo2 = -0.25 * dt;
                d.heart_rate = VitalsDelta::toward(v.heart_rate, p.hr_target, p.hr_rate, dt);
                if flags.fluid_rate_ml_min <= 0.0 {
                    d.cardiac_output = VitalsDelta::toward(v.cardiac_output, 3.0, 0.02, dt);
                }
            }
            if flags.fluid_rate_ml_min <= 0.0 {
                d.cvp = VitalsDelta::toward(v.cvp, 1.0, 0.02, dt);
            }
        }
        DistributiveSubtype::Neurogenic => {
            // Unopposed vagal tone: no compensatory tachycardia
            let hr_target = if flags.atropine_active { 75.0 } else { p.hr_target };
            d.heart_rate = VitalsDelta::toward(v.heart_rate, hr_target, p.hr_rate, dt);
            d.temperature = VitalsDelta::toward(v.temperature, 35.8, 0.005, dt);
            d.cardiac_output = VitalsDelta::toward(v.cardiac_output, 4.0, 0.01, dt);
            if flags.fluid_rate_ml_min <= 0.0 {
                d.cvp = VitalsDelta::toward(v.cvp, 3.0, 0.01, dt);
            }
        }
    }

    d.svr += -(v.svr - p.svr_floor).max(0.0) * svr_rate * (1.0 - suppression) * dt;
    d.respiratory_rate = VitalsDelta::toward(v.respiratory_rate, p.rr_target, 0.03, dt);
    d
}

pub(super) fn fluid_response(
    sub: DistributiveSubtype,
    v: &VitalSigns,
    fluid: FluidType,
    volume_ml: f64,
    ctx: &ResponseContext,
) -> VitalsDelta {
    let litres = volume_ml / 1000.0 * fluid.expansion_factor() * ctx.multiplier;
    let eff = fluid_efficiency(ctx.cumulative_fluids_ml);
    let leak = if sub == DistributiveSubtype::Neurogenic { 1.0 } else { 0.7 };
    let mut d = VitalsDelta {
        cvp: litres * 2.5 * eff * leak,
        cardiac_output: litres * 0.8 * eff,
        heart_rate: -litres * 4.0 * eff,
        pcwp: litres * 2.0 * eff,
        ..Default::default()
    };
    // Capillary leak turns late litres into lung water
    if ctx.cumulative_fluids_ml > 5000.0 && sub != DistributiveSubtype::Neurogenic {
        d.spo2 = -litres * 1.0;
    }
    if v.cvp > 14.0 {
        d.cardiac_output *= 0.3;
    }
    d
}

pub(super) fn vasopressor_response(
    sub: DistributiveSubtype,
    v: &VitalSigns,
    agent: Vasopressor,
    dose: f64,
    ctx: &ResponseContext,
) -> VitalsDelta {
    let bonus = match (sub, agent) {
        (DistributiveSubtype::Septic, _) => SEPTIC_VASOPRESSOR_BONUS,
        (DistributiveSubtype::Anaphylactic, Vasopressor::Epinephrine) => 1.5,
        _ => 1.0,
    };
    let raw = agent.svr_gain() * dose * bonus * ctx.multiplier * ctx.dt;
    let svr = raw.min((SVR_CEILING - v.svr).max(0.0));
    let hr_room = ((160.0 - v.heart_rate) / 100.0).max(0.0);
    let inotropy = agent.inotropy() * dose * ctx.multiplier;
    VitalsDelta {
        svr,
        heart_rate: agent.heart_rate_effect() * dose * hr_room * ctx.dt,
        cardiac_output: (7.0 - v.cardiac_output).max(0.0) * 0.002 * inotropy * ctx.dt,
        ..Default::default()
    }
}

/// svr ≤ 800, CO ≥ 4.5
pub(super) fn enforce_presentation(v: &mut VitalSigns) {
    v.svr = v.svr.min(800.0);
    v.cardiac_output = v.cardiac_output.max(4.5);
}

/// MAP ≥ 65, lactate cleared, SVR 800-1400, SpO2 ≥ 92, CO ≥ 4
pub(super) fn is_resolved(v: &VitalSigns, labs: &LabValues) -> bool {
    v.map >= 65.0
        && labs.gasometry.lactate < 2.0
        && (800.0..=1400.0).contains(&v.svr)
        && v.spo2 >= 92.0
        && v.cardiac_output >= 4.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(multiplier: f64) -> ResponseContext {
        ResponseContext {
            multiplier,
            cumulative_fluids_ml: 0.0,
            dt: 1.0,
        }
    }

    #[test]
    fn test_svr_decays_without_treatment() {
        let v = baseline_profile(DistributiveSubtype::Septic).vitals;
        let d = progress(DistributiveSubtype::Septic, &v, 1.0, &InterventionFlags::default());
        assert!(d.svr < 0.0);
    }

    #[test]
    fn test_vasopressor_blocks_decay() {
        let v = baseline_profile(DistributiveSubtype::Septic).vitals;
        let untreated = progress(DistributiveSubtype::Septic, &v, 1.0, &InterventionFlags::default());
        let flags = InterventionFlags {
            vasopressor_dose: 0.2,
            ..Default::default()
        };
        let treated = progress(DistributiveSubtype::Septic, &v, 1.0, &flags);
        assert!(treated.svr > untreated.svr);
    }

    #[test]
    fn test_neurogenic_heart_rate_stays_low() {
        let v = baseline_profile(DistributiveSubtype::Neurogenic).vitals;
        let d = progress(DistributiveSubtype::Neurogenic, &v, 10.0, &InterventionFlags::default());
        assert!(v.heart_rate + d.heart_rate < 60.0);
    }

    #[test]
    fn test_septic_bonus_applied() {
        let v = baseline_profile(DistributiveSubtype::Septic).vitals;
        let septic = vasopressor_response(DistributiveSubtype::Septic, &v, Vasopressor::Norepinephrine, 0.2, &ctx(1.0));
        let neuro = vasopressor_response(DistributiveSubtype::Neurogenic, &v, Vasopressor::Norepinephrine, 0.2, &ctx(1.0));
        assert!((septic.svr - 60.0 * 0.2 * SEPTIC_VASOPRESSOR_BONUS).abs() < 1e-9);
        assert!(septic.svr > neuro.svr);
    }

    #[test]
    fn test_vasopressor_never_exceeds_ceiling() {
        let mut v = baseline_profile(DistributiveSubtype::Septic).vitals;
        v.svr = 2150.0;
        let d = vasopressor_response(DistributiveSubtype::Septic, &v, Vasopressor::Norepinephrine, 1.0, &ctx(1.0));
        assert!(v.svr + d.svr <= SVR_CEILING);
    }

    #[test]
    fn test_fluids_diminish_after_four_litres() {
        let v = baseline_profile(DistributiveSubtype::Septic).vitals;
        let early = fluid_response(DistributiveSubtype::Septic, &v, FluidType::Crystalloid, 500.0, &ctx(1.0));
        let late_ctx = ResponseContext {
            cumulative_fluids_ml: 6000.0,
            ..ctx(1.0)
        };
        let late = fluid_response(DistributiveSubtype::Septic, &v, FluidType::Crystalloid, 500.0, &late_ctx);
        assert!(late.cardiac_output < early.cardiac_output);
        assert!(late.spo2 < 0.0);
    }

    #[test]
    fn test_septic_desaturation_tracks_severity() {
        let mut v = VitalSigns::normal();
        let covered = InterventionFlags {
            antibiotics_given: true,
            ..Default::default()
        };
        let controlled = progress(DistributiveSubtype::Septic, &v, 1.0, &covered);
        assert_eq!(controlled.spo2, 0.0);

        let uncovered = progress(DistributiveSubtype::Septic, &v, 1.0, &InterventionFlags::default());
        assert!((uncovered.spo2 + 0.005).abs() < 1e-12);

        v.set_pressures_from_map(55.0, 30.0);
        let hypotensive = progress(DistributiveSubtype::Septic, &v, 1.0, &InterventionFlags::default());
        assert!((hypotensive.spo2 + 0.01).abs() < 1e-12);
        let hypotensive_covered = progress(DistributiveSubtype::Septic, &v, 1.0, &covered);
        assert!(hypotensive_covered.spo2 < 0.0 && hypotensive_covered.spo2 > hypotensive.spo2);
    }

    #[test]
    fn test_anaphylaxis_hypoxemia_reversed_by_epinephrine() {
        let v = baseline_profile(DistributiveSubtype::Anaphylactic).vitals;
        let untreated = progress(DistributiveSubtype::Anaphylactic, &v, 1.0, &InterventionFlags::default());
        let flags = InterventionFlags {
            epinephrine_active: true,
            ..Default::default()
        };
        let treated = progress(DistributiveSubtype::Anaphylactic, &v, 1.0, &flags);
        assert!(untreated.spo2 < 0.0);
        assert!(treated.spo2 > 0.0);
    }

    #[test]
    fn test_resolution_requires_normal_svr() {
        let mut v = VitalSigns::normal();
        let labs = LabValues::normal();
        assert!(is_resolved(&v, &labs));
        v.svr = 600.0;
        assert!(!is_resolved(&v, &labs));
    }
}
