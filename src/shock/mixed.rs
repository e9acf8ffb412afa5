//! Mixed shock
//!
//! No fixed direction of its own. The active components are read off the
//! current vitals each tick using the other archetypes' defining thresholds,
//! and the component models are averaged.

use serde::{Deserialize, Serialize};

use crate::physiology::{LabValues, VitalSigns, VitalsDelta};
use crate::shock::profile::{assemble, blood, chem, gas, labs, ShockProfile, TreatmentResponsiveness};
use crate::shock::{
    cardiogenic, distributive, hypovolemic, obstructive, DistributiveSubtype, InotropeProfile, InterventionFlags,
    ObstructiveEtiology, ResponseContext,
};
use crate::treatment::catalog::{FluidType, Vasopressor};

pub(super) const INOTROPE_PROFILE: InotropeProfile = InotropeProfile {
    co_gain: 0.0025,
    co_ceiling: 6.0,
    contractility_gain: 0.35,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixedComponent {
    Hypovolemic,
    Cardiogenic,
    Distributive,
    Obstructive,
}

/// Components whose defining pattern is present, in fixed order
pub fn classify_mixed(v: &VitalSigns) -> Vec<MixedComponent> {
    let pcwp = v.pcwp.unwrap_or(0.0);
    let pvr = v.pvr.unwrap_or(0.0);
    let mut components = Vec::new();
    if v.cvp < 4.0 && v.svr > 1600.0 {
        components.push(MixedComponent::Hypovolemic);
    }
    if v.cvp > 14.0 && pcwp > 18.0 {
        components.push(MixedComponent::Cardiogenic);
    }
    if v.svr < 800.0 {
        components.push(MixedComponent::Distributive);
    }
    if pvr > 3.0 {
        components.push(MixedComponent::Obstructive);
    }
    components
}

pub(super) fn baseline_profile() -> ShockProfile {
    // Septic shock with myocardial depression
    assemble(
        "Choque misto",
        VitalSigns::new(120.0, 82.0, 46.0, 91.0, 28.0, 38.4, 15.0, 4.2, 760.0)
            .with_pcwp(19.0)
            .with_pvr(2.2),
        35.0,
        labs(gas(7.25, 14.0, 62.0, 5.5), blood(11.0, 17.0, 120.0), chem(4.9, 135.0, 1.9, 72.0)),
        1.2,
        0.35,
        TreatmentResponsiveness {
            fluid: 0.6,
            vasopressor: 0.8,
            inotrope: 0.8,
            oxygen: 0.8,
        },
    )
}

fn mean(deltas: Vec<VitalsDelta>) -> Option<VitalsDelta> {
    if deltas.is_empty() {
        return None;
    }
    let n = deltas.len() as f64;
    let sum = deltas.into_iter().fold(VitalsDelta::zero(), |acc, d| acc + d);
    Some(sum * (1.0 / n))
}

pub(super) fn progress(v: &VitalSigns, dt: f64, flags: &InterventionFlags) -> VitalsDelta {
    let deltas = classify_mixed(v)
        .into_iter()
        .map(|c| match c {
            MixedComponent::Hypovolemic => hypovolemic::progress(v, dt, flags, None),
            MixedComponent::Cardiogenic => cardiogenic::progress(v, dt, flags),
            MixedComponent::Distributive => distributive::progress(DistributiveSubtype::Septic, v, dt, flags),
            MixedComponent::Obstructive => {
                obstructive::progress(ObstructiveEtiology::PulmonaryEmbolism, v, dt, flags, None)
            }
        })
        .collect();

    // No recognisable pattern left: slow non-specific decline
    mean(deltas).unwrap_or_else(|| VitalsDelta {
        cardiac_output: -0.005 * dt,
        heart_rate: VitalsDelta::toward(v.heart_rate, 115.0, 0.02, dt),
        svr: VitalsDelta::toward(v.svr, 900.0, 0.005, dt),
        ..Default::default()
    })
}

pub(super) fn fluid_response(v: &VitalSigns, fluid: FluidType, volume_ml: f64, ctx: &ResponseContext) -> VitalsDelta {
    let deltas = classify_mixed(v)
        .into_iter()
        .map(|c| match c {
            MixedComponent::Hypovolemic => hypovolemic::fluid_response(v, fluid, volume_ml, ctx),
            MixedComponent::Cardiogenic => cardiogenic::fluid_response(v, fluid, volume_ml, ctx),
            MixedComponent::Distributive => {
                distributive::fluid_response(DistributiveSubtype::Septic, v, fluid, volume_ml, ctx)
            }
            MixedComponent::Obstructive => {
                obstructive::fluid_response(ObstructiveEtiology::PulmonaryEmbolism, v, fluid, volume_ml, ctx)
            }
        })
        .collect();
    mean(deltas).unwrap_or_else(|| {
        let litres = volume_ml / 1000.0 * fluid.expansion_factor() * ctx.multiplier;
        VitalsDelta {
            cvp: litres * 3.0,
            cardiac_output: litres * 0.5,
            ..Default::default()
        }
    })
}

pub(super) fn vasopressor_response(v: &VitalSigns, agent: Vasopressor, dose: f64, ctx: &ResponseContext) -> VitalsDelta {
    let deltas = classify_mixed(v)
        .into_iter()
        .map(|c| match c {
            MixedComponent::Hypovolemic => hypovolemic::vasopressor_response(v, agent, dose, ctx),
            MixedComponent::Cardiogenic => cardiogenic::vasopressor_response(v, agent, dose, ctx),
            MixedComponent::Distributive => {
                distributive::vasopressor_response(DistributiveSubtype::Septic, v, agent, dose, ctx)
            }
            MixedComponent::Obstructive => obstructive::vasopressor_response(v, agent, dose, ctx),
        })
        .collect();
    mean(deltas).unwrap_or_else(|| VitalsDelta {
        svr: (agent.svr_gain() * dose * ctx.multiplier * ctx.dt).min((2200.0 - v.svr).max(0.0)),
        ..Default::default()
    })
}

/// MAP ≥ 65, lactate cleared, CO ≥ 4, SpO2 ≥ 92, no shock pattern left
pub(super) fn is_resolved(v: &VitalSigns, labs: &LabValues) -> bool {
    v.map >= 65.0
        && labs.gasometry.lactate < 2.0
        && v.cardiac_output >= 4.0
        && v.spo2 >= 92.0
        && classify_mixed(v).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_thresholds() {
        let hypo = VitalSigns::new(125.0, 85.0, 65.0, 95.0, 24.0, 36.5, 2.0, 3.5, 1900.0);
        assert_eq!(classify_mixed(&hypo), vec![MixedComponent::Hypovolemic]);
        let baseline = baseline_profile().vitals;
        assert_eq!(
            classify_mixed(&baseline),
            vec![MixedComponent::Cardiogenic, MixedComponent::Distributive]
        );
        assert!(classify_mixed(&VitalSigns::normal()).is_empty());
    }

    #[test]
    fn test_progress_averages_components() {
        let v = baseline_profile().vitals;
        let flags = InterventionFlags::default();
        let card = cardiogenic::progress(&v, 1.0, &flags);
        let dist = distributive::progress(DistributiveSubtype::Septic, &v, 1.0, &flags);
        let mixed = progress(&v, 1.0, &flags);
        assert!((mixed.cardiac_output - (card.cardiac_output + dist.cardiac_output) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_resolution_needs_no_residual_pattern() {
        let labs = LabValues::normal();
        assert!(is_resolved(&VitalSigns::normal(), &labs));
        let mut v = VitalSigns::normal();
        v.pvr = Some(4.0);
        assert!(!is_resolved(&v, &labs));
    }
}
