//! Treatment effect composer
//!
//! Running interventions are applied one after another on a working copy
//! of the vitals, so each sees what the previous ones already did. The
//! result is the summed delta plus the side channels (volumes infused,
//! bicarbonate, renal output) that later stages need.

use tracing::trace;

use crate::core::types::Minutes;
use crate::patient::Patient;
use crate::physiology::{FluidInfusion, HemodynamicState, VitalSigns, VitalsDelta};
use crate::shock::ResponseContext;
use crate::treatment::catalog::{FluidType, InterventionKind, Medication};
use crate::treatment::intervention::ActiveIntervention;
use crate::treatment::medication::medication_effect;

#[derive(Debug, Clone, PartialEq)]
pub struct TreatmentEffect {
    pub delta: VitalsDelta,
    pub infused: FluidInfusion,
    /// Plasma bicarbonate added this tick (mEq/L)
    pub hco3: f64,
    pub urine_multiplier: f64,
}

impl Default for TreatmentEffect {
    fn default() -> Self {
        Self {
            delta: VitalsDelta::zero(),
            infused: FluidInfusion::default(),
            hco3: 0.0,
            urine_multiplier: 1.0,
        }
    }
}

/// Merge every running intervention over `[now, now + dt]` into one effect
pub fn compose_treatment_effects(
    vitals: &VitalSigns,
    hemodynamics: &HemodynamicState,
    interventions: &[ActiveIntervention],
    patient: &Patient,
    cumulative_fluids_ml: f64,
    now: Minutes,
    dt: Minutes,
) -> TreatmentEffect {
    let shock = patient.shock_type;
    let responsiveness = patient.profile.responsiveness;
    let modifiers = patient.modifiers;

    let mut working = vitals.clone();
    let mut working_hemo = hemodynamics.clone();
    let mut effect = TreatmentEffect::default();
    let mut cumulative = cumulative_fluids_ml;

    for intervention in interventions.iter().filter(|i| i.is_running()) {
        let dose = intervention.dose.unwrap_or(0.0);
        let class_multiplier = modifiers.for_class(intervention.kind.class());
        // Time inside the tick the agent actually acts; fluids are
        // pro-rated through the delivered volume instead
        let acting = dt * intervention.active_fraction(now, dt);

        let delta = match intervention.kind {
            InterventionKind::Fluid(fluid) => {
                let volume = intervention.volume_between(now, dt);
                if volume <= 0.0 {
                    continue;
                }
                let ctx = ResponseContext {
                    multiplier: responsiveness.fluid * class_multiplier,
                    cumulative_fluids_ml: cumulative,
                    dt,
                };
                cumulative += volume;
                match fluid {
                    FluidType::Crystalloid => effect.infused.crystalloid += volume,
                    FluidType::Colloid => effect.infused.colloid += volume,
                    FluidType::Blood => effect.infused.blood += volume,
                }
                shock.fluid_response(&working, fluid, volume, &ctx)
            }
            InterventionKind::Vasopressor(agent) => {
                let ctx = ResponseContext {
                    multiplier: responsiveness.vasopressor * class_multiplier,
                    cumulative_fluids_ml: cumulative,
                    dt: acting,
                };
                shock.vasopressor_response(&working, agent, dose, &ctx)
            }
            InterventionKind::Inotrope(agent) => {
                let ctx = ResponseContext {
                    multiplier: responsiveness.inotrope * class_multiplier,
                    cumulative_fluids_ml: cumulative,
                    dt: acting,
                };
                shock.inotrope_response(&working, &working_hemo, agent, dose, &ctx)
            }
            InterventionKind::Medication(medication) => {
                let oxygen = if medication == Medication::Oxygen {
                    responsiveness.oxygen * modifiers.oxygen
                } else {
                    1.0
                };
                let med = medication_effect(medication, dose, intervention.duration, &working, shock, oxygen, acting);
                effect.hco3 += med.hco3;
                effect.urine_multiplier *= med.urine_multiplier;
                med.delta.clamped_for(&working)
            }
            // Procedures act through the flags, the ventilation stage and
            // the relief of obstruction
            InterventionKind::Procedure(_) => continue,
        };

        trace!(intervention = %intervention.name, co = delta.cardiac_output, svr = delta.svr, "treatment delta");
        working = working.apply(&delta);
        working_hemo.contractility += delta.contractility;
        working_hemo.clamp();
        effect.delta += delta;
    }

    effect
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::types::InterventionId;
    use crate::shock::{DistributiveSubtype, ShockType};
    use crate::treatment::catalog::Vasopressor;
    use crate::treatment::intervention::InterventionRequest;

    fn septic() -> Patient {
        Patient::from_shock_type(
            ShockType::Distributive(DistributiveSubtype::Septic),
            5,
            &SimulationConfig::default(),
        )
        .unwrap()
    }

    fn order(id: u32, request: InterventionRequest) -> ActiveIntervention {
        ActiveIntervention::from_request(InterventionId::new(id), &request, 0.0)
    }

    #[test]
    fn test_no_interventions_no_effect() {
        let p = septic();
        let e = compose_treatment_effects(&p.profile.vitals, &p.profile.hemodynamics, &[], &p, 0.0, 0.0, 1.0);
        assert!(e.delta.is_zero());
        assert_eq!(e.infused.total(), 0.0);
    }

    #[test]
    fn test_pending_orders_skipped() {
        let p = septic();
        let pending = order(
            1,
            InterventionRequest::new(InterventionKind::Vasopressor(Vasopressor::Norepinephrine)).delayed(10.0),
        );
        let e = compose_treatment_effects(&p.profile.vitals, &p.profile.hemodynamics, &[pending], &p, 0.0, 0.0, 1.0);
        assert!(e.delta.is_zero());
    }

    #[test]
    fn test_mid_tick_start_acts_for_part_of_the_tick() {
        let p = septic();
        let request = InterventionRequest::new(InterventionKind::Vasopressor(Vasopressor::Norepinephrine)).with_dose(0.2);
        let full = order(1, request.clone());
        let mut late = order(2, request.delayed(0.5));
        late.resolve(0.0, 1.0);
        assert!(late.is_running());

        let v = &p.profile.vitals;
        let h = &p.profile.hemodynamics;
        let whole = compose_treatment_effects(v, h, &[full], &p, 0.0, 0.0, 1.0);
        let part = compose_treatment_effects(v, h, &[late], &p, 0.0, 0.0, 1.0);
        assert!(part.delta.svr > 0.0);
        assert!(part.delta.svr < whole.delta.svr);
    }

    #[test]
    fn test_fluid_volume_reported() {
        let p = septic();
        let bolus = order(1, InterventionRequest::new(InterventionKind::Fluid(FluidType::Crystalloid)));
        let e = compose_treatment_effects(&p.profile.vitals, &p.profile.hemodynamics, &[bolus], &p, 0.0, 0.0, 1.0);
        assert!((e.infused.crystalloid - 500.0 / 15.0).abs() < 1e-9);
        assert!(e.delta.cvp > 0.0);
    }

    #[test]
    fn test_sequential_accumulation_sees_previous_effect() {
        let p = septic();
        let mut v = p.profile.vitals.clone();
        v.svr = 2150.0;
        let nor = |id| {
            order(
                id,
                InterventionRequest::new(InterventionKind::Vasopressor(Vasopressor::Norepinephrine)).with_dose(1.0),
            )
        };
        let e = compose_treatment_effects(&v, &p.profile.hemodynamics, &[nor(1), nor(2)], &p, 0.0, 0.0, 1.0);
        // The second infusion sees the first one's rise and the ceiling
        assert!(v.svr + e.delta.svr <= 2200.0 + 1e-9);
    }
}
