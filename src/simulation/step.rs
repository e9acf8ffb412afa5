//! Step orchestrator - one tick of the patient
//!
//! Stages, in order:
//! interventions -> progression -> treatment -> ventilation -> baroreflex ->
//! derived hemodynamics -> fluid balance -> labs -> stability
//!
//! `step` never mutates its input; it returns the next state value. All
//! randomness comes from the RNG stored in the state, so a replay with the
//! same seed and the same Δt sequence is identical.

use rand::Rng;
use tracing::{debug, info, warn};

use crate::core::types::Minutes;
use crate::patient::Patient;
use crate::physiology::ranges::{safe_div, HARD_CARDIAC_OUTPUT};
use crate::physiology::{FluidOutput, HemodynamicState, VitalSigns, VitalsDelta};
use crate::shock::{
    atls_class, classify_mixed, relieve_obstruction, AtlsClass, ReliefOutcome, ShockType, SubtypeState,
};
use crate::simulation::events::SimulationEvent;
use crate::simulation::labs::{update_labs, LabInputs};
use crate::simulation::state::SimulationState;
use crate::treatment::{
    compose_treatment_effects, intervention_flags, ventilation_coupling, InterventionKind, Procedure, StatusChange,
};

/// Largest heart rate change the reflex can make per minute (bpm)
const REFLEX_MAX_HR_STEP: f64 = 3.0;
/// Largest SVR change the reflex can make per minute (dyn·s/cm⁵)
const REFLEX_MAX_SVR_STEP: f64 = 40.0;
/// The reflex stops adding tachycardia here
const REFLEX_HR_CEILING: f64 = 150.0;
/// The reflex stops adding vasoconstriction here
const REFLEX_SVR_CEILING: f64 = 2000.0;
/// MAP error (mmHg) that saturates the reflex
const REFLEX_SATURATION: f64 = 25.0;

/// Insensible losses (mL/kg/h)
const INSENSIBLE_ML_KG_H: f64 = 0.5;
/// Urine output with full renal perfusion (mL/kg/h)
const FULL_URINE_ML_KG_H: f64 = 1.0;

/// Exponent on the modeled stroke-volume ratio when contractility changes.
/// Below 1 because the per-class responses already move CO directly.
const CONTRACTILITY_COUPLING: f64 = 0.5;

/// Advance the patient by `dt` simulated minutes.
///
/// # Panics
/// If `dt` is negative or not finite.
pub fn step(state: &SimulationState, patient: &Patient, dt: Minutes) -> SimulationState {
    assert!(dt.is_finite() && dt >= 0.0, "step length must be finite and non-negative, got {dt}");

    let mut next = state.clone();
    next.events.clear();
    if dt == 0.0 {
        return next;
    }

    let now = state.minutes();
    let shock = patient.shock_type;

    // 1. Interventions
    resolve_interventions(&mut next, now, dt);
    apply_definitive_relief(&mut next, patient, now);
    let cumulative_fluids = next.fluid_balance.input.total();
    let flags = intervention_flags(&next.interventions, now, cumulative_fluids);

    // 2. Progression
    let deterioration = patient.data.difficulty.deterioration_multiplier()
        * patient.modifiers.deterioration_rate
        * patient.profile.degradation_rate;
    let progression = shock.progress(&next.vitals, dt, &flags, next.subtype.as_ref()) * deterioration;
    apply_delta(&mut next, &progression);

    // 3. Treatment
    let effect = compose_treatment_effects(
        &next.vitals,
        &next.hemodynamics,
        &next.interventions,
        patient,
        cumulative_fluids,
        now,
        dt,
    );
    apply_delta(&mut next, &effect.delta);

    // 4. Ventilation
    let oxygen_multiplier = patient.profile.responsiveness.oxygen * patient.modifiers.oxygen;
    let coupling = ventilation_coupling(
        &next.vitals,
        &next.ventilator,
        shock,
        flags.intubated,
        next.ventilation_offset,
        oxygen_multiplier,
        dt,
    );
    apply_delta(&mut next, &coupling.delta);
    next.ventilation_offset = coupling.applied_offset;

    // 5. Baroreflex
    if reflex_intact(shock, &next.vitals) {
        let reflex = baroreflex(
            &next.vitals,
            next.config.baroreflex_target_map,
            patient.profile.compensation_capacity,
            shock.baroreflex_gains(),
            dt,
        );
        apply_delta(&mut next, &reflex);
    }

    // 6. Derived hemodynamics
    let blend = next.config.map_blend_weight;
    recompute_derived(&mut next.vitals, &mut next.hemodynamics, blend);
    update_subtype(&mut next, now + dt);

    // 7. Fluid balance
    let urine = urine_output(
        &next.vitals,
        next.config.weight_kg,
        next.config.body_surface_area,
        effect.urine_multiplier,
        dt,
    );
    let output = FluidOutput {
        urine,
        insensible: INSENSIBLE_ML_KG_H * next.config.weight_kg / 60.0 * dt,
        blood_loss: shock.blood_loss(dt, &flags, next.subtype.as_ref()),
    };
    next.fluid_balance.record(&effect.infused, &output, dt);

    // 8. Labs
    let extra_lactate = match &next.subtype {
        // Each overlapping mechanism adds its own lactate burden
        Some(SubtypeState::Mixed { components }) => 0.01 * components.len() as f64,
        _ => 0.0,
    };
    let inputs = LabInputs {
        vitals: &next.vitals,
        baseline: &patient.profile.labs,
        infused: &effect.infused,
        blood_loss_ml: output.blood_loss,
        bicarbonate: effect.hco3,
        extra_lactate,
        ventilator: flags.intubated.then_some(&next.ventilator),
        body_surface_area: next.config.body_surface_area,
        now: now + dt,
        dt,
    };
    next.labs = update_labs(&next.labs, &inputs);

    // 9. Stability
    if shock.is_resolved(&next.vitals, &next.labs, next.subtype.as_ref()) {
        next.is_stable = true;
        next.stability_duration += dt;
    } else {
        next.is_stable = false;
        next.stability_duration = 0.0;
    }

    next.metrics.record(&next.vitals, &next.labs, &flags, effect.infused.total(), dt);
    next.clock.advance(dt);
    next.refresh_display(patient);

    debug!(
        t = next.minutes(),
        map = next.vitals.map,
        hr = next.vitals.heart_rate,
        co = next.vitals.cardiac_output,
        svr = next.vitals.svr,
        lactate = next.labs.gasometry.lactate,
        "tick"
    );
    next
}

/// Apply a delta to the vitals and its contractility part to the
/// hemodynamics. A contractility change scales CO by the change it makes
/// to the modeled stroke volume.
fn apply_delta(state: &mut SimulationState, delta: &VitalsDelta) {
    let delta = delta.clamped_for(&state.vitals);
    let pump_before = state.hemodynamics.modeled_stroke_volume();
    state.vitals = state.vitals.apply(&delta);
    state.hemodynamics.contractility += delta.contractility;
    state.hemodynamics.clamp();

    if delta.contractility != 0.0 {
        let ratio = safe_div(state.hemodynamics.modeled_stroke_volume(), pump_before, 1.0);
        let co = state.vitals.cardiac_output * ratio.powf(CONTRACTILITY_COUPLING);
        state.vitals.cardiac_output = HARD_CARDIAC_OUTPUT.clamp(co);
    }
}

fn resolve_interventions(state: &mut SimulationState, now: Minutes, dt: Minutes) {
    for intervention in state.interventions.iter_mut() {
        match intervention.resolve(now, dt) {
            Some(StatusChange::Started) => {
                let at = intervention.start_time.max(now);
                info!(id = intervention.id.0, name = %intervention.name, at, "intervention started");
                state.events.push(SimulationEvent::InterventionStarted {
                    id: intervention.id,
                    name: intervention.name.clone(),
                    at,
                });
            }
            Some(StatusChange::Expired) => {
                let at = intervention.completed_at.unwrap_or(now);
                info!(id = intervention.id.0, name = %intervention.name, at, "intervention completed");
                state.events.push(SimulationEvent::InterventionCompleted {
                    id: intervention.id,
                    name: intervention.name.clone(),
                    at,
                });
            }
            None => {}
        }
    }
}

/// Attempt relief with each running definitive procedure until one works.
/// Only the first successful procedure counts.
fn apply_definitive_relief(state: &mut SimulationState, patient: &Patient, now: Minutes) {
    let ShockType::Obstructive(etiology) = patient.shock_type else {
        return;
    };
    if !matches!(state.subtype, Some(SubtypeState::Obstructive { relief: None })) {
        return;
    }

    let procedures: Vec<_> = state
        .running_interventions()
        .filter_map(|i| match i.kind {
            InterventionKind::Procedure(Procedure::Definitive(d)) => Some((d, i.name.clone())),
            _ => None,
        })
        .collect();

    for (procedure, name) in procedures {
        let roll: f64 = state.rng_mut().gen();
        let outcome = relieve_obstruction(
            &state.vitals,
            etiology,
            procedure,
            now,
            roll,
            patient.modifiers.complication_risk,
        );
        let ReliefOutcome::Relieved { relief, delta } = outcome else {
            debug!(procedure = %name, "procedure does not address this obstruction");
            continue;
        };

        state.vitals = state.vitals.apply(&delta);
        state.subtype = Some(SubtypeState::Obstructive { relief: Some(relief) });
        info!(procedure = %name, at = now, co = state.vitals.cardiac_output, "obstruction relieved");
        state.events.push(SimulationEvent::ObstructionRelieved {
            procedure: name.clone(),
            at: now,
        });
        if let Some(complication) = relief.complication {
            warn!(procedure = %name, complication = ?complication.kind, "procedural complication");
            state.events.push(SimulationEvent::ProcedureComplication {
                procedure: name,
                description: complication.kind.description().to_string(),
                at: now,
            });
        }
        return;
    }
}

/// Class IV hemorrhage has exhausted the reflex
fn reflex_intact(shock: ShockType, vitals: &VitalSigns) -> bool {
    !(shock == ShockType::Hypovolemic && atls_class(vitals) == AtlsClass::IV)
}

/// Rate-limited heart rate and SVR drift toward the target MAP
pub fn baroreflex(vitals: &VitalSigns, target_map: f64, capacity: f64, gains: (f64, f64), dt: Minutes) -> VitalsDelta {
    let (hr_gain, svr_gain) = gains;
    let drive = ((target_map - vitals.map) / REFLEX_SATURATION).clamp(-1.0, 1.0) * capacity.clamp(0.0, 1.0);

    let hr_limit = REFLEX_MAX_HR_STEP * dt;
    let mut heart_rate = (drive * hr_gain * hr_limit).clamp(-hr_limit, hr_limit);
    if heart_rate > 0.0 {
        heart_rate = heart_rate.min((REFLEX_HR_CEILING - vitals.heart_rate).max(0.0));
    }
    let svr_limit = REFLEX_MAX_SVR_STEP * dt;
    let mut svr = (drive * svr_gain * svr_limit).clamp(-svr_limit, svr_limit);
    if svr > 0.0 {
        svr = svr.min((REFLEX_SVR_CEILING - vitals.svr).max(0.0));
    }

    VitalsDelta {
        heart_rate,
        svr,
        ..Default::default()
    }
}

/// MAP is a weighted blend of the pressure-derived value and the
/// flow-derived one (CO×SVR/80 + CVP). Systolic and diastolic are then
/// rebuilt around it with a pulse pressure that follows stroke volume.
pub fn recompute_derived(vitals: &mut VitalSigns, hemodynamics: &mut HemodynamicState, blend_weight: f64) {
    let pressure_map = vitals.map;
    let flow_map = vitals.flow_derived_map();
    let map = blend_weight * pressure_map + (1.0 - blend_weight) * flow_map;

    *hemodynamics = HemodynamicState::from_vitals(vitals, hemodynamics.contractility);
    let pulse_pressure = (hemodynamics.stroke_volume * 0.55).clamp(10.0, 90.0);
    vitals.set_pressures_from_map(map, pulse_pressure);
}

/// Renal output gated by perfusion pressure and cardiac index (mL)
pub fn urine_output(vitals: &VitalSigns, weight_kg: f64, body_surface_area: f64, multiplier: f64, dt: Minutes) -> f64 {
    let pressure = ((vitals.map - 50.0) / 25.0).clamp(0.0, 1.0);
    let flow = (vitals.cardiac_index(body_surface_area) / 2.5).clamp(0.0, 1.0);
    FULL_URINE_ML_KG_H * weight_kg / 60.0 * pressure * flow * multiplier * dt
}

/// Refresh archetype state that depends on the current vitals
fn update_subtype(state: &mut SimulationState, at: Minutes) {
    match state.subtype.as_mut() {
        Some(SubtypeState::Hypovolemic { atls, .. }) => {
            let class = atls_class(&state.vitals);
            if class != *atls {
                debug!(from = ?atls, to = ?class, "ATLS class changed");
                state.events.push(SimulationEvent::AtlsClassChanged { from: *atls, to: class, at });
                *atls = class;
            }
        }
        Some(SubtypeState::Mixed { components }) => {
            let current = classify_mixed(&state.vitals);
            if current != *components {
                debug!(components = ?current, "mixed shock pattern changed");
                state.events.push(SimulationEvent::MixedPatternChanged {
                    components: current.clone(),
                    at,
                });
                *components = current;
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::shock::{DistributiveSubtype, ObstructiveEtiology};
    use crate::treatment::{DefinitiveIntervention, InterventionRequest};

    fn case(shock: ShockType, seed: u64) -> (Patient, SimulationState) {
        let config = SimulationConfig::default();
        let patient = Patient::from_shock_type(shock, seed, &config).unwrap();
        let state = SimulationState::new(&patient, config);
        (patient, state)
    }

    #[test]
    fn test_step_leaves_input_untouched_and_replays() {
        let (patient, state) = case(ShockType::Distributive(DistributiveSubtype::Septic), 4);
        let before = state.vitals.clone();
        let a = step(&state, &patient, 1.0);
        let b = step(&state, &patient, 1.0);
        assert_eq!(state.vitals, before);
        assert_eq!(a.vitals, b.vitals);
        assert_eq!(a.labs, b.labs);
    }

    #[test]
    fn test_zero_step_is_identity() {
        let (patient, state) = case(ShockType::Cardiogenic, 4);
        let next = step(&state, &patient, 0.0);
        assert_eq!(next.vitals, state.vitals);
        assert_eq!(next.minutes(), 0.0);
    }

    #[test]
    #[should_panic]
    fn test_negative_step_panics() {
        let (patient, state) = case(ShockType::Cardiogenic, 4);
        step(&state, &patient, -1.0);
    }

    #[test]
    fn test_baroreflex_rate_limited_and_directional() {
        let mut v = VitalSigns::normal();
        v.set_pressures_from_map(40.0, 30.0);
        let d = baroreflex(&v, 75.0, 1.0, (1.0, 1.0), 1.0);
        assert!(d.heart_rate > 0.0 && d.heart_rate <= REFLEX_MAX_HR_STEP);
        assert!(d.svr > 0.0 && d.svr <= REFLEX_MAX_SVR_STEP);

        v.set_pressures_from_map(110.0, 40.0);
        let d = baroreflex(&v, 75.0, 1.0, (1.0, 1.0), 1.0);
        assert!(d.heart_rate < 0.0 && d.svr < 0.0);

        let none = baroreflex(&v, 75.0, 0.0, (1.0, 1.0), 1.0);
        assert!(none.is_zero() || (none.heart_rate == 0.0 && none.svr == 0.0));
    }

    #[test]
    fn test_derived_map_blends_estimates() {
        let mut v = VitalSigns::normal();
        let pressure_map = v.map;
        let flow_map = v.flow_derived_map();
        let mut hemo = HemodynamicState::from_vitals(&v, 50.0);
        recompute_derived(&mut v, &mut hemo, 0.5);
        assert!((v.map - (pressure_map + flow_map) / 2.0).abs() < 1e-6);
        assert!((v.map - VitalSigns::compute_map(v.systolic, v.diastolic)).abs() < 1e-9);
    }

    #[test]
    fn test_urine_gated_by_perfusion() {
        let v = VitalSigns::normal();
        let full = urine_output(&v, 70.0, 1.8, 1.0, 60.0);
        assert!((full - 70.0).abs() < 1e-9);
        let mut shocked = v.clone();
        shocked.set_pressures_from_map(45.0, 20.0);
        assert_eq!(urine_output(&shocked, 70.0, 1.8, 1.0, 60.0), 0.0);
    }

    #[test]
    fn test_hemorrhage_recorded_in_balance() {
        let (patient, state) = case(ShockType::Hypovolemic, 4);
        let next = step(&state, &patient, 1.0);
        assert!(next.fluid_balance.output.blood_loss > 0.0);
        assert!(next.fluid_balance.net_balance < 0.0);
    }

    #[test]
    fn test_pericardiocentesis_relieves_tamponade() {
        let (mut patient, mut state) = case(ShockType::Obstructive(ObstructiveEtiology::Tamponade), 4);
        // No roll can complicate the procedure
        patient.modifiers.complication_risk = 0.0;
        let before = state.vitals.clone();
        state
            .start_intervention(InterventionRequest::new(InterventionKind::Procedure(Procedure::Definitive(
                DefinitiveIntervention::Pericardiocentesis,
            ))))
            .unwrap();
        let next = step(&state, &patient, 1.0);

        assert!(next.subtype.as_ref().and_then(SubtypeState::relief).is_some());
        assert!(!next
            .events
            .iter()
            .any(|e| matches!(e, SimulationEvent::ProcedureComplication { .. })));
        assert!(next.vitals.cardiac_output > 2.0 * before.cardiac_output);
        assert!(before.cvp - next.vitals.cvp >= 10.0);
    }

    #[test]
    fn test_wrong_procedure_does_not_relieve() {
        let (patient, mut state) = case(ShockType::Obstructive(ObstructiveEtiology::Tamponade), 4);
        state
            .start_intervention(InterventionRequest::new(InterventionKind::Procedure(Procedure::Definitive(
                DefinitiveIntervention::ChestTube,
            ))))
            .unwrap();
        let next = step(&state, &patient, 1.0);
        assert!(next.subtype.as_ref().and_then(SubtypeState::relief).is_none());
    }

    #[test]
    fn test_intubation_costs_output_in_tamponade() {
        let (patient, state) = case(ShockType::Obstructive(ObstructiveEtiology::Tamponade), 4);
        let mut intubated = state.clone();
        intubated
            .start_intervention(InterventionRequest::new(InterventionKind::Procedure(Procedure::Intubation)))
            .unwrap();
        let plain = step(&state, &patient, 1.0);
        let vented = step(&intubated, &patient, 1.0);
        assert!(vented.vitals.cardiac_output < plain.vitals.cardiac_output);
        assert!(vented.ventilation_offset < 0.0);
    }

    #[test]
    fn test_contractility_loss_lowers_output() {
        let (_, mut state) = case(ShockType::Cardiogenic, 4);
        state.hemodynamics.contractility = 50.0;
        let co = state.vitals.cardiac_output;
        let pump = state.hemodynamics.modeled_stroke_volume();

        let delta = VitalsDelta {
            contractility: -10.0,
            ..Default::default()
        };
        apply_delta(&mut state, &delta);

        assert_eq!(state.hemodynamics.contractility, 40.0);
        let ratio = state.hemodynamics.modeled_stroke_volume() / pump;
        assert!((ratio - 0.8).abs() < 1e-9);
        assert!((state.vitals.cardiac_output - co * ratio.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_weaker_heart_declines_faster() {
        let (patient, base) = case(ShockType::Cardiogenic, 4);
        let mut weak = base.clone();
        weak.hemodynamics.contractility = 20.0;
        let mut strong = base;
        strong.hemodynamics.contractility = 60.0;

        for _ in 0..10 {
            weak = step(&weak, &patient, 1.0);
            strong = step(&strong, &patient, 1.0);
        }
        assert!(weak.hemodynamics.contractility < 20.0);
        assert!(weak.vitals.cardiac_output < strong.vitals.cardiac_output);
    }
}
