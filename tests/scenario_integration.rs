//! Case-level integration tests
//!
//! These tests play whole cases through the public API: untreated courses,
//! vasopressor and fluid responses, definitive relief of an obstruction and
//! the terminal-state rules.

use shock_sim::core::config::{OutcomeThresholds, SimulationConfig};
use shock_sim::outcome::{evaluate_outcome, CriticalStateTracker, DeathRule, OutcomeResult, SessionMetrics};
use shock_sim::outcome::{death_rules, DEATH_CAUSE_PREFIX};
use shock_sim::patient::{Patient, PatientData};
use shock_sim::physiology::{LabValues, VitalSigns};
use shock_sim::shock::{classify_fluid_tolerance, FluidTolerance, ObstructiveEtiology, ShockType};
use shock_sim::simulation::{advance, run_for, SimulationEvent, SimulationState};
use shock_sim::treatment::{
    DefinitiveIntervention, FluidType, InterventionKind, InterventionRequest, Procedure, Vasopressor,
};

fn start(data: PatientData) -> (Patient, SimulationState) {
    let config = SimulationConfig::default();
    let patient = Patient::new(data, &config).unwrap();
    let state = SimulationState::new(&patient, config);
    (patient, state)
}

fn crashing_vitals() -> VitalSigns {
    let mut v = VitalSigns::normal();
    v.set_pressures_from_map(35.0, 20.0);
    v
}

/// Untreated hemorrhage is fatal, and the cause names refractory shock
#[test]
fn test_untreated_hypovolemic_patient_dies() {
    let (patient, state) = start(PatientData::new(ShockType::Hypovolemic).with_seed(42));
    let end = run_for(&state, &patient, 600.0);

    match &end.outcome {
        OutcomeResult::Died { cause, at, .. } => {
            assert!(cause.starts_with(DEATH_CAUSE_PREFIX), "cause was {}", cause);
            assert!(*at <= 600.0);
        }
        other => panic!("expected death, got {:?}", other),
    }
    // The clock stops at death
    assert!(end.minutes() <= 600.0);
    let frozen = advance(&end, &patient, 1.0);
    assert_eq!(frozen.minutes(), end.minutes());
}

/// Hypovolemic patient past compensation: class IV, reflex exhausted
fn crashing_hemorrhage(outcome: OutcomeThresholds) -> (Patient, SimulationState) {
    let config = SimulationConfig {
        outcome,
        ..Default::default()
    };
    let patient = Patient::new(PatientData::new(ShockType::Hypovolemic).with_seed(42), &config).unwrap();
    let mut state = SimulationState::new(&patient, config);
    state.vitals.heart_rate = 175.0;
    state.vitals.cvp = 1.0;
    state.vitals.cardiac_output = 1.5;
    state.vitals.svr = 1300.0;
    state.vitals.set_pressures_from_map(35.0, 15.0);
    (patient, state)
}

/// Thirty contiguous minutes with MAP below 40 is always fatal
#[test]
fn test_thirty_contiguous_minutes_of_map_below_40_kills() {
    // Disable the short-window rule so only the contiguous rule can fire
    let thresholds = OutcomeThresholds {
        consecutive_ticks: 1000,
        ..Default::default()
    };
    let (patient, mut state) = crashing_hemorrhage(thresholds.clone());

    for minute in 1..=30 {
        state = advance(&state, &patient, 1.0);
        assert!(state.vitals.map < 40.0, "MAP {} at minute {}", state.vitals.map, minute);
        if minute < 30 {
            assert_eq!(state.outcome, OutcomeResult::Ongoing, "died early at minute {}", minute);
        }
    }

    assert_eq!(death_rules(&state.tracker, &thresholds), vec![DeathRule::Contiguous]);
    match &state.outcome {
        OutcomeResult::Died { cause, contributing_factors, at, .. } => {
            assert!(cause.starts_with(DEATH_CAUSE_PREFIX));
            assert!(cause.contains("PAM"));
            assert_eq!(contributing_factors, &vec![DeathRule::Contiguous.description(&thresholds)]);
            assert_eq!(*at, 30.0);
        }
        other => panic!("expected death, got {:?}", other),
    }
}

/// With the default thresholds the short-window rule ends the same course first
#[test]
fn test_short_window_kills_before_contiguous_rule() {
    let (patient, mut state) = crashing_hemorrhage(OutcomeThresholds::default());
    for _ in 0..15 {
        state = advance(&state, &patient, 1.0);
        assert!(state.vitals.map < 40.0);
    }

    match &state.outcome {
        OutcomeResult::Died { cause, at, .. } => {
            assert!(cause.starts_with(DEATH_CAUSE_PREFIX));
            assert_eq!(*at, 15.0);
        }
        other => panic!("expected death, got {:?}", other),
    }
    assert!(state
        .events
        .iter()
        .any(|e| matches!(e, SimulationEvent::OutcomeReached { .. })));
}

/// A single compatible tick resets the contiguous clock but not the total
#[test]
fn test_recovery_resets_contiguous_time_only() {
    let labs = LabValues::normal();
    let mut tracker = CriticalStateTracker::new();
    for _ in 0..20 {
        tracker.update(&crashing_vitals(), &labs, 1.0);
    }
    tracker.update(&VitalSigns::normal(), &labs, 1.0);

    assert_eq!(tracker.incompatible_vitals_count, 0);
    assert_eq!(tracker.time_since_last_recovery, 0.0);
    assert_eq!(tracker.incompatible_vitals_duration, 20.0);
}

/// Death is checked before survival on the same tick
#[test]
fn test_death_takes_precedence_over_survival() {
    let v = crashing_vitals();
    let labs = LabValues::normal();
    let metrics = SessionMetrics::new(&v, &labs);
    let thresholds = OutcomeThresholds::default();
    let mut tracker = CriticalStateTracker::new();
    for _ in 0..60 {
        tracker.update(&v, &labs, 1.0);
    }

    let outcome = evaluate_outcome(&OutcomeResult::Ongoing, &tracker, 120.0, &thresholds, 60.0, &metrics);
    assert!(matches!(outcome, OutcomeResult::Died { .. }));

    // Once terminal, nothing changes it
    let again = evaluate_outcome(&outcome, &CriticalStateTracker::new(), 120.0, &thresholds, 61.0, &metrics);
    assert_eq!(again, outcome);
}

/// Norepinephrine raises resistance in vasoplegia without passing the ceiling
#[test]
fn test_septic_norepinephrine_raises_svr_within_ceiling() {
    let mut data = PatientData::new(ShockType::Distributive(Default::default())).with_seed(8);
    data.rvs = Some(480.0);
    let (patient, untreated) = start(data);
    let initial_svr = untreated.vitals.svr;
    assert!(initial_svr < 900.0);

    let mut treated = untreated.clone();
    treated
        .start_intervention(
            InterventionRequest::new(InterventionKind::Vasopressor(Vasopressor::Norepinephrine)).with_dose(0.2),
        )
        .unwrap();

    let mut control = untreated;
    for _ in 0..60 {
        treated = advance(&treated, &patient, 1.0);
        control = advance(&control, &patient, 1.0);
        assert!(treated.vitals.svr <= 2200.0, "svr {} above ceiling", treated.vitals.svr);
    }

    assert!(treated.vitals.svr > initial_svr);
    assert!(treated.vitals.svr > control.vitals.svr);
    assert!(treated.metrics.vasopressor_minutes > 0.0);
}

/// Volume into a congested ventricle worsens oxygenation
#[test]
fn test_cardiogenic_fluid_with_high_cvp_worsens_spo2() {
    let mut data = PatientData::new(ShockType::Cardiogenic).with_seed(5);
    data.pvc = Some(16.0);
    let (patient, state) = start(data);
    assert_eq!(state.vitals.cvp, 16.0);
    assert!(classify_fluid_tolerance(&state.vitals) >= FluidTolerance::HighRisk);

    let mut treated = state.clone();
    treated
        .start_intervention(InterventionRequest::new(InterventionKind::Fluid(FluidType::Crystalloid)).with_volume(1000.0))
        .unwrap();
    let mut control = state;
    for _ in 0..30 {
        treated = advance(&treated, &patient, 1.0);
        control = advance(&control, &patient, 1.0);
    }

    assert!((treated.fluid_balance.total_input - 1000.0).abs() < 1e-6);
    assert!(treated.vitals.spo2 < control.vitals.spo2);
    assert!(treated.vitals.cvp > control.vitals.cvp);
}

/// Pericardiocentesis relieves a tamponade on the tick it is performed
#[test]
fn test_pericardiocentesis_relieves_tamponade() {
    let (mut patient, mut state) =
        start(PatientData::new(ShockType::Obstructive(ObstructiveEtiology::Tamponade)).with_seed(13));
    // Every roll clears a zero complication probability
    patient.modifiers.complication_risk = 0.0;
    let co_before = state.vitals.cardiac_output;
    let cvp_before = state.vitals.cvp;
    state
        .start_intervention(InterventionRequest::new(InterventionKind::Procedure(Procedure::Definitive(
            DefinitiveIntervention::Pericardiocentesis,
        ))))
        .unwrap();

    let next = advance(&state, &patient, 1.0);
    assert!(next.subtype.as_ref().and_then(|s| s.relief()).is_some());
    assert!(next
        .events
        .iter()
        .any(|e| matches!(e, SimulationEvent::ObstructionRelieved { .. })));
    assert!(!next
        .events
        .iter()
        .any(|e| matches!(e, SimulationEvent::ProcedureComplication { .. })));
    assert!(next.vitals.cardiac_output > 2.0 * co_before);
    assert!(cvp_before - next.vitals.cvp >= 10.0);
}

/// A procedure aimed at a different obstruction does nothing
#[test]
fn test_chest_tube_does_not_relieve_tamponade() {
    let (patient, mut state) = start(PatientData::new(ShockType::Obstructive(ObstructiveEtiology::Tamponade)).with_seed(13));
    state
        .start_intervention(InterventionRequest::new(InterventionKind::Procedure(Procedure::Definitive(
            DefinitiveIntervention::ChestTube,
        ))))
        .unwrap();

    let next = advance(&state, &patient, 1.0);
    assert!(next.subtype.as_ref().and_then(|s| s.relief()).is_none());
    assert!(!next
        .events
        .iter()
        .any(|e| matches!(e, SimulationEvent::ObstructionRelieved { .. })));
}

/// Same seed, same orders, same course
#[test]
fn test_replay_is_deterministic() {
    let data = PatientData::new(ShockType::Mixed).with_seed(99);
    let (patient, mut state) = start(data);
    state
        .start_intervention(InterventionRequest::new(InterventionKind::Fluid(FluidType::Crystalloid)))
        .unwrap();

    let a = run_for(&state, &patient, 45.0);
    let b = run_for(&state, &patient, 45.0);
    assert_eq!(a.vitals, b.vitals);
    assert_eq!(a.labs, b.labs);
    assert_eq!(a.outcome, b.outcome);
}
