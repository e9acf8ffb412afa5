//! Property tests for state invariants
//!
//! Whatever the archetype, seed or orders, every tick must leave vitals
//! inside their hard bounds, keep hematocrit tied to hemoglobin and never
//! shrink the cumulative critical time.

use proptest::prelude::*;

use shock_sim::core::config::SimulationConfig;
use shock_sim::outcome::CriticalStateTracker;
use shock_sim::patient::Patient;
use shock_sim::physiology::ranges::*;
use shock_sim::physiology::{LabValues, VitalSigns, VitalsDelta};
use shock_sim::shock::ShockType;
use shock_sim::simulation::{advance, SimulationState};
use shock_sim::treatment::{FluidType, InterventionKind, InterventionRequest, Vasopressor};

fn any_shock() -> impl Strategy<Value = ShockType> {
    (0..ShockType::all().len()).prop_map(|i| ShockType::all()[i])
}

fn assert_within_bounds(v: &VitalSigns) {
    assert!(HARD_HEART_RATE.contains(v.heart_rate), "hr {}", v.heart_rate);
    assert!(HARD_SYSTOLIC.contains(v.systolic), "sys {}", v.systolic);
    assert!(HARD_DIASTOLIC.contains(v.diastolic), "dia {}", v.diastolic);
    assert!(HARD_SPO2.contains(v.spo2), "spo2 {}", v.spo2);
    assert!(HARD_CVP.contains(v.cvp), "cvp {}", v.cvp);
    assert!(HARD_CARDIAC_OUTPUT.contains(v.cardiac_output), "co {}", v.cardiac_output);
    assert!(HARD_SVR.contains(v.svr), "svr {}", v.svr);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_ticks_keep_state_in_bounds(
        shock in any_shock(),
        seed in any::<u64>(),
        fluid_ml in 0.0f64..3000.0,
        norepinephrine in 0.0f64..1.0,
    ) {
        let config = SimulationConfig::default();
        let patient = Patient::from_shock_type(shock, seed, &config).unwrap();
        let mut state = SimulationState::new(&patient, config);
        if fluid_ml > 0.0 {
            state
                .start_intervention(InterventionRequest::new(InterventionKind::Fluid(FluidType::Crystalloid)).with_volume(fluid_ml))
                .unwrap();
        }
        if norepinephrine > 0.0 {
            state
                .start_intervention(
                    InterventionRequest::new(InterventionKind::Vasopressor(Vasopressor::Norepinephrine))
                        .with_dose(norepinephrine),
                )
                .unwrap();
        }

        let mut last_duration = 0.0;
        for _ in 0..60 {
            state = advance(&state, &patient, 1.0);
            assert_within_bounds(&state.vitals);
            let h = &state.labs.hematology;
            prop_assert!((h.hematocrit - 3.0 * h.hemoglobin).abs() < 1e-9);
            prop_assert!(state.labs.gasometry.ph.is_finite());
            prop_assert!(state.tracker.incompatible_vitals_duration >= last_duration);
            last_duration = state.tracker.incompatible_vitals_duration;
        }
    }

    #[test]
    fn prop_hypovolemic_presentation_holds_for_any_seed(seed in any::<u64>()) {
        let patient = Patient::from_shock_type(ShockType::Hypovolemic, seed, &SimulationConfig::default()).unwrap();
        prop_assert!(patient.profile.vitals.cvp <= 5.0);
        prop_assert!(patient.profile.vitals.svr >= 1600.0);
    }

    #[test]
    fn prop_clamped_delta_stays_in_bounds(
        hr in -500.0f64..500.0,
        sys in -500.0f64..500.0,
        spo2 in -200.0f64..200.0,
        co in -20.0f64..20.0,
        svr in -5000.0f64..5000.0,
        cvp in -50.0f64..50.0,
    ) {
        let v = VitalSigns::normal();
        let delta = VitalsDelta {
            heart_rate: hr,
            systolic: sys,
            spo2,
            cardiac_output: co,
            svr,
            cvp,
            ..Default::default()
        };
        let next = v.apply(&delta.clamped_for(&v));
        assert_within_bounds(&next);
    }

    #[test]
    fn prop_tracker_duration_is_monotonic(ticks in prop::collection::vec((any::<bool>(), 0.1f64..5.0), 1..80)) {
        let labs = LabValues::normal();
        let mut crashing = VitalSigns::normal();
        crashing.set_pressures_from_map(35.0, 20.0);
        let normal = VitalSigns::normal();

        let mut tracker = CriticalStateTracker::new();
        let mut last = 0.0;
        for (incompatible, dt) in ticks {
            let v = if incompatible { &crashing } else { &normal };
            let flagged = tracker.update(v, &labs, dt);
            prop_assert_eq!(flagged, incompatible);
            prop_assert!(tracker.incompatible_vitals_duration >= last);
            prop_assert!(tracker.time_since_last_recovery <= tracker.incompatible_vitals_duration + 1e-9);
            if !incompatible {
                prop_assert_eq!(tracker.incompatible_vitals_count, 0);
            }
            last = tracker.incompatible_vitals_duration;
        }
    }
}
