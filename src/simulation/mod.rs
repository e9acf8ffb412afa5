//! Simulation driver
//!
//! `step` is the pure per-tick physiology pipeline. `advance` wraps it with
//! the critical-state tracker and the outcome state machine and is what a
//! driver calls once per tick while the case is playing.

pub mod alerts;
pub mod events;
pub mod labs;
pub mod state;
pub mod step;

pub use events::SimulationEvent;
pub use state::SimulationState;
pub use step::{baroreflex, recompute_derived, step, urine_output};

use tracing::info;

use crate::core::types::Minutes;
use crate::outcome::{evaluate_outcome, OutcomeResult};
use crate::patient::Patient;

/// One tick: physiology, tracker, outcome. `dt` is real-time minutes and
/// is scaled by the clock's speed multiplier. No-op once the case has ended.
pub fn advance(state: &SimulationState, patient: &Patient, dt: Minutes) -> SimulationState {
    if state.outcome.is_terminal() {
        return state.clone();
    }

    let sim_dt = state.clock.scaled(dt);
    let mut next = step(state, patient, sim_dt);
    if sim_dt <= 0.0 {
        return next;
    }

    next.tracker.update(&next.vitals, &next.labs, sim_dt);
    let outcome = evaluate_outcome(
        &next.outcome,
        &next.tracker,
        next.stability_duration,
        &next.config.outcome,
        next.minutes(),
        &next.metrics,
    );

    if outcome != next.outcome {
        match &outcome {
            OutcomeResult::Died { cause, at, .. } => info!(%cause, at, "patient died"),
            OutcomeResult::Survived { at, .. } => info!(at, "patient survived"),
            OutcomeResult::Ongoing => {}
        }
        next.events.push(SimulationEvent::OutcomeReached {
            outcome: outcome.label().to_string(),
            at: next.minutes(),
        });
    }
    next.outcome = outcome;
    next
}

/// Advance in ticks of the configured length until `minutes` of simulated
/// time have passed or the case ends
pub fn run_for(state: &SimulationState, patient: &Patient, minutes: Minutes) -> SimulationState {
    let tick = state.config.tick_minutes;
    let end = state.minutes() + minutes;
    let mut current = state.clone();
    while current.minutes() + 1e-9 < end && !current.outcome.is_terminal() {
        let remaining = (end - current.minutes()) / current.clock.speed().max(f64::EPSILON);
        current = advance(&current, patient, tick.min(remaining));
    }
    current
}
