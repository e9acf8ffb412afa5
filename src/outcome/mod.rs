//! Death/survival determination
//!
//! The tracker accumulates time spent incompatible with life; the state
//! machine turns that, plus the stability window, into a terminal outcome.

pub mod machine;
pub mod metrics;
pub mod tracker;

pub use machine::{death_rules, evaluate_outcome, DeathRule, OutcomeResult, DEATH_CAUSE_PREFIX};
pub use metrics::SessionMetrics;
pub use tracker::{incompatibility_reasons, CriticalStateTracker};
