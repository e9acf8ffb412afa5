//! Outcome state machine
//!
//! `Ongoing` moves to `Died` or `Survived` and never leaves either. Death is
//! evaluated first, so a tick that satisfies both ends the case in death.

use serde::{Deserialize, Serialize};

use crate::core::config::OutcomeThresholds;
use crate::core::types::Minutes;
use crate::outcome::metrics::SessionMetrics;
use crate::outcome::tracker::CriticalStateTracker;

pub const DEATH_CAUSE_PREFIX: &str = "Choque refratário";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeResult {
    #[default]
    Ongoing,
    #[serde(rename_all = "camelCase")]
    Survived {
        at: Minutes,
        stability_minutes: Minutes,
        metrics: SessionMetrics,
    },
    #[serde(rename_all = "camelCase")]
    Died {
        cause: String,
        contributing_factors: Vec<String>,
        at: Minutes,
        metrics: SessionMetrics,
    },
}

impl OutcomeResult {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OutcomeResult::Ongoing)
    }

    pub fn label(&self) -> &'static str {
        match self {
            OutcomeResult::Ongoing => "Em andamento",
            OutcomeResult::Survived { .. } => "Sobreviveu",
            OutcomeResult::Died { .. } => "Óbito",
        }
    }
}

/// Which death criterion fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathRule {
    /// Contiguous incompatible time
    Contiguous,
    /// Consecutive ticks over a shorter cumulative window
    ShortWindow,
    /// Cumulative incompatible time, gaps allowed
    Cumulative,
}

impl DeathRule {
    pub fn description(&self, thresholds: &OutcomeThresholds) -> String {
        match self {
            DeathRule::Contiguous => format!(
                "{:.0} minutos contínuos com sinais vitais incompatíveis com a vida",
                thresholds.contiguous_minutes
            ),
            DeathRule::ShortWindow => format!(
                "{} ciclos consecutivos e {:.0} minutos acumulados em estado crítico",
                thresholds.consecutive_ticks, thresholds.short_window_minutes
            ),
            DeathRule::Cumulative => format!(
                "{:.0} minutos acumulados em estado crítico",
                thresholds.cumulative_minutes
            ),
        }
    }
}

/// Every death criterion currently met, in rule order
pub fn death_rules(tracker: &CriticalStateTracker, thresholds: &OutcomeThresholds) -> Vec<DeathRule> {
    let mut rules = Vec::new();
    if tracker.time_since_last_recovery >= thresholds.contiguous_minutes {
        rules.push(DeathRule::Contiguous);
    }
    if tracker.incompatible_vitals_count >= thresholds.consecutive_ticks
        && tracker.incompatible_vitals_duration >= thresholds.short_window_minutes
    {
        rules.push(DeathRule::ShortWindow);
    }
    if tracker.incompatible_vitals_duration >= thresholds.cumulative_minutes {
        rules.push(DeathRule::Cumulative);
    }
    rules
}

/// Next outcome given the tracker and stability after a tick at `now`
pub fn evaluate_outcome(
    current: &OutcomeResult,
    tracker: &CriticalStateTracker,
    stability_duration: Minutes,
    thresholds: &OutcomeThresholds,
    now: Minutes,
    metrics: &SessionMetrics,
) -> OutcomeResult {
    if current.is_terminal() {
        return current.clone();
    }

    let rules = death_rules(tracker, thresholds);
    if !rules.is_empty() {
        let detail = if tracker.reasons.is_empty() {
            rules[0].description(thresholds)
        } else {
            tracker.reasons.join(", ")
        };
        return OutcomeResult::Died {
            cause: format!("{} ({})", DEATH_CAUSE_PREFIX, detail),
            contributing_factors: rules.iter().map(|r| r.description(thresholds)).collect(),
            at: now,
            metrics: metrics.clone(),
        };
    }

    if stability_duration >= thresholds.survival_minutes {
        return OutcomeResult::Survived {
            at: now,
            stability_minutes: stability_duration,
            metrics: metrics.clone(),
        };
    }

    OutcomeResult::Ongoing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physiology::{LabValues, VitalSigns};

    fn metrics() -> SessionMetrics {
        SessionMetrics::new(&VitalSigns::normal(), &LabValues::normal())
    }

    fn tracker(count: u32, duration: Minutes, contiguous: Minutes) -> CriticalStateTracker {
        CriticalStateTracker {
            incompatible_vitals_count: count,
            incompatible_vitals_duration: duration,
            reasons: vec!["PAM 35 mmHg".to_string()],
            time_since_last_recovery: contiguous,
        }
    }

    fn eval(t: &CriticalStateTracker, stability: Minutes) -> OutcomeResult {
        evaluate_outcome(&OutcomeResult::Ongoing, t, stability, &OutcomeThresholds::default(), 100.0, &metrics())
    }

    #[test]
    fn test_each_rule_kills() {
        assert_eq!(death_rules(&tracker(30, 30.0, 30.0), &OutcomeThresholds::default())[0], DeathRule::Contiguous);
        assert_eq!(death_rules(&tracker(5, 15.0, 5.0), &OutcomeThresholds::default()), vec![DeathRule::ShortWindow]);
        assert_eq!(death_rules(&tracker(1, 60.0, 1.0), &OutcomeThresholds::default()), vec![DeathRule::Cumulative]);
        assert!(death_rules(&tracker(4, 14.0, 4.0), &OutcomeThresholds::default()).is_empty());
    }

    #[test]
    fn test_death_cause_text() {
        match eval(&tracker(30, 30.0, 30.0), 0.0) {
            OutcomeResult::Died { cause, contributing_factors, at, .. } => {
                assert!(cause.starts_with("Choque refratário"));
                assert!(cause.contains("PAM"));
                assert!(!contributing_factors.is_empty());
                assert_eq!(at, 100.0);
            }
            other => panic!("expected death, got {:?}", other),
        }
    }

    #[test]
    fn test_death_takes_precedence_over_survival() {
        let outcome = eval(&tracker(30, 30.0, 30.0), 120.0);
        assert!(matches!(outcome, OutcomeResult::Died { .. }));
    }

    #[test]
    fn test_survival_after_window() {
        let calm = CriticalStateTracker::new();
        assert_eq!(eval(&calm, 59.0), OutcomeResult::Ongoing);
        assert!(matches!(eval(&calm, 60.0), OutcomeResult::Survived { .. }));
    }

    #[test]
    fn test_terminal_states_absorb() {
        let survived = eval(&CriticalStateTracker::new(), 60.0);
        let after = evaluate_outcome(
            &survived,
            &tracker(60, 60.0, 60.0),
            0.0,
            &OutcomeThresholds::default(),
            500.0,
            &metrics(),
        );
        assert_eq!(after, survived);
    }

    #[test]
    fn test_serialized_status_tag() {
        let json = serde_json::to_string(&OutcomeResult::Ongoing).unwrap();
        assert_eq!(json, r#"{"status":"ONGOING"}"#);
    }
}
