//! Ordered interventions and their lifecycle
//!
//! An order starts `Pending` until its start time, runs `Active`, and ends
//! `Completed` either when a single-dose duration elapses or when the
//! learner stops it. Completed is terminal.

use serde::{Deserialize, Serialize};

use crate::core::types::{InterventionId, Minutes};
use crate::shock::InterventionFlags;
use crate::treatment::catalog::{InterventionKind, Medication, Procedure, Vasopressor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionStatus {
    Pending,
    Active,
    Completed,
}

/// What the learner asked for. Unset fields fall back to the agent's
/// catalog defaults when the order is placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterventionRequest {
    pub kind: InterventionKind,
    #[serde(default)]
    pub dose: Option<f64>,
    #[serde(default)]
    pub rate_ml_h: Option<f64>,
    #[serde(default)]
    pub volume_ml: Option<f64>,
    #[serde(default)]
    pub duration: Option<Minutes>,
    /// Minutes from now until the order takes effect
    #[serde(default)]
    pub delay: Minutes,
}

impl InterventionRequest {
    pub fn new(kind: InterventionKind) -> Self {
        Self {
            kind,
            dose: None,
            rate_ml_h: None,
            volume_ml: None,
            duration: None,
            delay: 0.0,
        }
    }

    pub fn with_dose(mut self, dose: f64) -> Self {
        self.dose = Some(dose);
        self
    }

    pub fn with_volume(mut self, volume_ml: f64) -> Self {
        self.volume_ml = Some(volume_ml);
        self
    }

    pub fn with_duration(mut self, duration: Minutes) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn delayed(mut self, delay: Minutes) -> Self {
        self.delay = delay.max(0.0);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveIntervention {
    pub id: InterventionId,
    pub kind: InterventionKind,
    pub name: String,
    pub dose: Option<f64>,
    pub rate_ml_h: Option<f64>,
    pub volume_ml: Option<f64>,
    pub start_time: Minutes,
    /// `None` for continuous infusions and persistent procedures
    pub duration: Option<Minutes>,
    pub status: InterventionStatus,
    pub completed_at: Option<Minutes>,
}

/// Lifecycle transition reported by `resolve`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Started,
    Expired,
}

impl ActiveIntervention {
    /// Build an order from a request, filling gaps from catalog defaults.
    /// A fluid given as volume over a duration gets the matching rate.
    pub fn from_request(id: InterventionId, request: &InterventionRequest, now: Minutes) -> Self {
        let defaults = request.kind.defaults();
        let volume_ml = request.volume_ml.or(defaults.volume_ml);
        let requested_rate = request.rate_ml_h.or(defaults.rate_ml_h);
        // An explicit volume runs at the given rate until it is all in
        let duration = request
            .duration
            .or_else(|| match (request.volume_ml, requested_rate) {
                (Some(v), Some(r)) if r > 0.0 => Some(v / r * 60.0),
                _ => None,
            })
            .or(defaults.duration);
        let rate_ml_h = requested_rate.or_else(|| match (volume_ml, duration) {
            (Some(v), Some(d)) if d > 0.0 => Some(v / d * 60.0),
            _ => None,
        });
        let start_time = now + request.delay.max(0.0);
        Self {
            id,
            kind: request.kind,
            name: request.kind.name().to_string(),
            dose: request.dose.or(defaults.dose),
            rate_ml_h,
            volume_ml,
            start_time,
            duration,
            status: if start_time <= now {
                InterventionStatus::Active
            } else {
                InterventionStatus::Pending
            },
            completed_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == InterventionStatus::Active
    }

    pub fn is_completed(&self) -> bool {
        self.status == InterventionStatus::Completed
    }

    /// Ever took effect (running or finished after starting)
    pub fn was_given(&self) -> bool {
        match self.status {
            InterventionStatus::Active => true,
            InterventionStatus::Completed => self.completed_at.map_or(true, |t| t >= self.start_time),
            InterventionStatus::Pending => false,
        }
    }

    pub fn end_time(&self) -> Option<Minutes> {
        self.duration.map(|d| self.start_time + d)
    }

    /// Finished on schedule rather than stopped early
    pub fn ran_to_completion(&self) -> bool {
        self.is_completed()
            && matches!((self.completed_at, self.end_time()), (Some(done), Some(end)) if done >= end)
    }

    /// Bring the status up to date for the tick `[now, now + dt)`. A
    /// pending order starts in the tick that contains its start time.
    pub fn resolve(&mut self, now: Minutes, dt: Minutes) -> Option<StatusChange> {
        match self.status {
            InterventionStatus::Pending if self.start_time < now + dt.max(0.0) || now >= self.start_time => {
                self.status = InterventionStatus::Active;
                Some(StatusChange::Started)
            }
            InterventionStatus::Active => match self.end_time() {
                Some(end) if now >= end => {
                    self.status = InterventionStatus::Completed;
                    self.completed_at = Some(end);
                    Some(StatusChange::Expired)
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Fluid volume delivered during `[from, from + dt]` (mL)
    pub fn volume_between(&self, from: Minutes, dt: Minutes) -> f64 {
        let Some(rate) = self.rate_ml_h else {
            return 0.0;
        };
        let start = from.max(self.start_time);
        let mut end = from + dt;
        if let Some(stop) = self.end_time() {
            end = end.min(stop);
        }
        if let Some(stop) = self.completed_at {
            end = end.min(stop);
        }
        (end - start).max(0.0) * rate / 60.0
    }

    /// Share of `[from, from + dt]` during which the intervention acts
    pub fn active_fraction(&self, from: Minutes, dt: Minutes) -> f64 {
        if dt <= 0.0 {
            return 0.0;
        }
        let start = from.max(self.start_time);
        let mut end = from + dt;
        if let Some(stop) = self.end_time() {
            end = end.min(stop);
        }
        if let Some(stop) = self.completed_at {
            end = end.min(stop);
        }
        ((end - start) / dt).clamp(0.0, 1.0)
    }

    /// Current infusion rate in mL/min, zero unless running
    pub fn rate_ml_min(&self) -> f64 {
        if self.is_running() {
            self.rate_ml_h.unwrap_or(0.0) / 60.0
        } else {
            0.0
        }
    }

    pub fn stop(&mut self, now: Minutes) {
        self.status = InterventionStatus::Completed;
        self.completed_at = Some(now);
    }
}

/// Summarise the intervention list into what the progression models read
pub fn intervention_flags(
    interventions: &[ActiveIntervention],
    minutes_since_onset: Minutes,
    cumulative_fluids_ml: f64,
) -> InterventionFlags {
    let mut flags = InterventionFlags {
        minutes_since_onset,
        cumulative_fluids_ml,
        ..Default::default()
    };
    for i in interventions {
        let running = i.is_running();
        let dose = i.dose.unwrap_or(0.0);
        match i.kind {
            InterventionKind::Fluid(_) => flags.fluid_rate_ml_min += i.rate_ml_min(),
            InterventionKind::Vasopressor(agent) if running => {
                flags.vasopressor_dose += agent.norepinephrine_equivalent(dose);
                if agent == Vasopressor::Epinephrine {
                    flags.epinephrine_active = true;
                }
            }
            InterventionKind::Inotrope(agent) if running => flags.inotrope_dose += agent.dobutamine_equivalent(dose),
            InterventionKind::Medication(med) => match med {
                Medication::Antibiotics => flags.antibiotics_given |= i.was_given(),
                Medication::Hydrocortisone => flags.steroids_given |= i.was_given(),
                Medication::TranexamicAcid => flags.tranexamic_acid |= i.was_given(),
                Medication::Atropine => flags.atropine_active |= running,
                _ => {}
            },
            InterventionKind::Procedure(proc) => match proc {
                Procedure::Intubation => flags.intubated |= running,
                Procedure::MechanicalSupport => flags.mechanical_support |= running,
                Procedure::HemorrhageControl => flags.hemorrhage_controlled |= i.ran_to_completion(),
                Procedure::Definitive(_) => {}
            },
            _ => {}
        }
    }
    flags
}
