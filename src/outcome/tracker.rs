//! Critical-state tracker
//!
//! Accumulates how long the patient has spent with vitals incompatible with
//! life. The cumulative duration never decreases; the contiguous counters
//! reset on the first compatible tick.

use serde::{Deserialize, Serialize};

use crate::core::types::Minutes;
use crate::physiology::{LabValues, VitalSigns};

/// Thresholds past which a value counts as incompatible with life
pub mod limits {
    pub const MAP_MIN: f64 = 40.0;
    pub const HEART_RATE_MIN: f64 = 30.0;
    pub const HEART_RATE_MAX: f64 = 180.0;
    pub const SPO2_MIN: f64 = 70.0;
    pub const PH_MIN: f64 = 6.8;
    pub const PH_MAX: f64 = 7.8;
    pub const LACTATE_MAX: f64 = 15.0;
    pub const CARDIAC_OUTPUT_MIN: f64 = 2.0;
    pub const POTASSIUM_MIN: f64 = 2.0;
    pub const POTASSIUM_MAX: f64 = 7.5;
}

/// Every criterion currently violated, as shown to the learner
pub fn incompatibility_reasons(vitals: &VitalSigns, labs: &LabValues) -> Vec<String> {
    use limits::*;

    let mut reasons = Vec::new();
    if vitals.map < MAP_MIN {
        reasons.push(format!("PAM {:.0} mmHg", vitals.map));
    }
    if vitals.heart_rate < HEART_RATE_MIN {
        reasons.push(format!("bradicardia extrema (FC {:.0})", vitals.heart_rate));
    } else if vitals.heart_rate > HEART_RATE_MAX {
        reasons.push(format!("taquicardia extrema (FC {:.0})", vitals.heart_rate));
    }
    if vitals.spo2 < SPO2_MIN {
        reasons.push(format!("SpO2 {:.0}%", vitals.spo2));
    }
    let ph = labs.gasometry.ph;
    if !(PH_MIN..=PH_MAX).contains(&ph) {
        reasons.push(format!("pH {:.2}", ph));
    }
    if labs.gasometry.lactate > LACTATE_MAX {
        reasons.push(format!("lactato {:.1} mmol/L", labs.gasometry.lactate));
    }
    if vitals.cardiac_output < CARDIAC_OUTPUT_MIN {
        reasons.push(format!("DC {:.1} L/min", vitals.cardiac_output));
    }
    let k = labs.chemistry.potassium;
    if !(POTASSIUM_MIN..=POTASSIUM_MAX).contains(&k) {
        reasons.push(format!("potássio {:.1} mEq/L", k));
    }
    reasons
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalStateTracker {
    /// Consecutive incompatible ticks
    pub incompatible_vitals_count: u32,
    /// Cumulative incompatible minutes, gaps allowed
    pub incompatible_vitals_duration: Minutes,
    /// Latest snapshot
    pub reasons: Vec<String>,
    /// Contiguous incompatible minutes since the last compatible tick
    pub time_since_last_recovery: Minutes,
}

impl CriticalStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one tick of length `dt`. Returns whether it was incompatible.
    pub fn update(&mut self, vitals: &VitalSigns, labs: &LabValues, dt: Minutes) -> bool {
        self.reasons = incompatibility_reasons(vitals, labs);
        if self.reasons.is_empty() {
            self.incompatible_vitals_count = 0;
            self.time_since_last_recovery = 0.0;
            false
        } else {
            self.incompatible_vitals_count = self.incompatible_vitals_count.saturating_add(1);
            self.incompatible_vitals_duration += dt.max(0.0);
            self.time_since_last_recovery += dt.max(0.0);
            true
        }
    }

    pub fn is_incompatible(&self) -> bool {
        !self.reasons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crashing() -> VitalSigns {
        let mut v = VitalSigns::normal();
        v.set_pressures_from_map(35.0, 20.0);
        v
    }

    #[test]
    fn test_normal_patient_compatible() {
        assert!(incompatibility_reasons(&VitalSigns::normal(), &LabValues::normal()).is_empty());
    }

    #[test]
    fn test_reasons_listed() {
        let mut labs = LabValues::normal();
        labs.chemistry.potassium = 7.9;
        labs.gasometry.lactate = 16.0;
        let reasons = incompatibility_reasons(&crashing(), &labs);
        assert_eq!(reasons.len(), 3);
        assert!(reasons[0].starts_with("PAM"));
    }

    #[test]
    fn test_recovery_resets_contiguous_counters_only() {
        let mut tracker = CriticalStateTracker::new();
        let labs = LabValues::normal();
        for _ in 0..4 {
            assert!(tracker.update(&crashing(), &labs, 1.0));
        }
        assert_eq!(tracker.incompatible_vitals_count, 4);
        assert_eq!(tracker.time_since_last_recovery, 4.0);

        assert!(!tracker.update(&VitalSigns::normal(), &labs, 1.0));
        assert_eq!(tracker.incompatible_vitals_count, 0);
        assert_eq!(tracker.time_since_last_recovery, 0.0);
        assert_eq!(tracker.incompatible_vitals_duration, 4.0);
        assert!(tracker.reasons.is_empty());
    }
}
