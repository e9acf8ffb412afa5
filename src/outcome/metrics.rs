//! Session metrics reported with the outcome

use serde::{Deserialize, Serialize};

use crate::core::types::Minutes;
use crate::physiology::{LabValues, VitalSigns};
use crate::shock::InterventionFlags;

/// MAP below which a minute counts as hypotensive
pub const HYPOTENSION_MAP: f64 = 65.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    pub peak_lactate: f64,
    pub nadir_map: f64,
    pub minutes_hypotensive: Minutes,
    pub vasopressor_minutes: Minutes,
    pub total_fluids_ml: f64,
    pub interventions_ordered: u32,
}

impl SessionMetrics {
    pub fn new(vitals: &VitalSigns, labs: &LabValues) -> Self {
        Self {
            peak_lactate: labs.gasometry.lactate,
            nadir_map: vitals.map,
            minutes_hypotensive: 0.0,
            vasopressor_minutes: 0.0,
            total_fluids_ml: 0.0,
            interventions_ordered: 0,
        }
    }

    pub fn record(&mut self, vitals: &VitalSigns, labs: &LabValues, flags: &InterventionFlags, fluids_ml: f64, dt: Minutes) {
        self.peak_lactate = self.peak_lactate.max(labs.gasometry.lactate);
        self.nadir_map = self.nadir_map.min(vitals.map);
        if vitals.map < HYPOTENSION_MAP {
            self.minutes_hypotensive += dt;
        }
        if flags.vasopressor_dose > 0.0 {
            self.vasopressor_minutes += dt;
        }
        self.total_fluids_ml += fluids_ml;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extremes_tracked() {
        let mut v = VitalSigns::normal();
        let mut labs = LabValues::normal();
        let mut metrics = SessionMetrics::new(&v, &labs);

        v.set_pressures_from_map(55.0, 30.0);
        labs.gasometry.lactate = 6.0;
        let flags = InterventionFlags {
            vasopressor_dose: 0.1,
            ..Default::default()
        };
        metrics.record(&v, &labs, &flags, 250.0, 2.0);
        metrics.record(&VitalSigns::normal(), &LabValues::normal(), &InterventionFlags::default(), 0.0, 1.0);

        assert_eq!(metrics.peak_lactate, 6.0);
        assert!((metrics.nadir_map - 55.0).abs() < 1e-9);
        assert_eq!(metrics.minutes_hypotensive, 2.0);
        assert_eq!(metrics.vasopressor_minutes, 2.0);
        assert_eq!(metrics.total_fluids_ml, 250.0);
    }
}
