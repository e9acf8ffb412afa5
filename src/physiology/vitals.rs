//! Vital signs of the simulated patient

use serde::{Deserialize, Serialize};

use crate::physiology::delta::VitalsDelta;
use crate::physiology::ranges::*;

/// Bedside vitals plus invasive hemodynamic measurements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalSigns {
    pub heart_rate: f64,
    pub systolic: f64,
    pub diastolic: f64,
    /// Derived: diastolic + (systolic - diastolic) / 3
    pub map: f64,
    pub spo2: f64,
    pub respiratory_rate: f64,
    pub temperature: f64,
    pub cvp: f64,
    /// Only present when a pulmonary artery catheter is in place
    pub pcwp: Option<f64>,
    /// Wood units
    pub pvr: Option<f64>,
    /// L/min
    pub cardiac_output: f64,
    /// dyn·s/cm⁵
    pub svr: f64,
}

impl VitalSigns {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        heart_rate: f64,
        systolic: f64,
        diastolic: f64,
        spo2: f64,
        respiratory_rate: f64,
        temperature: f64,
        cvp: f64,
        cardiac_output: f64,
        svr: f64,
    ) -> Self {
        let mut vitals = Self {
            heart_rate,
            systolic,
            diastolic,
            map: 0.0,
            spo2,
            respiratory_rate,
            temperature,
            cvp,
            pcwp: None,
            pvr: None,
            cardiac_output,
            svr,
        };
        vitals.clamp();
        vitals
    }

    pub fn with_pcwp(mut self, pcwp: f64) -> Self {
        self.pcwp = Some(HARD_PCWP.clamp(pcwp));
        self
    }

    pub fn with_pvr(mut self, pvr: f64) -> Self {
        self.pvr = Some(HARD_PVR.clamp(pvr));
        self
    }

    /// Healthy adult at rest
    pub fn normal() -> Self {
        Self::new(75.0, 120.0, 80.0, 98.0, 14.0, 36.8, 6.0, 5.5, 1100.0)
            .with_pcwp(10.0)
            .with_pvr(1.2)
    }

    pub fn compute_map(systolic: f64, diastolic: f64) -> f64 {
        diastolic + (systolic - diastolic) / 3.0
    }

    pub fn pulse_pressure(&self) -> f64 {
        self.systolic - self.diastolic
    }

    /// Cardiac index (L/min/m²)
    pub fn cardiac_index(&self, body_surface_area: f64) -> f64 {
        safe_div(self.cardiac_output, body_surface_area, 0.0)
    }

    /// HR / systolic; 0.0 when systolic is not measurable
    pub fn shock_index(&self) -> f64 {
        safe_div(self.heart_rate, self.systolic, 0.0)
    }

    /// Pressure-derived MAP estimate from the flow side: CO×SVR/80 + CVP
    pub fn flow_derived_map(&self) -> f64 {
        self.cardiac_output * self.svr / 80.0 + self.cvp
    }

    /// Clamp every field to its hard bound, keep diastolic below systolic
    /// and recompute MAP last.
    pub fn clamp(&mut self) {
        self.heart_rate = HARD_HEART_RATE.clamp(self.heart_rate);
        self.systolic = HARD_SYSTOLIC.clamp(self.systolic);
        self.diastolic = HARD_DIASTOLIC.clamp(self.diastolic);
        if self.diastolic >= self.systolic {
            self.diastolic = HARD_DIASTOLIC.clamp(self.systolic - 5.0);
            self.systolic = self.systolic.max(self.diastolic + 5.0);
        }
        self.spo2 = HARD_SPO2.clamp(self.spo2);
        self.respiratory_rate = HARD_RESPIRATORY_RATE.clamp(self.respiratory_rate);
        self.temperature = HARD_TEMPERATURE.clamp(self.temperature);
        self.cvp = HARD_CVP.clamp(self.cvp);
        self.pcwp = self.pcwp.map(|v| HARD_PCWP.clamp(v));
        self.pvr = self.pvr.map(|v| HARD_PVR.clamp(v));
        self.cardiac_output = HARD_CARDIAC_OUTPUT.clamp(self.cardiac_output);
        self.svr = HARD_SVR.clamp(self.svr);
        self.map = Self::compute_map(self.systolic, self.diastolic);
    }

    /// Apply a delta and return the clamped result
    pub fn apply(&self, delta: &VitalsDelta) -> Self {
        let mut next = self.clone();
        next.heart_rate += delta.heart_rate;
        next.systolic += delta.systolic;
        next.diastolic += delta.diastolic;
        next.spo2 += delta.spo2;
        next.respiratory_rate += delta.respiratory_rate;
        next.temperature += delta.temperature;
        next.cvp += delta.cvp;
        next.pcwp = next.pcwp.map(|v| v + delta.pcwp);
        next.pvr = next.pvr.map(|v| v + delta.pvr);
        next.cardiac_output += delta.cardiac_output;
        next.svr += delta.svr;
        next.clamp();
        next
    }

    /// Rebuild systolic/diastolic around a MAP with a given pulse pressure
    pub fn set_pressures_from_map(&mut self, map: f64, pulse_pressure: f64) {
        self.systolic = map + 2.0 * pulse_pressure / 3.0;
        self.diastolic = map - pulse_pressure / 3.0;
        self.clamp();
    }

    pub fn within_hard_bounds(&self) -> bool {
        HARD_HEART_RATE.contains(self.heart_rate)
            && HARD_SYSTOLIC.contains(self.systolic)
            && HARD_DIASTOLIC.contains(self.diastolic)
            && HARD_SPO2.contains(self.spo2)
            && HARD_RESPIRATORY_RATE.contains(self.respiratory_rate)
            && HARD_TEMPERATURE.contains(self.temperature)
            && HARD_CVP.contains(self.cvp)
            && self.pcwp.map_or(true, |v| HARD_PCWP.contains(v))
            && self.pvr.map_or(true, |v| HARD_PVR.contains(v))
            && HARD_CARDIAC_OUTPUT.contains(self.cardiac_output)
            && HARD_SVR.contains(self.svr)
            && (self.map - Self::compute_map(self.systolic, self.diastolic)).abs() < 1e-9
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_derived_on_construction() {
        let v = VitalSigns::new(80.0, 120.0, 60.0, 98.0, 14.0, 37.0, 5.0, 5.0, 1000.0);
        assert!((v.map - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_apply_clamps_and_recomputes_map() {
        let v = VitalSigns::normal();
        let delta = VitalsDelta {
            heart_rate: 500.0,
            svr: -10_000.0,
            systolic: -20.0,
            ..Default::default()
        };
        let next = v.apply(&delta);
        assert_eq!(next.heart_rate, HARD_HEART_RATE.max);
        assert_eq!(next.svr, HARD_SVR.min);
        assert!(next.within_hard_bounds());
    }

    #[test]
    fn test_inverted_pressures_repaired() {
        let mut v = VitalSigns::normal();
        v.diastolic = 130.0;
        v.systolic = 90.0;
        v.clamp();
        assert!(v.diastolic < v.systolic);
        assert!(v.within_hard_bounds());
    }

    #[test]
    fn test_set_pressures_from_map_preserves_map() {
        let mut v = VitalSigns::normal();
        v.set_pressures_from_map(70.0, 30.0);
        assert!((v.map - 70.0).abs() < 1e-9);
        assert!((v.pulse_pressure() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_shock_index_zero_systolic_sentinel() {
        let mut v = VitalSigns::normal();
        v.systolic = 0.0;
        assert_eq!(v.shock_index(), 0.0);
    }
}
