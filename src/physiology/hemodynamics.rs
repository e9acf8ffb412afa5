//! Abstract hemodynamic state (preload, contractility, afterload)

use serde::{Deserialize, Serialize};

use crate::physiology::ranges::{safe_div, HARD_HEART_RATE, HARD_SCALE, HARD_STROKE_VOLUME};
use crate::physiology::vitals::VitalSigns;

/// Preload, contractility and afterload are 0-100 teaching scales where 50
/// is a healthy adult at rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HemodynamicState {
    pub preload: f64,
    pub contractility: f64,
    pub afterload: f64,
    pub heart_rate: f64,
    /// mL
    pub stroke_volume: f64,
}

impl HemodynamicState {
    pub fn new(preload: f64, contractility: f64, afterload: f64, heart_rate: f64, stroke_volume: f64) -> Self {
        let mut state = Self {
            preload,
            contractility,
            afterload,
            heart_rate,
            stroke_volume,
        };
        state.clamp();
        state
    }

    pub fn normal() -> Self {
        Self::new(50.0, 50.0, 50.0, 75.0, 73.0)
    }

    /// Derive the abstract scales from measured vitals, keeping contractility
    pub fn from_vitals(vitals: &VitalSigns, contractility: f64) -> Self {
        Self::new(
            preload_from_filling(vitals.cvp, vitals.pcwp),
            contractility,
            afterload_from_svr(vitals.svr),
            vitals.heart_rate,
            flow_stroke_volume(vitals.cardiac_output, vitals.heart_rate),
        )
    }

    /// Stroke volume predicted by the preload/contractility/afterload model
    pub fn modeled_stroke_volume(&self) -> f64 {
        let filling = (self.preload / 50.0).clamp(0.0, 2.0).sqrt();
        let pump = self.contractility / 50.0;
        let resistance = 1.0 + (self.afterload - 50.0) / 200.0;
        HARD_STROKE_VOLUME.clamp(73.0 * filling * pump / resistance.max(0.25))
    }

    pub fn clamp(&mut self) {
        self.preload = HARD_SCALE.clamp(self.preload);
        self.contractility = HARD_SCALE.clamp(self.contractility);
        self.afterload = HARD_SCALE.clamp(self.afterload);
        self.heart_rate = HARD_HEART_RATE.clamp(self.heart_rate);
        self.stroke_volume = HARD_STROKE_VOLUME.clamp(self.stroke_volume);
    }
}

impl Default for HemodynamicState {
    fn default() -> Self {
        Self::normal()
    }
}

/// Stroke volume from flow: CO×1000/HR, 0.0 when HR is 0
pub fn flow_stroke_volume(cardiac_output: f64, heart_rate: f64) -> f64 {
    safe_div(cardiac_output * 1000.0, heart_rate, 0.0)
}

/// CVP 6 (or PCWP 10) maps to 50; the wedge pressure dominates when present
pub fn preload_from_filling(cvp: f64, pcwp: Option<f64>) -> f64 {
    let from_cvp = cvp / 6.0 * 50.0;
    let value = match pcwp {
        Some(wedge) => 0.4 * from_cvp + 0.6 * (wedge / 10.0 * 50.0),
        None => from_cvp,
    };
    HARD_SCALE.clamp(value)
}

/// SVR 1100 maps to 50
pub fn afterload_from_svr(svr: f64) -> f64 {
    HARD_SCALE.clamp(svr / 1100.0 * 50.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_model_consistent() {
        let h = HemodynamicState::normal();
        assert!((h.modeled_stroke_volume() - 73.0).abs() < 1.0);
        assert!((h.stroke_volume * h.heart_rate / 1000.0 - 5.5).abs() < 0.1);
    }

    #[test]
    fn test_zero_heart_rate_sentinel() {
        assert_eq!(flow_stroke_volume(5.0, 0.0), 0.0);
    }

    #[test]
    fn test_low_contractility_lowers_stroke_volume() {
        let mut h = HemodynamicState::normal();
        h.contractility = 20.0;
        assert!(h.modeled_stroke_volume() < 40.0);
    }

    #[test]
    fn test_from_vitals_scales() {
        let v = VitalSigns::normal();
        let h = HemodynamicState::from_vitals(&v, 50.0);
        assert!((h.afterload - 50.0).abs() < 0.1);
        assert!(h.preload > 40.0 && h.preload < 60.0);
    }
}
