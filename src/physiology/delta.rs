//! Additive change to the physiological state produced by one model stage

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul};

use crate::physiology::ranges::*;
use crate::physiology::vitals::VitalSigns;

/// Per-tick change proposed by a progression model or a treatment.
///
/// `contractility` targets the hemodynamic abstraction, everything else maps
/// one-to-one onto `VitalSigns`. MAP is never part of a delta: it is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsDelta {
    pub heart_rate: f64,
    pub systolic: f64,
    pub diastolic: f64,
    pub spo2: f64,
    pub respiratory_rate: f64,
    pub temperature: f64,
    pub cvp: f64,
    pub pcwp: f64,
    pub pvr: f64,
    pub cardiac_output: f64,
    pub svr: f64,
    pub contractility: f64,
}

impl VitalsDelta {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Shrink the delta so that `vitals + delta` stays inside hard bounds
    pub fn clamped_for(&self, vitals: &VitalSigns) -> Self {
        fn fit(current: f64, change: f64, bounds: Bounds) -> f64 {
            bounds.clamp(current + change) - current
        }

        Self {
            heart_rate: fit(vitals.heart_rate, self.heart_rate, HARD_HEART_RATE),
            systolic: fit(vitals.systolic, self.systolic, HARD_SYSTOLIC),
            diastolic: fit(vitals.diastolic, self.diastolic, HARD_DIASTOLIC),
            spo2: fit(vitals.spo2, self.spo2, HARD_SPO2),
            respiratory_rate: fit(vitals.respiratory_rate, self.respiratory_rate, HARD_RESPIRATORY_RATE),
            temperature: fit(vitals.temperature, self.temperature, HARD_TEMPERATURE),
            cvp: fit(vitals.cvp, self.cvp, HARD_CVP),
            pcwp: vitals.pcwp.map_or(0.0, |v| fit(v, self.pcwp, HARD_PCWP)),
            pvr: vitals.pvr.map_or(0.0, |v| fit(v, self.pvr, HARD_PVR)),
            cardiac_output: fit(vitals.cardiac_output, self.cardiac_output, HARD_CARDIAC_OUTPUT),
            svr: fit(vitals.svr, self.svr, HARD_SVR),
            contractility: self.contractility,
        }
    }

    /// Change that moves `current` toward `target` by `rate` per minute
    pub fn toward(current: f64, target: f64, rate: f64, dt: f64) -> f64 {
        let step = (target - current) * (rate * dt).min(1.0);
        if step.is_finite() {
            step
        } else {
            0.0
        }
    }
}

impl Add for VitalsDelta {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            heart_rate: self.heart_rate + rhs.heart_rate,
            systolic: self.systolic + rhs.systolic,
            diastolic: self.diastolic + rhs.diastolic,
            spo2: self.spo2 + rhs.spo2,
            respiratory_rate: self.respiratory_rate + rhs.respiratory_rate,
            temperature: self.temperature + rhs.temperature,
            cvp: self.cvp + rhs.cvp,
            pcwp: self.pcwp + rhs.pcwp,
            pvr: self.pvr + rhs.pvr,
            cardiac_output: self.cardiac_output + rhs.cardiac_output,
            svr: self.svr + rhs.svr,
            contractility: self.contractility + rhs.contractility,
        }
    }
}

impl AddAssign for VitalsDelta {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul<f64> for VitalsDelta {
    type Output = Self;

    fn mul(self, k: f64) -> Self {
        Self {
            heart_rate: self.heart_rate * k,
            systolic: self.systolic * k,
            diastolic: self.diastolic * k,
            spo2: self.spo2 * k,
            respiratory_rate: self.respiratory_rate * k,
            temperature: self.temperature * k,
            cvp: self.cvp * k,
            pcwp: self.pcwp * k,
            pvr: self.pvr * k,
            cardiac_output: self.cardiac_output * k,
            svr: self.svr * k,
            contractility: self.contractility * k,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_for_stays_in_bounds() {
        let vitals = VitalSigns::normal();
        let delta = VitalsDelta {
            cardiac_output: -50.0,
            spo2: 20.0,
            ..Default::default()
        };
        let fitted = delta.clamped_for(&vitals);
        let next = vitals.apply(&fitted);
        assert_eq!(next.cardiac_output, HARD_CARDIAC_OUTPUT.min);
        assert_eq!(next.spo2, HARD_SPO2.max);
    }

    #[test]
    fn test_toward_never_overshoots() {
        let step = VitalsDelta::toward(10.0, 20.0, 5.0, 1.0);
        assert_eq!(step, 10.0);
        let step = VitalsDelta::toward(10.0, 20.0, 0.1, 1.0);
        assert!((step - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_scale_and_sum() {
        let a = VitalsDelta { heart_rate: 2.0, ..Default::default() };
        let b = VitalsDelta { heart_rate: 1.0, svr: 10.0, ..Default::default() };
        let sum = a * 2.0 + b;
        assert_eq!(sum.heart_rate, 5.0);
        assert_eq!(sum.svr, 10.0);
    }
}
