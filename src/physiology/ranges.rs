//! Physiological ranges - all clamp bounds in one place
//!
//! `HARD_*` bounds are what the simulation can ever display. They are wider
//! than the incompatibility thresholds so a dying patient is representable.
//! `SAFETY_*` bounds are tighter and only apply to baseline construction
//! (comorbidity stacking, user-edited presentations).

use serde::{Deserialize, Serialize};

/// Closed interval used for clamping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamp, mapping NaN to the lower bound
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

// Vital signs (hard)
pub const HARD_HEART_RATE: Bounds = Bounds::new(20.0, 220.0);
pub const HARD_SYSTOLIC: Bounds = Bounds::new(30.0, 260.0);
pub const HARD_DIASTOLIC: Bounds = Bounds::new(15.0, 160.0);
pub const HARD_SPO2: Bounds = Bounds::new(40.0, 100.0);
pub const HARD_RESPIRATORY_RATE: Bounds = Bounds::new(4.0, 60.0);
pub const HARD_TEMPERATURE: Bounds = Bounds::new(32.0, 43.0);
pub const HARD_CVP: Bounds = Bounds::new(0.0, 30.0);
pub const HARD_PCWP: Bounds = Bounds::new(2.0, 40.0);
pub const HARD_PVR: Bounds = Bounds::new(0.5, 15.0);
pub const HARD_CARDIAC_OUTPUT: Bounds = Bounds::new(0.5, 12.0);
pub const HARD_SVR: Bounds = Bounds::new(300.0, 3000.0);

// Hemodynamic abstractions
pub const HARD_SCALE: Bounds = Bounds::new(0.0, 100.0);
pub const HARD_STROKE_VOLUME: Bounds = Bounds::new(5.0, 150.0);

// Labs (hard)
pub const HARD_PH: Bounds = Bounds::new(6.6, 7.9);
pub const HARD_PCO2: Bounds = Bounds::new(10.0, 120.0);
pub const HARD_PO2: Bounds = Bounds::new(25.0, 600.0);
pub const HARD_HCO3: Bounds = Bounds::new(3.0, 45.0);
pub const HARD_LACTATE: Bounds = Bounds::new(0.3, 25.0);
pub const HARD_HEMOGLOBIN: Bounds = Bounds::new(2.0, 22.0);
pub const HARD_WBC: Bounds = Bounds::new(0.1, 80.0);
pub const HARD_PLATELETS: Bounds = Bounds::new(5.0, 1000.0);
pub const HARD_POTASSIUM: Bounds = Bounds::new(1.5, 9.0);
pub const HARD_SODIUM: Bounds = Bounds::new(110.0, 170.0);
pub const HARD_MAGNESIUM: Bounds = Bounds::new(0.5, 5.0);
pub const HARD_CHLORIDE: Bounds = Bounds::new(70.0, 140.0);
pub const HARD_CREATININE: Bounds = Bounds::new(0.2, 15.0);
pub const HARD_UREA: Bounds = Bounds::new(5.0, 400.0);

// Baseline safety bounds (comorbidity stacking)
pub const SAFETY_HEART_RATE: Bounds = Bounds::new(30.0, 200.0);
pub const SAFETY_SYSTOLIC: Bounds = Bounds::new(50.0, 220.0);
pub const SAFETY_DIASTOLIC: Bounds = Bounds::new(25.0, 130.0);
pub const SAFETY_SPO2: Bounds = Bounds::new(60.0, 100.0);
pub const SAFETY_RESPIRATORY_RATE: Bounds = Bounds::new(6.0, 50.0);
pub const SAFETY_TEMPERATURE: Bounds = Bounds::new(34.0, 42.0);
pub const SAFETY_CVP: Bounds = Bounds::new(0.0, 25.0);
pub const SAFETY_CARDIAC_OUTPUT: Bounds = Bounds::new(1.0, 10.0);
pub const SAFETY_SVR: Bounds = Bounds::new(350.0, 2800.0);
pub const SAFETY_PH: Bounds = Bounds::new(6.8, 7.8);
pub const SAFETY_LACTATE: Bounds = Bounds::new(0.5, 15.0);
pub const SAFETY_POTASSIUM: Bounds = Bounds::new(2.5, 7.0);
pub const SAFETY_HEMOGLOBIN: Bounds = Bounds::new(4.0, 20.0);
pub const SAFETY_CREATININE: Bounds = Bounds::new(0.3, 12.0);

/// Normal adult reference ranges, used for alerts
pub mod normal {
    use super::Bounds;

    pub const HEART_RATE: Bounds = Bounds::new(60.0, 100.0);
    pub const MAP: Bounds = Bounds::new(65.0, 105.0);
    pub const SPO2: Bounds = Bounds::new(94.0, 100.0);
    pub const RESPIRATORY_RATE: Bounds = Bounds::new(12.0, 20.0);
    pub const TEMPERATURE: Bounds = Bounds::new(36.0, 37.8);
    pub const CVP: Bounds = Bounds::new(2.0, 8.0);
    pub const CARDIAC_OUTPUT: Bounds = Bounds::new(4.0, 8.0);
    pub const SVR: Bounds = Bounds::new(800.0, 1200.0);
    pub const PH: Bounds = Bounds::new(7.35, 7.45);
    pub const LACTATE: Bounds = Bounds::new(0.5, 2.0);
    pub const POTASSIUM: Bounds = Bounds::new(3.5, 5.0);
}

/// Typical dose ranges by agent unit, for display only (no validation)
pub mod doses {
    use super::Bounds;

    /// mcg/kg/min
    pub const NOREPINEPHRINE: Bounds = Bounds::new(0.01, 1.0);
    /// mcg/kg/min
    pub const EPINEPHRINE: Bounds = Bounds::new(0.01, 0.5);
    /// U/min
    pub const VASOPRESSIN: Bounds = Bounds::new(0.01, 0.04);
    /// mcg/kg/min
    pub const PHENYLEPHRINE: Bounds = Bounds::new(0.5, 5.0);
    /// mcg/kg/min
    pub const DOPAMINE: Bounds = Bounds::new(2.0, 20.0);
    /// mcg/kg/min
    pub const DOBUTAMINE: Bounds = Bounds::new(2.0, 20.0);
    /// mcg/kg/min
    pub const MILRINONE: Bounds = Bounds::new(0.125, 0.75);
    /// mL per bolus
    pub const FLUID_BOLUS: Bounds = Bounds::new(250.0, 2000.0);
}

/// Blood volume of a 70 kg adult (mL)
pub const ESTIMATED_BLOOD_VOLUME_ML: f64 = 5000.0;

/// Henderson-Hasselbalch: pH from bicarbonate (mEq/L) and pCO2 (mmHg)
pub fn henderson_hasselbalch_ph(hco3: f64, pco2: f64) -> f64 {
    if pco2 <= 0.0 || hco3 <= 0.0 {
        return HARD_PH.min;
    }
    6.1 + (hco3 / (0.03 * pco2)).log10()
}

/// Inverse of `henderson_hasselbalch_ph`: pCO2 giving `ph` at `hco3`
pub fn henderson_hasselbalch_pco2(hco3: f64, ph: f64) -> f64 {
    hco3 / (0.03 * 10f64.powf(ph - 6.1))
}

/// Division returning `sentinel` instead of inf/NaN
pub fn safe_div(numerator: f64, denominator: f64, sentinel: f64) -> f64 {
    if denominator.abs() < f64::EPSILON || !denominator.is_finite() {
        sentinel
    } else {
        numerator / denominator
    }
}
