//! Laboratory update stage
//!
//! Lactate follows perfusion adequacy and is buffered 1:1 by bicarbonate.
//! pCO2 follows the expected respiratory compensation (or the ventilator's
//! minute ventilation) and pH is recomputed from Henderson-Hasselbalch, so
//! the gas is always internally consistent. Creatinine and urea lag MAP
//! with first-order kinetics.

use crate::core::types::Minutes;
use crate::physiology::labs::po2_from_spo2;
use crate::physiology::ranges::{henderson_hasselbalch_ph, safe_div, ESTIMATED_BLOOD_VOLUME_ML};
use crate::physiology::{FluidInfusion, LabValues, VitalSigns, VitalsDelta};
use crate::treatment::VentilatorSettings;

/// Fraction of infused crystalloid still intravascular
const CRYSTALLOID_RETENTION: f64 = 0.25;
const COLLOID_RETENTION: f64 = 0.8;
/// Hemoglobin rise per 300 mL unit of packed cells (g/dL)
const HB_PER_UNIT: f64 = 1.0;
const UNIT_ML: f64 = 300.0;

/// Everything the lab stage reads besides the labs themselves
#[derive(Debug, Clone, Copy)]
pub struct LabInputs<'a> {
    pub vitals: &'a VitalSigns,
    /// Patient's starting labs, the resting point for renal markers
    pub baseline: &'a LabValues,
    pub infused: &'a FluidInfusion,
    pub blood_loss_ml: f64,
    /// Bicarbonate given this tick (mEq/L)
    pub bicarbonate: f64,
    /// Extra lactate production not explained by perfusion (mmol/L/min)
    pub extra_lactate: f64,
    /// Present while the patient is intubated
    pub ventilator: Option<&'a VentilatorSettings>,
    pub body_surface_area: f64,
    pub now: Minutes,
    pub dt: Minutes,
}

/// 1.0 when MAP, cardiac index and saturation are all adequate
pub fn perfusion_adequacy(vitals: &VitalSigns, body_surface_area: f64) -> f64 {
    let pressure = vitals.map / 65.0;
    let flow = vitals.cardiac_index(body_surface_area) / 2.2;
    let oxygen = vitals.spo2 / 92.0;
    pressure.min(flow).min(oxygen).clamp(0.0, 1.2)
}

/// Winter's formula: expected pCO2 for a metabolic acidosis
pub fn expected_pco2(hco3: f64) -> f64 {
    1.5 * hco3 + 8.0
}

pub fn update_labs(labs: &LabValues, inputs: &LabInputs) -> LabValues {
    let dt = inputs.dt;
    let v = inputs.vitals;
    let mut next = labs.clone();

    // Lactate
    let lactate = labs.gasometry.lactate;
    let adequacy = perfusion_adequacy(v, inputs.body_surface_area);
    let mut lactate_change = if adequacy < 1.0 {
        (1.0 - adequacy) * 0.12 * dt
    } else {
        VitalsDelta::toward(lactate, 1.0, 0.015, dt)
    };
    lactate_change += inputs.extra_lactate * dt;
    next.gasometry.lactate = lactate + lactate_change;

    // Buffering and bicarbonate therapy
    next.gasometry.hco3 = labs.gasometry.hco3 - lactate_change + inputs.bicarbonate;

    // Ventilation
    let pco2_target = match inputs.ventilator {
        Some(vent) => {
            let minute_ventilation = vent.rate * vent.tidal_volume;
            40.0 * safe_div(16.0 * 450.0, minute_ventilation, 1.0)
        }
        // Compensation only ever lowers pCO2
        None => expected_pco2(next.gasometry.hco3).min(40.0),
    };
    next.gasometry.pco2 = labs.gasometry.pco2 + VitalsDelta::toward(labs.gasometry.pco2, pco2_target, 0.2, dt);
    next.gasometry.po2 = po2_from_spo2(v.spo2);

    // Renal markers
    let base = &inputs.baseline.chemistry;
    let hypoperfusion = ((65.0 - v.map) / 25.0).clamp(0.0, 2.0);
    let creatinine_target = base.creatinine * (1.0 + hypoperfusion);
    let c = &labs.chemistry;
    next.chemistry.creatinine = c.creatinine + VitalsDelta::toward(c.creatinine, creatinine_target, 0.003, dt);
    let urea_target = base.urea * (1.0 + hypoperfusion);
    next.chemistry.urea = c.urea + VitalsDelta::toward(c.urea, urea_target, 0.003, dt);

    // Hemoglobin: dilution, transfusion, hemorrhage with transcapillary refill
    let hb = labs.hematology.hemoglobin;
    let dilution = (inputs.infused.crystalloid * CRYSTALLOID_RETENTION + inputs.infused.colloid * COLLOID_RETENTION)
        / ESTIMATED_BLOOD_VOLUME_ML;
    let transfused = inputs.infused.blood / UNIT_ML * HB_PER_UNIT;
    let bled = hb * inputs.blood_loss_ml / ESTIMATED_BLOOD_VOLUME_ML * 0.3;
    next.hematology.hemoglobin = hb * (1.0 - dilution) + transfused - bled;

    // pH from the gas, then potassium shifts with acidemia
    next.clamp();
    next.gasometry.ph = henderson_hasselbalch_ph(next.gasometry.hco3, next.gasometry.pco2);
    let k_target = base.potassium + 0.4 * ((7.4 - next.gasometry.ph) / 0.1).max(0.0);
    next.chemistry.potassium = c.potassium + VitalsDelta::toward(c.potassium, k_target, 0.05, dt);

    next.clamp();
    next.touch(inputs.now);
    next
}
