//! Bedside alerts (values out of range) and warnings (treatment context)

use crate::patient::Patient;
use crate::physiology::{LabValues, VitalSigns};
use crate::shock::{classify_fluid_tolerance, FluidTolerance, ShockType, SubtypeState};
use crate::simulation::state::SimulationState;
use crate::treatment::{InterventionKind, Procedure};

/// Values out of range, most dangerous first
pub fn generate_alerts(vitals: &VitalSigns, labs: &LabValues) -> Vec<String> {
    let mut alerts = Vec::new();
    if vitals.map < 65.0 {
        alerts.push(format!("Hipotensão: PAM {:.0} mmHg", vitals.map));
    }
    if vitals.spo2 < 90.0 {
        alerts.push(format!("Hipoxemia: SpO2 {:.0}%", vitals.spo2));
    }
    if vitals.heart_rate > 130.0 {
        alerts.push(format!("Taquicardia: FC {:.0} bpm", vitals.heart_rate));
    } else if vitals.heart_rate < 50.0 {
        alerts.push(format!("Bradicardia: FC {:.0} bpm", vitals.heart_rate));
    }
    if labs.gasometry.lactate > 2.0 {
        alerts.push(format!("Hiperlactatemia: lactato {:.1} mmol/L", labs.gasometry.lactate));
    }
    if labs.gasometry.ph < 7.2 {
        alerts.push(format!("Acidemia grave: pH {:.2}", labs.gasometry.ph));
    }
    let k = labs.chemistry.potassium;
    if k > 6.0 {
        alerts.push(format!("Hipercalemia: K {:.1} mEq/L", k));
    } else if k < 3.0 {
        alerts.push(format!("Hipocalemia: K {:.1} mEq/L", k));
    }
    if vitals.cardiac_output < 2.5 {
        alerts.push(format!("Baixo débito: DC {:.1} L/min", vitals.cardiac_output));
    }
    alerts
}

/// Contextual warnings about the current treatment
pub fn generate_warnings(state: &SimulationState, patient: &Patient) -> Vec<String> {
    let mut warnings = Vec::new();
    let oliguria_ml_h = 0.5 * state.config.weight_kg;
    if state.minutes() > 0.0 && state.fluid_balance.urine_rate_ml_h < oliguria_ml_h {
        warnings.push(format!("Oligúria: diurese {:.0} mL/h", state.fluid_balance.urine_rate_ml_h));
    }
    if state.fluid_balance.net_balance > 3000.0 {
        warnings.push(format!(
            "Balanço hídrico positivo: {:+.0} mL",
            state.fluid_balance.net_balance
        ));
    }

    let fluid_running = state
        .running_interventions()
        .any(|i| matches!(i.kind, InterventionKind::Fluid(_)));
    if fluid_running && classify_fluid_tolerance(&state.vitals) >= FluidTolerance::HighRisk {
        warnings.push("Risco de congestão pulmonar com volume".to_string());
    }

    match (&patient.shock_type, &state.subtype) {
        (ShockType::Hypovolemic, Some(SubtypeState::Hypovolemic { .. })) => {
            let controlled = state.interventions.iter().any(|i| {
                i.kind == InterventionKind::Procedure(Procedure::HemorrhageControl) && i.ran_to_completion()
            });
            if !controlled {
                warnings.push("Sangramento ativo não controlado".to_string());
            }
        }
        (ShockType::Obstructive(_), Some(sub)) if sub.relief().is_none() => {
            warnings.push("Obstrução não aliviada: tratamento clínico é apenas ponte".to_string());
            if state.ventilation_offset < 0.0 {
                warnings.push("Ventilação com pressão positiva reduzindo o débito cardíaco".to_string());
            }
        }
        _ => {}
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_values_no_alerts() {
        assert!(generate_alerts(&VitalSigns::normal(), &LabValues::normal()).is_empty());
    }

    #[test]
    fn test_hypotension_alert_first() {
        let mut v = VitalSigns::normal();
        v.set_pressures_from_map(55.0, 30.0);
        v.spo2 = 85.0;
        let alerts = generate_alerts(&v, &LabValues::normal());
        assert_eq!(alerts.len(), 2);
        assert!(alerts[0].starts_with("Hipotensão"));
    }
}
