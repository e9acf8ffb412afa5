//! Interventions: catalog, lifecycle, per-tick effects

pub mod catalog;
pub mod composer;
pub mod intervention;
pub mod medication;
pub mod ventilation;

pub use catalog::{
    AgentDefaults, DefinitiveIntervention, FluidType, Inotrope, InterventionClass, InterventionKind, Medication,
    Procedure, Vasopressor,
};
pub use composer::{compose_treatment_effects, TreatmentEffect};
pub use intervention::{intervention_flags, ActiveIntervention, InterventionRequest, InterventionStatus, StatusChange};
pub use medication::{medication_effect, oxygen_spo2_delta, MedicationEffect, ROOM_AIR_FIO2};
pub use ventilation::{ventilation_coupling, VentilationCoupling, VentilatorSettings};
