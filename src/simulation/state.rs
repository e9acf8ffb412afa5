//! Simulation state: the single value the driver owns and replaces each tick

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::clock::SimClock;
use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{InterventionId, Minutes, ResourceLevel};
use crate::outcome::{CriticalStateTracker, OutcomeResult, SessionMetrics};
use crate::patient::Patient;
use crate::physiology::{FluidBalance, HemodynamicState, LabValues, VitalSigns};
use crate::shock::SubtypeState;
use crate::simulation::alerts::{generate_alerts, generate_warnings};
use crate::simulation::events::SimulationEvent;
use crate::treatment::{ActiveIntervention, InterventionRequest, VentilatorSettings};

/// Stream used for in-case rolls, kept apart from patient randomization
const EVENT_STREAM: u64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationState {
    // === PHYSIOLOGY ===
    pub vitals: VitalSigns,
    pub labs: LabValues,
    pub hemodynamics: HemodynamicState,
    pub fluid_balance: FluidBalance,

    // === TREATMENT ===
    pub interventions: Vec<ActiveIntervention>,
    pub next_id: InterventionId,
    pub resource_level: ResourceLevel,
    pub ventilator: VentilatorSettings,
    /// CO currently removed (or added) by positive-pressure ventilation
    pub ventilation_offset: f64,

    // === TIME & STABILITY ===
    pub clock: SimClock,
    pub is_stable: bool,
    /// Contiguous minutes meeting the resolution criteria
    pub stability_duration: Minutes,

    // === DISPLAY ===
    pub alerts: Vec<String>,
    pub warnings: Vec<String>,
    /// Raised during the last tick
    pub events: Vec<SimulationEvent>,

    // === MODEL STATE ===
    pub subtype: Option<SubtypeState>,
    pub tracker: CriticalStateTracker,
    pub outcome: OutcomeResult,
    pub metrics: SessionMetrics,
    pub config: SimulationConfig,
    rng: ChaCha8Rng,
}

impl SimulationState {
    /// Case start from a built patient. A weight on the case overrides
    /// the configured default.
    pub fn new(patient: &Patient, mut config: SimulationConfig) -> Self {
        if let Some(weight_kg) = patient.data.weight_kg {
            config.weight_kg = weight_kg;
        }
        let profile = &patient.profile;
        let mut labs = profile.labs.clone();
        labs.touch(0.0);

        let mut rng = ChaCha8Rng::seed_from_u64(patient.data.effective_seed());
        rng.set_stream(EVENT_STREAM);

        let mut state = Self {
            vitals: profile.vitals.clone(),
            hemodynamics: profile.hemodynamics.clone(),
            fluid_balance: FluidBalance::new(),
            interventions: Vec::new(),
            next_id: InterventionId::new(1),
            resource_level: patient.data.resource_level,
            ventilator: VentilatorSettings::default(),
            ventilation_offset: 0.0,
            clock: SimClock::new(config.speed_multiplier),
            is_stable: false,
            stability_duration: 0.0,
            alerts: Vec::new(),
            warnings: Vec::new(),
            events: Vec::new(),
            subtype: patient.shock_type.initial_subtype_state(&profile.vitals),
            tracker: CriticalStateTracker::new(),
            outcome: OutcomeResult::Ongoing,
            metrics: SessionMetrics::new(&profile.vitals, &labs),
            labs,
            config,
            rng,
        };
        state.refresh_display(patient);
        state
    }

    pub fn minutes(&self) -> Minutes {
        self.clock.sim_minutes()
    }

    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    pub fn running_interventions(&self) -> impl Iterator<Item = &ActiveIntervention> {
        self.interventions.iter().filter(|i| i.is_running())
    }

    pub fn intervention(&self, id: InterventionId) -> Option<&ActiveIntervention> {
        self.interventions.iter().find(|i| i.id == id)
    }

    /// Place an order. Defaults come from the catalog; no dose-range checks.
    pub fn start_intervention(&mut self, request: InterventionRequest) -> Result<InterventionId> {
        if self.outcome.is_terminal() {
            return Err(SimError::CaseFinished);
        }
        if !request.kind.is_available(self.resource_level) {
            return Err(SimError::InterventionUnavailable {
                name: request.kind.name().to_string(),
                level: self.resource_level.to_string(),
            });
        }

        let id = self.next_id;
        self.next_id = id.next();
        let now = self.minutes();
        let intervention = ActiveIntervention::from_request(id, &request, now);
        info!(
            id = id.0,
            name = %intervention.name,
            dose = ?intervention.dose,
            start = intervention.start_time,
            "intervention ordered"
        );
        self.interventions.push(intervention);
        self.metrics.interventions_ordered += 1;
        Ok(id)
    }

    pub fn stop_intervention(&mut self, id: InterventionId) -> Result<()> {
        let now = self.minutes();
        let intervention = self.find_open(id)?;
        intervention.stop(now);
        info!(id = id.0, name = %intervention.name, at = now, "intervention stopped");
        Ok(())
    }

    pub fn adjust_dose(&mut self, id: InterventionId, dose: f64) -> Result<()> {
        let intervention = self.find_open(id)?;
        info!(id = id.0, name = %intervention.name, from = ?intervention.dose, to = dose, "dose adjusted");
        intervention.dose = Some(dose);
        Ok(())
    }

    pub fn set_ventilator(&mut self, settings: VentilatorSettings) {
        self.ventilator = settings;
    }

    fn find_open(&mut self, id: InterventionId) -> Result<&mut ActiveIntervention> {
        let intervention = self
            .interventions
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(SimError::InterventionNotFound(id))?;
        if intervention.is_completed() {
            return Err(SimError::InterventionCompleted(id));
        }
        Ok(intervention)
    }

    /// Regenerate alerts and warnings from the current values
    pub(crate) fn refresh_display(&mut self, patient: &Patient) {
        self.alerts = generate_alerts(&self.vitals, &self.labs);
        self.warnings = generate_warnings(self, patient);
    }
}
