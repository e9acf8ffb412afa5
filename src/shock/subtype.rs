//! Archetype-specific state that persists between ticks

use serde::{Deserialize, Serialize};

use crate::shock::hypovolemic::{atls_class, AtlsClass, DEFAULT_BLEED_RATE_ML_MIN};
use crate::shock::mixed::MixedComponent;
use crate::shock::obstructive::Relief;
use crate::physiology::VitalSigns;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SubtypeState {
    Hypovolemic {
        /// Uncontrolled hemorrhage, mL/min
        bleed_rate_ml_min: f64,
        /// Last estimated ATLS class, for transition logging
        atls: AtlsClass,
    },
    Obstructive {
        relief: Option<Relief>,
    },
    Mixed {
        components: Vec<MixedComponent>,
    },
}

impl SubtypeState {
    pub fn hypovolemic(vitals: &VitalSigns) -> Self {
        SubtypeState::Hypovolemic {
            bleed_rate_ml_min: DEFAULT_BLEED_RATE_ML_MIN,
            atls: atls_class(vitals),
        }
    }

    pub fn obstructive() -> Self {
        SubtypeState::Obstructive { relief: None }
    }

    pub fn relief(&self) -> Option<&Relief> {
        match self {
            SubtypeState::Obstructive { relief } => relief.as_ref(),
            _ => None,
        }
    }
}
