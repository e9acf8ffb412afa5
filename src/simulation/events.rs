//! Events raised during one tick, for the case log

use serde::{Deserialize, Serialize};

use crate::core::types::{InterventionId, Minutes};
use crate::shock::{AtlsClass, MixedComponent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimulationEvent {
    InterventionStarted {
        id: InterventionId,
        name: String,
        at: Minutes,
    },
    InterventionCompleted {
        id: InterventionId,
        name: String,
        at: Minutes,
    },
    ObstructionRelieved {
        procedure: String,
        at: Minutes,
    },
    ProcedureComplication {
        procedure: String,
        description: String,
        at: Minutes,
    },
    AtlsClassChanged {
        from: AtlsClass,
        to: AtlsClass,
        at: Minutes,
    },
    MixedPatternChanged {
        components: Vec<MixedComponent>,
        at: Minutes,
    },
    OutcomeReached {
        outcome: String,
        at: Minutes,
    },
}
