use thiserror::Error;

use crate::core::types::InterventionId;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Intervention not found: {0:?}")]
    InterventionNotFound(InterventionId),

    #[error("Intervention already completed: {0:?}")]
    InterventionCompleted(InterventionId),

    #[error("Intervention '{name}' unavailable with resource level {level}")]
    InterventionUnavailable { name: String, level: String },

    #[error("Unknown intervention agent: {0}")]
    UnknownAgent(String),

    #[error("Invalid patient data: {0}")]
    InvalidPatient(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Case already finished")]
    CaseFinished,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
