use thiserror::Error;

/// Errors emitted by the simulation and its sinks.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("id space exhausted: {0}")]
    IdSpaceExhausted(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("warehouse error: {0}")]
    Warehouse(String),
    #[error(transparent)]
    Core(#[from] schoolforge_core::Error),
}
