// Typed errors returned to callers
use thiserror::Error;

/// Errors the engine hands back to callers. None of these are fatal to the
/// process; each maps to a distinct HTTP status at the presentation boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("insufficient data for {parameter}: need at least {needed} samples, got {got}")]
    InsufficientData {
        parameter: &'static str,
        needed: usize,
        got: usize,
    },

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl EngineError {
    pub fn dataset_not_found(id: impl Into<String>) -> Self {
        EngineError::NotFound { entity: "dataset", id: id.into() }
    }

    pub fn run_not_found(id: impl Into<String>) -> Self {
        EngineError::NotFound { entity: "correlation run", id: id.into() }
    }

    /// Stable machine-readable kind, used in the HTTP error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation_error",
            EngineError::UnsupportedFormat(_) => "unsupported_format",
            EngineError::NotFound { .. } => "not_found",
            EngineError::InsufficientData { .. } => "insufficient_data",
            EngineError::Storage(_) => "storage_error",
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
