//! Error types for the kgweave graph pipeline

use thiserror::Error;

/// Errors produced while turning text or JSON into graph data.
#[derive(Error, Debug)]
pub enum GraphError {
    /// A single unit of model output or a single import record could not be
    /// turned into a triple. Producers skip the unit and keep going.
    #[error("Malformed input '{unit}': {reason}")]
    MalformedInput { unit: String, reason: String },

    /// The top-level import value has neither a document nor a tuple-array shape.
    #[error("Malformed import: {0}")]
    MalformedImport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GraphError {
    pub(crate) fn malformed_input(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        GraphError::MalformedInput {
            unit: unit.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for graph pipeline operations
pub type GraphResult<T> = Result<T, GraphError>;
