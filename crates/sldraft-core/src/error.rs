//! Error types for the editing engine.

use thiserror::Error;

/// Errors reported by model, history, and layer operations.
///
/// Every variant is recoverable: a rejected operation leaves the diagram,
/// the history stacks, and the layer index exactly as they were.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Duplicate id: {0}")]
    DuplicateId(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Dangling reference: {0}")]
    DanglingReference(String),
    #[error("Layer is locked: {0}")]
    LayerLocked(String),
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("Layer still owns {count} component(s): {layer}")]
    LayerNotEmpty { layer: String, count: usize },
    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Unknown catalog template: {0}")]
    UnknownTemplate(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
