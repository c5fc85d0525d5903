//! Diagram persistence.
//!
//! Only the [`Diagram`] is stored. View state, selection, layers, and
//! history are session data and are rebuilt when a diagram is opened.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use crate::diagram::Diagram;
use crate::error::EngineError;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Diagram not found: {0}")]
    NotFound(String),
    #[error("Stored diagram is invalid: {0}")]
    Invalid(#[from] EngineError),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Storage error: {0}")]
    Other(String),
}

impl StorageError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future so backends can be used behind `dyn Storage`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A place diagrams can be saved to and loaded from, keyed by a string id.
pub trait Storage: Send + Sync {
    /// Save a diagram, replacing any previous one with the same id.
    fn save(&self, id: &str, diagram: &Diagram) -> BoxFuture<'_, StorageResult<()>>;

    /// Load and validate a diagram.
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Diagram>>;

    /// Delete a diagram. Deleting a missing id is not an error.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// All stored ids, sorted.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a diagram exists.
    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>>;
}
