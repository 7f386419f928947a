//! Storage errors and their mapping onto governance errors

use kpi_types::GovernanceError;
use thiserror::Error;

/// Storage-specific errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Compare-and-swap lost against a concurrent writer
    #[error("Version conflict on {key}: expected {expected}, found {found}")]
    VersionConflict {
        key: String,
        expected: u64,
        found: u64,
    },

    /// Item already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Version conflicts are resolved by the engine, which re-reads the
/// submission and reports the status the caller lost against.
impl From<StorageError> for GovernanceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => GovernanceError::NotFound(what),
            StorageError::Conflict(what) => GovernanceError::InvalidCatalog(what),
            other => GovernanceError::Storage(other.to_string()),
        }
    }
}
