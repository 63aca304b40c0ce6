//! Error types for goma-core

use thiserror::Error;

/// Result type alias using goma-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in goma-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Local input contract violated; nothing was written or sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// Local storage engine failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Offline service used before initialization succeeded
    #[error("Offline store is not initialized")]
    NotInitialized,

    /// Material not found
    #[error("Material not found: {0}")]
    NotFound(String),

    /// Remote call failed due to network/timeout; recoverable via the
    /// offline fallback path
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// A queued operation was rejected on replay for a non-connectivity
    /// reason; halts that entity's queue until resolved manually
    #[error("Sync conflict: {0}")]
    SyncConflict(String),

    /// The remote API rejected a direct call for a non-connectivity reason
    #[error("Remote API error: {0}")]
    Remote(String),

    /// A write for this record is already in flight
    #[error("Write already in flight for material: {0}")]
    WriteInFlight(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
