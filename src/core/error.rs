use thiserror::Error;

/// Core error types for nftgrid
///
/// Validation findings are data ([`Finding`](crate::core::checks::Finding)),
/// never errors; this enum covers I/O, parsing, and document-level failures.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Document storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Chain generation requires at least one interface
    #[error("No network interfaces listed, detect them first")]
    NoInterfaces,

    /// Input validation failed
    #[error("Validation error in {field}: {message}")]
    Validation { field: String, message: String },

    /// Internal logic error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Document-storage specific errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid document name: {0}")]
    InvalidName(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Data directory not available")]
    DataDirUnavailable,
}

pub type Result<T> = std::result::Result<T, Error>;
