//! Error types for membank

use thiserror::Error;

/// Main error type for membank operations
#[derive(Error, Debug)]
pub enum MembankError {
    /// Content store errors (file system, blob access)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Index document errors (load/save/corruption)
    #[error("Index error: {0}")]
    Index(String),

    /// On-disk record parsing errors
    #[error("Record error: {0}")]
    Record(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No memory matched the given id or prefix
    #[error("Memory not found: {0}")]
    NotFound(String),

    /// Malformed TTL specification
    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),

    /// Unknown priority value
    #[error("Invalid priority: {0}")]
    InvalidPriority(String),

    /// Invalid operation arguments
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Merge preconditions not met
    #[error("Merge error: {0}")]
    Merge(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for membank operations
pub type Result<T> = std::result::Result<T, MembankError>;
