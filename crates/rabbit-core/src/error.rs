use thiserror::Error;

/// Result type for validation and parsing of core types.
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("malformed short code: {0}")]
    MalformedCode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid content hash: {0}")]
    InvalidHash(String),
}

/// Errors raised by mapping store backends.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// A uniqueness constraint rejected the write.
    #[error("mapping already exists: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

/// Errors raised by sequence issuer backends.
///
/// Every variant is retryable from the caller's point of view. A failed call
/// may still have advanced the counter, so a retry never reuses a value.
#[derive(Debug, Clone, Error)]
pub enum SequenceError {
    #[error("sequence backend unavailable: {0}")]
    Unavailable(String),
    #[error("sequence operation timed out: {0}")]
    Timeout(String),
    #[error("sequence backend error: {0}")]
    Backend(String),
    #[error("sequence value is invalid: {0}")]
    InvalidData(String),
    #[error("sequence exhausted")]
    Exhausted,
}

/// Errors raised by existence guard backends.
#[derive(Debug, Clone, Error)]
pub enum GuardError {
    #[error("guard backend unavailable: {0}")]
    Unavailable(String),
    #[error("guard initialization failed: {0}")]
    Initialization(String),
    #[error("guard operation failed: {0}")]
    Operation(String),
}
