//! Centralized error types for the sync engine.

use thiserror::Error;

/// Main error type for sync operations.
///
/// Variants map onto the handling policy each kind of failure gets:
/// transient and rate-limit errors are retried inside the client, validation
/// and persistence errors are counted and skipped, checkpoint corruption is
/// fatal for its phase until an operator resets it.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Transient network error: {0}")]
    Transient(String),

    #[error("Rate limit exceeded (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Permanent error: {0}")]
    Permanent(String),

    #[error("Invalid record: {0}")]
    DataValidation(String),

    #[error("Checkpoint corrupt for phase '{phase}': {reason}")]
    CheckpointCorruption { phase: String, reason: String },

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Deadline exceeded waiting for {0}")]
    DeadlineExceeded(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    /// Create a transient network error.
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    /// Create a permanent error.
    pub fn permanent(msg: impl Into<String>) -> Self {
        Self::Permanent(msg.into())
    }

    /// Create a validation error for a malformed record.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::DataValidation(msg.into())
    }

    /// Create a persistence failure.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Whether the client should retry the request that produced this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::RateLimited { .. })
    }
}
