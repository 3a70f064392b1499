//! Crate error types.

use thiserror::Error;

/// Errors surfaced by every fallible stratadb operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage layer error. Fatal to the current operation, propagated
    /// unchanged.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Record not found on a direct primary-key lookup. Scans treat an
    /// absent index or record as zero results instead.
    #[error("record not found")]
    NotFound,

    /// Write-write conflict detected by the store. Retryable by the caller;
    /// never retried internally.
    #[error("transaction conflict")]
    Conflict,

    /// A value with no ordering-preserving encoding for its declared kind.
    #[error("unsupported encoding: {0}")]
    EncodingUnsupported(String),

    /// Malformed query or identifier.
    #[error("usage error: {0}")]
    Usage(String),

    /// Record payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record payload could not be deserialized.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Key decoding error.
    #[error("invalid key format")]
    InvalidKey,
}
