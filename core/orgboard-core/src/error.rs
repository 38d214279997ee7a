//! Error types for orgboard-core operations.
//!
//! Most persistence failures are recovered locally and never reach callers:
//! the store's bias is availability over strict durability. Only
//! `NotFound`/`InvalidTarget` propagate, so the view layer can show a
//! rejected-operation message.

use thiserror::Error;

/// All errors that can occur in orgboard-core operations.
#[derive(Debug, Error)]
pub enum StoreError {
    // ─────────────────────────────────────────────────────────────────────
    // Persistence Errors (recovered internally, logged, never blocking)
    // ─────────────────────────────────────────────────────────────────────
    #[error("Durable storage unavailable: {details}")]
    StorageUnavailable { details: String },

    #[error("Persisted payload is not valid state: {details}")]
    Deserialization { details: String },

    #[error("Storage quota exceeded while writing {key}")]
    QuotaExceeded { key: String },

    // ─────────────────────────────────────────────────────────────────────
    // Mutation Errors (surfaced to the caller as rejected operations)
    // ─────────────────────────────────────────────────────────────────────
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: u64 },

    #[error("Invalid mutation target: {target}")]
    InvalidTarget { target: String },

    // ─────────────────────────────────────────────────────────────────────
    // Carrier Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Whether this error is a rejected mutation rather than a persistence
    /// problem.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound { .. } | StoreError::InvalidTarget { .. }
        )
    }
}

/// Convenience type alias for Results using StoreError.
pub type Result<T> = std::result::Result<T, StoreError>;
