//! Persistence error kinds

use thiserror::Error;

use crate::platform::StoreError;

/// Why a persistence operation failed
///
/// The boolean/`Option` facade methods log these and swallow them; the
/// `try_*` methods return them.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The durable store failed its startup write check
    #[error("durable storage unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    /// Null save target, non-object import bundle, ...
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Value could not be encoded, or stored text does not match the requested type
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A store primitive failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PersistError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        PersistError::InvalidInput(msg.into())
    }

    /// Whether the store rejected a write for lack of space
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, PersistError::Store(StoreError::QuotaExceeded { .. }))
    }
}
