//! Snapshot store errors.

use crate::blob::BlobId;
use chronicle_core::{CoreError, SnapshotId};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Blob not found
    BlobNotFound {
        /// Requested address
        id: BlobId,
    },
    /// Blob larger than the configured limit
    BlobTooLarge {
        /// Path the content was committed under
        path: String,
        /// Content size
        size: usize,
        /// Configured limit
        limit: usize,
    },
    /// Path cannot be stored in a manifest
    InvalidPath {
        /// Offending path
        path: String,
        /// Why it was rejected
        reason: &'static str,
    },
    /// Snapshot id is not part of this store
    UnknownSnapshot {
        /// Requested id
        id: SnapshotId,
    },
    /// Snapshot id could not be derived
    Encoding {
        /// Encoder message
        reason: String,
    },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlobNotFound { id } => write!(f, "Blob not found: {}", id),
            Self::BlobTooLarge { path, size, limit } => {
                write!(f, "Blob too large at {}: {} bytes (limit: {})", path, size, limit)
            }
            Self::InvalidPath { path, reason } => write!(f, "Invalid path {:?}: {}", path, reason),
            Self::UnknownSnapshot { id } => write!(f, "Unknown snapshot: {}", id),
            Self::Encoding { reason } => write!(f, "Encoding error: {}", reason),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<CoreError> for StoreError {
    fn from(err: CoreError) -> Self {
        Self::Encoding {
            reason: err.to_string(),
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BlobNotFound { id } => CoreError::NotFound {
                kind: "Blob".to_string(),
                id: id.to_string(),
            },
            StoreError::UnknownSnapshot { id } => CoreError::NotFound {
                kind: "Snapshot".to_string(),
                id: id.to_string(),
            },
            StoreError::BlobTooLarge { size, limit, .. } => CoreError::CapacityExceeded {
                resource: format!("blob of {} bytes", size),
                limit: limit as u64,
            },
            other => CoreError::Validation {
                field: "store".to_string(),
                reason: other.to_string(),
            },
        }
    }
}
