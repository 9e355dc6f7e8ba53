//! Commit source errors.

use crate::object::ObjectKind;
use chronicle_core::{CoreError, ObjectId};

/// Result type for commit source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Commit source error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// Object is not present in the source
    #[error("Missing object: {id}")]
    MissingObject {
        /// Requested id
        id: ObjectId,
    },

    /// Object exists but has a different type than requested
    #[error("Object {id} is a {actual}, expected a {expected}")]
    WrongType {
        /// Requested id
        id: ObjectId,
        /// Type the caller asked for
        expected: ObjectKind,
        /// Type actually stored
        actual: ObjectKind,
    },

    /// Object could not be decoded
    #[error("Corrupt object {id}: {reason}")]
    Corrupt {
        /// Offending object
        id: ObjectId,
        /// Decoder message
        reason: String,
    },

    /// Annotated tag chain did not reach a non-tag object within the limit
    #[error("Tag chain starting at {start} exceeds {limit} levels")]
    PeelDepthExceeded {
        /// First object of the chain
        start: ObjectId,
        /// Configured limit
        limit: usize,
    },

    /// Failure inside the backing repository library
    #[error("Commit source error: {message}")]
    Backend {
        /// Library message
        message: String,
    },
}

impl SourceError {
    /// Missing objects and type mismatches: the object cannot serve as the
    /// requested type, but the source itself is healthy
    #[must_use]
    pub fn is_unresolvable(&self) -> bool {
        matches!(self, Self::MissingObject { .. } | Self::WrongType { .. })
    }

    /// Create a backend error from any displayable library error
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend {
            message: err.to_string(),
        }
    }
}

impl From<SourceError> for CoreError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::MissingObject { id } => CoreError::NotFound {
                kind: "Object".to_string(),
                id: id.to_hex(),
            },
            other => CoreError::Validation {
                field: "source".to_string(),
                reason: other.to_string(),
            },
        }
    }
}
