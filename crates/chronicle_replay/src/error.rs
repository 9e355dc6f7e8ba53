//! Replay errors.

use chronicle_core::{CoreError, ObjectId};
use chronicle_source::SourceError;
use chronicle_storage::StoreError;

/// Result type for replay operations
pub type ReplayResult<T> = Result<T, ReplayError>;

/// Fatal replay failure
///
/// Snapshots committed before the failure stay in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// Reading from the commit source failed
    Source(SourceError),
    /// The snapshot store rejected a commit
    Store(StoreError),
    /// Submodule entry found while gitlinks are not skipped
    Gitlink {
        /// Path of the entry
        path: String,
        /// Commit in the other repository
        id: ObjectId,
    },
    /// Two tree entries flattened to the same path
    DuplicatePath {
        /// The colliding path
        path: String,
    },
    /// Failure while replaying a specific commit
    Commit {
        /// Commit being replayed
        id: ObjectId,
        /// Underlying failure
        error: Box<ReplayError>,
    },
}

impl ReplayError {
    /// Attach the commit being replayed
    #[must_use]
    pub fn in_commit(self, id: ObjectId) -> Self {
        Self::Commit {
            id,
            error: Box::new(self),
        }
    }

    /// Innermost error, without commit context
    #[must_use]
    pub fn root_cause(&self) -> &ReplayError {
        match self {
            Self::Commit { error, .. } => error.root_cause(),
            other => other,
        }
    }
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source(err) => write!(f, "Source error: {}", err),
            Self::Store(err) => write!(f, "Store error: {}", err),
            Self::Gitlink { path, id } => {
                write!(f, "Submodule entry {} points at foreign commit {}", path, id)
            }
            Self::DuplicatePath { path } => write!(f, "Tree contains {} more than once", path),
            Self::Commit { id, error } => write!(f, "Replay of commit {} failed: {}", id, error),
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Commit { error, .. } => Some(error.as_ref()),
            Self::Gitlink { .. } | Self::DuplicatePath { .. } => None,
        }
    }
}

impl From<SourceError> for ReplayError {
    fn from(err: SourceError) -> Self {
        Self::Source(err)
    }
}

impl From<StoreError> for ReplayError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<ReplayError> for CoreError {
    fn from(err: ReplayError) -> Self {
        match err {
            ReplayError::Source(err) => err.into(),
            ReplayError::Store(err) => err.into(),
            other => CoreError::Validation {
                field: "replay".to_string(),
                reason: other.to_string(),
            },
        }
    }
}
