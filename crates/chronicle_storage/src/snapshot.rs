//! Snapshot history over the content store.

use crate::blob::BlobId;
use crate::error::{StoreError, StoreResult};
use crate::query::QueryEngine;
use crate::search::{SearchExpression, SearchResults};
use crate::store::{ContentStore, StoreConfig, StoreStats};
use chronicle_core::{FlatContentMapping, Hash, Sequence, SnapshotId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A committed snapshot
///
/// The id is the hash of every other field, so two stores that receive the
/// same commits in the same order assign the same ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSnapshot {
    /// Content-derived id
    pub id: SnapshotId,
    /// Position in commit order, starting at zero
    pub sequence: Sequence,
    /// Parent snapshots
    pub parents: Vec<SnapshotId>,
    /// Commit message
    pub message: String,
    /// Path to blob address
    pub manifest: BTreeMap<String, BlobId>,
}

impl StoredSnapshot {
    /// Whether this snapshot starts a history
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Number of paths in the manifest
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.manifest.len()
    }

    /// Blob stored under `path`
    #[must_use]
    pub fn blob_for(&self, path: &str) -> Option<&BlobId> {
        self.manifest.get(path)
    }

    /// First line of the message
    #[must_use]
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

#[derive(Serialize)]
struct SnapshotIdInput<'a> {
    sequence: Sequence,
    parents: &'a [SnapshotId],
    message: &'a str,
    manifest: &'a BTreeMap<String, BlobId>,
}

/// In-memory snapshot repository
///
/// Snapshots are kept in commit order. The head is not tracked here; callers
/// pass the parent explicitly on every commit.
#[derive(Debug, Default)]
pub struct SnapshotRepo {
    content: ContentStore,
    snapshots: IndexMap<SnapshotId, Arc<StoredSnapshot>>,
}

impl SnapshotRepo {
    /// Create an empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create with custom configuration
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            content: ContentStore::with_config(config),
            snapshots: IndexMap::new(),
        }
    }

    /// Commit `mapping` on top of `head`
    ///
    /// Validation happens before anything is written, so a rejected commit
    /// leaves the repository untouched.
    ///
    /// # Errors
    ///
    /// Returns error if `head` is not part of this repository, a path is
    /// invalid, or a blob exceeds the configured size limit
    pub fn commit(
        &mut self,
        head: Option<&SnapshotId>,
        mapping: FlatContentMapping,
        message: &str,
    ) -> StoreResult<Arc<StoredSnapshot>> {
        if let Some(head) = head {
            if !self.snapshots.contains_key(head) {
                return Err(StoreError::UnknownSnapshot { id: *head });
            }
        }
        for (path, content) in mapping.iter() {
            validate_path(path)?;
            self.content.check_size(path, content.len())?;
        }

        let mut manifest = BTreeMap::new();
        for (path, content) in mapping {
            let id = self.content.write(&path, content)?;
            manifest.insert(path, id);
        }

        let sequence = Sequence::from_raw(self.snapshots.len() as u64);
        let parents: Vec<SnapshotId> = head.into_iter().copied().collect();
        let id = SnapshotId::from_hash(Hash::of_encoded(&SnapshotIdInput {
            sequence,
            parents: &parents,
            message,
            manifest: &manifest,
        })?);

        let snapshot = Arc::new(StoredSnapshot {
            id,
            sequence,
            parents,
            message: message.to_string(),
            manifest,
        });
        self.snapshots.insert(id, Arc::clone(&snapshot));

        tracing::debug!(
            snapshot = %id.short(),
            %sequence,
            entries = snapshot.entry_count(),
            "committed snapshot"
        );
        Ok(snapshot)
    }

    /// Materialize the full content of a snapshot
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot is unknown or a blob is missing
    pub fn checkout(&self, id: &SnapshotId) -> StoreResult<FlatContentMapping> {
        let snapshot = self.get(id).ok_or(StoreError::UnknownSnapshot { id: *id })?;
        let mut mapping = FlatContentMapping::new();
        for (path, blob_id) in &snapshot.manifest {
            let blob = self.content.read(blob_id)?;
            mapping.insert(path.as_str(), blob.as_bytes());
        }
        Ok(mapping)
    }

    /// Evaluate a search expression
    ///
    /// # Errors
    ///
    /// Returns error if the expression names an unknown snapshot
    pub fn search(&self, expression: &SearchExpression) -> StoreResult<SearchResults> {
        QueryEngine::new(self).evaluate(expression)
    }

    /// Look up a snapshot
    #[must_use]
    pub fn get(&self, id: &SnapshotId) -> Option<&Arc<StoredSnapshot>> {
        self.snapshots.get(id)
    }

    /// Whether `id` is part of this repository
    #[must_use]
    pub fn contains(&self, id: &SnapshotId) -> bool {
        self.snapshots.contains_key(id)
    }

    /// Snapshot at a given sequence number
    #[must_use]
    pub fn at(&self, sequence: Sequence) -> Option<&Arc<StoredSnapshot>> {
        let index = usize::try_from(sequence.as_u64()).ok()?;
        self.snapshots.get_index(index).map(|(_, snapshot)| snapshot)
    }

    /// Snapshots in commit order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<StoredSnapshot>> {
        self.snapshots.values()
    }

    /// Most recently committed snapshot
    #[must_use]
    pub fn latest(&self) -> Option<&Arc<StoredSnapshot>> {
        self.snapshots.last().map(|(_, snapshot)| snapshot)
    }

    /// Number of snapshots
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether nothing has been committed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Underlying content store
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    /// Content store statistics
    #[must_use]
    pub fn stats(&self) -> &StoreStats {
        self.content.stats()
    }
}

fn validate_path(path: &str) -> StoreResult<()> {
    let reason = if path.is_empty() {
        "empty path"
    } else if path.starts_with('/') {
        "leading slash"
    } else if path.split('/').any(str::is_empty) {
        "empty segment"
    } else if path.split('/').any(|segment| segment == "." || segment == "..") {
        "relative segment"
    } else {
        return Ok(());
    };
    Err(StoreError::InvalidPath {
        path: path.to_string(),
        reason,
    })
}
