//! Search expressions over snapshot history.

use crate::snapshot::StoredSnapshot;
use chronicle_core::SnapshotId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Composable query over stored snapshots
///
/// Expressions are plain data; evaluation lives in [`crate::QueryEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchExpression {
    /// Every stored snapshot
    AllSnapshots,
    /// Members of the inner result with no descendant inside that result
    TipOf(Box<SearchExpression>),
    /// A single snapshot by id
    Snapshot(SnapshotId),
    /// Members of the inner result and all of their ancestors
    AncestorsOf(Box<SearchExpression>),
    /// Snapshots whose message contains the text
    MessageContains(String),
    /// Members of either side
    Union(Box<SearchExpression>, Box<SearchExpression>),
}

impl SearchExpression {
    /// `AllSnapshots`
    #[must_use]
    pub const fn all() -> Self {
        Self::AllSnapshots
    }

    /// `Snapshot(id)`
    #[must_use]
    pub const fn snapshot(id: SnapshotId) -> Self {
        Self::Snapshot(id)
    }

    /// `MessageContains(text)`
    #[must_use]
    pub fn message_contains(text: impl Into<String>) -> Self {
        Self::MessageContains(text.into())
    }

    /// Tips of this expression's result
    #[must_use]
    pub fn tip(self) -> Self {
        Self::TipOf(Box::new(self))
    }

    /// This expression's result plus its ancestry
    #[must_use]
    pub fn ancestors(self) -> Self {
        Self::AncestorsOf(Box::new(self))
    }

    /// Union with another expression
    #[must_use]
    pub fn union(self, other: SearchExpression) -> Self {
        Self::Union(Box::new(self), Box::new(other))
    }
}

/// Evaluated search result, ordered by store sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    snapshots: Vec<Arc<StoredSnapshot>>,
}

impl SearchResults {
    /// Build from snapshots already in sequence order
    pub(crate) fn from_ordered(snapshots: Vec<Arc<StoredSnapshot>>) -> Self {
        Self { snapshots }
    }

    /// Number of matches
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether nothing matched
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Matches in sequence order
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<StoredSnapshot>> {
        self.snapshots.iter()
    }

    /// Ids of the matches in sequence order
    #[must_use]
    pub fn ids(&self) -> Vec<SnapshotId> {
        self.snapshots.iter().map(|s| s.id).collect()
    }

    /// Whether `id` is among the matches
    #[must_use]
    pub fn contains(&self, id: &SnapshotId) -> bool {
        self.snapshots.iter().any(|s| s.id == *id)
    }

    /// Earliest match
    #[must_use]
    pub fn first(&self) -> Option<&Arc<StoredSnapshot>> {
        self.snapshots.first()
    }

    /// Latest match
    #[must_use]
    pub fn last(&self) -> Option<&Arc<StoredSnapshot>> {
        self.snapshots.last()
    }

    /// Take the matches
    #[must_use]
    pub fn into_vec(self) -> Vec<Arc<StoredSnapshot>> {
        self.snapshots
    }
}

impl<'a> IntoIterator for &'a SearchResults {
    type Item = &'a Arc<StoredSnapshot>;
    type IntoIter = std::slice::Iter<'a, Arc<StoredSnapshot>>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.iter()
    }
}
