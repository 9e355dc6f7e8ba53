//! Query evaluation against a snapshot repository.

use crate::error::{StoreError, StoreResult};
use crate::search::{SearchExpression, SearchResults};
use crate::snapshot::{SnapshotRepo, StoredSnapshot};
use chronicle_core::{FlatContentMapping, Sequence, SnapshotId};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

type Matches = BTreeMap<Sequence, Arc<StoredSnapshot>>;

/// Read-only evaluator over a [`SnapshotRepo`]
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine<'a> {
    repo: &'a SnapshotRepo,
}

impl<'a> QueryEngine<'a> {
    /// Create an engine borrowing `repo`
    #[must_use]
    pub const fn new(repo: &'a SnapshotRepo) -> Self {
        Self { repo }
    }

    /// Evaluate `expression`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownSnapshot`] if the expression names a
    /// snapshot that is not in the repository
    pub fn evaluate(&self, expression: &SearchExpression) -> StoreResult<SearchResults> {
        let matches = self.eval(expression)?;
        Ok(SearchResults::from_ordered(matches.into_values().collect()))
    }

    /// Tips of the whole history
    #[must_use]
    pub fn tips(&self) -> SearchResults {
        let all = self.all();
        SearchResults::from_ordered(self.tips_of(all).into_values().collect())
    }

    /// Materialize a snapshot
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot is unknown or a blob is missing
    pub fn checkout(&self, id: &SnapshotId) -> StoreResult<FlatContentMapping> {
        self.repo.checkout(id)
    }

    fn eval(&self, expression: &SearchExpression) -> StoreResult<Matches> {
        match expression {
            SearchExpression::AllSnapshots => Ok(self.all()),
            SearchExpression::TipOf(inner) => Ok(self.tips_of(self.eval(inner)?)),
            SearchExpression::Snapshot(id) => {
                let snapshot = self
                    .repo
                    .get(id)
                    .ok_or(StoreError::UnknownSnapshot { id: *id })?;
                Ok(Matches::from([(snapshot.sequence, Arc::clone(snapshot))]))
            }
            SearchExpression::AncestorsOf(inner) => Ok(self.ancestors_of(self.eval(inner)?)),
            SearchExpression::MessageContains(text) => Ok(self
                .repo
                .iter()
                .filter(|s| s.message.contains(text.as_str()))
                .map(|s| (s.sequence, Arc::clone(s)))
                .collect()),
            SearchExpression::Union(left, right) => {
                let mut matches = self.eval(left)?;
                matches.extend(self.eval(right)?);
                Ok(matches)
            }
        }
    }

    fn all(&self) -> Matches {
        self.repo
            .iter()
            .map(|s| (s.sequence, Arc::clone(s)))
            .collect()
    }

    fn tips_of(&self, mut set: Matches) -> Matches {
        let mut stack: Vec<SnapshotId> = set
            .values()
            .flat_map(|s| s.parents.iter().copied())
            .collect();
        let mut seen = HashSet::new();

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(snapshot) = self.repo.get(&id) {
                set.remove(&snapshot.sequence);
                stack.extend(snapshot.parents.iter().copied());
            }
        }
        set
    }

    fn ancestors_of(&self, set: Matches) -> Matches {
        let mut stack: Vec<SnapshotId> = set.values().map(|s| s.id).collect();
        let mut out = Matches::new();

        while let Some(id) = stack.pop() {
            let Some(snapshot) = self.repo.get(&id) else {
                continue;
            };
            if out.insert(snapshot.sequence, Arc::clone(snapshot)).is_none() {
                stack.extend(snapshot.parents.iter().copied());
            }
        }
        out
    }
}
