//! Reference resolution into seed commits.

use crate::error::ReplayResult;
use chronicle_core::ObjectId;
use chronicle_source::{CommitSource, DEFAULT_PEEL_DEPTH, RepositoryReference};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A reference that resolved to a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRef {
    /// Reference name
    pub name: String,
    /// Commit reached by peeling
    pub commit: ObjectId,
}

/// Turns repository references into the seed commits of a replay
///
/// References whose target is missing or is not a commit (for example a tag
/// pointing at a tree) are skipped. Any other source failure is fatal.
pub struct RefResolver<'s, S: ?Sized> {
    source: &'s S,
    peel_depth: usize,
}

impl<'s, S: CommitSource + ?Sized> RefResolver<'s, S> {
    /// Create a resolver with the default peel depth
    #[must_use]
    pub fn new(source: &'s S) -> Self {
        Self {
            source,
            peel_depth: DEFAULT_PEEL_DEPTH,
        }
    }

    /// Limit the number of annotated tags followed per reference
    #[must_use]
    pub fn with_peel_depth(mut self, depth: usize) -> Self {
        self.peel_depth = depth;
        self
    }

    /// Resolve a single reference
    ///
    /// Returns `None` when the reference does not lead to a commit.
    ///
    /// # Errors
    ///
    /// Returns error on source failures other than a missing or mistyped
    /// target, including tag chains deeper than the peel limit
    pub fn resolve_reference(
        &self,
        reference: &RepositoryReference,
    ) -> ReplayResult<Option<ObjectId>> {
        let peeled = match self.source.peel_reference(reference, self.peel_depth) {
            Ok(peeled) => peeled,
            Err(e) if e.is_unresolvable() => {
                tracing::debug!(reference = %reference.name, error = %e, "skipping unpeelable reference");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let target = peeled.effective_target();
        match self.source.load_commit(&target) {
            Ok(commit) => Ok(Some(commit.id)),
            Err(e) if e.is_unresolvable() => {
                tracing::debug!(reference = %reference.name, object = %target, error = %e, "skipping non-commit reference");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Every reference that resolves to a commit, in enumeration order
    ///
    /// # Errors
    ///
    /// Returns error if references cannot be enumerated or a fatal source
    /// failure occurs while resolving one
    pub fn resolve_references(&self) -> ReplayResult<Vec<ResolvedRef>> {
        let mut resolved = Vec::new();
        for reference in self.source.references()? {
            if let Some(commit) = self.resolve_reference(&reference)? {
                resolved.push(ResolvedRef {
                    name: reference.name,
                    commit,
                });
            }
        }
        Ok(resolved)
    }

    /// Distinct seed commits in first-seen order
    ///
    /// # Errors
    ///
    /// See [`Self::resolve_references`]
    pub fn seeds(&self) -> ReplayResult<Vec<ObjectId>> {
        let seeds: IndexSet<ObjectId> = self
            .resolve_references()?
            .into_iter()
            .map(|resolved| resolved.commit)
            .collect();
        Ok(seeds.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReplayError;
    use chronicle_core::CommitTime;
    use chronicle_source::{MemorySource, SourceError};

    fn two_commits() -> (MemorySource, ObjectId, ObjectId) {
        let mut source = MemorySource::new();
        let tree = source.add_files([("a.txt", "1")]);
        let c1 = source.add_commit(tree, &[], CommitTime::from_secs(100), "c1");
        let c2 = source.add_commit(tree, &[c1], CommitTime::from_secs(200), "c2");
        (source, c1, c2)
    }

    #[test]
    fn test_annotated_branch_and_tree_tag() {
        let (mut source, c1, c2) = two_commits();
        let tag = source.add_tag(c1, "v1");
        source.set_reference("refs/tags/v1", tag);
        source.set_reference("refs/heads/main", c2);
        let tree = source.add_files([("only.txt", "x")]);
        let tree_tag = source.add_tag(tree, "tree");
        source.set_reference("refs/tags/tree", tree_tag);

        let seeds = RefResolver::new(&source).seeds().unwrap();
        assert_eq!(seeds, vec![c1, c2]);
    }

    #[test]
    fn test_seeds_are_distinct() {
        let (mut source, _, c2) = two_commits();
        source.set_reference("HEAD", c2);
        source.set_reference("refs/heads/main", c2);
        let tag = source.add_tag(c2, "v2");
        source.set_reference("refs/tags/v2", tag);

        let resolver = RefResolver::new(&source);
        assert_eq!(resolver.resolve_references().unwrap().len(), 3);
        assert_eq!(resolver.seeds().unwrap(), vec![c2]);
    }

    #[test]
    fn test_nested_tags_resolve() {
        let (mut source, c1, _) = two_commits();
        let inner = source.add_tag(c1, "inner");
        let outer = source.add_tag(inner, "outer");
        source.set_reference("refs/tags/outer", outer);

        assert_eq!(RefResolver::new(&source).seeds().unwrap(), vec![c1]);
    }

    #[test]
    fn test_dangling_reference_skipped() {
        let (mut source, c1, _) = two_commits();
        let gone = source.add_blob("temporary");
        source.remove_object(&gone);
        source.set_reference("refs/heads/gone", gone);
        source.set_reference("refs/heads/main", c1);

        assert_eq!(RefResolver::new(&source).seeds().unwrap(), vec![c1]);
    }

    #[test]
    fn test_blob_reference_skipped() {
        let (mut source, _, _) = two_commits();
        let blob = source.add_blob("not a commit");
        source.set_reference("refs/tags/blob", blob);

        assert!(RefResolver::new(&source).seeds().unwrap().is_empty());
    }

    #[test]
    fn test_peel_limit_is_fatal() {
        let (mut source, c1, _) = two_commits();
        let inner = source.add_tag(c1, "inner");
        let outer = source.add_tag(inner, "outer");
        source.set_reference("refs/tags/outer", outer);

        let result = RefResolver::new(&source).with_peel_depth(1).seeds();
        assert!(matches!(
            result,
            Err(ReplayError::Source(SourceError::PeelDepthExceeded { limit: 1, .. }))
        ));
    }
}
