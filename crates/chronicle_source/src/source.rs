//! The commit source capability.

use crate::error::{SourceError, SourceResult};
use crate::object::{FileMode, ObjectKind, RepositoryReference, SourceCommit, TreeEntry};
use chronicle_core::ObjectId;

/// Default maximum number of annotated-tag levels followed while peeling
pub const DEFAULT_PEEL_DEPTH: usize = 64;

/// Read-only access to a version-controlled repository
///
/// Typed loads fail fast with [`SourceError::MissingObject`] when the object
/// does not exist and [`SourceError::WrongType`] when it exists with another
/// type. Implementations never mutate the repository.
pub trait CommitSource {
    /// Enumerate every reference
    ///
    /// # Errors
    ///
    /// Returns error if the reference database cannot be read
    fn references(&self) -> SourceResult<Vec<RepositoryReference>>;

    /// Type of an object
    ///
    /// # Errors
    ///
    /// Returns error if the object is missing or unreadable
    fn object_kind(&self, id: &ObjectId) -> SourceResult<ObjectKind>;

    /// Object an annotated tag points at
    ///
    /// # Errors
    ///
    /// Returns error if `id` is missing or not a tag
    fn tag_target(&self, id: &ObjectId) -> SourceResult<ObjectId>;

    /// Load an object as a commit
    ///
    /// # Errors
    ///
    /// Returns error if `id` is missing, not a commit, or corrupt
    fn load_commit(&self, id: &ObjectId) -> SourceResult<SourceCommit>;

    /// Load the direct entries of a tree; entry paths are bare names
    ///
    /// # Errors
    ///
    /// Returns error if `id` is missing, not a tree, or corrupt
    fn load_tree(&self, id: &ObjectId) -> SourceResult<Vec<TreeEntry>>;

    /// Load blob content
    ///
    /// # Errors
    ///
    /// Returns error if `id` is missing, not a blob, or unreadable
    fn load_blob(&self, id: &ObjectId) -> SourceResult<Vec<u8>>;

    /// Peel a reference through any number of annotated tags
    ///
    /// The returned reference carries the first non-tag object in `peeled`.
    /// A reference that is already peeled is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns error if an object along the chain cannot be read or the chain
    /// is longer than `max_depth`
    fn peel_reference(
        &self,
        reference: &RepositoryReference,
        max_depth: usize,
    ) -> SourceResult<RepositoryReference> {
        if reference.is_peeled() {
            return Ok(reference.clone());
        }

        let mut current = reference.target;
        let mut depth = 0;
        while self.object_kind(&current)? == ObjectKind::Tag {
            if depth == max_depth {
                return Err(SourceError::PeelDepthExceeded {
                    start: reference.target,
                    limit: max_depth,
                });
            }
            current = self.tag_target(&current)?;
            depth += 1;
        }

        Ok(RepositoryReference {
            name: reference.name.clone(),
            target: reference.target,
            peeled: Some(current),
        })
    }

    /// Enumerate a tree recursively in pre-order
    ///
    /// Every entry, subdirectories included, is returned with its full
    /// slash-separated path from the root of `tree`.
    ///
    /// # Errors
    ///
    /// Returns error if any tree along the walk cannot be loaded
    fn walk_tree(&self, tree: &ObjectId) -> SourceResult<Vec<TreeEntry>> {
        let mut entries = Vec::new();
        walk_into(self, tree, "", &mut entries)?;
        Ok(entries)
    }
}

fn walk_into<S: CommitSource + ?Sized>(
    source: &S,
    tree: &ObjectId,
    prefix: &str,
    out: &mut Vec<TreeEntry>,
) -> SourceResult<()> {
    for entry in source.load_tree(tree)? {
        let path = if prefix.is_empty() {
            entry.path
        } else {
            format!("{}/{}", prefix, entry.path)
        };
        out.push(TreeEntry::new(path.clone(), entry.id, entry.mode));
        if entry.mode == FileMode::Tree {
            walk_into(source, &entry.id, &path, out)?;
        }
    }
    Ok(())
}

impl<S: CommitSource + ?Sized> CommitSource for &S {
    fn references(&self) -> SourceResult<Vec<RepositoryReference>> {
        (**self).references()
    }

    fn object_kind(&self, id: &ObjectId) -> SourceResult<ObjectKind> {
        (**self).object_kind(id)
    }

    fn tag_target(&self, id: &ObjectId) -> SourceResult<ObjectId> {
        (**self).tag_target(id)
    }

    fn load_commit(&self, id: &ObjectId) -> SourceResult<SourceCommit> {
        (**self).load_commit(id)
    }

    fn load_tree(&self, id: &ObjectId) -> SourceResult<Vec<TreeEntry>> {
        (**self).load_tree(id)
    }

    fn load_blob(&self, id: &ObjectId) -> SourceResult<Vec<u8>> {
        (**self).load_blob(id)
    }

    fn peel_reference(
        &self,
        reference: &RepositoryReference,
        max_depth: usize,
    ) -> SourceResult<RepositoryReference> {
        (**self).peel_reference(reference, max_depth)
    }

    fn walk_tree(&self, tree: &ObjectId) -> SourceResult<Vec<TreeEntry>> {
        (**self).walk_tree(tree)
    }
}
