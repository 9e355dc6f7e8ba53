//! Commit tree flattening.

use crate::error::{ReplayError, ReplayResult};
use chronicle_core::{FlatContentMapping, ObjectId};
use chronicle_source::{CommitSource, FileMode, SourceCommit};

/// Reads a commit's tree into a flat path to content mapping
///
/// Only blob entries (regular files, executables, symlinks) are included.
/// File modes are not preserved. A path that occurs twice in one tree, for
/// example two non-UTF-8 names decoding to the same string, is an error.
pub struct TreeFlattener<'s, S: ?Sized> {
    source: &'s S,
    skip_gitlinks: bool,
}

impl<'s, S: CommitSource + ?Sized> TreeFlattener<'s, S> {
    /// Create a flattener that skips submodule entries
    #[must_use]
    pub fn new(source: &'s S) -> Self {
        Self {
            source,
            skip_gitlinks: true,
        }
    }

    /// Choose whether submodule entries are skipped or rejected
    #[must_use]
    pub fn with_skip_gitlinks(mut self, skip: bool) -> Self {
        self.skip_gitlinks = skip;
        self
    }

    /// Flatten the root tree of `commit`
    ///
    /// # Errors
    ///
    /// Returns error if any tree or blob cannot be read, a path repeats, or a
    /// gitlink is found while gitlinks are not skipped
    pub fn flatten(&self, commit: &SourceCommit) -> ReplayResult<FlatContentMapping> {
        self.flatten_tree(&commit.tree)
    }

    /// Flatten an arbitrary tree
    ///
    /// # Errors
    ///
    /// See [`Self::flatten`]
    pub fn flatten_tree(&self, tree: &ObjectId) -> ReplayResult<FlatContentMapping> {
        let mut mapping = FlatContentMapping::new();
        for entry in self.source.walk_tree(tree)? {
            match entry.mode {
                FileMode::Tree => {}
                FileMode::Gitlink if self.skip_gitlinks => {
                    tracing::debug!(path = %entry.path, commit = %entry.id, "skipping submodule entry");
                }
                FileMode::Gitlink => {
                    return Err(ReplayError::Gitlink {
                        path: entry.path,
                        id: entry.id,
                    });
                }
                FileMode::Regular | FileMode::Executable | FileMode::Symlink => {
                    if mapping.contains(&entry.path) {
                        return Err(ReplayError::DuplicatePath { path: entry.path });
                    }
                    let content = self.source.load_blob(&entry.id)?;
                    mapping.insert(entry.path, content);
                }
            }
        }
        Ok(mapping)
    }
}
