//! Object model exposed by a commit source.

use chronicle_core::{CommitTime, ObjectId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of an object in the commit source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Commit object
    Commit,
    /// Tree (directory listing)
    Tree,
    /// Blob (file content)
    Blob,
    /// Annotated tag object
    Tag,
}

impl ObjectKind {
    /// Lowercase name, as git spells it
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::Tree => "tree",
            Self::Blob => "blob",
            Self::Tag => "tag",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mode of a tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileMode {
    /// Subdirectory
    Tree,
    /// Regular file
    Regular,
    /// Executable file
    Executable,
    /// Symbolic link; the blob holds the link target
    Symlink,
    /// Submodule commit from another repository
    Gitlink,
}

impl FileMode {
    /// Parse a raw git mode
    #[must_use]
    pub const fn from_raw(mode: u32) -> Option<Self> {
        match mode {
            0o040000 => Some(Self::Tree),
            0o100644 | 0o100664 => Some(Self::Regular),
            0o100755 => Some(Self::Executable),
            0o120000 => Some(Self::Symlink),
            0o160000 => Some(Self::Gitlink),
            _ => None,
        }
    }

    /// Raw git mode
    #[must_use]
    pub const fn as_raw(&self) -> u32 {
        match self {
            Self::Tree => 0o040000,
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Gitlink => 0o160000,
        }
    }

    /// Whether the entry's object is a blob in this repository
    #[must_use]
    pub const fn is_blob(&self) -> bool {
        matches!(self, Self::Regular | Self::Executable | Self::Symlink)
    }
}

/// One entry of a tree
///
/// `path` is the entry name when returned by `load_tree` and the full
/// slash-separated path from the root when returned by `walk_tree`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Entry name or full path
    pub path: String,
    /// Object the entry points at
    pub id: ObjectId,
    /// Entry mode
    pub mode: FileMode,
}

impl TreeEntry {
    /// Create a tree entry
    #[must_use]
    pub fn new(path: impl Into<String>, id: ObjectId, mode: FileMode) -> Self {
        Self {
            path: path.into(),
            id,
            mode,
        }
    }
}

/// A commit as read from the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCommit {
    /// Commit id
    pub id: ObjectId,
    /// Full commit message
    pub message: String,
    /// Committer timestamp
    pub time: CommitTime,
    /// Parent commit ids, first parent first
    pub parents: Vec<ObjectId>,
    /// Root tree id
    pub tree: ObjectId,
}

impl SourceCommit {
    /// First line of the message
    #[must_use]
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Whether this commit joins two or more lines of history
    #[must_use]
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// A named reference, captured at enumeration time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryReference {
    /// Full reference name, e.g. `refs/heads/main`
    pub name: String,
    /// Object the reference points at directly
    pub target: ObjectId,
    /// Non-tag object reached by peeling, when known
    pub peeled: Option<ObjectId>,
}

impl RepositoryReference {
    /// Create an unpeeled reference
    #[must_use]
    pub fn new(name: impl Into<String>, target: ObjectId) -> Self {
        Self {
            name: name.into(),
            target,
            peeled: None,
        }
    }

    /// Whether the peeled target is already known
    #[must_use]
    pub fn is_peeled(&self) -> bool {
        self.peeled.is_some()
    }

    /// Peeled id if known, otherwise the direct target
    #[must_use]
    pub fn effective_target(&self) -> ObjectId {
        self.peeled.unwrap_or(self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_mode_raw_roundtrip() {
        for mode in [
            FileMode::Tree,
            FileMode::Regular,
            FileMode::Executable,
            FileMode::Symlink,
            FileMode::Gitlink,
        ] {
            assert_eq!(FileMode::from_raw(mode.as_raw()), Some(mode));
        }
        assert_eq!(FileMode::from_raw(0o100664), Some(FileMode::Regular));
        assert_eq!(FileMode::from_raw(0o777), None);
    }

    #[test]
    fn test_file_mode_is_blob() {
        assert!(FileMode::Regular.is_blob());
        assert!(FileMode::Symlink.is_blob());
        assert!(!FileMode::Tree.is_blob());
        assert!(!FileMode::Gitlink.is_blob());
    }

    #[test]
    fn test_reference_effective_target() {
        let direct = ObjectId::derive(b"tag", 20);
        let commit = ObjectId::derive(b"commit", 20);

        let mut reference = RepositoryReference::new("refs/tags/v1", direct);
        assert!(!reference.is_peeled());
        assert_eq!(reference.effective_target(), direct);

        reference.peeled = Some(commit);
        assert!(reference.is_peeled());
        assert_eq!(reference.effective_target(), commit);
    }

    #[test]
    fn test_commit_summary() {
        let commit = SourceCommit {
            id: ObjectId::derive(b"c", 20),
            message: "Add parser\n\nLonger body".to_string(),
            time: CommitTime::from_secs(1),
            parents: vec![],
            tree: ObjectId::derive(b"t", 20),
        };
        assert_eq!(commit.summary(), "Add parser");
        assert!(!commit.is_merge());
    }
}
