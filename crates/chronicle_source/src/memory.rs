//! In-memory commit source.
//!
//! A small object database with content-derived ids. Useful for fixtures:
//! histories can be assembled object by object, and objects can be removed
//! afterwards to simulate a damaged repository.

use crate::error::{SourceError, SourceResult};
use crate::object::{FileMode, ObjectKind, RepositoryReference, SourceCommit, TreeEntry};
use crate::source::CommitSource;
use chronicle_core::{CommitTime, ObjectId};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};

/// Width of minted ids, matching SHA-1 object names
const ID_LEN: usize = 20;

#[derive(Debug, Clone)]
enum MemoryObject {
    Blob(Vec<u8>),
    Tree(Vec<TreeEntry>),
    Commit(SourceCommit),
    Tag { target: ObjectId },
}

impl MemoryObject {
    const fn kind(&self) -> ObjectKind {
        match self {
            Self::Blob(_) => ObjectKind::Blob,
            Self::Tree(_) => ObjectKind::Tree,
            Self::Commit(_) => ObjectKind::Commit,
            Self::Tag { .. } => ObjectKind::Tag,
        }
    }
}

/// Nested file layout used to build trees from slash paths
enum PathNode {
    File(Vec<u8>),
    Dir(BTreeMap<String, PathNode>),
}

/// In-memory object database implementing [`CommitSource`]
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    objects: HashMap<ObjectId, MemoryObject>,
    references: IndexMap<String, ObjectId>,
}

impl MemorySource {
    /// Create an empty source
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a blob
    pub fn add_blob(&mut self, content: impl Into<Vec<u8>>) -> ObjectId {
        let content = content.into();
        let mut raw = b"blob\0".to_vec();
        raw.extend_from_slice(&content);
        self.insert(&raw, MemoryObject::Blob(content))
    }

    /// Store a tree from `(name, mode, id)` entries
    ///
    /// Entries are kept sorted by name; a repeated name keeps the last entry.
    pub fn add_tree<N: Into<String>>(
        &mut self,
        entries: impl IntoIterator<Item = (N, FileMode, ObjectId)>,
    ) -> ObjectId {
        let sorted: BTreeMap<String, (FileMode, ObjectId)> = entries
            .into_iter()
            .map(|(name, mode, id)| (name.into(), (mode, id)))
            .collect();

        let mut raw = b"tree\0".to_vec();
        let mut entries = Vec::with_capacity(sorted.len());
        for (name, (mode, id)) in sorted {
            raw.extend_from_slice(format!("{:o} {} {}\n", mode.as_raw(), name, id).as_bytes());
            entries.push(TreeEntry::new(name, id, mode));
        }
        self.insert(&raw, MemoryObject::Tree(entries))
    }

    /// Store regular files given as slash-separated paths, creating nested
    /// trees as needed, and return the root tree id
    pub fn add_files<P: AsRef<str>, C: Into<Vec<u8>>>(
        &mut self,
        files: impl IntoIterator<Item = (P, C)>,
    ) -> ObjectId {
        let mut root = BTreeMap::new();
        for (path, content) in files {
            let segments: Vec<&str> = path
                .as_ref()
                .split('/')
                .filter(|segment| !segment.is_empty())
                .collect();
            insert_path(&mut root, &segments, content.into());
        }
        self.write_dir(root)
    }

    fn write_dir(&mut self, dir: BTreeMap<String, PathNode>) -> ObjectId {
        let mut entries = Vec::with_capacity(dir.len());
        for (name, node) in dir {
            let entry = match node {
                PathNode::File(content) => (name, FileMode::Regular, self.add_blob(content)),
                PathNode::Dir(children) => (name, FileMode::Tree, self.write_dir(children)),
            };
            entries.push(entry);
        }
        self.add_tree(entries)
    }

    /// Store a commit
    pub fn add_commit(
        &mut self,
        tree: ObjectId,
        parents: &[ObjectId],
        time: CommitTime,
        message: impl Into<String>,
    ) -> ObjectId {
        let message = message.into();
        let mut raw = format!("commit\0tree {}\n", tree);
        for parent in parents {
            raw.push_str(&format!("parent {}\n", parent));
        }
        raw.push_str(&format!("time {} {}\n\n{}", time.seconds, time.offset_minutes, message));

        let id = ObjectId::derive(raw.as_bytes(), ID_LEN);
        let commit = SourceCommit {
            id,
            message,
            time,
            parents: parents.to_vec(),
            tree,
        };
        self.objects.insert(id, MemoryObject::Commit(commit));
        id
    }

    /// Store an annotated tag object pointing at `target`
    pub fn add_tag(&mut self, target: ObjectId, name: &str) -> ObjectId {
        let raw = format!("tag\0object {}\ntag {}\n", target, name);
        self.insert(raw.as_bytes(), MemoryObject::Tag { target })
    }

    /// Create or move a reference
    pub fn set_reference(&mut self, name: impl Into<String>, target: ObjectId) {
        self.references.insert(name.into(), target);
    }

    /// Delete an object, leaving any references to it dangling
    pub fn remove_object(&mut self, id: &ObjectId) -> bool {
        self.objects.remove(id).is_some()
    }

    /// Number of stored objects
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn insert(&mut self, raw: &[u8], object: MemoryObject) -> ObjectId {
        let id = ObjectId::derive(raw, ID_LEN);
        self.objects.entry(id).or_insert(object);
        id
    }

    fn get(&self, id: &ObjectId) -> SourceResult<&MemoryObject> {
        self.objects
            .get(id)
            .ok_or(SourceError::MissingObject { id: *id })
    }
}

fn insert_path(dir: &mut BTreeMap<String, PathNode>, segments: &[&str], content: Vec<u8>) {
    match segments {
        [] => {}
        [name] => {
            dir.insert((*name).to_string(), PathNode::File(content));
        }
        [name, rest @ ..] => {
            let node = dir
                .entry((*name).to_string())
                .or_insert_with(|| PathNode::Dir(BTreeMap::new()));
            if let PathNode::File(_) = node {
                *node = PathNode::Dir(BTreeMap::new());
            }
            if let PathNode::Dir(children) = node {
                insert_path(children, rest, content);
            }
        }
    }
}

fn wrong_type(id: &ObjectId, expected: ObjectKind, actual: &MemoryObject) -> SourceError {
    SourceError::WrongType {
        id: *id,
        expected,
        actual: actual.kind(),
    }
}

impl CommitSource for MemorySource {
    fn references(&self) -> SourceResult<Vec<RepositoryReference>> {
        Ok(self
            .references
            .iter()
            .map(|(name, target)| RepositoryReference::new(name.clone(), *target))
            .collect())
    }

    fn object_kind(&self, id: &ObjectId) -> SourceResult<ObjectKind> {
        self.get(id).map(MemoryObject::kind)
    }

    fn tag_target(&self, id: &ObjectId) -> SourceResult<ObjectId> {
        match self.get(id)? {
            MemoryObject::Tag { target } => Ok(*target),
            other => Err(wrong_type(id, ObjectKind::Tag, other)),
        }
    }

    fn load_commit(&self, id: &ObjectId) -> SourceResult<SourceCommit> {
        match self.get(id)? {
            MemoryObject::Commit(commit) => Ok(commit.clone()),
            other => Err(wrong_type(id, ObjectKind::Commit, other)),
        }
    }

    fn load_tree(&self, id: &ObjectId) -> SourceResult<Vec<TreeEntry>> {
        match self.get(id)? {
            MemoryObject::Tree(entries) => Ok(entries.clone()),
            other => Err(wrong_type(id, ObjectKind::Tree, other)),
        }
    }

    fn load_blob(&self, id: &ObjectId) -> SourceResult<Vec<u8>> {
        match self.get(id)? {
            MemoryObject::Blob(content) => Ok(content.clone()),
            other => Err(wrong_type(id, ObjectKind::Blob, other)),
        }
    }
}
