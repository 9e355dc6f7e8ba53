//! Commit source backed by a git repository through `git2`.

use crate::error::{SourceError, SourceResult};
use crate::object::{FileMode, ObjectKind, RepositoryReference, SourceCommit, TreeEntry};
use crate::source::CommitSource;
use chronicle_core::{CommitTime, ObjectId};
use git2::{
    ErrorCode, Object, ObjectType, Oid, Reference, ReferenceType, Repository, TreeWalkMode,
    TreeWalkResult,
};
use std::path::Path;

/// [`CommitSource`] over a local git repository
///
/// The repository handle is owned by the source and released on drop.
pub struct GitSource {
    repo: Repository,
}

impl GitSource {
    /// Open an existing repository (bare or with a working tree)
    ///
    /// # Errors
    ///
    /// Returns error if `path` is not a git repository
    pub fn open(path: impl AsRef<Path>) -> SourceResult<Self> {
        let repo = Repository::open(path.as_ref()).map_err(|e| SourceError::Backend {
            message: format!("Failed to open repository {}: {}", path.as_ref().display(), e),
        })?;
        Ok(Self { repo })
    }

    /// Clone `url` into `into` and open the result
    ///
    /// # Errors
    ///
    /// Returns error if the clone fails
    pub fn clone_from(url: &str, into: impl AsRef<Path>) -> SourceResult<Self> {
        tracing::info!(url, path = %into.as_ref().display(), "cloning repository");
        let repo = Repository::clone(url, into.as_ref()).map_err(|e| SourceError::Backend {
            message: format!("Failed to clone {}: {}", url, e),
        })?;
        Ok(Self { repo })
    }

    /// Wrap an already opened repository
    #[must_use]
    pub fn from_repository(repo: Repository) -> Self {
        Self { repo }
    }

    /// Underlying repository
    #[must_use]
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    fn find(&self, id: &ObjectId) -> SourceResult<Object<'_>> {
        let oid = to_oid(id)?;
        self.repo.find_object(oid, None).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                SourceError::MissingObject { id: *id }
            } else {
                SourceError::Corrupt {
                    id: *id,
                    reason: e.message().to_string(),
                }
            }
        })
    }

    fn direct_reference(&self, name: String, reference: &Reference<'_>) -> Option<RepositoryReference> {
        let resolved = match reference.kind() {
            Some(ReferenceType::Symbolic) => match reference.resolve() {
                Ok(resolved) => resolved,
                Err(e) => {
                    tracing::debug!(reference = %name, error = %e, "skipping dangling symbolic reference");
                    return None;
                }
            },
            _ => return self.to_reference(name, reference),
        };
        self.to_reference(name, &resolved)
    }

    fn to_reference(&self, name: String, reference: &Reference<'_>) -> Option<RepositoryReference> {
        let target = from_oid(reference.target()?).ok()?;
        let peeled = reference.target_peel().and_then(|oid| from_oid(oid).ok());
        Some(RepositoryReference {
            name,
            target,
            peeled,
        })
    }
}

fn to_oid(id: &ObjectId) -> SourceResult<Oid> {
    Oid::from_bytes(id.as_bytes()).map_err(SourceError::backend)
}

fn from_oid(oid: Oid) -> SourceResult<ObjectId> {
    ObjectId::from_slice(oid.as_bytes()).map_err(SourceError::backend)
}

fn kind_of(id: &ObjectId, object_type: Option<ObjectType>) -> SourceResult<ObjectKind> {
    match object_type {
        Some(ObjectType::Commit) => Ok(ObjectKind::Commit),
        Some(ObjectType::Tree) => Ok(ObjectKind::Tree),
        Some(ObjectType::Blob) => Ok(ObjectKind::Blob),
        Some(ObjectType::Tag) => Ok(ObjectKind::Tag),
        _ => Err(SourceError::Corrupt {
            id: *id,
            reason: "unknown object type".to_string(),
        }),
    }
}

fn entry_mode(id: &ObjectId, raw: i32) -> SourceResult<FileMode> {
    u32::try_from(raw)
        .ok()
        .and_then(FileMode::from_raw)
        .ok_or_else(|| SourceError::Corrupt {
            id: *id,
            reason: format!("unsupported file mode {:o}", raw),
        })
}

impl CommitSource for GitSource {
    fn references(&self) -> SourceResult<Vec<RepositoryReference>> {
        let mut references = Vec::new();

        match self.repo.find_reference("HEAD") {
            Ok(head) => references.extend(self.direct_reference("HEAD".to_string(), &head)),
            Err(e) => tracing::debug!(error = %e, "repository has no HEAD"),
        }

        for reference in self.repo.references().map_err(SourceError::backend)? {
            let reference = reference.map_err(SourceError::backend)?;
            let name = String::from_utf8_lossy(reference.name_bytes()).into_owned();
            references.extend(self.direct_reference(name, &reference));
        }

        Ok(references)
    }

    fn object_kind(&self, id: &ObjectId) -> SourceResult<ObjectKind> {
        let object = self.find(id)?;
        kind_of(id, object.kind())
    }

    fn tag_target(&self, id: &ObjectId) -> SourceResult<ObjectId> {
        let object = self.find(id)?;
        let actual = kind_of(id, object.kind())?;
        let tag = object.into_tag().map_err(|_| SourceError::WrongType {
            id: *id,
            expected: ObjectKind::Tag,
            actual,
        })?;
        from_oid(tag.target_id())
    }

    fn load_commit(&self, id: &ObjectId) -> SourceResult<SourceCommit> {
        let object = self.find(id)?;
        let actual = kind_of(id, object.kind())?;
        let commit = object.into_commit().map_err(|_| SourceError::WrongType {
            id: *id,
            expected: ObjectKind::Commit,
            actual,
        })?;

        let parents = commit
            .parent_ids()
            .map(from_oid)
            .collect::<SourceResult<Vec<_>>>()?;
        let time = commit.time();

        Ok(SourceCommit {
            id: *id,
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            time: CommitTime::new(time.seconds(), time.offset_minutes()),
            parents,
            tree: from_oid(commit.tree_id())?,
        })
    }

    fn load_tree(&self, id: &ObjectId) -> SourceResult<Vec<TreeEntry>> {
        let object = self.find(id)?;
        let actual = kind_of(id, object.kind())?;
        let tree = object.into_tree().map_err(|_| SourceError::WrongType {
            id: *id,
            expected: ObjectKind::Tree,
            actual,
        })?;

        tree.iter()
            .map(|entry| -> SourceResult<TreeEntry> {
                Ok(TreeEntry::new(
                    String::from_utf8_lossy(entry.name_bytes()).into_owned(),
                    from_oid(entry.id())?,
                    entry_mode(id, entry.filemode())?,
                ))
            })
            .collect()
    }

    fn load_blob(&self, id: &ObjectId) -> SourceResult<Vec<u8>> {
        let object = self.find(id)?;
        let actual = kind_of(id, object.kind())?;
        let blob = object.into_blob().map_err(|_| SourceError::WrongType {
            id: *id,
            expected: ObjectKind::Blob,
            actual,
        })?;
        Ok(blob.content().to_vec())
    }

    fn walk_tree(&self, tree: &ObjectId) -> SourceResult<Vec<TreeEntry>> {
        let object = self.find(tree)?;
        let actual = kind_of(tree, object.kind())?;
        let root = object.into_tree().map_err(|_| SourceError::WrongType {
            id: *tree,
            expected: ObjectKind::Tree,
            actual,
        })?;

        let mut entries = Vec::new();
        let mut failure = None;
        let walked = root.walk(TreeWalkMode::PreOrder, |prefix, entry| {
            let step = from_oid(entry.id()).and_then(|id| {
                let mode = entry_mode(tree, entry.filemode())?;
                let name = String::from_utf8_lossy(entry.name_bytes());
                Ok(TreeEntry::new(format!("{}{}", prefix, name), id, mode))
            });
            match step {
                Ok(entry) => {
                    entries.push(entry);
                    TreeWalkResult::Ok
                }
                Err(e) => {
                    failure = Some(e);
                    TreeWalkResult::Abort
                }
            }
        });

        if let Some(e) = failure {
            return Err(e);
        }
        walked.map_err(|e| SourceError::Corrupt {
            id: *tree,
            reason: e.message().to_string(),
        })?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::DEFAULT_PEEL_DEPTH;
    use git2::{Signature, Time};

    struct Fixture {
        _dir: tempfile::TempDir,
        repo: Repository,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        Fixture { _dir: dir, repo }
    }

    fn signature(seconds: i64) -> Signature<'static> {
        Signature::new("Test", "test@example.com", &Time::new(seconds, 0)).unwrap()
    }

    fn write_tree(repo: &Repository, files: &[(&str, &str)]) -> Oid {
        let mut builder = repo.treebuilder(None).unwrap();
        for (name, content) in files {
            let blob = repo.blob(content.as_bytes()).unwrap();
            builder.insert(*name, blob, 0o100644).unwrap();
        }
        builder.write().unwrap()
    }

    fn commit(
        repo: &Repository,
        update_ref: &str,
        tree: Oid,
        parents: &[Oid],
        seconds: i64,
        message: &str,
    ) -> Oid {
        let tree = repo.find_tree(tree).unwrap();
        let parents: Vec<git2::Commit<'_>> =
            parents.iter().map(|p| repo.find_commit(*p).unwrap()).collect();
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();
        let sig = signature(seconds);
        repo.commit(Some(update_ref), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    #[test]
    fn test_open_invalid_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(GitSource::open(&missing).is_err());
    }

    #[test]
    fn test_load_commit_and_blob() {
        let fx = fixture();
        let tree = write_tree(&fx.repo, &[("a.txt", "1")]);
        let c1 = commit(&fx.repo, "refs/heads/main", tree, &[], 100, "first\n\nbody\n");

        let source = GitSource::from_repository(fx.repo);
        let id = from_oid(c1).unwrap();
        let loaded = source.load_commit(&id).unwrap();
        assert_eq!(loaded.message, "first\n\nbody\n");
        assert_eq!(loaded.time, CommitTime::new(100, 0));
        assert!(loaded.parents.is_empty());

        let entries = source.walk_tree(&loaded.tree).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "a.txt");
        assert_eq!(source.load_blob(&entries[0].id).unwrap(), b"1".to_vec());
    }

    #[test]
    fn test_wrong_type_and_missing() {
        let fx = fixture();
        let tree = write_tree(&fx.repo, &[("a.txt", "1")]);
        let source = GitSource::from_repository(fx.repo);

        let tree_id = from_oid(tree).unwrap();
        let err = source.load_commit(&tree_id).unwrap_err();
        assert!(matches!(
            err,
            SourceError::WrongType {
                expected: ObjectKind::Commit,
                actual: ObjectKind::Tree,
                ..
            }
        ));

        let ghost = ObjectId::from_hex("1111111111111111111111111111111111111111").unwrap();
        assert_eq!(
            source.load_commit(&ghost).unwrap_err(),
            SourceError::MissingObject { id: ghost }
        );
    }

    #[test]
    fn test_walk_nested_tree() {
        let fx = fixture();
        let sub = write_tree(&fx.repo, &[("c.txt", "3")]);
        let root = {
            let blob = fx.repo.blob(b"1").unwrap();
            let mut builder = fx.repo.treebuilder(None).unwrap();
            builder.insert("a.txt", blob, 0o100755).unwrap();
            builder.insert("dir", sub, 0o040000).unwrap();
            builder.write().unwrap()
        };

        let source = GitSource::from_repository(fx.repo);
        let walked = source.walk_tree(&from_oid(root).unwrap()).unwrap();
        let paths: Vec<(&str, FileMode)> =
            walked.iter().map(|e| (e.path.as_str(), e.mode)).collect();
        assert_eq!(
            paths,
            vec![
                ("a.txt", FileMode::Executable),
                ("dir", FileMode::Tree),
                ("dir/c.txt", FileMode::Regular),
            ]
        );
    }

    #[test]
    fn test_references_and_peeling() {
        let fx = fixture();
        let tree = write_tree(&fx.repo, &[("a.txt", "1")]);
        let c1 = commit(&fx.repo, "refs/heads/main", tree, &[], 100, "first");
        let tag = {
            let target = fx.repo.find_object(c1, None).unwrap();
            fx.repo
                .tag("v1", &target, &signature(101), "release", false)
                .unwrap()
        };
        fx.repo
            .reference("refs/tags/tree-tag", tree, false, "tag a tree")
            .unwrap();

        let source = GitSource::from_repository(fx.repo);
        let references = source.references().unwrap();
        let names: Vec<&str> = references.iter().map(|r| r.name.as_str()).collect();
        assert!(names.contains(&"refs/heads/main"));
        assert!(names.contains(&"refs/tags/v1"));
        assert!(names.contains(&"refs/tags/tree-tag"));

        let v1 = references
            .iter()
            .find(|r| r.name == "refs/tags/v1")
            .unwrap();
        assert_eq!(v1.target, from_oid(tag).unwrap());
        let peeled = source.peel_reference(v1, DEFAULT_PEEL_DEPTH).unwrap();
        assert_eq!(peeled.peeled, Some(from_oid(c1).unwrap()));
    }
}
