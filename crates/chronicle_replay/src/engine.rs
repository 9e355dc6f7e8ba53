//! Replay driver: resolve, order, flatten, commit.

use crate::error::{ReplayError, ReplayResult};
use crate::flatten::TreeFlattener;
use crate::order::HistoryOrderer;
use crate::refs::RefResolver;
use chronicle_core::{ObjectId, SnapshotId};
use chronicle_source::{CommitSource, DEFAULT_PEEL_DEPTH, SourceCommit};
use chronicle_storage::{SnapshotRepo, StoredSnapshot};
use serde::{Deserialize, Serialize};

/// Replay configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Maximum commits to replay (0 = unlimited)
    pub max_commits: usize,
    /// Skip submodule entries instead of failing
    pub skip_gitlinks: bool,
    /// Maximum annotated-tag levels followed per reference
    pub peel_depth_limit: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            max_commits: 0,
            skip_gitlinks: true,
            peel_depth_limit: DEFAULT_PEEL_DEPTH,
        }
    }
}

/// One replayed commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayedCommit {
    /// Source commit
    pub commit: ObjectId,
    /// Snapshot it was stored as
    pub snapshot: SnapshotId,
}

/// Outcome of a replay run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Number of distinct seed commits
    pub seeds: usize,
    /// Commits in replay order
    pub replayed: Vec<ReplayedCommit>,
    /// Snapshot of the last replayed commit
    pub head: Option<SnapshotId>,
}

impl ReplayReport {
    /// Number of replayed commits
    #[must_use]
    pub fn len(&self) -> usize {
        self.replayed.len()
    }

    /// Whether nothing was replayed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.replayed.is_empty()
    }

    /// Snapshot a source commit was stored as
    #[must_use]
    pub fn snapshot_for(&self, commit: &ObjectId) -> Option<SnapshotId> {
        self.replayed
            .iter()
            .find(|r| r.commit == *commit)
            .map(|r| r.snapshot)
    }
}

/// Progress notification sent after each commit is stored
#[derive(Debug)]
pub struct ReplayProgress<'a> {
    /// Zero-based position in replay order
    pub index: usize,
    /// Number of commits this run will replay
    pub total: usize,
    /// Commit just replayed
    pub commit: &'a SourceCommit,
    /// Snapshot it produced
    pub snapshot: &'a StoredSnapshot,
}

/// Replays the history of a commit source into a snapshot repository
///
/// Every run starts a fresh line of history: the first replayed commit is
/// stored without a parent and each following commit is stored on top of the
/// previous one. Replaying twice into the same repository appends a second
/// copy of the history.
pub struct SnapshotReplayer<'s, S: ?Sized> {
    source: &'s S,
    config: ReplayConfig,
}

impl<'s, S: CommitSource + ?Sized> SnapshotReplayer<'s, S> {
    /// Create a replayer with the default configuration
    #[must_use]
    pub fn new(source: &'s S) -> Self {
        Self {
            source,
            config: ReplayConfig::default(),
        }
    }

    /// Create with custom config
    #[must_use]
    pub fn with_config(mut self, config: ReplayConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Distinct seed commits for this source
    ///
    /// # Errors
    ///
    /// Returns error on fatal source failures
    pub fn seeds(&self) -> ReplayResult<Vec<ObjectId>> {
        RefResolver::new(self.source)
            .with_peel_depth(self.config.peel_depth_limit)
            .seeds()
    }

    /// Commits in replay order, honouring `max_commits`
    ///
    /// # Errors
    ///
    /// Returns error on fatal source failures
    pub fn plan(&self) -> ReplayResult<Vec<SourceCommit>> {
        let seeds = self.seeds()?;
        let walk = HistoryOrderer::new(self.source).walk(&seeds)?;
        Ok(walk.take(self.limit()).collect())
    }

    /// Replay the full history into `store`
    ///
    /// # Errors
    ///
    /// Returns the first fatal failure; snapshots committed before it remain
    /// in `store`
    pub fn replay(&self, store: &mut SnapshotRepo) -> ReplayResult<ReplayReport> {
        self.replay_with_callback(store, |_| {})
    }

    /// Replay, calling `on_commit` after each stored snapshot
    ///
    /// # Errors
    ///
    /// See [`Self::replay`]
    pub fn replay_with_callback<F>(
        &self,
        store: &mut SnapshotRepo,
        mut on_commit: F,
    ) -> ReplayResult<ReplayReport>
    where
        F: FnMut(&ReplayProgress<'_>),
    {
        let seeds = self.seeds()?;
        if seeds.is_empty() {
            tracing::warn!("no reference resolves to a commit; nothing to replay");
        }

        let walk = HistoryOrderer::new(self.source).walk(&seeds)?;
        let total = walk.total().min(self.limit());
        tracing::info!(seeds = seeds.len(), commits = total, "starting replay");

        let flattener =
            TreeFlattener::new(self.source).with_skip_gitlinks(self.config.skip_gitlinks);
        let mut report = ReplayReport {
            seeds: seeds.len(),
            replayed: Vec::with_capacity(total),
            head: None,
        };

        for (index, commit) in walk.take(total).enumerate() {
            let mapping = flattener
                .flatten(&commit)
                .map_err(|e| e.in_commit(commit.id))?;
            let snapshot = store
                .commit(report.head.as_ref(), mapping, &commit.message)
                .map_err(|e| ReplayError::from(e).in_commit(commit.id))?;

            tracing::info!(
                commit = %commit.id.short(),
                snapshot = %snapshot.id.short(),
                summary = commit.summary(),
                "replayed commit"
            );
            on_commit(&ReplayProgress {
                index,
                total,
                commit: &commit,
                snapshot: &snapshot,
            });

            report.head = Some(snapshot.id);
            report.replayed.push(ReplayedCommit {
                commit: commit.id,
                snapshot: snapshot.id,
            });
        }

        tracing::info!(replayed = report.len(), "replay finished");
        Ok(report)
    }

    fn limit(&self) -> usize {
        match self.config.max_commits {
            0 => usize::MAX,
            n => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_core::{CommitTime, FlatContentMapping};
    use chronicle_source::{FileMode, MemorySource, SourceError};
    use chronicle_storage::{SearchExpression, StoreConfig, StoreError};

    fn files(entries: &[(&str, &str)]) -> FlatContentMapping {
        entries.iter().map(|(p, c)| (*p, c.as_bytes())).collect()
    }

    /// C1 {a:1} -> C2 {a:2, b:2} -> C3 {a:3, b:2}, main at C3
    fn linear() -> (MemorySource, [ObjectId; 3]) {
        let mut source = MemorySource::new();
        let t1 = source.add_files([("a.txt", "1")]);
        let c1 = source.add_commit(t1, &[], CommitTime::from_secs(1000), "C1");
        let t2 = source.add_files([("a.txt", "2"), ("b.txt", "2")]);
        let c2 = source.add_commit(t2, &[c1], CommitTime::from_secs(2000), "C2");
        let t3 = source.add_files([("a.txt", "3"), ("b.txt", "2")]);
        let c3 = source.add_commit(t3, &[c2], CommitTime::from_secs(3000), "C3");
        source.set_reference("refs/heads/main", c3);
        (source, [c1, c2, c3])
    }

    #[test]
    fn test_linear_scenario() {
        let (source, [c1, c2, c3]) = linear();
        let mut store = SnapshotRepo::new();
        let report = SnapshotReplayer::new(&source).replay(&mut store).unwrap();

        assert_eq!(report.seeds, 1);
        assert_eq!(
            report.replayed.iter().map(|r| r.commit).collect::<Vec<_>>(),
            vec![c1, c2, c3]
        );

        let all = store.search(&SearchExpression::all()).unwrap();
        assert_eq!(all.len(), 3);

        let tips = store.search(&SearchExpression::all().tip()).unwrap();
        assert_eq!(tips.len(), 1);
        let tip = tips.first().unwrap();
        assert_eq!(tip.message, "C3");
        assert_eq!(Some(tip.id), report.snapshot_for(&c3));
        assert_eq!(report.head, Some(tip.id));

        let checkout = store.checkout(&tip.id).unwrap();
        assert_eq!(checkout, files(&[("a.txt", "3"), ("b.txt", "2")]));
        assert_eq!(checkout.as_list_string(), "a.txt : 3\nb.txt : 2\n");
    }

    #[test]
    fn test_merge_scenario() {
        let mut source = MemorySource::new();
        let t1 = source.add_files([("left.txt", "L")]);
        let c1 = source.add_commit(t1, &[], CommitTime::from_secs(10), "C1");
        let t2 = source.add_files([("right.txt", "R")]);
        let c2 = source.add_commit(t2, &[], CommitTime::from_secs(20), "C2");
        let t3 = source.add_files([("left.txt", "L"), ("right.txt", "R")]);
        let c3 = source.add_commit(t3, &[c1, c2], CommitTime::from_secs(30), "C3");
        source.set_reference("refs/heads/main", c3);
        source.set_reference("refs/heads/right", c2);

        let mut store = SnapshotRepo::new();
        let report = SnapshotReplayer::new(&source).replay(&mut store).unwrap();
        assert_eq!(report.seeds, 2);

        let all = store.search(&SearchExpression::all()).unwrap();
        assert_eq!(all.len(), 3);
        let messages: Vec<&str> = all.iter().map(|s| s.message.as_str()).collect();
        assert_eq!(messages, vec!["C1", "C2", "C3"]);

        let merge = report.snapshot_for(&c3).unwrap();
        let merged = store.get(&merge).unwrap();
        for parent in [c1, c2] {
            let parent = store.get(&report.snapshot_for(&parent).unwrap()).unwrap();
            assert!(parent.sequence < merged.sequence);
        }
    }

    #[test]
    fn test_missing_blob_keeps_earlier_snapshots() {
        let mut source = MemorySource::new();
        let t1 = source.add_files([("a.txt", "1")]);
        let c1 = source.add_commit(t1, &[], CommitTime::from_secs(1), "C1");
        let t2 = source.add_files([("a.txt", "only in c2")]);
        let c2 = source.add_commit(t2, &[c1], CommitTime::from_secs(2), "C2");
        let t3 = source.add_files([("a.txt", "3")]);
        let c3 = source.add_commit(t3, &[c2], CommitTime::from_secs(3), "C3");
        source.set_reference("refs/heads/main", c3);
        let lost = source.add_blob("only in c2");
        source.remove_object(&lost);

        let mut store = SnapshotRepo::new();
        let err = SnapshotReplayer::new(&source)
            .replay(&mut store)
            .unwrap_err();

        assert!(matches!(err, ReplayError::Commit { id, .. } if id == c2));
        assert_eq!(
            err.root_cause(),
            &ReplayError::Source(SourceError::MissingObject { id: lost })
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.latest().map(|s| s.message.as_str()), Some("C1"));
    }

    #[test]
    fn test_store_failure_is_fatal() {
        let (mut source, [_, c2, _]) = linear();
        let mut store = SnapshotRepo::with_config(StoreConfig {
            max_blob_size: 1,
            ..Default::default()
        });
        let big = source.add_files([("a.txt", "1"), ("big.bin", "too big")]);
        let c = source.add_commit(big, &[c2], CommitTime::from_secs(2500), "big");
        source.set_reference("refs/heads/big", c);

        let err = SnapshotReplayer::new(&source)
            .replay(&mut store)
            .unwrap_err();
        assert!(matches!(
            err.root_cause(),
            ReplayError::Store(StoreError::BlobTooLarge { .. })
        ));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_max_commits_replays_prefix() {
        let (source, [c1, c2, _]) = linear();
        let config = ReplayConfig {
            max_commits: 2,
            ..Default::default()
        };
        let replayer = SnapshotReplayer::new(&source).with_config(config);

        let plan: Vec<ObjectId> = replayer.plan().unwrap().iter().map(|c| c.id).collect();
        assert_eq!(plan, vec![c1, c2]);

        let mut store = SnapshotRepo::new();
        let report = replayer.replay(&mut store).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_progress_callback() {
        let (source, commits) = linear();
        let mut store = SnapshotRepo::new();
        let mut seen = Vec::new();

        SnapshotReplayer::new(&source)
            .replay_with_callback(&mut store, |progress| {
                assert_eq!(progress.total, 3);
                assert_eq!(progress.snapshot.message, progress.commit.message);
                seen.push((progress.index, progress.commit.id));
            })
            .unwrap();

        assert_eq!(
            seen,
            commits.iter().copied().enumerate().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_no_references_replays_nothing() {
        let mut source = MemorySource::new();
        let tree = source.add_files([("a", "1")]);
        source.add_commit(tree, &[], CommitTime::from_secs(1), "orphan");

        let mut store = SnapshotRepo::new();
        let report = SnapshotReplayer::new(&source).replay(&mut store).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.head, None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_replay_is_deterministic() {
        let (source, _) = linear();
        let mut left = SnapshotRepo::new();
        let mut right = SnapshotRepo::new();
        let a = SnapshotReplayer::new(&source).replay(&mut left).unwrap();
        let b = SnapshotReplayer::new(&source).replay(&mut right).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_gitlink_rejected_when_not_skipped() {
        let mut source = MemorySource::new();
        let file = source.add_blob("x");
        let foreign = ObjectId::derive(b"foreign", 20);
        let tree = source.add_tree([
            ("file", FileMode::Regular, file),
            ("sub", FileMode::Gitlink, foreign),
        ]);
        let c = source.add_commit(tree, &[], CommitTime::from_secs(1), "with submodule");
        source.set_reference("refs/heads/main", c);

        let mut store = SnapshotRepo::new();
        let report = SnapshotReplayer::new(&source).replay(&mut store).unwrap();
        let snapshot = store.get(&report.head.unwrap()).unwrap();
        assert_eq!(snapshot.entry_count(), 1);

        let strict = ReplayConfig {
            skip_gitlinks: false,
            ..Default::default()
        };
        let err = SnapshotReplayer::new(&source)
            .with_config(strict)
            .replay(&mut SnapshotRepo::new())
            .unwrap_err();
        assert!(matches!(err.root_cause(), ReplayError::Gitlink { .. }));
    }

    #[test]
    fn test_config_and_report_json() {
        let config: ReplayConfig = serde_json::from_str(r#"{"max_commits": 5}"#).unwrap();
        assert_eq!(config.max_commits, 5);
        assert!(config.skip_gitlinks);
        assert_eq!(config.peel_depth_limit, DEFAULT_PEEL_DEPTH);

        let (source, _) = linear();
        let report = SnapshotReplayer::new(&source)
            .replay(&mut SnapshotRepo::new())
            .unwrap();
        let json = serde_json::to_string(&report).unwrap();
        let back: ReplayReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
