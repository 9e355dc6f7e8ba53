//! Parents-first, oldest-first ordering of the commit graph.

use crate::error::ReplayResult;
use chronicle_core::ObjectId;
use chronicle_source::{CommitSource, SourceCommit};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Builds a [`HistoryWalk`] over everything reachable from a set of seeds
pub struct HistoryOrderer<'s, S: ?Sized> {
    source: &'s S,
}

impl<'s, S: CommitSource + ?Sized> HistoryOrderer<'s, S> {
    /// Create an orderer reading from `source`
    #[must_use]
    pub fn new(source: &'s S) -> Self {
        Self { source }
    }

    /// Load every commit reachable from `seeds` and prepare the walk
    ///
    /// The graph is loaded eagerly; commits are released one at a time as the
    /// walk is iterated.
    ///
    /// # Errors
    ///
    /// Returns error if any reachable commit cannot be loaded
    pub fn walk(&self, seeds: &[ObjectId]) -> ReplayResult<HistoryWalk> {
        let mut arena = Arena::default();
        let mut pending: Vec<usize> = seeds.iter().map(|id| arena.intern(*id).0).collect();
        pending.reverse();

        while let Some(index) = pending.pop() {
            if arena.nodes[index].commit.is_some() {
                continue;
            }
            let commit = self.source.load_commit(&arena.nodes[index].id)?;
            for parent in &commit.parents {
                let (parent_index, fresh) = arena.intern(*parent);
                arena.nodes[parent_index].children.push(index);
                arena.nodes[index].waiting += 1;
                if fresh {
                    pending.push(parent_index);
                }
            }
            arena.nodes[index].commit = Some(commit);
        }

        tracing::debug!(seeds = seeds.len(), commits = arena.nodes.len(), "loaded commit graph");
        Ok(HistoryWalk::new(arena.nodes))
    }

    /// Collect the full ordering
    ///
    /// # Errors
    ///
    /// Returns error if any reachable commit cannot be loaded
    pub fn order(&self, seeds: &[ObjectId]) -> ReplayResult<Vec<SourceCommit>> {
        Ok(self.walk(seeds)?.collect())
    }
}

#[derive(Default)]
struct Arena {
    nodes: Vec<Node>,
    index: HashMap<ObjectId, usize>,
}

impl Arena {
    /// Index of `id`, and whether it was just added
    fn intern(&mut self, id: ObjectId) -> (usize, bool) {
        if let Some(&index) = self.index.get(&id) {
            return (index, false);
        }
        let index = self.nodes.len();
        self.nodes.push(Node {
            id,
            commit: None,
            children: Vec::new(),
            waiting: 0,
            depth: 0,
        });
        self.index.insert(id, index);
        (index, true)
    }
}

struct Node {
    id: ObjectId,
    commit: Option<SourceCommit>,
    children: Vec<usize>,
    /// Parent edges not yet emitted
    waiting: usize,
    /// Longest parent path back to a root; final once `waiting` reaches zero
    depth: usize,
}

#[derive(Clone, Copy)]
struct HeapItem {
    depth: usize,
    seconds: i64,
    id: ObjectId,
    index: usize,
}

/// Min-heap by (depth, timestamp, id): the shallowest, oldest ready commit
/// has the highest priority.
impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .depth
            .cmp(&self.depth)
            .then_with(|| other.seconds.cmp(&self.seconds))
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.depth == other.depth && self.seconds == other.seconds && self.id == other.id
    }
}

impl Eq for HeapItem {}

/// Single-pass iterator over an ordered commit graph
///
/// Commits are yielded by topological depth (roots are depth 0, every other
/// commit is one deeper than its deepest parent), so no commit comes before
/// its parents. Within a depth the smallest commit timestamp comes first and
/// ties go to the smaller object id.
pub struct HistoryWalk {
    nodes: Vec<Node>,
    ready: BinaryHeap<HeapItem>,
    remaining: usize,
}

impl HistoryWalk {
    fn new(nodes: Vec<Node>) -> Self {
        let mut walk = Self {
            remaining: nodes.len(),
            ready: BinaryHeap::new(),
            nodes,
        };
        for index in 0..walk.nodes.len() {
            if walk.nodes[index].waiting == 0 {
                walk.push_ready(index);
            }
        }
        walk
    }

    fn push_ready(&mut self, index: usize) {
        let node = &self.nodes[index];
        if let Some(commit) = &node.commit {
            self.ready.push(HeapItem {
                depth: node.depth,
                seconds: commit.time.seconds,
                id: node.id,
                index,
            });
        }
    }

    /// Total number of commits in the graph
    #[must_use]
    pub fn total(&self) -> usize {
        self.nodes.len()
    }
}

impl Iterator for HistoryWalk {
    type Item = SourceCommit;

    fn next(&mut self) -> Option<SourceCommit> {
        let Some(item) = self.ready.pop() else {
            if self.remaining > 0 {
                tracing::warn!(unreachable = self.remaining, "commit graph contains a cycle");
                self.remaining = 0;
            }
            return None;
        };

        let commit = self.nodes[item.index].commit.take()?;
        self.remaining -= 1;

        let children = std::mem::take(&mut self.nodes[item.index].children);
        for child in children {
            let node = &mut self.nodes[child];
            node.depth = node.depth.max(item.depth + 1);
            node.waiting -= 1;
            if node.waiting == 0 {
                self.push_ready(child);
            }
        }
        Some(commit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.ready.len().min(self.remaining), Some(self.remaining))
    }
}
