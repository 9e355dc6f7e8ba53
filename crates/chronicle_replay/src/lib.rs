//! chronicle replay engine
//!
//! Replays the full commit history of a [`CommitSource`] into a
//! [`SnapshotRepo`]: reference tips are resolved to seed commits, the reachable
//! graph is ordered parents-first and oldest-first, and every commit's tree is
//! flattened and committed as one snapshot.
//!
//! [`CommitSource`]: chronicle_source::CommitSource
//! [`SnapshotRepo`]: chronicle_storage::SnapshotRepo

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod error;
pub mod flatten;
pub mod order;
pub mod refs;

pub use engine::{ReplayConfig, ReplayProgress, ReplayReport, ReplayedCommit, SnapshotReplayer};
pub use error::{ReplayError, ReplayResult};
pub use flatten::TreeFlattener;
pub use order::{HistoryOrderer, HistoryWalk};
pub use refs::{RefResolver, ResolvedRef};
