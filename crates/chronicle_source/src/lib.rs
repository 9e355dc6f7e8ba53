//! chronicle commit source
//!
//! The read-only capability the replay engine needs from a version-controlled
//! repository: enumerate references, peel annotated tags, load typed objects
//! and walk trees. [`GitSource`] adapts a `git2` repository; [`MemorySource`]
//! is an in-memory object database for fixtures and tests.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod git;
pub mod memory;
pub mod object;
pub mod source;

pub use error::{SourceError, SourceResult};
pub use git::GitSource;
pub use memory::MemorySource;
pub use object::{FileMode, ObjectKind, RepositoryReference, SourceCommit, TreeEntry};
pub use source::{CommitSource, DEFAULT_PEEL_DEPTH};
