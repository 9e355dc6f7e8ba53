//! chronicle core types
//!
//! Pure data types shared by the commit source, the snapshot store and the
//! replay engine. No I/O happens in this crate.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod hash;
pub mod id;
pub mod mapping;
pub mod time;

// Re-exports
pub use error::{CoreError, CoreResult};
pub use hash::{Hash, HashError};
pub use id::{ObjectId, ObjectIdError, SnapshotId};
pub use mapping::FlatContentMapping;
pub use time::{CommitTime, Sequence};
