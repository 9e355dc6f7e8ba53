//! chronicle storage
//!
//! In-memory content-addressed snapshot store. Blobs are deduplicated by
//! content address; snapshots record a manifest of path to blob address and
//! form a history that can be searched and checked out.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod address;
pub mod blob;
pub mod error;
pub mod query;
pub mod search;
pub mod snapshot;
pub mod store;

pub use address::{AddressAlgorithm, ContentAddress};
pub use blob::{Blob, BlobId};
pub use error::{StoreError, StoreResult};
pub use query::QueryEngine;
pub use search::{SearchExpression, SearchResults};
pub use snapshot::{SnapshotRepo, StoredSnapshot};
pub use store::{ContentStore, StoreConfig, StoreStats};
