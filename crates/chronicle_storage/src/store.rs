//! Content-addressed blob store.

use crate::address::AddressAlgorithm;
use crate::blob::{Blob, BlobId};
use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum blob size in bytes (0 = unlimited)
    pub max_blob_size: usize,
    /// Algorithm used to address blob content
    pub algorithm: AddressAlgorithm,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_blob_size: 0,
            algorithm: AddressAlgorithm::Blake3,
        }
    }
}

/// Store statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of distinct blobs
    pub blob_count: usize,
    /// Bytes held by distinct blobs
    pub total_bytes: u64,
    /// Number of write calls
    pub write_count: u64,
    /// Writes whose content was already present
    pub deduplicated_writes: u64,
}

/// In-memory content store
///
/// Writes take `&mut self`; the store is owned by a single snapshot repo.
#[derive(Debug, Default)]
pub struct ContentStore {
    config: StoreConfig,
    blobs: HashMap<BlobId, Blob>,
    stats: StoreStats,
}

impl ContentStore {
    /// Create a new content store
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create with custom configuration
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            blobs: HashMap::new(),
            stats: StoreStats::default(),
        }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Check `size` against the configured limit
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BlobTooLarge`] if the limit is exceeded
    pub fn check_size(&self, path: &str, size: usize) -> StoreResult<()> {
        let limit = self.config.max_blob_size;
        if limit > 0 && size > limit {
            return Err(StoreError::BlobTooLarge {
                path: path.to_string(),
                size,
                limit,
            });
        }
        Ok(())
    }

    /// Write a blob to the store, returning its address
    ///
    /// Writing content that is already present is a no-op apart from the
    /// statistics.
    ///
    /// # Errors
    ///
    /// Returns error if the blob exceeds the size limit
    pub fn write(&mut self, path: &str, data: Vec<u8>) -> StoreResult<BlobId> {
        self.check_size(path, data.len())?;

        let blob = Blob::new(data, self.config.algorithm);
        let id = blob.id();
        self.stats.write_count += 1;

        if self.blobs.contains_key(&id) {
            self.stats.deduplicated_writes += 1;
        } else {
            self.stats.blob_count += 1;
            self.stats.total_bytes += blob.size() as u64;
            self.blobs.insert(id, blob);
        }

        Ok(id)
    }

    /// Read a blob from the store
    ///
    /// # Errors
    ///
    /// Returns error if blob not found
    pub fn read(&self, id: &BlobId) -> StoreResult<Blob> {
        self.blobs
            .get(id)
            .cloned()
            .ok_or(StoreError::BlobNotFound { id: *id })
    }

    /// Check if a blob exists
    #[must_use]
    pub fn contains(&self, id: &BlobId) -> bool {
        self.blobs.contains_key(id)
    }

    /// Get store statistics
    #[must_use]
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Number of distinct blobs
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether no blob has been written
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::ContentAddress;

    #[test]
    fn test_store_config_default() {
        let config = StoreConfig::default();
        assert_eq!(config.max_blob_size, 0);
        assert_eq!(config.algorithm, AddressAlgorithm::Blake3);
    }

    #[test]
    fn test_default_store_accepts_large_blobs() {
        let store = ContentStore::new();
        assert!(store.check_size("video.mp4", 512 * 1024 * 1024).is_ok());
    }

    #[test]
    fn test_store_config_from_json() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"algorithm": "sha256"}"#).unwrap();
        assert_eq!(config.algorithm, AddressAlgorithm::Sha256);
        assert_eq!(config.max_blob_size, StoreConfig::default().max_blob_size);
    }

    #[test]
    fn test_store_new() {
        let store = ContentStore::new();
        assert!(store.is_empty());
        assert_eq!(store.stats().total_bytes, 0);
    }

    #[test]
    fn test_store_write_read() {
        let mut store = ContentStore::new();
        let data = b"hello world".to_vec();
        let id = store.write("greeting.txt", data.clone()).unwrap();

        let blob = store.read(&id).unwrap();
        assert_eq!(blob.as_bytes(), &data[..]);
        assert!(store.contains(&id));
    }

    #[test]
    fn test_store_read_missing() {
        let store = ContentStore::new();
        let id = ContentAddress::compute(b"other", AddressAlgorithm::Blake3);
        assert_eq!(store.read(&id), Err(StoreError::BlobNotFound { id }));
    }

    #[test]
    fn test_store_write_duplicate() {
        let mut store = ContentStore::new();
        let id1 = store.write("a.txt", b"duplicate".to_vec()).unwrap();
        let id2 = store.write("b.txt", b"duplicate".to_vec()).unwrap();

        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
        let stats = store.stats();
        assert_eq!(stats.blob_count, 1);
        assert_eq!(stats.total_bytes, 9);
        assert_eq!(stats.write_count, 2);
        assert_eq!(stats.deduplicated_writes, 1);
    }

    #[test]
    fn test_store_blob_too_large() {
        let mut store = ContentStore::with_config(StoreConfig {
            max_blob_size: 10,
            ..Default::default()
        });
        let result = store.write("big.bin", vec![0u8; 100]);
        assert!(matches!(
            result,
            Err(StoreError::BlobTooLarge { size: 100, limit: 10, .. })
        ));
        assert!(store.is_empty());
        assert_eq!(store.stats().write_count, 0);
    }

    #[test]
    fn test_store_unlimited_size() {
        let mut store = ContentStore::with_config(StoreConfig {
            max_blob_size: 0,
            ..Default::default()
        });
        assert!(store.write("big.bin", vec![1u8; 4096]).is_ok());
    }
}
