//! Blob storage primitives.

use crate::address::{AddressAlgorithm, ContentAddress};
use std::sync::Arc;

/// Unique identifier for a blob
pub type BlobId = ContentAddress;

/// Immutable, cheaply cloneable file content with its address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    address: ContentAddress,
    data: Arc<[u8]>,
}

impl Blob {
    /// Create a blob, addressing it with `algorithm`
    #[must_use]
    pub fn new(data: Vec<u8>, algorithm: AddressAlgorithm) -> Self {
        Self {
            address: ContentAddress::compute(&data, algorithm),
            data: data.into(),
        }
    }

    /// Get blob ID
    #[must_use]
    pub const fn id(&self) -> BlobId {
        self.address
    }

    /// Get data bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Size in bytes
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Check if blob is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_new() {
        let blob = Blob::new(b"hello".to_vec(), AddressAlgorithm::Blake3);
        assert_eq!(blob.as_bytes(), b"hello");
        assert_eq!(blob.size(), 5);
        assert!(!blob.is_empty());
        assert_eq!(blob.id(), ContentAddress::compute(b"hello", AddressAlgorithm::Blake3));
    }

    #[test]
    fn test_blob_id_deterministic() {
        let a = Blob::new(b"same".to_vec(), AddressAlgorithm::Blake3);
        let b = Blob::new(b"same".to_vec(), AddressAlgorithm::Blake3);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_blob_clone_shares_data() {
        let blob = Blob::new(vec![7u8; 1024], AddressAlgorithm::Sha256);
        let copy = blob.clone();
        assert_eq!(copy.as_bytes().as_ptr(), blob.as_bytes().as_ptr());
    }

    #[test]
    fn test_empty_blob() {
        let blob = Blob::new(Vec::new(), AddressAlgorithm::Blake3);
        assert!(blob.is_empty());
        assert_eq!(blob.size(), 0);
    }
}
