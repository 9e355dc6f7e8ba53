//! Identifiers for source objects and stored snapshots.
//!
//! Source object ids come from the commit source (SHA-1 or SHA-256 wide) and
//! are kept verbatim. Snapshot ids are assigned by the snapshot store.

use crate::hash::Hash;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an object in the commit source (commit, tree, blob or tag)
///
/// Holds up to 32 raw bytes so both SHA-1 (20 byte) and SHA-256 (32 byte)
/// object formats fit without allocation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ObjectId {
    len: u8,
    bytes: [u8; ObjectId::MAX_LEN],
}

impl ObjectId {
    /// Maximum raw length of an object id
    pub const MAX_LEN: usize = 32;

    /// Create from raw bytes
    ///
    /// # Errors
    ///
    /// Returns error if the slice is empty or longer than [`Self::MAX_LEN`]
    pub fn from_slice(raw: &[u8]) -> Result<Self, ObjectIdError> {
        if raw.is_empty() || raw.len() > Self::MAX_LEN {
            return Err(ObjectIdError::InvalidLength(raw.len()));
        }
        let mut bytes = [0u8; Self::MAX_LEN];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Self {
            len: raw.len() as u8,
            bytes,
        })
    }

    /// Parse from hex string
    ///
    /// # Errors
    ///
    /// Returns error if hex is invalid or has an unsupported length
    pub fn from_hex(hex: &str) -> Result<Self, ObjectIdError> {
        let raw = hex::decode(hex).map_err(|_| ObjectIdError::InvalidHex)?;
        Self::from_slice(&raw)
    }

    /// Derive an id by hashing `data` and keeping the first `len` bytes
    ///
    /// Used by sources that mint their own ids.
    #[must_use]
    pub fn derive(data: &[u8], len: usize) -> Self {
        let len = len.clamp(1, Self::MAX_LEN);
        let hash = Hash::compute(data);
        let mut bytes = [0u8; Self::MAX_LEN];
        bytes[..len].copy_from_slice(&hash.as_bytes()[..len]);
        Self {
            len: len as u8,
            bytes,
        }
    }

    /// Raw id bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Convert to hex string
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Abbreviated hex form (first 7 characters, like `git log --oneline`)
    #[must_use]
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(7);
        hex
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.to_hex()
    }
}

impl TryFrom<String> for ObjectId {
    type Error = ObjectIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl std::str::FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Object id parse errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectIdError {
    /// Invalid hex encoding
    InvalidHex,
    /// Empty or longer than 32 bytes
    InvalidLength(usize),
}

impl std::error::Error for ObjectIdError {}

impl fmt::Display for ObjectIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHex => write!(f, "Invalid hex encoding"),
            Self::InvalidLength(len) => {
                write!(f, "Invalid object id length: {} (expected 1..=32)", len)
            }
        }
    }
}

/// Snapshot identifier - content hash assigned by the snapshot store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(Hash);

impl SnapshotId {
    /// Wrap a hash
    #[must_use]
    pub const fn from_hash(hash: Hash) -> Self {
        Self(hash)
    }

    /// Underlying hash
    #[must_use]
    pub const fn as_hash(&self) -> &Hash {
        &self.0
    }

    /// Abbreviated form for logs
    #[must_use]
    pub fn short(&self) -> String {
        self.0.short(12)
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "snap_{}", self.0)
    }
}
