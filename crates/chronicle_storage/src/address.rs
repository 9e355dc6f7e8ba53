//! Content addressing for blob storage.

use chronicle_core::{CoreError, CoreResult, Hash};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content address combining hash and algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentAddress {
    /// Hash of the content
    pub hash: Hash,
    /// Algorithm used to compute the hash
    pub algorithm: AddressAlgorithm,
}

impl ContentAddress {
    /// Create a new content address
    #[must_use]
    pub const fn new(hash: Hash, algorithm: AddressAlgorithm) -> Self {
        Self { hash, algorithm }
    }

    /// Address `data` with the given algorithm
    #[must_use]
    pub fn compute(data: &[u8], algorithm: AddressAlgorithm) -> Self {
        Self {
            hash: algorithm.hash(data),
            algorithm,
        }
    }

    /// Parse from the `algorithm:hex` form
    ///
    /// # Errors
    ///
    /// Returns error if the algorithm is unknown or the hash is not valid hex
    pub fn parse(s: &str) -> CoreResult<Self> {
        let (algorithm, hex) = s.split_once(':').ok_or_else(|| CoreError::Validation {
            field: "address".to_string(),
            reason: "Invalid address format".to_string(),
        })?;

        let algorithm = AddressAlgorithm::parse(algorithm)?;
        let hash = Hash::from_hex(hex).map_err(|e| CoreError::InvalidHash {
            reason: e.to_string(),
        })?;

        Ok(Self { hash, algorithm })
    }

    /// Abbreviated form for log output
    #[must_use]
    pub fn short(&self) -> String {
        format!("{}:{}", self.algorithm.as_str(), self.hash.short(12))
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm.as_str(), self.hash.to_hex())
    }
}

/// Address algorithm for content hashing
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AddressAlgorithm {
    /// BLAKE3
    #[default]
    Blake3,
    /// SHA-256
    Sha256,
}

impl AddressAlgorithm {
    /// Parse algorithm from its lowercase name
    ///
    /// # Errors
    ///
    /// Returns error if algorithm is unknown
    pub fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "blake3" => Ok(Self::Blake3),
            "sha256" => Ok(Self::Sha256),
            _ => Err(CoreError::Validation {
                field: "algorithm".to_string(),
                reason: format!("Unknown algorithm: {}", s),
            }),
        }
    }

    /// Lowercase name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Blake3 => "blake3",
            Self::Sha256 => "sha256",
        }
    }

    /// Compute hash of data using this algorithm
    #[must_use]
    pub fn hash(&self, data: &[u8]) -> Hash {
        match self {
            Self::Blake3 => Hash::compute(data),
            Self::Sha256 => {
                use sha2::Digest;
                let digest = sha2::Sha256::new().chain_update(data).finalize();
                Hash::from_bytes(digest.into())
            }
        }
    }
}

impl fmt::Display for AddressAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
