//! Configuration file loading.

use chronicle_replay::ReplayConfig;
use chronicle_storage::StoreConfig;
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChronicleConfig {
    /// Replay settings
    pub replay: ReplayConfig,
    /// Snapshot store settings
    pub store: StoreConfig,
}

impl ChronicleConfig {
    /// Read a JSON configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&raw)
            .wrap_err_with(|| format!("failed to parse config {}", path.display()))
    }

    /// Load `path` if given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_storage::AddressAlgorithm;
    use std::io::Write;

    #[test]
    fn test_partial_document_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"replay": {{"max_commits": 10}}, "store": {{"algorithm": "sha256"}}}}"#
        )
        .unwrap();

        let config = ChronicleConfig::load(file.path()).unwrap();
        assert_eq!(config.replay.max_commits, 10);
        assert!(config.replay.skip_gitlinks);
        assert_eq!(config.store.algorithm, AddressAlgorithm::Sha256);
        assert_eq!(config.store.max_blob_size, 0);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ChronicleConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }

    #[test]
    fn test_no_path_is_default() {
        assert_eq!(
            ChronicleConfig::load_or_default(None).unwrap(),
            ChronicleConfig::default()
        );
    }
}
