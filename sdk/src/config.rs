//! Client configuration stored as JSON under `~/.sip`

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::keystore::{KdfParams, Keystore};

/// Default directory for client state
const SIP_DIR: &str = ".sip";
pub const CONFIG_FILE: &str = "config.json";
const KEYS_FILE: &str = "keys.enc";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SipConfig {
    /// Chain used when none is given explicitly
    pub default_chain: String,
    /// Announcements fetched per scan page
    pub scan_batch_size: usize,
    /// Worker shards for parallel scans
    pub scan_shards: usize,
    pub keystore_path: Option<PathBuf>,
    pub kdf: KdfParams,
}

impl Default for SipConfig {
    fn default() -> Self {
        Self {
            default_chain: "solana".to_string(),
            scan_batch_size: 256,
            scan_shards: 4,
            keystore_path: None,
            kdf: KdfParams::default(),
        }
    }
}

impl SipConfig {
    /// `~/.sip`, or `None` when no home directory is known
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(SIP_DIR))
    }

    /// Load a config file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&json).context("Failed to parse config")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write config {}", path.display()))
    }

    /// Keystore at the configured path, falling back to `~/.sip/keys.enc`
    pub fn keystore(&self) -> Result<Keystore> {
        let path = match &self.keystore_path {
            Some(path) => path.clone(),
            None => Self::default_dir()
                .map(|dir| dir.join(KEYS_FILE))
                .context("Could not find home directory")?,
        };
        Ok(Keystore::new(path).with_kdf(self.kdf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = SipConfig::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, SipConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = SipConfig {
            default_chain: "ethereum".into(),
            scan_shards: 8,
            keystore_path: Some(dir.path().join("keys.enc")),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(SipConfig::load(&path).unwrap(), config);

        let store = config.keystore().unwrap();
        assert_eq!(store.path(), dir.path().join("keys.enc").as_path());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{ "scan_batch_size": 32 }"#).unwrap();
        let config = SipConfig::load(&path).unwrap();
        assert_eq!(config.scan_batch_size, 32);
        assert_eq!(config.default_chain, "solana");
        assert_eq!(config.kdf, KdfParams::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "not json").unwrap();
        assert!(SipConfig::load(&path).is_err());
    }
}
