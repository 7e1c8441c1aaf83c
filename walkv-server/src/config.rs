//! Server configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via WALKV_CONFIG)
//! 3. Environment variables

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use walkv_storage::StoreConfig;
use walkv_wal::{CompressionConfig, CompressionType, DEFAULT_SEGMENT_SIZE};

/// Server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Network configuration.
    pub network: NetworkConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Compaction configuration.
    pub compaction: CompactionConfig,
}

impl Config {
    /// Loads configuration from file, then applies environment variable
    /// overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("WALKV_CONFIG") {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.network.apply_env_overrides();
        self.storage.apply_env_overrides();
        self.compaction.apply_env_overrides();
    }
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:7400".parse().unwrap(),
        }
    }
}

impl NetworkConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("WALKV_BIND") {
            if let Ok(parsed) = addr.parse() {
                self.bind_addr = parsed;
            }
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// WAL segment rotation threshold in bytes.
    pub segment_size: u64,
    /// Record compression settings.
    pub compression: CompressionConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            segment_size: DEFAULT_SEGMENT_SIZE,
            compression: CompressionConfig::default(),
        }
    }
}

impl StorageConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("WALKV_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(size) = std::env::var("WALKV_SEGMENT_SIZE") {
            if let Ok(parsed) = size.parse() {
                self.segment_size = parsed;
            }
        }
        if let Ok(kind) = std::env::var("WALKV_COMPRESSION") {
            match kind.to_ascii_lowercase().as_str() {
                "none" => self.compression.algorithm = CompressionType::None,
                "zlib" => self.compression.algorithm = CompressionType::Zlib,
                _ => {}
            }
        }
        if let Ok(level) = std::env::var("WALKV_COMPRESSION_LEVEL") {
            if let Ok(parsed) = level.parse::<u32>() {
                self.compression.level = parsed.min(9);
            }
        }
    }

    /// Converts to the store's own configuration type.
    pub fn to_store_config(&self) -> StoreConfig {
        StoreConfig::new(&self.data_dir)
            .with_segment_size(self.segment_size)
            .with_compression(self.compression)
    }
}

/// Compaction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionConfig {
    /// Seconds between compaction passes.
    pub interval_secs: u64,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            interval_secs: walkv_storage::DEFAULT_COMPACTION_INTERVAL.as_secs(),
        }
    }
}

impl CompactionConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(secs) = std::env::var("WALKV_COMPACTION_INTERVAL_SECS") {
            if let Ok(parsed) = secs.parse() {
                self.interval_secs = parsed;
            }
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(PathBuf, std::io::Error),

    #[error("failed to parse config file {0}: {1}")]
    Parse(PathBuf, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.network.bind_addr.port(), 7400);
        assert_eq!(config.storage.segment_size, DEFAULT_SEGMENT_SIZE);
        assert_eq!(config.storage.compression.algorithm, CompressionType::Zlib);
        assert_eq!(config.storage.compression.level, 6);
        assert_eq!(config.compaction.interval_secs, 60);
    }

    #[test]
    fn test_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("walkv.yaml");
        std::fs::write(
            &path,
            r#"
network:
  bind_addr: "0.0.0.0:9999"
storage:
  data_dir: "/var/lib/walkv"
  segment_size: 1048576
  compression:
    algorithm: none
compaction:
  interval_secs: 5
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.network.bind_addr.port(), 9999);
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/walkv"));
        assert_eq!(config.storage.segment_size, 1048576);
        assert_eq!(config.storage.compression.algorithm, CompressionType::None);
        assert_eq!(config.compaction.interval_secs, 5);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("walkv.yaml");
        std::fs::write(&path, "network:\n  bind_addr: \"127.0.0.1:7500\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.network.bind_addr.port(), 7500);
        assert_eq!(config.storage.segment_size, DEFAULT_SEGMENT_SIZE);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("walkv.yaml");
        std::fs::write(&path, "network: [not a mapping").unwrap();

        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::Parse(_, _))
        ));
    }

    #[test]
    fn test_to_store_config() {
        let mut config = Config::default();
        config.storage.data_dir = PathBuf::from("/tmp/kv");
        config.storage.segment_size = 4096;

        let store_config = config.storage.to_store_config();
        assert_eq!(store_config.data_dir, PathBuf::from("/tmp/kv"));
        assert_eq!(store_config.segment_size, 4096);
    }
}
