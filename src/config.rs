//! Configuration for arclift.
//!
//! Settings are read from `<config dir>/arclift/config.json` when it exists
//! (e.g. `~/.config/arclift/config.json` on Linux). Command line flags
//! override individual values after loading.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::upload::{DEFAULT_CHUNK_SIZE, MAX_PART_SIZE};

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Size of every uploaded part except the last one.
    pub chunk_size_bytes: u64,

    /// Name of the S3 provider preset (`aws` or `localstack`).
    pub provider: String,

    /// Endpoint override for S3-compatible stores.
    pub endpoint_url: Option<String>,

    /// Region override.
    pub region: Option<String>,

    /// Bucket receiving uploads.
    pub bucket: Option<String>,

    /// Key prefix under which uploaded archives are stored.
    pub key_prefix: String,

    /// Number of archive trees kept in memory.
    pub cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size_bytes: DEFAULT_CHUNK_SIZE,
            provider: "aws".to_string(),
            endpoint_url: None,
            region: None,
            bucket: None,
            key_prefix: "exports".to_string(),
            cache_capacity: 16,
        }
    }
}

impl Config {
    /// Load the configuration from the default location, falling back to
    /// defaults when no file exists.
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load the configuration from a specific JSON file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size_bytes == 0 {
            return Err(anyhow!("chunk_size_bytes must be greater than zero"));
        }
        if self.chunk_size_bytes > MAX_PART_SIZE {
            return Err(anyhow!(
                "chunk_size_bytes {} exceeds the gateway maximum part size of {}",
                self.chunk_size_bytes,
                MAX_PART_SIZE
            ));
        }
        if self.cache_capacity == 0 {
            return Err(anyhow!("cache_capacity must be greater than zero"));
        }
        Ok(())
    }

    /// Bucket to upload into, or an error explaining how to set one.
    pub fn require_bucket(&self) -> Result<&str> {
        self.bucket
            .as_deref()
            .ok_or_else(|| anyhow!("No bucket configured. Pass --bucket or set ARCLIFT_BUCKET."))
    }
}

/// Platform-specific configuration file path.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("arclift").join("config.json"))
}
