/*!
 * Configuration types for Bagger
 *
 * All process-wide settings are constructed once at startup and threaded
 * through constructors explicitly; nothing reads ambient process state.
 */

use crate::error::{Error, Result};
use crate::fixity::DigestAlgorithm;
use crate::transfer::submit::DEFAULT_CHUNK_SIZE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;

/// Minimum multipart part size accepted by S3
const MIN_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// Log verbosity for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Main configuration for bag assembly and submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaggerConfig {
    /// Organization name recorded as `Source-Organization`
    #[serde(default)]
    pub source_organization: Option<String>,

    /// Short organization id prefixed to every bag name
    #[serde(default = "default_source_organization_id")]
    pub source_organization_id: String,

    /// Scratch directory where bags are assembled and archived
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    /// Digest algorithm for payload and tag manifests
    #[serde(default)]
    pub manifest_algorithm: DigestAlgorithm,

    /// Single-shot/multipart threshold and part size in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,

    /// Overwrite pre-existing remote objects of the same key
    #[serde(default)]
    pub overwrite: bool,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_source_organization_id() -> String {
    "test".to_string()
}

fn default_staging_dir() -> PathBuf {
    std::env::temp_dir().join("bagger")
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

impl Default for BaggerConfig {
    fn default() -> Self {
        Self {
            source_organization: None,
            source_organization_id: default_source_organization_id(),
            staging_dir: default_staging_dir(),
            manifest_algorithm: DigestAlgorithm::default(),
            chunk_size: default_chunk_size(),
            overwrite: false,
            log_level: LogLevel::default(),
            log_file: None,
        }
    }
}

impl BaggerConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: BaggerConfig = toml::from_str(&text)
            .map_err(|e| Error::config(format!("cannot parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_organization_id.is_empty() {
            return Err(Error::config("source organization id must not be empty"));
        }
        if self.chunk_size < MIN_CHUNK_SIZE {
            return Err(Error::config(format!(
                "chunk size {} is below the {} byte multipart minimum",
                self.chunk_size, MIN_CHUNK_SIZE
            )));
        }
        Ok(())
    }

    /// Bag (and archive base) name for one item: `<org-id>.<item-id>`
    pub fn bag_name(&self, item_id: &str) -> String {
        format!("{}.{}", self.source_organization_id, item_id)
    }
}
