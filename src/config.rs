//! Run configuration
//!
//! Read from an optional JSON file. Every field has a default, and command
//! line flags override file values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checks::DEFAULT_LOGO_SIZE;

/// Environment variable holding the GitHub API token.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Invalid config JSON in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Configuration of one validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Directory holding one subdirectory per package
    #[serde(default = "default_registry_dir")]
    pub registry_dir: PathBuf,

    /// Path of the JSON Schema document
    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,

    /// Output directory; the collection goes to stdout when unset
    #[serde(default)]
    pub outdir: Option<PathBuf>,

    /// Name of the metadata document inside each package directory
    #[serde(default = "default_meta_file_name")]
    pub meta_file_name: String,

    /// Edge of the logo bounding box in pixels
    #[serde(default = "default_logo_size")]
    pub logo_size: u32,

    /// Whether links, package indexes and contacts are checked over the network
    #[serde(default)]
    pub remote_checks: bool,

    /// Timeout for each remote request
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_registry_dir() -> PathBuf {
    PathBuf::from("packages")
}
fn default_schema_path() -> PathBuf {
    PathBuf::from("schema.json")
}
fn default_meta_file_name() -> String {
    "meta.yaml".to_string()
}
fn default_logo_size() -> u32 {
    DEFAULT_LOGO_SIZE
}
fn default_http_timeout_secs() -> u64 {
    30
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            registry_dir: default_registry_dir(),
            schema_path: default_schema_path(),
            outdir: None,
            meta_file_name: default_meta_file_name(),
            logo_size: default_logo_size(),
            remote_checks: false,
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl RegistryConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: RegistryConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        config.validate()?;

        Ok(config)
    }

    /// Rejects values no run can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.meta_file_name.trim().is_empty() {
            return Err(ConfigError::Invalid("meta_file_name must not be empty".into()));
        }
        if self.meta_file_name.contains('/') || self.meta_file_name.contains('\\') {
            return Err(ConfigError::Invalid(format!(
                "meta_file_name must be a plain file name, got '{}'",
                self.meta_file_name
            )));
        }
        if self.logo_size == 0 {
            return Err(ConfigError::Invalid("logo_size must be > 0".into()));
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::Invalid("http_timeout_secs must be > 0".into()));
        }
        Ok(())
    }

    /// Reads the GitHub token from the environment.
    pub fn github_token() -> Option<String> {
        std::env::var(GITHUB_TOKEN_ENV).ok().filter(|t| !t.is_empty())
    }
}
