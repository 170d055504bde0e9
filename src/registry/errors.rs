//! Registry discovery errors

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised while walking the registry directory
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid registry directory: {0}")]
    RegistryDirMissing(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to walk registry: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Malformed document {path}: {reason}")]
    MalformedDocument { path: PathBuf, reason: String },
}

impl RegistryError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::RegistryDirMissing(_) => "ECOREG_REGISTRY_DIR_MISSING",
            RegistryError::Io { .. } | RegistryError::Walk(_) => "ECOREG_REGISTRY_IO",
            RegistryError::MalformedDocument { .. } => "ECOREG_MALFORMED_DOCUMENT",
        }
    }
}
