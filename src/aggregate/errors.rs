//! Pipeline errors
//!
//! Every variant fails the run; nothing is published after an error.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::registry::RegistryError;
use crate::report::ValidationReport;
use crate::schema::SchemaError;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(
        "{} of {} package(s) failed validation\n{}",
        .0.failed_count(),
        .0.package_count(),
        .0
    )]
    ValidationFailed(ValidationReport),

    #[error("Output already exists: {0}")]
    OutputExists(PathBuf),

    #[error("Failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize collection: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PipelineError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Schema(e) => e.code().code(),
            PipelineError::Registry(e) => e.code(),
            PipelineError::ValidationFailed(_) => "ECOREG_VALIDATION_FAILED",
            PipelineError::OutputExists(_) => "ECOREG_OUTPUT_EXISTS",
            PipelineError::Output { .. } => "ECOREG_OUTPUT_IO",
            PipelineError::Serialize(_) => "ECOREG_SERIALIZE",
        }
    }

    /// Returns the report of a failed validation, if that is what failed.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            PipelineError::ValidationFailed(report) => Some(report),
            _ => None,
        }
    }
}
