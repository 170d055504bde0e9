//! CLI-specific error types
//!
//! Every CLI error ends the process with exit code 1.

use std::fmt;
use std::io;

use crate::aggregate::PipelineError;
use crate::checks::ProbeError;
use crate::config::ConfigError;
use crate::schema::SchemaError;
use crate::template_repos::TemplateReposError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file or flag error
    ConfigError,
    /// I/O error (stdout)
    IoError,
    /// Schema could not be loaded
    SchemaError,
    /// Validation or publication failed
    PipelineFailed,
    /// A remote service could not be reached
    RemoteError,
    /// Template repository list could not be updated
    TemplateReposFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "ECOREG_CLI_CONFIG_ERROR",
            Self::IoError => "ECOREG_CLI_IO_ERROR",
            Self::SchemaError => "ECOREG_CLI_SCHEMA_ERROR",
            Self::PipelineFailed => "ECOREG_CLI_PIPELINE_FAILED",
            Self::RemoteError => "ECOREG_CLI_REMOTE_ERROR",
            Self::TemplateReposFailed => "ECOREG_CLI_TEMPLATE_REPOS_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        Self::new(CliErrorCode::SchemaError, e.to_string())
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Schema(e) => e.into(),
            other => Self::new(CliErrorCode::PipelineFailed, other.to_string()),
        }
    }
}

impl From<ProbeError> for CliError {
    fn from(e: ProbeError) -> Self {
        Self::new(CliErrorCode::RemoteError, e.to_string())
    }
}

impl From<TemplateReposError> for CliError {
    fn from(e: TemplateReposError) -> Self {
        Self::new(CliErrorCode::TemplateReposFailed, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_display_carries_code() {
        let err = CliError::config_error("logo_size must be > 0");
        assert_eq!(
            err.to_string(),
            "ECOREG_CLI_CONFIG_ERROR: logo_size must be > 0"
        );
    }

    #[test]
    fn test_pipeline_schema_error_maps_to_schema_code() {
        let err: CliError = PipelineError::Schema(SchemaError::unreadable("schema.json", "gone")).into();
        assert_eq!(err.code(), &CliErrorCode::SchemaError);

        let err: CliError = PipelineError::OutputExists(PathBuf::from("out/packages.json")).into();
        assert_eq!(err.code(), &CliErrorCode::PipelineFailed);
        assert!(err.message().contains("out/packages.json"));
    }
}
