//! Schema error types
//!
//! Error codes:
//! - ECOREG_SCHEMA_VIOLATION (REJECT)
//! - ECOREG_META_SCHEMA_VIOLATION (FATAL)
//! - ECOREG_SCHEMA_UNREADABLE (FATAL)

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The offending document is rejected, the run continues collecting errors
    Reject,
    /// The run cannot proceed at all
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// A metadata document violates one or more schema constraints
    SchemaViolation,
    /// The schema document is not a valid draft 2020-12 JSON Schema
    MetaSchemaViolation,
    /// The schema document could not be read or parsed
    SchemaUnreadable,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::SchemaViolation => "ECOREG_SCHEMA_VIOLATION",
            SchemaErrorCode::MetaSchemaViolation => "ECOREG_META_SCHEMA_VIOLATION",
            SchemaErrorCode::SchemaUnreadable => "ECOREG_SCHEMA_UNREADABLE",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::SchemaViolation => Severity::Reject,
            SchemaErrorCode::MetaSchemaViolation | SchemaErrorCode::SchemaUnreadable => {
                Severity::Fatal
            }
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One violated constraint inside a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDetails {
    /// Field path (e.g., "install.pypi", "publications[1]", "$root")
    pub field: String,
    /// Schema keyword that failed (e.g., "required", "enum", "pattern")
    pub constraint: String,
    /// Human-readable description of the failure
    pub message: String,
}

impl ValidationDetails {
    pub fn new(
        field: impl Into<String>,
        constraint: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            constraint: constraint.into(),
            message: message.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            message: format!("'{}' is a required property", field),
            field,
            constraint: "required".into(),
        }
    }

    pub fn unexpected_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            message: format!("'{}' is not a declared property", field),
            field,
            constraint: "additionalProperties".into(),
        }
    }
}

impl fmt::Display for ValidationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}' ({}): {}", self.field, self.constraint, self.message)
    }
}

/// Schema error type with full context
#[derive(Debug)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    /// Every violated constraint, in the order the validator reported them
    details: Vec<ValidationDetails>,
}

impl SchemaError {
    /// Create a document violation error carrying all collected details
    pub fn violation(document: impl Into<String>, details: Vec<ValidationDetails>) -> Self {
        Self {
            code: SchemaErrorCode::SchemaViolation,
            message: format!(
                "Document '{}' violates {} schema constraint(s)",
                document.into(),
                details.len()
            ),
            details,
        }
    }

    /// Create a meta-schema violation error for the schema document itself
    pub fn meta_schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::MetaSchemaViolation,
            message: format!(
                "Schema '{}' is not a valid JSON Schema: {}",
                path.into(),
                reason.into()
            ),
            details: Vec::new(),
        }
    }

    /// Create an error for a schema file that cannot be read or parsed
    pub fn unreadable(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::SchemaUnreadable,
            message: format!("Cannot load schema '{}': {}", path.into(), reason.into()),
            details: Vec::new(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns all validation details
    pub fn details(&self) -> &[ValidationDetails] {
        &self.details
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)?;
        for detail in &self.details {
            write!(f, "\n  - {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaErrorCode::SchemaViolation.code(), "ECOREG_SCHEMA_VIOLATION");
        assert_eq!(
            SchemaErrorCode::MetaSchemaViolation.code(),
            "ECOREG_META_SCHEMA_VIOLATION"
        );
        assert_eq!(SchemaErrorCode::SchemaUnreadable.code(), "ECOREG_SCHEMA_UNREADABLE");
    }

    #[test]
    fn test_severity_levels() {
        assert_eq!(SchemaErrorCode::SchemaViolation.severity(), Severity::Reject);
        assert_eq!(SchemaErrorCode::MetaSchemaViolation.severity(), Severity::Fatal);
        assert!(SchemaError::unreadable("schema.json", "missing").is_fatal());
    }

    #[test]
    fn test_missing_field_details() {
        let details = ValidationDetails::missing_field("license");
        assert_eq!(details.field, "license");
        assert_eq!(details.constraint, "required");
        assert!(details.to_string().contains("license"));
    }

    #[test]
    fn test_violation_lists_every_detail() {
        let err = SchemaError::violation(
            "scanpy",
            vec![
                ValidationDetails::missing_field("license"),
                ValidationDetails::new("tags", "uniqueItems", "has non-unique elements"),
            ],
        );
        assert_eq!(err.details().len(), 2);
        let display = err.to_string();
        assert!(display.starts_with("[REJECT] ECOREG_SCHEMA_VIOLATION"));
        assert!(display.contains("2 schema constraint(s)"));
        assert!(display.contains("field 'tags' (uniqueItems)"));
    }
}
