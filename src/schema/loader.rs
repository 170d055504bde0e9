//! Schema loader for the registry's metadata schema
//!
//! - One draft 2020-12 JSON Schema document for the whole registry
//! - Checked against the JSON Schema meta-schema before anything is compiled
//! - A broken schema stops the run before any package is validated

use std::fmt;
use std::fs;
use std::path::Path;

use jsonschema::{Draft, Validator};
use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};

/// Copy of the repository schema compiled into the binary.
const BUNDLED_SCHEMA: &str = include_str!("../../schema.json");

/// Holds the schema document and its compiled form.
pub struct SchemaLoader {
    /// Where the schema came from, for messages
    source: String,
    /// Raw schema document
    schema: Value,
    /// Compiled validator with format assertion enabled
    compiled: Validator,
}

impl fmt::Debug for SchemaLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaLoader")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl SchemaLoader {
    /// Loads and compiles the schema file at `path`.
    ///
    /// Unreadable files and invalid JSON are `ECOREG_SCHEMA_UNREADABLE`;
    /// a document that is not a valid JSON Schema is
    /// `ECOREG_META_SCHEMA_VIOLATION`.
    pub fn load(path: &Path) -> SchemaResult<Self> {
        let source = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::unreadable(&source, format!("Failed to read file: {}", e))
        })?;

        let schema: Value = serde_json::from_str(&content)
            .map_err(|e| SchemaError::unreadable(&source, format!("Invalid JSON: {}", e)))?;

        Self::from_value(source, schema)
    }

    /// Compiles a schema held in memory.
    pub fn from_value(source: impl Into<String>, schema: Value) -> SchemaResult<Self> {
        let source = source.into();

        check_meta_schema(&source, &schema)?;

        let compiled = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .should_validate_formats(true)
            .build(&schema)
            .map_err(|e| SchemaError::meta_schema(&source, e.to_string()))?;

        Ok(Self {
            source,
            schema,
            compiled,
        })
    }

    /// Compiles the schema bundled with this crate.
    pub fn bundled() -> SchemaResult<Self> {
        let schema: Value = serde_json::from_str(BUNDLED_SCHEMA)
            .map_err(|e| SchemaError::unreadable("<bundled>", format!("Invalid JSON: {}", e)))?;
        Self::from_value("<bundled>", schema)
    }

    /// Returns where the schema was loaded from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the raw schema document.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Returns the compiled validator.
    pub(crate) fn compiled(&self) -> &Validator {
        &self.compiled
    }

    /// Returns the names of the mandatory top-level fields.
    pub fn required_fields(&self) -> Vec<&str> {
        self.schema
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Validates a schema document against the JSON Schema meta-schema.
pub fn check_meta_schema(source: &str, schema: &Value) -> SchemaResult<()> {
    if !schema.is_object() {
        return Err(SchemaError::meta_schema(source, "schema must be a JSON object"));
    }

    jsonschema::meta::validate(schema).map_err(|e| {
        let location = e.instance_path.to_string();
        let reason = if location.is_empty() {
            e.to_string()
        } else {
            format!("{} (at {})", e, location)
        };
        SchemaError::meta_schema(source, reason)
    })
}
