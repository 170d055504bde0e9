//! Document validation against the registry schema
//!
//! Validation semantics:
//! - Every violated constraint is reported, never just the first
//! - Each violation names the field path and the failing keyword
//! - A missing mandatory field is reported under the field's own name
//! - Validation never mutates the document and is deterministic

use jsonschema::error::ValidationErrorKind;
use jsonschema::ValidationError;
use serde_json::Value;

use super::errors::{SchemaError, SchemaResult, ValidationDetails};
use super::loader::SchemaLoader;

/// Path used for violations that concern the document as a whole.
pub const ROOT_PATH: &str = "$root";

/// Validator that checks metadata documents against a loaded schema.
pub struct SchemaValidator<'a> {
    loader: &'a SchemaLoader,
}

impl<'a> SchemaValidator<'a> {
    /// Creates a new validator backed by the given schema loader.
    pub fn new(loader: &'a SchemaLoader) -> Self {
        Self { loader }
    }

    /// Collects every constraint the document violates.
    ///
    /// An empty list means the document is valid.
    pub fn validate_document(&self, document: &Value) -> Vec<ValidationDetails> {
        let mut details: Vec<ValidationDetails> = self
            .loader
            .compiled()
            .iter_errors(document)
            .flat_map(|error| to_details(&error))
            .collect();

        // The order the compiled schema yields errors in is an implementation
        // detail; reports must be stable across runs.
        details.sort_by(|a, b| {
            (a.field.as_str(), a.constraint.as_str()).cmp(&(b.field.as_str(), b.constraint.as_str()))
        });
        details.dedup();
        details
    }

    /// Validates a document, failing with every violation attached.
    ///
    /// # Errors
    ///
    /// Returns `ECOREG_SCHEMA_VIOLATION` listing all violated constraints.
    pub fn check_document(&self, document_id: &str, document: &Value) -> SchemaResult<()> {
        let details = self.validate_document(document);
        if details.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::violation(document_id, details))
        }
    }

    /// Returns true if the document satisfies the schema.
    pub fn is_valid(&self, document: &Value) -> bool {
        self.loader.compiled().is_valid(document)
    }
}

/// Converts one validator error into field-level details.
fn to_details(error: &ValidationError<'_>) -> Vec<ValidationDetails> {
    let parent = pointer_to_path(&error.instance_path.to_string());
    let constraint = keyword_of(&error.schema_path.to_string());

    match &error.kind {
        ValidationErrorKind::Required { property } => {
            let name = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            vec![ValidationDetails::missing_field(join_path(&parent, &name))]
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
            .iter()
            .map(|name| ValidationDetails::unexpected_field(join_path(&parent, name)))
            .collect(),
        _ => {
            let field = if parent.is_empty() {
                ROOT_PATH.to_string()
            } else {
                parent
            };
            vec![ValidationDetails::new(field, constraint, error.to_string())]
        }
    }
}

/// Turns a JSON pointer ("/publications/1") into a field path ("publications[1]").
fn pointer_to_path(pointer: &str) -> String {
    let mut path = String::new();
    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            path.push('[');
            path.push_str(&segment);
            path.push(']');
        } else {
            path = join_path(&path, &segment);
        }
    }
    path
}

/// Returns the last keyword of a schema path ("/properties/license/enum" -> "enum").
fn keyword_of(schema_path: &str) -> String {
    schema_path
        .rsplit('/')
        .find(|segment| !segment.is_empty() && !segment.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or("schema")
        .to_string()
}

/// Creates a field path from prefix and field name.
fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}
