//! Schema validation for package metadata documents
//!
//! The registry schema is a single draft 2020-12 JSON Schema document.
//!
//! # Design Principles
//!
//! - The schema itself is checked against the meta-schema before use
//! - Every violation in a document is collected, none is fatal on its own
//! - Violations carry the field path and the failing keyword
//! - Deterministic validation

mod errors;
mod loader;
mod types;
mod validator;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity, ValidationDetails};
pub use loader::{check_meta_schema, SchemaLoader};
pub use types::{PackageMetadata, INSTALL_CONDA, INSTALL_CRAN, INSTALL_PYPI};
pub use validator::{SchemaValidator, ROOT_PATH};
