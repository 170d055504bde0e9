//! Typed view of a package metadata document
//!
//! Documents are validated and published as raw JSON values so that every
//! field survives untouched. Once a document passes schema validation it is
//! also read into [`PackageMetadata`] for the checks that need typed access.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Package index identifiers understood by the install checks.
pub const INSTALL_PYPI: &str = "pypi";
pub const INSTALL_CONDA: &str = "conda";
pub const INSTALL_CRAN: &str = "cran";

/// Metadata of one registered ecosystem package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub name: String,
    pub description: String,
    pub project_home: String,
    pub documentation_home: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tutorials_home: Option<String>,
    /// Package index name -> identifier on that index
    pub install: BTreeMap<String, String>,
    pub license: String,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub publications: Vec<String>,
    pub version: String,
    pub authors: Vec<String>,
    /// GitHub user names of the maintainers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contact: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_command: Option<String>,
    /// Logo path relative to the package directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl PackageMetadata {
    /// Reads the typed view out of a raw document.
    pub fn from_document(document: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(document)
    }

    /// Returns the identifier registered for a package index, if any.
    pub fn install_target(&self, index: &str) -> Option<&str> {
        self.install.get(index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_document_with_optional_fields_absent() {
        let doc = json!({
            "name": "scanpy",
            "description": "Single-cell analysis",
            "project_home": "https://github.com/scverse/scanpy",
            "documentation_home": "https://scanpy.readthedocs.io",
            "install": { "pypi": "scanpy" },
            "license": "BSD-3-Clause",
            "tags": ["single-cell"],
            "version": "1.10",
            "authors": ["Alex Wolf"]
        });

        let meta = PackageMetadata::from_document(&doc).unwrap();
        assert_eq!(meta.name, "scanpy");
        assert!(meta.tutorials_home.is_none());
        assert!(meta.publications.is_empty());
        assert!(meta.logo.is_none());
        assert_eq!(meta.install_target(INSTALL_PYPI), Some("scanpy"));
        assert_eq!(meta.install_target(INSTALL_CRAN), None);
    }

    #[test]
    fn test_from_document_rejects_wrong_shape() {
        let doc = json!({ "name": 42 });
        assert!(PackageMetadata::from_document(&doc).is_err());
    }
}
