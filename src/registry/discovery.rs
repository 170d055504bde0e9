//! Package discovery
//!
//! Each package occupies one subdirectory of the registry directory and is
//! identified by that subdirectory's name. Packages are returned sorted by
//! name so every run sees the same traversal order.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::WalkDir;

use super::errors::{RegistryError, RegistryResult};

/// A registry directory with one subdirectory per package.
#[derive(Debug, Clone)]
pub struct Registry {
    root: PathBuf,
    meta_file_name: String,
}

impl Registry {
    /// Opens the registry rooted at `root`.
    ///
    /// # Errors
    ///
    /// Fails if `root` is not a directory.
    pub fn open(root: &Path, meta_file_name: &str) -> RegistryResult<Self> {
        if !root.is_dir() {
            return Err(RegistryError::RegistryDirMissing(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            meta_file_name: meta_file_name.to_string(),
        })
    }

    /// Lists package directories sorted by name. Hidden directories are skipped.
    pub fn packages(&self) -> RegistryResult<Vec<PackageEntry>> {
        let mut packages = Vec::new();

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }

            let id = entry.file_name().to_string_lossy().into_owned();
            if id.starts_with('.') {
                continue;
            }

            let dir = entry.into_path();
            let meta_path = dir.join(&self.meta_file_name);
            packages.push(PackageEntry { id, dir, meta_path });
        }

        Ok(packages)
    }
}

/// One package directory inside the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    id: String,
    dir: PathBuf,
    meta_path: PathBuf,
}

impl PackageEntry {
    /// Returns the package identifier (its directory name).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the package directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path of the metadata document.
    pub fn meta_path(&self) -> &Path {
        &self.meta_path
    }

    /// True if the metadata document exists.
    pub fn has_metadata(&self) -> bool {
        self.meta_path.is_file()
    }

    /// Reads and parses the metadata document.
    pub fn load(&self) -> RegistryResult<Value> {
        let text = fs::read_to_string(&self.meta_path).map_err(|source| RegistryError::Io {
            path: self.meta_path.clone(),
            source,
        })?;
        parse_document(&self.meta_path, &text)
    }
}

/// Parses a YAML metadata document into a JSON value.
pub fn parse_document(path: &Path, text: &str) -> RegistryResult<Value> {
    serde_yaml::from_str::<Value>(text).map_err(|e| RegistryError::MalformedDocument {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
