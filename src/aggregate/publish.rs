//! Collection publishing
//!
//! Turns a validated registry into the published collection: one JSON
//! array, package order preserved, object keys sorted. Written compactly
//! to `<outdir>/packages.json` together with the logos, or pretty-printed
//! to stdout when there is no output directory.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use sha2::{Digest, Sha256};

use super::errors::{PipelineError, PipelineResult};
use super::pipeline::{ValidatedPackage, ValidatedRegistry};
use crate::observability::{log_event_with_fields, Event};
use crate::registry::contained_path;

/// File name of the published collection inside the output directory.
pub const ARTIFACT_FILE_NAME: &str = "packages.json";

/// Result of a successful publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Path of `packages.json`; `None` when written to stdout
    pub artifact: Option<PathBuf>,
    pub package_count: usize,
    /// Hex SHA-256 of the written bytes
    pub sha256: String,
}

/// Writes the collection of a validated registry.
#[derive(Debug, Clone)]
pub struct Publisher {
    outdir: Option<PathBuf>,
}

impl Publisher {
    pub fn new(outdir: Option<PathBuf>) -> Self {
        Self { outdir }
    }

    /// Builds the collection, rewriting each logo to `<package>/<file>`.
    pub fn build_collection(registry: &ValidatedRegistry) -> Value {
        Value::Array(
            registry
                .packages
                .iter()
                .map(|package| {
                    let mut document = package.document.clone();
                    if let Some(target) = published_logo(package) {
                        document["logo"] = Value::String(target);
                    }
                    document
                })
                .collect(),
        )
    }

    /// Publishes the collection.
    ///
    /// # Errors
    ///
    /// Fails with `OutputExists` if the output directory already holds a
    /// collection. Nothing is created in that case.
    pub fn publish(
        &self,
        registry: &ValidatedRegistry,
        stdout: &mut dyn Write,
    ) -> PipelineResult<PublishOutcome> {
        let collection = Self::build_collection(registry);

        let outcome = match &self.outdir {
            Some(outdir) => {
                let bytes = serde_json::to_vec(&collection)?;
                let artifact = self.write_outdir(outdir, registry, &bytes)?;
                PublishOutcome {
                    artifact: Some(artifact),
                    package_count: registry.len(),
                    sha256: checksum(&bytes),
                }
            }
            None => {
                let mut bytes = serde_json::to_vec_pretty(&collection)?;
                bytes.push(b'\n');
                stdout
                    .write_all(&bytes)
                    .and_then(|_| stdout.flush())
                    .map_err(|source| PipelineError::Output {
                        path: PathBuf::from("<stdout>"),
                        source,
                    })?;
                PublishOutcome {
                    artifact: None,
                    package_count: registry.len(),
                    sha256: checksum(&bytes),
                }
            }
        };

        let count = outcome.package_count.to_string();
        let target = outcome
            .artifact
            .as_ref()
            .map_or_else(|| "<stdout>".to_string(), |p| p.display().to_string());
        log_event_with_fields(
            Event::PublishComplete,
            &[
                ("artifact", &target),
                ("packages", &count),
                ("sha256", &outcome.sha256),
            ],
        );

        Ok(outcome)
    }

    /// Writes logos then `packages.json`. On failure everything created
    /// here is removed again.
    fn write_outdir(
        &self,
        outdir: &Path,
        registry: &ValidatedRegistry,
        bytes: &[u8],
    ) -> PipelineResult<PathBuf> {
        let artifact = outdir.join(ARTIFACT_FILE_NAME);
        if artifact.exists() {
            return Err(PipelineError::OutputExists(artifact));
        }

        let mut created = CreatedPaths::default();
        let result = write_outputs(outdir, &artifact, registry, bytes, &mut created);
        if result.is_err() {
            created.remove_all();
        }
        result.map(|_| artifact)
    }
}

fn write_outputs(
    outdir: &Path,
    artifact: &Path,
    registry: &ValidatedRegistry,
    bytes: &[u8],
    created: &mut CreatedPaths,
) -> PipelineResult<()> {
    created.create_dir_all(outdir)?;

    for package in &registry.packages {
        let (Some(logo), Some(target)) = (logo_field(package), published_logo(package)) else {
            continue;
        };
        let source = match contained_path(logo) {
            Some(relative) => package.dir.join(relative),
            None => {
                return Err(output_error(
                    &package.dir,
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("logo '{}' leaves the package directory", logo),
                    ),
                ))
            }
        };

        let destination = outdir.join(&target);
        if let Some(parent) = destination.parent() {
            created.create_dir_all(parent)?;
        }
        created.copy(&source, &destination)?;
    }

    created.write(artifact, bytes)
}

/// Files and directories created by one publication, in creation order.
#[derive(Debug, Default)]
struct CreatedPaths {
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
}

impl CreatedPaths {
    fn create_dir_all(&mut self, dir: &Path) -> PipelineResult<()> {
        let mut missing: Vec<PathBuf> = dir
            .ancestors()
            .take_while(|ancestor| !ancestor.as_os_str().is_empty() && !ancestor.exists())
            .map(Path::to_path_buf)
            .collect();
        fs::create_dir_all(dir).map_err(|source| output_error(dir, source))?;
        missing.reverse();
        self.dirs.extend(missing);
        Ok(())
    }

    fn copy(&mut self, from: &Path, to: &Path) -> PipelineResult<()> {
        fs::copy(from, to).map_err(|source| output_error(to, source))?;
        self.files.push(to.to_path_buf());
        Ok(())
    }

    fn write(&mut self, path: &Path, bytes: &[u8]) -> PipelineResult<()> {
        fs::write(path, bytes).map_err(|source| output_error(path, source))?;
        self.files.push(path.to_path_buf());
        Ok(())
    }

    /// Best effort; the original error is what gets reported.
    fn remove_all(&self) {
        for file in self.files.iter().rev() {
            let _ = fs::remove_file(file);
        }
        for dir in self.dirs.iter().rev() {
            let _ = fs::remove_dir(dir);
        }
    }
}

/// Hex SHA-256 of `data`.
pub fn checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn logo_field(package: &ValidatedPackage) -> Option<&str> {
    package.document.get("logo").and_then(Value::as_str)
}

fn published_logo(package: &ValidatedPackage) -> Option<String> {
    let file_name = Path::new(logo_field(package)?).file_name()?;
    Some(format!("{}/{}", package.id, file_name.to_string_lossy()))
}

fn output_error(path: &Path, source: io::Error) -> PipelineError {
    PipelineError::Output {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn registry(temp_dir: &TempDir) -> ValidatedRegistry {
        let dir = temp_dir.path().join("packages/scanpy");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("logo.svg"), "<svg/>").unwrap();

        ValidatedRegistry {
            packages: vec![
                ValidatedPackage {
                    id: "anndata".into(),
                    dir: temp_dir.path().join("packages/anndata"),
                    document: json!({"name": "anndata", "version": "0.10"}),
                },
                ValidatedPackage {
                    id: "scanpy".into(),
                    dir,
                    document: json!({"name": "scanpy", "logo": "logo.svg"}),
                },
            ],
        }
    }

    #[test]
    fn test_collection_rewrites_logo() {
        let temp_dir = TempDir::new().unwrap();
        let collection = Publisher::build_collection(&registry(&temp_dir));

        assert_eq!(collection.as_array().unwrap().len(), 2);
        assert_eq!(collection[0]["name"], "anndata");
        assert!(collection[0].get("logo").is_none());
        assert_eq!(collection[1]["logo"], "scanpy/logo.svg");
    }

    #[test]
    fn test_publish_to_outdir() {
        let temp_dir = TempDir::new().unwrap();
        let outdir = temp_dir.path().join("out/nested");
        let publisher = Publisher::new(Some(outdir.clone()));

        let mut stdout = Vec::new();
        let outcome = publisher.publish(&registry(&temp_dir), &mut stdout).unwrap();

        assert!(stdout.is_empty());
        assert_eq!(outcome.package_count, 2);
        assert_eq!(outcome.artifact.as_deref(), Some(outdir.join("packages.json").as_path()));
        assert!(outdir.join("scanpy/logo.svg").is_file());

        let written = fs::read(outdir.join("packages.json")).unwrap();
        assert_eq!(outcome.sha256, checksum(&written));
        let text = String::from_utf8(written).unwrap();
        assert!(!text.contains('\n'));
        assert!(text.starts_with(r#"[{"name":"anndata","version":"0.10"}"#));
    }

    #[test]
    fn test_existing_artifact_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let outdir = temp_dir.path().join("out");
        fs::create_dir_all(&outdir).unwrap();
        fs::write(outdir.join("packages.json"), "[]").unwrap();

        let publisher = Publisher::new(Some(outdir.clone()));
        let result = publisher.publish(&registry(&temp_dir), &mut Vec::new());

        assert!(matches!(result, Err(PipelineError::OutputExists(_))));
        assert!(!outdir.join("scanpy").exists());
        assert_eq!(fs::read_to_string(outdir.join("packages.json")).unwrap(), "[]");
    }

    #[test]
    fn test_failed_copy_leaves_no_output() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = registry(&temp_dir);
        registry.packages.push(ValidatedPackage {
            id: "zarr".into(),
            dir: temp_dir.path().join("packages/zarr"),
            document: json!({"name": "zarr", "logo": "missing.png"}),
        });

        let outdir = temp_dir.path().join("out/nested");
        let result = Publisher::new(Some(outdir.clone())).publish(&registry, &mut Vec::new());

        assert!(matches!(result, Err(PipelineError::Output { .. })));
        assert!(!temp_dir.path().join("out").exists());
    }

    #[test]
    fn test_failed_copy_keeps_existing_outdir() {
        let temp_dir = TempDir::new().unwrap();
        let outdir = temp_dir.path().join("out");
        fs::create_dir(&outdir).unwrap();
        fs::write(outdir.join("README"), "keep").unwrap();

        let mut registry = registry(&temp_dir);
        registry.packages.push(ValidatedPackage {
            id: "zarr".into(),
            dir: temp_dir.path().join("packages/zarr"),
            document: json!({"name": "zarr", "logo": "../scanpy/logo.svg"}),
        });

        let result = Publisher::new(Some(outdir.clone())).publish(&registry, &mut Vec::new());

        assert!(matches!(result, Err(PipelineError::Output { .. })));
        assert_eq!(fs::read_to_string(outdir.join("README")).unwrap(), "keep");
        assert!(!outdir.join("scanpy").exists());
        assert!(!outdir.join("zarr").exists());
        assert!(!outdir.join("packages.json").exists());
    }

    #[test]
    fn test_publish_to_stdout_is_pretty() {
        let temp_dir = TempDir::new().unwrap();
        let mut stdout = Vec::new();
        let outcome = Publisher::new(None)
            .publish(&registry(&temp_dir), &mut stdout)
            .unwrap();

        assert!(outcome.artifact.is_none());
        let text = String::from_utf8(stdout).unwrap();
        assert!(text.starts_with("[\n  {\n    \"name\": \"anndata\""));
        assert!(text.ends_with("]\n"));
    }

    #[test]
    fn test_checksum_is_stable() {
        assert_eq!(
            checksum(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
