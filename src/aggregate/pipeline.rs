//! Validation pipeline
//!
//! One pass over the registry:
//! 1. Load the schema (meta-schema check first; a broken schema halts the run)
//! 2. Discover package directories in name order
//! 3. Per package: layout, parsing, schema, duplicate links, logo and remote
//!    checks, all issues collected
//! 4. Reject duplicate package names
//! 5. Any issue in any package fails the run; otherwise publish

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use serde_json::Value;

use super::errors::{PipelineError, PipelineResult};
use super::publish::{PublishOutcome, Publisher};
use crate::checks::{check_package_logo, LinkRegistry, RemoteChecker, RemoteProbe};
use crate::config::RegistryConfig;
use crate::observability::{log_event_with_fields, Event};
use crate::registry::{check_structure, PackageEntry, Registry};
use crate::report::{IssueKind, PackageIssue, ValidationReport};
use crate::schema::{PackageMetadata, SchemaLoader, SchemaValidator, ROOT_PATH};

/// A package whose document passed every check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPackage {
    /// Package directory name
    pub id: String,
    /// Package directory
    pub dir: PathBuf,
    /// The metadata document, as parsed
    pub document: Value,
}

/// All packages of a clean run, in traversal order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRegistry {
    pub packages: Vec<ValidatedPackage>,
}

impl ValidatedRegistry {
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Validates a registry and publishes its collection.
pub struct Pipeline<'a> {
    config: &'a RegistryConfig,
    probe: Option<&'a dyn RemoteProbe>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a RegistryConfig) -> Self {
        Self {
            config,
            probe: None,
        }
    }

    /// Enables remote checks through `probe`.
    pub fn with_probe(mut self, probe: &'a dyn RemoteProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Validates then publishes. `stdout` receives the collection when no
    /// output directory is configured.
    pub fn run(&self, stdout: &mut dyn Write) -> PipelineResult<PublishOutcome> {
        let validated = self.validate()?;
        Publisher::new(self.config.outdir.clone()).publish(&validated, stdout)
    }

    /// Validates every package, failing if any package has an issue.
    pub fn validate(&self) -> PipelineResult<ValidatedRegistry> {
        log_event_with_fields(
            Event::RunStart,
            &[
                ("registry_dir", &self.config.registry_dir.display().to_string()),
                ("remote_checks", if self.probe.is_some() { "true" } else { "false" }),
            ],
        );

        let loader = SchemaLoader::load(&self.config.schema_path).map_err(|e| {
            log_event_with_fields(
                Event::SchemaRejected,
                &[("code", e.code().code()), ("message", e.message())],
            );
            e
        })?;
        log_event_with_fields(Event::SchemaLoaded, &[("schema", loader.source())]);

        let registry = Registry::open(&self.config.registry_dir, &self.config.meta_file_name)?;
        let entries = registry.packages()?;

        let validator = SchemaValidator::new(&loader);
        let mut run = RunState {
            links: LinkRegistry::new(),
            remote: self.probe.map(RemoteChecker::new),
            names: HashMap::new(),
            report: ValidationReport::new(),
        };

        let mut packages = Vec::with_capacity(entries.len());
        for entry in &entries {
            log_event_with_fields(Event::PackageDiscovered, &[("package", entry.id())]);
            run.report.track(entry.id());

            let document = self.check_package(entry, &validator, &mut run)?;
            log_package_outcome(entry.id(), run.report.issues(entry.id()));

            if let Some(document) = document {
                packages.push(ValidatedPackage {
                    id: entry.id().to_string(),
                    dir: entry.dir().to_path_buf(),
                    document,
                });
            }
        }

        if !run.report.is_clean() {
            let failed = run.report.failed_count().to_string();
            log_event_with_fields(
                Event::RunFailed,
                &[("failed_packages", &failed), ("reason", "validation")],
            );
            return Err(PipelineError::ValidationFailed(run.report));
        }

        Ok(ValidatedRegistry { packages })
    }

    /// Runs every per-package check, returning the parsed document if there is one.
    fn check_package(
        &self,
        entry: &PackageEntry,
        validator: &SchemaValidator<'_>,
        run: &mut RunState<'_>,
    ) -> PipelineResult<Option<Value>> {
        let id = entry.id();

        let document = if entry.has_metadata() {
            match entry.load() {
                Ok(document) => Some(document),
                Err(e) => {
                    run.report
                        .push(id, PackageIssue::new(IssueKind::MalformedDocument, e.to_string()));
                    None
                }
            }
        } else {
            None
        };

        let logo = document
            .as_ref()
            .and_then(|doc| doc.get("logo"))
            .and_then(Value::as_str);
        let structure = check_structure(entry, &self.config.meta_file_name, logo)?;
        run.report.extend(id, structure);

        let document = match document {
            Some(document) => document,
            None => return Ok(None),
        };

        if let Some(name) = document.get("name").and_then(Value::as_str) {
            match run.names.get(name) {
                Some(first) => run.report.push(
                    id,
                    PackageIssue::for_field(
                        IssueKind::DuplicateName,
                        "name",
                        format!("Package name '{}' is already used by '{}'", name, first),
                    ),
                ),
                None => {
                    run.names.insert(name.to_string(), id.to_string());
                }
            }
        }

        let details = validator.validate_document(&document);
        if !details.is_empty() {
            run.report
                .extend(id, details.into_iter().map(PackageIssue::from));
            return Ok(Some(document));
        }

        let meta = match PackageMetadata::from_document(&document) {
            Ok(meta) => meta,
            Err(e) => {
                run.report.push(
                    id,
                    PackageIssue::for_field(IssueKind::SchemaViolation, ROOT_PATH, e.to_string()),
                );
                return Ok(Some(document));
            }
        };

        run.report.extend(id, run.links.register_package(&meta));

        if let Some(logo) = meta.logo.as_deref() {
            run.report
                .extend(id, check_package_logo(entry.dir(), logo, self.config.logo_size));
        }

        if let Some(remote) = run.remote.as_mut() {
            let issues = remote.check_package(&meta);
            if issues.is_empty() {
                log_event_with_fields(Event::RemoteCheckPassed, &[("package", id)]);
            }
            run.report.extend(id, issues);
        }

        Ok(Some(document))
    }
}

/// Mutable state shared by the packages of one run.
struct RunState<'a> {
    links: LinkRegistry,
    remote: Option<RemoteChecker<'a>>,
    /// Package name -> directory of the first package using it
    names: HashMap<String, String>,
    report: ValidationReport,
}

fn log_package_outcome(package: &str, issues: &[PackageIssue]) {
    for issue in issues {
        log_event_with_fields(
            Event::ValidationIssue,
            &[
                ("package", package),
                ("code", issue.kind.code()),
                ("field", issue.field.as_deref().unwrap_or("")),
                ("message", &issue.message),
            ],
        );
    }

    if issues.is_empty() {
        log_event_with_fields(Event::PackageValid, &[("package", package)]);
    } else {
        let count = issues.len().to_string();
        log_event_with_fields(
            Event::PackageInvalid,
            &[("package", package), ("issues", &count)],
        );
    }
}
