//! Per-package validation report
//!
//! Every check appends [`PackageIssue`]s under the package's directory name.
//! A run may only publish when the report is clean.

use std::collections::BTreeMap;
use std::fmt;

use crate::schema::ValidationDetails;

/// Category of a problem found in one package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// Document violates the schema
    SchemaViolation,
    /// Package directory holds unexpected files, or lacks the metadata document
    StructuralViolation,
    /// Metadata document is not parseable YAML
    MalformedDocument,
    /// Another package already registered the same link
    DuplicateLink,
    /// Another package already uses the same name
    DuplicateName,
    /// Logo missing or of the wrong size
    InvalidLogo,
    /// A link, package index entry or contact failed a remote check
    RemoteCheckFailed,
}

impl IssueKind {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            IssueKind::SchemaViolation => "ECOREG_SCHEMA_VIOLATION",
            IssueKind::StructuralViolation => "ECOREG_STRUCTURAL_VIOLATION",
            IssueKind::MalformedDocument => "ECOREG_MALFORMED_DOCUMENT",
            IssueKind::DuplicateLink => "ECOREG_DUPLICATE_LINK",
            IssueKind::DuplicateName => "ECOREG_DUPLICATE_NAME",
            IssueKind::InvalidLogo => "ECOREG_INVALID_LOGO",
            IssueKind::RemoteCheckFailed => "ECOREG_REMOTE_CHECK_FAILED",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One problem found in one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIssue {
    pub kind: IssueKind,
    /// Field the problem is attached to, if any
    pub field: Option<String>,
    pub message: String,
}

impl PackageIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: None,
            message: message.into(),
        }
    }

    pub fn for_field(kind: IssueKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

impl From<ValidationDetails> for PackageIssue {
    fn from(details: ValidationDetails) -> Self {
        let message = details.to_string();
        Self::for_field(IssueKind::SchemaViolation, details.field, message)
    }
}

impl fmt::Display for PackageIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Issues of all packages, keyed by package directory name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    packages: BTreeMap<String, Vec<PackageIssue>>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a package so it shows up even with zero issues.
    pub fn track(&mut self, package: &str) {
        self.packages.entry(package.to_string()).or_default();
    }

    /// Records an issue against a package.
    pub fn push(&mut self, package: &str, issue: PackageIssue) {
        self.packages.entry(package.to_string()).or_default().push(issue);
    }

    /// Records several issues against a package.
    pub fn extend(&mut self, package: &str, issues: impl IntoIterator<Item = PackageIssue>) {
        self.packages
            .entry(package.to_string())
            .or_default()
            .extend(issues);
    }

    /// Returns the issues recorded for a package.
    pub fn issues(&self, package: &str) -> &[PackageIssue] {
        self.packages.get(package).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the packages with at least one issue, in package order.
    pub fn failed_packages(&self) -> impl Iterator<Item = (&str, &[PackageIssue])> {
        self.packages
            .iter()
            .filter(|(_, issues)| !issues.is_empty())
            .map(|(name, issues)| (name.as_str(), issues.as_slice()))
    }

    /// Returns the number of packages with at least one issue.
    pub fn failed_count(&self) -> usize {
        self.failed_packages().count()
    }

    /// Returns the number of tracked packages.
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    /// Returns the total number of issues.
    pub fn issue_count(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }

    /// True when no package has any issue.
    pub fn is_clean(&self) -> bool {
        self.issue_count() == 0
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (package, issues) in self.failed_packages() {
            writeln!(f, "{}:", package)?;
            for issue in issues {
                writeln!(f, "  - {}", issue)?;
            }
        }
        Ok(())
    }
}
