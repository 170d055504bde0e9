//! Observable events of a registry run
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// A validation run begins
    RunStart,
    /// Configuration loaded
    ConfigLoaded,
    /// Schema loaded and checked against the meta-schema
    SchemaLoaded,
    /// Schema rejected (FATAL)
    SchemaRejected,

    // Per-package validation
    /// Package directory found
    PackageDiscovered,
    /// Package passed every check
    PackageValid,
    /// Package failed at least one check
    PackageInvalid,
    /// One problem found in a package
    ValidationIssue,
    /// A remote check confirmed a link, index entry or contact
    RemoteCheckPassed,

    // Publication
    /// Collection written
    PublishComplete,
    /// Run failed, nothing published (FATAL)
    RunFailed,

    // Template repositories
    /// Template repository list merged and written
    TemplateReposMerged,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::RunStart => "RUN_START",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemaLoaded => "SCHEMA_LOADED",
            Event::SchemaRejected => "SCHEMA_REJECTED",
            Event::PackageDiscovered => "PACKAGE_DISCOVERED",
            Event::PackageValid => "PACKAGE_VALID",
            Event::PackageInvalid => "PACKAGE_INVALID",
            Event::ValidationIssue => "VALIDATION_ISSUE",
            Event::RemoteCheckPassed => "REMOTE_CHECK_PASSED",
            Event::PublishComplete => "PUBLISH_COMPLETE",
            Event::RunFailed => "RUN_FAILED",
            Event::TemplateReposMerged => "TEMPLATE_REPOS_MERGED",
        }
    }

    /// Returns true if this event ends the run with a failure
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::SchemaRejected | Event::RunFailed)
    }

    /// Returns true if this event reports a problem
    pub fn is_error(&self) -> bool {
        matches!(self, Event::PackageInvalid | Event::ValidationIssue)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_events() {
        assert!(Event::SchemaRejected.is_fatal());
        assert!(Event::RunFailed.is_fatal());
        assert!(!Event::PublishComplete.is_fatal());
        assert!(!Event::ValidationIssue.is_fatal());
    }

    #[test]
    fn test_error_events() {
        assert!(Event::ValidationIssue.is_error());
        assert!(!Event::PackageValid.is_error());
    }

    #[test]
    fn test_event_names_unique() {
        let events = [
            Event::RunStart,
            Event::ConfigLoaded,
            Event::SchemaLoaded,
            Event::SchemaRejected,
            Event::PackageDiscovered,
            Event::PackageValid,
            Event::PackageInvalid,
            Event::ValidationIssue,
            Event::RemoteCheckPassed,
            Event::PublishComplete,
            Event::RunFailed,
            Event::TemplateReposMerged,
        ];
        let mut names: Vec<&str> = events.iter().map(Event::as_str).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), events.len());
    }
}
