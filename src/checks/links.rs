//! Duplicate link detection
//!
//! Each link category keeps its own set of known URLs. The same URL may be
//! a project home in one package and a documentation home in another, but
//! two packages may not share a project home.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::report::{IssueKind, PackageIssue};
use crate::schema::PackageMetadata;

/// Categories of links a package declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkCategory {
    ProjectHome,
    DocumentationHome,
    TutorialsHome,
}

impl LinkCategory {
    /// Returns the metadata field holding links of this category.
    pub fn field(&self) -> &'static str {
        match self {
            LinkCategory::ProjectHome => "project_home",
            LinkCategory::DocumentationHome => "documentation_home",
            LinkCategory::TutorialsHome => "tutorials_home",
        }
    }
}

impl fmt::Display for LinkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.field())
    }
}

/// Returns the links a package declares, with their categories.
pub fn package_links(meta: &PackageMetadata) -> Vec<(LinkCategory, &str)> {
    let mut links = vec![
        (LinkCategory::ProjectHome, meta.project_home.as_str()),
        (LinkCategory::DocumentationHome, meta.documentation_home.as_str()),
    ];
    if let Some(url) = meta.tutorials_home.as_deref() {
        links.push((LinkCategory::TutorialsHome, url));
    }
    links
}

/// Tracks links seen so far in a run.
#[derive(Debug, Default)]
pub struct LinkRegistry {
    known: HashMap<LinkCategory, HashSet<String>>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a link, reporting it if the category already holds it.
    pub fn register(&mut self, category: LinkCategory, url: &str) -> Option<PackageIssue> {
        let seen = self.known.entry(category).or_default();
        if seen.insert(url.to_string()) {
            None
        } else {
            Some(PackageIssue::for_field(
                IssueKind::DuplicateLink,
                category.field(),
                format!("Duplicate link: {}", url),
            ))
        }
    }

    /// Registers every link of a package.
    pub fn register_package(&mut self, meta: &PackageMetadata) -> Vec<PackageIssue> {
        package_links(meta)
            .into_iter()
            .filter_map(|(category, url)| self.register(category, url))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_registration_passes() {
        let mut links = LinkRegistry::new();
        assert!(links
            .register(LinkCategory::ProjectHome, "https://github.com/scverse/scanpy")
            .is_none());
    }

    #[test]
    fn test_duplicate_in_same_category() {
        let mut links = LinkRegistry::new();
        links.register(LinkCategory::ProjectHome, "https://github.com/scverse/scanpy");

        let issue = links
            .register(LinkCategory::ProjectHome, "https://github.com/scverse/scanpy")
            .unwrap();
        assert_eq!(issue.kind, IssueKind::DuplicateLink);
        assert_eq!(issue.field.as_deref(), Some("project_home"));
    }

    #[test]
    fn test_categories_are_independent() {
        let mut links = LinkRegistry::new();
        let url = "https://scverse.org";
        assert!(links.register(LinkCategory::ProjectHome, url).is_none());
        assert!(links.register(LinkCategory::DocumentationHome, url).is_none());
        assert!(links.register(LinkCategory::TutorialsHome, url).is_none());
    }
}
