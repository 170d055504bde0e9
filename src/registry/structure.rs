//! Package directory layout check
//!
//! A package directory holds its metadata document and, optionally, the logo
//! that document points to. Anything else is a structural violation.

use std::path::{Component, Path};

use walkdir::WalkDir;

use super::discovery::PackageEntry;
use super::errors::RegistryResult;
use crate::report::{IssueKind, PackageIssue};

/// Reports every file and directory in the package directory other than the
/// allowed ones. A logo path leaving the package directory allows nothing.
pub fn check_structure(
    entry: &PackageEntry,
    meta_file_name: &str,
    logo: Option<&str>,
) -> RegistryResult<Vec<PackageIssue>> {
    let mut issues = Vec::new();

    if !entry.has_metadata() {
        issues.push(PackageIssue::new(
            IssueKind::StructuralViolation,
            format!("missing metadata document '{}'", meta_file_name),
        ));
    }

    let logo = logo.and_then(contained_path);

    let mut walker = WalkDir::new(entry.dir())
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();
    while let Some(item) = walker.next() {
        let item = item?;
        let relative = match item.path().strip_prefix(entry.dir()) {
            Ok(relative) => to_slash_path(relative),
            Err(_) => continue,
        };

        if item.file_type().is_dir() {
            let holds_logo = logo
                .as_deref()
                .map_or(false, |logo| logo.starts_with(&format!("{}/", relative)));
            if !holds_logo {
                issues.push(PackageIssue::new(
                    IssueKind::StructuralViolation,
                    format!("unexpected directory '{}' in package directory", relative),
                ));
                walker.skip_current_dir();
            }
            continue;
        }

        if relative == meta_file_name || logo.as_deref() == Some(relative.as_str()) {
            continue;
        }

        issues.push(PackageIssue::new(
            IssueKind::StructuralViolation,
            format!("unexpected file '{}' in package directory", relative),
        ));
    }

    Ok(issues)
}

/// Normalizes a path that must stay inside its base directory.
///
/// Returns the '/'-joined path, or `None` for an empty path or one with a
/// root, prefix or `..` component. `.` components are dropped.
pub fn contained_path(path: &str) -> Option<String> {
    let mut parts = Vec::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Renders a relative path with '/' separators.
fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use std::fs;
    use tempfile::TempDir;

    fn single_package(temp_dir: &TempDir, files: &[&str]) -> PackageEntry {
        let dir = temp_dir.path().join("scanpy");
        fs::create_dir(&dir).unwrap();
        for file in files {
            let path = dir.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "x").unwrap();
        }
        let registry = Registry::open(temp_dir.path(), "meta.yaml").unwrap();
        registry.packages().unwrap().remove(0)
    }

    #[test]
    fn test_only_metadata_is_clean() {
        let temp_dir = TempDir::new().unwrap();
        let entry = single_package(&temp_dir, &["meta.yaml"]);
        assert!(check_structure(&entry, "meta.yaml", None).unwrap().is_empty());
    }

    #[test]
    fn test_logo_is_allowed() {
        let temp_dir = TempDir::new().unwrap();
        let entry = single_package(&temp_dir, &["meta.yaml", "img/logo.svg"]);
        let issues = check_structure(&entry, "meta.yaml", Some("./img/logo.svg")).unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn test_extra_files_reported() {
        let temp_dir = TempDir::new().unwrap();
        let entry = single_package(&temp_dir, &["meta.yaml", "notes.txt", "logo.png"]);
        let issues = check_structure(&entry, "meta.yaml", None).unwrap();

        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.kind == IssueKind::StructuralViolation));
        assert!(issues[0].message.contains("logo.png"));
        assert!(issues[1].message.contains("notes.txt"));
    }

    #[test]
    fn test_empty_nested_directory_reported() {
        let temp_dir = TempDir::new().unwrap();
        let entry = single_package(&temp_dir, &["meta.yaml"]);
        fs::create_dir(entry.dir().join("stray_subdir")).unwrap();

        let issues = check_structure(&entry, "meta.yaml", None).unwrap();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("unexpected directory 'stray_subdir'"));
    }

    #[test]
    fn test_directory_reported_once_with_its_contents() {
        let temp_dir = TempDir::new().unwrap();
        let entry = single_package(
            &temp_dir,
            &["meta.yaml", "img/logo.svg", "docs/a.md", "docs/b.md"],
        );

        let issues = check_structure(&entry, "meta.yaml", Some("img/logo.svg")).unwrap();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("'docs'"));
    }

    #[test]
    fn test_escaping_logo_allows_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let entry = single_package(&temp_dir, &["meta.yaml", "other/logo.svg"]);

        let issues = check_structure(&entry, "meta.yaml", Some("../other/logo.svg")).unwrap();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("'other'"));
    }

    #[test]
    fn test_contained_path() {
        assert_eq!(contained_path("logo.svg").as_deref(), Some("logo.svg"));
        assert_eq!(contained_path("./img/logo.svg").as_deref(), Some("img/logo.svg"));
        assert_eq!(contained_path("../other/logo.svg"), None);
        assert_eq!(contained_path("img/../../logo.svg"), None);
        assert_eq!(contained_path("/etc/passwd"), None);
        assert_eq!(contained_path(""), None);
        assert_eq!(contained_path("."), None);
    }

    #[test]
    fn test_missing_metadata_reported() {
        let temp_dir = TempDir::new().unwrap();
        let entry = single_package(&temp_dir, &[]);
        let issues = check_structure(&entry, "meta.yaml", None).unwrap();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("missing metadata document"));
    }
}
