//! Template repository registry
//!
//! Keeps `template-repos.yml` up to date with the repositories generated
//! from the ecosystem's project template. Known entries, including their
//! `skip` flags, are never dropped; newly found repositories are appended.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checks::{ProbeError, RemoteProbe};
use crate::observability::{log_event_with_fields, Event, Logger};

/// Template the generated repositories reference in their `.cruft.json`.
pub const DEFAULT_TEMPLATE_URL: &str = "https://github.com/scverse/cookiecutter-scverse";

/// Template registry errors
#[derive(Debug, Error)]
pub enum TemplateReposError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid repository list in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize repository list: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Repository search failed: {0}")]
    Search(#[from] ProbeError),
}

/// One repository generated from the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repo {
    pub url: String,
    /// Repositories marked `skip` receive no template update PRs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<bool>,
}

impl Repo {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            skip: None,
        }
    }
}

/// Reads the known repositories. A missing or empty file holds none.
pub fn parse_repos(path: &Path) -> Result<Vec<Repo>, TemplateReposError> {
    if !path.is_file() {
        Logger::info(
            "TEMPLATE_REPOS_NOT_FOUND",
            &[("path", &path.display().to_string())],
        );
        return Ok(Vec::new());
    }

    let text = fs::read_to_string(path).map_err(|source| TemplateReposError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let repos: Option<Vec<Repo>> =
        serde_yaml::from_str(&text).map_err(|e| TemplateReposError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(repos.unwrap_or_default())
}

/// Appends every found URL that is not known yet.
pub fn merge_repos(known: Vec<Repo>, found: impl IntoIterator<Item = String>) -> Vec<Repo> {
    let mut known_urls: HashSet<String> = known.iter().map(|r| r.url.clone()).collect();
    let mut repos = known;
    for url in found {
        if known_urls.insert(url.clone()) {
            repos.push(Repo::new(url));
        }
    }
    repos
}

/// Searches GitHub for repositories whose `.cruft.json` references `template_url`.
pub fn search_repos(
    probe: &dyn RemoteProbe,
    template_url: &str,
) -> Result<Vec<String>, TemplateReposError> {
    let query = format!("filename:.cruft.json \"{}\"", template_url);
    Ok(probe.search_code_repositories(&query)?)
}

/// Writes the list sorted by URL. An empty list leaves the file untouched.
///
/// Returns whether the file was written.
pub fn write_repos(path: &Path, repos: &[Repo]) -> Result<bool, TemplateReposError> {
    if repos.is_empty() {
        return Ok(false);
    }

    let mut sorted = repos.to_vec();
    sorted.sort_by(|a, b| a.url.cmp(&b.url));
    let text = serde_yaml::to_string(&sorted)?;
    fs::write(path, text).map_err(|source| TemplateReposError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}

/// Parses, searches, merges and writes back in one go.
pub fn update_repos(
    path: &Path,
    probe: &dyn RemoteProbe,
    template_url: &str,
) -> Result<Vec<Repo>, TemplateReposError> {
    let known = parse_repos(path)?;
    let known_count = known.len();
    let found = search_repos(probe, template_url)?;
    let repos = merge_repos(known, found);

    write_repos(path, &repos)?;

    let known_count_str = known_count.to_string();
    let new_count = (repos.len() - known_count).to_string();
    log_event_with_fields(
        Event::TemplateReposMerged,
        &[
            ("path", &path.display().to_string()),
            ("known", &known_count_str),
            ("new", &new_count),
        ],
    );

    Ok(repos)
}
