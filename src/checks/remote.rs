//! Remote existence checks
//!
//! Links must answer, package index entries must exist, and contacts must be
//! real GitHub users. Network access goes through [`RemoteProbe`] so the
//! checks can run against a fake in tests. Every successful probe is cached
//! for the rest of the run.

use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

use super::links::{package_links, LinkCategory};
use crate::report::{IssueKind, PackageIssue};
use crate::schema::{PackageMetadata, INSTALL_CONDA, INSTALL_CRAN, INSTALL_PYPI};

const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";
const GITHUB_CODE_SEARCH_URL: &str = "https://api.github.com/search/code";

/// GitHub search returns at most 1000 results, 100 per page.
const SEARCH_PAGE_SIZE: usize = 100;
const SEARCH_MAX_PAGES: usize = 10;

/// Errors raised while talking to remote services
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },
}

/// Network operations needed by the remote checks.
pub trait RemoteProbe {
    /// Sends a HEAD request, following redirects, and returns the final status.
    fn head_status(&self, url: &str) -> Result<u16, ProbeError>;

    /// Returns the subset of `users` that GitHub does not know.
    fn missing_github_users(&self, users: &[String]) -> Result<Vec<String>, ProbeError>;

    /// Runs a GitHub code search and returns the HTML URLs of the matching repositories.
    fn search_code_repositories(&self, query: &str) -> Result<Vec<String>, ProbeError>;
}

/// [`RemoteProbe`] backed by a blocking reqwest client.
pub struct HttpProbe {
    client: Client,
    github_token: Option<String>,
}

impl HttpProbe {
    /// Creates a probe with the given request timeout.
    pub fn new(timeout_secs: u64, github_token: Option<String>) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProbeError::Client(e.to_string()))?;

        Ok(Self {
            client,
            github_token: github_token.filter(|t| !t.is_empty()),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.github_token {
            Some(token) => request.header("Authorization", format!("token {}", token)),
            None => request,
        }
    }
}

impl RemoteProbe for HttpProbe {
    fn head_status(&self, url: &str) -> Result<u16, ProbeError> {
        let response = self
            .client
            .head(url)
            .send()
            .map_err(|e| ProbeError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(response.status().as_u16())
    }

    fn missing_github_users(&self, users: &[String]) -> Result<Vec<String>, ProbeError> {
        if users.is_empty() {
            return Ok(Vec::new());
        }

        let query = github_users_query(users);
        let response = self
            .authorize(self.client.post(GITHUB_GRAPHQL_URL))
            .json(&json!({ "query": query }))
            .send()
            .map_err(|e| ProbeError::Request {
                url: GITHUB_GRAPHQL_URL.to_string(),
                reason: e.to_string(),
            })?;

        if response.status() != StatusCode::OK {
            return Err(ProbeError::Status {
                url: GITHUB_GRAPHQL_URL.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body: Value = response.json().map_err(|e| ProbeError::InvalidResponse {
            url: GITHUB_GRAPHQL_URL.to_string(),
            reason: e.to_string(),
        })?;

        missing_users_from_response(users, &body).map_err(|reason| ProbeError::InvalidResponse {
            url: GITHUB_GRAPHQL_URL.to_string(),
            reason,
        })
    }

    fn search_code_repositories(&self, query: &str) -> Result<Vec<String>, ProbeError> {
        let mut repos = Vec::new();

        for page in 1..=SEARCH_MAX_PAGES {
            let page_param = page.to_string();
            let per_page = SEARCH_PAGE_SIZE.to_string();
            let response = self
                .authorize(self.client.get(GITHUB_CODE_SEARCH_URL))
                .header("Accept", "application/vnd.github+json")
                .query(&[
                    ("q", query),
                    ("per_page", per_page.as_str()),
                    ("page", page_param.as_str()),
                ])
                .send()
                .map_err(|e| ProbeError::Request {
                    url: GITHUB_CODE_SEARCH_URL.to_string(),
                    reason: e.to_string(),
                })?;

            if response.status() != StatusCode::OK {
                return Err(ProbeError::Status {
                    url: GITHUB_CODE_SEARCH_URL.to_string(),
                    status: response.status().as_u16(),
                });
            }

            let body: Value = response.json().map_err(|e| ProbeError::InvalidResponse {
                url: GITHUB_CODE_SEARCH_URL.to_string(),
                reason: e.to_string(),
            })?;

            let items = body
                .get("items")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            if items.is_empty() {
                break;
            }

            repos.extend(items.iter().filter_map(|item| {
                item.pointer("/repository/html_url")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            }));

            let total = body.get("total_count").and_then(Value::as_u64).unwrap_or(0);
            if (page * SEARCH_PAGE_SIZE) as u64 >= total {
                break;
            }
        }

        repos.sort();
        repos.dedup();
        Ok(repos)
    }
}

/// Builds one batched GraphQL query looking up every user.
fn github_users_query(users: &[String]) -> String {
    let lookups: Vec<String> = users
        .iter()
        .enumerate()
        .map(|(i, name)| format!("user{}: user(login: {}) {{ login }}", i, Value::from(name.as_str())))
        .collect();
    format!("query {{ {} }}", lookups.join("\n"))
}

/// Reads the users GitHub returned no data for.
fn missing_users_from_response(users: &[String], body: &Value) -> Result<Vec<String>, String> {
    let data = match body.get("data").filter(|d| d.is_object()) {
        Some(data) => data,
        None => {
            let messages: Vec<&str> = body
                .get("errors")
                .and_then(Value::as_array)
                .map(|errors| {
                    errors
                        .iter()
                        .filter_map(|e| e.get("message").and_then(Value::as_str))
                        .collect()
                })
                .unwrap_or_default();
            return Err(if messages.is_empty() {
                "response has no data".to_string()
            } else {
                messages.join("; ")
            });
        }
    };

    Ok(users
        .iter()
        .enumerate()
        .filter(|(i, _)| data.get(format!("user{}", i)).map_or(true, Value::is_null))
        .map(|(_, name)| name.clone())
        .collect())
}

/// Splits a conda spec of the form `channel::package`.
pub fn parse_conda_spec(spec: &str) -> Option<(&str, &str)> {
    static CONDA_SPEC: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = CONDA_SPEC
        .get_or_init(|| Regex::new(r"^([A-Za-z0-9_.\-]+)::([A-Za-z0-9_.+\-]+)$").ok())
        .as_ref()?;
    let captures = pattern.captures(spec)?;
    Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()))
}

/// Runs remote checks with per-run caching.
pub struct RemoteChecker<'a> {
    probe: &'a dyn RemoteProbe,
    reachable_links: HashSet<String>,
    validated_packages: HashSet<(String, String)>,
    validated_users: HashSet<String>,
}

impl<'a> RemoteChecker<'a> {
    pub fn new(probe: &'a dyn RemoteProbe) -> Self {
        Self {
            probe,
            reachable_links: HashSet::new(),
            validated_packages: HashSet::new(),
            validated_users: HashSet::new(),
        }
    }

    /// Runs every remote check for one package.
    pub fn check_package(&mut self, meta: &PackageMetadata) -> Vec<PackageIssue> {
        let mut issues = Vec::new();

        for (category, url) in package_links(meta) {
            issues.extend(self.check_link(category, url));
        }
        for (index, target) in &meta.install {
            issues.extend(self.check_install(index, target));
        }
        issues.extend(self.check_contacts(&meta.contact));

        issues
    }

    /// Checks that a link answers with 200 OK.
    pub fn check_link(&mut self, category: LinkCategory, url: &str) -> Option<PackageIssue> {
        if self.reachable_links.contains(url) {
            return None;
        }

        match self.probe.head_status(url) {
            Ok(200) => {
                self.reachable_links.insert(url.to_string());
                None
            }
            Ok(status) => Some(remote_issue(
                category.field(),
                format!("URL {} is not reachable (error {})", url, status),
            )),
            Err(e) => Some(remote_issue(
                category.field(),
                format!("URL {} is not reachable: {}", url, e),
            )),
        }
    }

    /// Checks that an install target exists on its package index.
    ///
    /// Indexes without a known lookup are accepted as-is.
    pub fn check_install(&mut self, index: &str, target: &str) -> Option<PackageIssue> {
        let field = format!("install.{}", index);
        let key = (index.to_string(), target.to_string());
        if self.validated_packages.contains(&key) {
            return None;
        }

        let (url, label) = match index {
            INSTALL_PYPI => (format!("https://pypi.org/pypi/{}/json", target), "PyPI"),
            INSTALL_CRAN => (format!("https://crandb.r-pkg.org/{}", target), "CRAN"),
            INSTALL_CONDA => match parse_conda_spec(target) {
                Some((channel, package)) => (
                    format!("https://api.anaconda.org/package/{}/{}", channel, package),
                    "Conda",
                ),
                None => {
                    return Some(remote_issue(
                        field,
                        format!(
                            "Invalid Conda package spec '{}' (expected format: channel::package)",
                            target
                        ),
                    ))
                }
            },
            _ => return None,
        };

        match self.probe.head_status(&url) {
            Ok(200) => {
                self.validated_packages.insert(key);
                None
            }
            Ok(404) => Some(remote_issue(
                field,
                format!("{} package '{}' does not exist", label, target),
            )),
            Ok(status) => Some(remote_issue(
                field,
                format!("Failed to validate {} package '{}' (error {})", label, target, status),
            )),
            Err(e) => Some(remote_issue(
                field,
                format!("Failed to validate {} package '{}': {}", label, target, e),
            )),
        }
    }

    /// Checks that every contact is a GitHub user. Users already confirmed are skipped.
    pub fn check_contacts(&mut self, users: &[String]) -> Option<PackageIssue> {
        let mut unvalidated: Vec<String> = users
            .iter()
            .filter(|u| !self.validated_users.contains(*u))
            .cloned()
            .collect();
        unvalidated.sort();
        unvalidated.dedup();
        if unvalidated.is_empty() {
            return None;
        }

        match self.probe.missing_github_users(&unvalidated) {
            Ok(missing) if missing.is_empty() => {
                self.validated_users.extend(unvalidated);
                None
            }
            Ok(missing) => {
                self.validated_users
                    .extend(unvalidated.into_iter().filter(|u| !missing.contains(u)));
                Some(remote_issue(
                    "contact",
                    format!("Unknown GitHub users: {}", missing.join(", ")),
                ))
            }
            Err(e) => Some(remote_issue(
                "contact",
                format!("Failed to validate GitHub users {:?}: {}", unvalidated, e),
            )),
        }
    }
}

fn remote_issue(field: impl Into<String>, message: String) -> PackageIssue {
    PackageIssue::for_field(IssueKind::RemoteCheckFailed, field, message)
}


#[cfg(test)]
mod tests {
    use super::fake::FakeProbe;
    use super::*;

    #[test]
    fn test_parse_conda_spec() {
        assert_eq!(
            parse_conda_spec("conda-forge::scanpy"),
            Some(("conda-forge", "scanpy"))
        );
        assert_eq!(parse_conda_spec("scanpy"), None);
        assert_eq!(parse_conda_spec("a::b::c"), None);
    }

    #[test]
    fn test_parse_conda_spec_repeated_calls() {
        for _ in 0..3 {
            assert_eq!(
                parse_conda_spec("bioconda::scanpy-extra+1"),
                Some(("bioconda", "scanpy-extra+1"))
            );
            assert_eq!(parse_conda_spec("::scanpy"), None);
        }
    }

    #[test]
    fn test_link_reachability_cached() {
        let probe = FakeProbe::with_ok(&["https://scverse.org"]);
        let mut checker = RemoteChecker::new(&probe);

        assert!(checker.check_link(LinkCategory::ProjectHome, "https://scverse.org").is_none());
        assert!(checker
            .check_link(LinkCategory::DocumentationHome, "https://scverse.org")
            .is_none());
        assert_eq!(probe.request_count(), 1);
    }

    #[test]
    fn test_unreachable_link() {
        let probe = FakeProbe::default();
        let mut checker = RemoteChecker::new(&probe);

        let issue = checker
            .check_link(LinkCategory::TutorialsHome, "https://gone.example")
            .unwrap();
        assert_eq!(issue.kind, IssueKind::RemoteCheckFailed);
        assert_eq!(issue.field.as_deref(), Some("tutorials_home"));
        assert!(issue.message.contains("error 404"));
    }

    #[test]
    fn test_install_targets() {
        let probe = FakeProbe::with_ok(&[
            "https://pypi.org/pypi/scanpy/json",
            "https://api.anaconda.org/package/conda-forge/scanpy",
        ]);
        let mut checker = RemoteChecker::new(&probe);

        assert!(checker.check_install("pypi", "scanpy").is_none());
        assert!(checker.check_install("conda", "conda-forge::scanpy").is_none());

        let issue = checker.check_install("cran", "Seurat").unwrap();
        assert!(issue.message.contains("CRAN package 'Seurat' does not exist"));
        assert_eq!(issue.field.as_deref(), Some("install.cran"));

        assert!(checker.check_install("bioconductor", "anything").is_none());
    }

    #[test]
    fn test_invalid_conda_spec_needs_no_request() {
        let probe = FakeProbe::default();
        let mut checker = RemoteChecker::new(&probe);

        let issue = checker.check_install("conda", "scanpy").unwrap();
        assert!(issue.message.contains("channel::package"));
        assert_eq!(probe.request_count(), 0);
    }

    #[test]
    fn test_contacts() {
        let mut probe = FakeProbe::default();
        probe.unknown_users.insert("ghost".to_string());
        let mut checker = RemoteChecker::new(&probe);

        let users = vec!["flying-sheep".to_string(), "ghost".to_string()];
        let issue = checker.check_contacts(&users).unwrap();
        assert!(issue.message.contains("ghost"));
        assert!(!issue.message.contains("flying-sheep"));

        // Confirmed users are not looked up again
        assert!(checker.check_contacts(&["flying-sheep".to_string()]).is_none());
        assert_eq!(probe.request_count(), 1);
    }

    #[test]
    fn test_users_query_escapes_names() {
        let query = github_users_query(&["a\"b".to_string(), "c".to_string()]);
        assert!(query.contains("user0: user(login: \"a\\\"b\")"));
        assert!(query.contains("user1: user(login: \"c\")"));
    }

    #[test]
    fn test_missing_users_from_response() {
        let users = vec!["alice".to_string(), "ghost".to_string()];
        let body = json!({
            "data": { "user0": { "login": "alice" }, "user1": null },
            "errors": [{ "message": "Could not resolve to a User with the login of 'ghost'." }]
        });
        assert_eq!(missing_users_from_response(&users, &body).unwrap(), vec!["ghost"]);

        let body = json!({ "errors": [{ "message": "Bad credentials" }] });
        assert_eq!(
            missing_users_from_response(&users, &body).unwrap_err(),
            "Bad credentials"
        );
    }
}
