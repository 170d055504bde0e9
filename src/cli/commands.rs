//! CLI command implementations
//!
//! Commands resolve their configuration, do their work and return. Logs go
//! to stderr; stdout only carries the published collection.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::aggregate::{Pipeline, PublishOutcome};
use crate::checks::{HttpProbe, RemoteProbe};
use crate::config::RegistryConfig;
use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::schema::SchemaLoader;
use crate::template_repos::{update_repos, Repo};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Main entry point
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    if cli.quiet {
        Logger::set_min_severity(Severity::Error);
    }
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Validate {
            config,
            registry_dir,
            schema,
            outdir,
            remote_checks,
        } => {
            let config = resolve_config(
                config.as_deref(),
                registry_dir,
                schema,
                outdir,
                remote_checks,
            )?;
            let stdout = io::stdout();
            let mut stdout = stdout.lock();
            validate(&config, &mut stdout).map(|_| ())
        }
        Command::CheckSchema { schema } => {
            check_schema(&schema)?;
            let mut stdout = io::stdout();
            writeln!(stdout, "{}: valid JSON Schema", schema.display())?;
            Ok(())
        }
        Command::TemplateRepos { file, template_url } => {
            template_repos(&file, &template_url).map(|_| ())
        }
    }
}

/// Builds the run configuration: file values first, then flags on top.
pub fn resolve_config(
    config_path: Option<&Path>,
    registry_dir: Option<PathBuf>,
    schema: Option<PathBuf>,
    outdir: Option<PathBuf>,
    remote_checks: bool,
) -> CliResult<RegistryConfig> {
    let mut config = match config_path {
        Some(path) => RegistryConfig::load(path)?,
        None => RegistryConfig::default(),
    };

    if let Some(dir) = registry_dir {
        config.registry_dir = dir;
    }
    if let Some(path) = schema {
        config.schema_path = path;
    }
    if outdir.is_some() {
        config.outdir = outdir;
    }
    config.remote_checks |= remote_checks;

    config.validate()?;

    let remote = if config.remote_checks { "true" } else { "false" };
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("registry_dir", &config.registry_dir.display().to_string()),
            ("schema", &config.schema_path.display().to_string()),
            ("remote_checks", remote),
        ],
    );

    Ok(config)
}

/// Validates the registry and publishes the collection.
pub fn validate(config: &RegistryConfig, stdout: &mut dyn Write) -> CliResult<PublishOutcome> {
    let probe = if config.remote_checks {
        Some(HttpProbe::new(
            config.http_timeout_secs,
            RegistryConfig::github_token(),
        )?)
    } else {
        None
    };

    let mut pipeline = Pipeline::new(config);
    if let Some(probe) = probe.as_ref() {
        pipeline = pipeline.with_probe(probe as &dyn RemoteProbe);
    }

    Ok(pipeline.run(stdout)?)
}

/// Loads the schema, which checks it against the meta-schema.
pub fn check_schema(schema_path: &Path) -> CliResult<SchemaLoader> {
    let loader = SchemaLoader::load(schema_path)?;
    log_event_with_fields(Event::SchemaLoaded, &[("schema", loader.source())]);
    Ok(loader)
}

/// Updates the template repository list at `file`.
///
/// GitHub code search needs a token.
pub fn template_repos(file: &Path, template_url: &str) -> CliResult<Vec<Repo>> {
    let token = RegistryConfig::github_token().ok_or_else(|| {
        CliError::config_error(format!(
            "{} must be set to search GitHub",
            crate::config::GITHUB_TOKEN_ENV
        ))
    })?;
    let probe = HttpProbe::new(RegistryConfig::default().http_timeout_secs, Some(token))?;
    Ok(update_repos(file, &probe, template_url)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_flags_override_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ecoreg.json");
        fs::write(&path, r#"{ "registry_dir": "from-file", "logo_size": 256 }"#).unwrap();

        let config = resolve_config(
            Some(&path),
            Some(PathBuf::from("from-flag")),
            None,
            Some(PathBuf::from("build")),
            false,
        )
        .unwrap();

        assert_eq!(config.registry_dir, PathBuf::from("from-flag"));
        assert_eq!(config.logo_size, 256);
        assert_eq!(config.outdir, Some(PathBuf::from("build")));
        assert!(!config.remote_checks);
    }

    #[test]
    fn test_defaults_without_file() {
        let config = resolve_config(None, None, None, None, true).unwrap();
        assert_eq!(config.registry_dir, PathBuf::from("packages"));
        assert!(config.remote_checks);
    }

    #[test]
    fn test_bad_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ecoreg.json");
        fs::write(&path, "{ not json").unwrap();

        let err = resolve_config(Some(&path), None, None, None, false).unwrap_err();
        assert_eq!(err.code_str(), "ECOREG_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_check_schema() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("schema.json");
        fs::write(&good, include_str!("../../schema.json")).unwrap();
        assert!(check_schema(&good).is_ok());

        let bad = temp_dir.path().join("bad.json");
        fs::write(&bad, r#"{"type": "strnig"}"#).unwrap();
        let err = check_schema(&bad).unwrap_err();
        assert_eq!(err.code_str(), "ECOREG_CLI_SCHEMA_ERROR");
    }

    #[test]
    fn test_validate_writes_collection_to_writer() {
        let temp_dir = TempDir::new().unwrap();
        let schema_path = temp_dir.path().join("schema.json");
        fs::write(&schema_path, include_str!("../../schema.json")).unwrap();
        let registry_dir = temp_dir.path().join("packages");
        fs::create_dir(&registry_dir).unwrap();

        let config = RegistryConfig {
            registry_dir,
            schema_path,
            ..RegistryConfig::default()
        };
        let mut stdout = Vec::new();
        let outcome = validate(&config, &mut stdout).unwrap();

        assert_eq!(outcome.package_count, 0);
        assert_eq!(String::from_utf8(stdout).unwrap(), "[]\n");
    }
}
