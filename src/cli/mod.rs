//! CLI module for ecoreg
//!
//! Provides command-line interface for:
//! - validate: Validate the registry and publish the collection
//! - check-schema: Check the schema against the JSON Schema meta-schema
//! - template-repos: Update the list of template-generated repositories

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{check_schema, resolve_config, run, run_command, template_repos, validate};
pub use errors::{CliError, CliErrorCode, CliResult};
