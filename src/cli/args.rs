//! CLI argument definitions using clap
//!
//! Commands:
//! - ecoreg validate [--config <path>] [--registry-dir <dir>] [--schema <path>] [--outdir <dir>] [--remote-checks]
//! - ecoreg check-schema [--schema <path>]
//! - ecoreg template-repos <file>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::template_repos::DEFAULT_TEMPLATE_URL;

/// ecoreg - validate and publish an ecosystem package registry
#[derive(Parser, Debug)]
#[command(name = "ecoreg")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Only log errors
    #[arg(long, short, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate every package and publish the collection
    Validate {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory holding one subdirectory per package
        #[arg(long)]
        registry_dir: Option<PathBuf>,

        /// Path of the JSON Schema document
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Output directory; the collection goes to stdout when omitted
        #[arg(long)]
        outdir: Option<PathBuf>,

        /// Check links, package indexes and contacts over the network
        #[arg(long)]
        remote_checks: bool,
    },

    /// Check that the schema is itself a valid JSON Schema
    CheckSchema {
        /// Path of the JSON Schema document
        #[arg(long, default_value = "schema.json")]
        schema: PathBuf,
    },

    /// Add repositories generated from the project template to a list
    TemplateRepos {
        /// The repository list, usually template-repos.yml
        file: PathBuf,

        /// Template URL the repositories reference
        #[arg(long, default_value = DEFAULT_TEMPLATE_URL)]
        template_url: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
