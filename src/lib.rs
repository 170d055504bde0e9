//! ecoreg - validator and publisher for a registry of ecosystem packages
//!
//! Each package is a directory holding one YAML metadata document. A run
//! validates every document against a JSON Schema and a few cross-package
//! rules, then publishes the whole registry as one JSON collection.

pub mod aggregate;
pub mod checks;
pub mod cli;
pub mod config;
pub mod observability;
pub mod registry;
pub mod report;
pub mod schema;
pub mod template_repos;
