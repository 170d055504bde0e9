//! Registry directory handling
//!
//! Finds package directories, loads their metadata documents and checks
//! that each directory contains nothing but its document and logo.

mod discovery;
mod errors;
mod structure;

pub use discovery::{parse_document, PackageEntry, Registry};
pub use errors::{RegistryError, RegistryResult};
pub use structure::{check_structure, contained_path};
