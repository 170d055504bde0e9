//! Checks that go beyond the schema
//!
//! - Duplicate links across packages (per link category)
//! - Logo presence and dimensions
//! - Optional remote checks: reachable links, existing package index
//!   entries and GitHub contacts

mod links;
mod logo;
mod remote;

pub use links::{package_links, LinkCategory, LinkRegistry};
pub use logo::{check_logo, check_package_logo, fits_bounding_box, DEFAULT_LOGO_SIZE};
pub use remote::{parse_conda_spec, HttpProbe, ProbeError, RemoteChecker, RemoteProbe};

#[cfg(test)]
pub(crate) use remote::fake::FakeProbe;
