//! Aggregation
//!
//! Validates every package of a registry and, only when all of them pass,
//! publishes the combined collection.

mod errors;
mod pipeline;
mod publish;

pub use errors::{PipelineError, PipelineResult};
pub use pipeline::{Pipeline, ValidatedPackage, ValidatedRegistry};
pub use publish::{checksum, PublishOutcome, Publisher, ARTIFACT_FILE_NAME};
