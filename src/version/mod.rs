//! Multi-version API resolution
//!
//! - [`registry`] - Known API versions per product line and their order
//! - [`feature`] - Feature declarations and the version resolver

pub mod feature;
pub mod registry;

use thiserror::Error;

pub use feature::{resolve, Feature, FeatureSet, ResolveMode};
pub use registry::{ApiVersion, ProductLine};

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("Unknown API version tag: {0}")]
    UnknownTag(String),

    #[error("API version {version} is not part of the {line} product line")]
    NotInProductLine {
        version: ApiVersion,
        line: ProductLine,
    },
}
