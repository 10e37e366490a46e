//! Known API surface versions per product line

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::VersionError;

/// One backend API surface revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiVersion {
    #[serde(rename = "v1")]
    V1,
    #[serde(rename = "v0beta")]
    V0Beta,
    #[serde(rename = "v1beta1")]
    V1Beta1,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V0Beta => "v0beta",
            ApiVersion::V1Beta1 => "v1beta1",
        }
    }

    /// Path segment used in REST URLs (`compute/beta/...`)
    pub fn url_segment(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V0Beta => "beta",
            ApiVersion::V1Beta1 => "v1beta1",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" => Ok(ApiVersion::V1),
            "v0beta" | "beta" => Ok(ApiVersion::V0Beta),
            "v1beta1" => Ok(ApiVersion::V1Beta1),
            other => Err(VersionError::UnknownTag(other.to_string())),
        }
    }
}

/// A family of API surfaces that share resource shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductLine {
    Compute,
    Container,
}

const COMPUTE_VERSIONS: &[ApiVersion] = &[ApiVersion::V1, ApiVersion::V0Beta];
const CONTAINER_VERSIONS: &[ApiVersion] = &[ApiVersion::V1, ApiVersion::V1Beta1];

impl ProductLine {
    /// Versions from most stable to most capable
    pub fn ordered_versions(&self) -> &'static [ApiVersion] {
        match self {
            ProductLine::Compute => COMPUTE_VERSIONS,
            ProductLine::Container => CONTAINER_VERSIONS,
        }
    }

    pub fn most_stable(&self) -> ApiVersion {
        self.ordered_versions()[0]
    }

    pub fn most_capable(&self) -> ApiVersion {
        let versions = self.ordered_versions();
        versions[versions.len() - 1]
    }

    /// Position in the capability order, `None` for a foreign version
    pub fn rank(&self, version: ApiVersion) -> Option<usize> {
        self.ordered_versions().iter().position(|v| *v == version)
    }

    pub fn contains(&self, version: ApiVersion) -> bool {
        self.rank(version).is_some()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductLine::Compute => "compute",
            ProductLine::Container => "container",
        }
    }
}

impl fmt::Display for ProductLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
