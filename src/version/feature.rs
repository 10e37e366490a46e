//! Feature declarations and minimum-version resolution
//!
//! A [`Feature`] ties a configuration field to the API version that first
//! exposes it. [`FeatureSet::resolve`] looks at which features the declared
//! configuration actually uses and picks the least capable version that still
//! serves all of them.
//!
//! Wildcard paths (`network_interface.*.alias_ip_range`) expand the first `*`
//! over the indices of that list. Only one level is expanded; a second `*` is
//! matched literally and never resolves. Features nested inside set-typed
//! blocks cannot be addressed at all.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::registry::{ApiVersion, ProductLine};
use super::VersionError;
use crate::resource::data::ResourceData;

/// When the version is being chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    AtCreate,
    /// Also counts features whose value changed, so reverting a beta field
    /// to its default still goes through the beta surface
    AtUpdate,
}

/// A field that needs at least `version` to be expressed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub version: ApiVersion,
    pub field_path: String,
    #[serde(default)]
    pub default_value: Option<Value>,
}

impl Feature {
    pub fn new(version: ApiVersion, field_path: impl Into<String>) -> Self {
        Self {
            version,
            field_path: field_path.into(),
            default_value: None,
        }
    }

    pub fn with_default(mut self, default_value: Value) -> Self {
        self.default_value = Some(default_value);
        self
    }

    /// Set to something other than its default
    pub fn in_use(&self, data: &dyn ResourceData) -> bool {
        match split_wildcard(&self.field_path) {
            None => field_in_use(data, &self.field_path, self.default_value.as_ref()),
            Some((prefix, suffix)) => (0..list_len(data, prefix)).any(|i| {
                field_in_use(data, &format!("{prefix}{i}{suffix}"), self.default_value.as_ref())
            }),
        }
    }

    /// Changed since the last persisted state, including removal
    pub fn has_change(&self, data: &dyn ResourceData) -> bool {
        match split_wildcard(&self.field_path) {
            None => data.has_change(&self.field_path),
            Some((prefix, suffix)) => {
                data.has_change(&format!("{prefix}#"))
                    || (0..list_len(data, prefix))
                        .any(|i| data.has_change(&format!("{prefix}{i}{suffix}")))
            }
        }
    }

    pub fn is_active(&self, data: &dyn ResourceData, mode: ResolveMode) -> bool {
        match mode {
            ResolveMode::AtCreate => self.in_use(data),
            ResolveMode::AtUpdate => self.in_use(data) || self.has_change(data),
        }
    }
}

/// `("network_interface.", ".alias_ip_range")` for the first `*`
fn split_wildcard(path: &str) -> Option<(&str, &str)> {
    let pos = path.find('*')?;
    Some((&path[..pos], &path[pos + 1..]))
}

fn list_len(data: &dyn ResourceData, prefix: &str) -> u64 {
    data.get_ok(&format!("{prefix}#"))
        .and_then(|v| v.as_u64())
        .unwrap_or(0)
}

fn field_in_use(data: &dyn ResourceData, path: &str, default_value: Option<&Value>) -> bool {
    match data.get_ok(path) {
        Some(value) => default_value.map_or(true, |d| &value != d),
        None => false,
    }
}

/// The feature list of one resource, validated against its product line
#[derive(Debug, Clone)]
pub struct FeatureSet {
    line: ProductLine,
    base: ApiVersion,
    features: Vec<Feature>,
}

impl FeatureSet {
    pub fn new(
        line: ProductLine,
        base: ApiVersion,
        features: Vec<Feature>,
    ) -> Result<Self, VersionError> {
        for version in std::iter::once(base).chain(features.iter().map(|f| f.version)) {
            if !line.contains(version) {
                return Err(VersionError::NotInProductLine { version, line });
            }
        }

        Ok(Self {
            line,
            base,
            features,
        })
    }

    pub fn line(&self) -> ProductLine {
        self.line
    }

    pub fn base(&self) -> ApiVersion {
        self.base
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn active_features(&self, data: &dyn ResourceData, mode: ResolveMode) -> Vec<&Feature> {
        self.features
            .iter()
            .filter(|f| f.is_active(data, mode))
            .collect()
    }

    pub fn resolve(&self, data: &dyn ResourceData, mode: ResolveMode) -> ApiVersion {
        resolve(self.line, self.base, &self.features, mode, data)
    }
}

/// Pick the API version for one operation.
///
/// The result is `declared` or the version of an active feature, whichever
/// sits highest in `line`'s capability order.
pub fn resolve(
    line: ProductLine,
    declared: ApiVersion,
    features: &[Feature],
    mode: ResolveMode,
    data: &dyn ResourceData,
) -> ApiVersion {
    let mut candidates = vec![declared];

    for feature in features {
        if feature.is_active(data, mode) {
            tracing::debug!(
                "Feature {} active ({:?}), needs {}",
                feature.field_path,
                mode,
                feature.version
            );
            candidates.push(feature.version);
        }
    }

    let chosen = line
        .ordered_versions()
        .iter()
        .rev()
        .find(|v| candidates.contains(v))
        .copied()
        .unwrap_or_else(|| line.most_capable());

    tracing::debug!("Resolved {} version {} (declared {})", line, chosen, declared);
    chosen
}
