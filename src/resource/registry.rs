//! Resource Registry - Load resource definitions from JSON
//!
//! Versioned resources and embedded collections are declared in JSON files
//! compiled into the binary and looked up by key.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::collection::CollectionSpec;
use crate::version::{ApiVersion, Feature, FeatureSet, ProductLine, VersionError};

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[include_str!("../resources/compute.json")];

/// A resource with its own URL whose API version depends on the fields it uses
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    pub product: ProductLine,
    pub base_version: ApiVersion,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl ResourceDef {
    pub fn feature_set(&self) -> Result<FeatureSet, VersionError> {
        FeatureSet::new(self.product, self.base_version, self.features.clone())
    }
}

/// An element of a parent's list field, managed as a resource of its own
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddedDef {
    #[serde(flatten)]
    pub collection: CollectionSpec,
    pub base_version: ApiVersion,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl EmbeddedDef {
    pub fn feature_set(&self) -> Result<FeatureSet, VersionError> {
        FeatureSet::new(
            self.collection.product,
            self.base_version,
            self.features.clone(),
        )
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ResourceConfig {
    #[serde(default)]
    pub resources: HashMap<String, ResourceDef>,
    #[serde(default)]
    pub collections: HashMap<String, EmbeddedDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig::default();

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.resources.extend(partial.resources);
            final_config.collections.extend(partial.collections);
        }

        final_config
    })
}

/// Get a versioned resource definition by key
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    get_registry().resources.get(key)
}

/// Get an embedded collection definition by key
pub fn get_collection(key: &str) -> Option<&'static EmbeddedDef> {
    get_registry().collections.get(key)
}

/// All resource keys, sorted
pub fn get_all_resource_keys() -> Vec<&'static str> {
    let mut keys: Vec<_> = get_registry()
        .resources
        .keys()
        .map(|s| s.as_str())
        .collect();
    keys.sort_unstable();
    keys
}

/// All collection keys, sorted
pub fn get_all_collection_keys() -> Vec<&'static str> {
    let mut keys: Vec<_> = get_registry()
        .collections
        .keys()
        .map(|s| s.as_str())
        .collect();
    keys.sort_unstable();
    keys
}
