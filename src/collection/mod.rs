//! Embedded-collection resources
//!
//! Some API objects keep child elements in a list field instead of exposing
//! them at their own URL: NAT configs and BGP peers live in a router's `nats`
//! and `bgpPeers`, peerings in a network's `peerings`. This module lets such an
//! element be created, read, updated and deleted as if it were a resource of
//! its own:
//!
//! - the parent is fetched, the element is located by its natural key
//!   (usually `name`), the list is edited in memory and the whole list is
//!   PATCHed back;
//! - all operations on one parent are serialized through the client's
//!   [`MutexRegistry`](crate::lock::MutexRegistry).
//!
//! The lock only covers this process. A collection that declares a
//! `fingerprint_field` also sends the fingerprint it read, so the API rejects a
//! write based on a stale read from another process.

mod store;

pub use store::{CollectionItemStore, DeleteOutcome};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::gcp::http::HttpError;
use crate::gcp::operation::OperationError;
use crate::version::ProductLine;

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("{kind} {key:?} already exists in {parent}")]
    AlreadyExists {
        kind: String,
        key: String,
        parent: String,
    },

    #[error("{kind} {key:?} not found in {parent}")]
    NotFound {
        kind: String,
        key: String,
        parent: String,
    },

    #[error("{kind} {key:?} in {parent} cannot be renamed to {requested}")]
    KeyChange {
        kind: String,
        key: String,
        requested: Value,
        parent: String,
    },

    #[error("{parent}: field {field:?} is not a list")]
    MalformedParent { parent: String, field: String },

    #[error("Error {activity}: {source}")]
    Request {
        activity: String,
        #[source]
        source: HttpError,
    },

    #[error(transparent)]
    Operation(#[from] OperationError),
}

impl CollectionError {
    /// Configuration-level errors the user has to fix; the rest are transport failures
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            CollectionError::AlreadyExists { .. }
                | CollectionError::NotFound { .. }
                | CollectionError::KeyChange { .. }
        )
    }
}

/// Maps a declared key onto the wire and a wire key back to its comparable form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCodec {
    /// Keys are compared as-is
    #[default]
    Name,
    /// The key is a reference to another resource. It is sent as a
    /// project-relative path and compared by its last path segment, since the
    /// server answers with full URLs.
    ResourceName,
}

/// What a declared key is qualified against
#[derive(Debug, Clone, Copy)]
pub struct KeyScope<'a> {
    pub project: &'a str,
    pub location: &'a str,
    /// Path of a short key, with `{project}`, `{location}` and `{key}` placeholders
    pub template: Option<&'a str>,
}

impl KeyScope<'_> {
    /// `ig-1` -> `projects/p/zones/z/instanceGroups/ig-1`
    fn qualify(&self, declared: &str) -> String {
        if declared.starts_with("https://") || declared.starts_with("projects/") {
            return declared.to_string();
        }
        if declared.contains('/') {
            return format!("projects/{}/{}", self.project, declared);
        }
        match self.template {
            Some(template) => template
                .replace("{project}", self.project)
                .replace("{location}", self.location)
                .replace("{key}", declared),
            None => declared.to_string(),
        }
    }
}

impl KeyCodec {
    /// Declared key to wire value
    pub fn expand(&self, declared: &str, scope: &KeyScope<'_>) -> Value {
        match self {
            KeyCodec::Name => Value::String(declared.to_string()),
            KeyCodec::ResourceName => Value::String(scope.qualify(declared)),
        }
    }

    /// Wire value to comparable key
    pub fn flatten(&self, wire: &Value) -> Value {
        match (self, wire) {
            (KeyCodec::ResourceName, Value::String(s)) => {
                Value::String(s.rsplit('/').next().unwrap_or(s).to_string())
            }
            _ => wire.clone(),
        }
    }
}

fn default_key_field() -> String {
    "name".to_string()
}

/// Where an embedded collection lives and how its elements are keyed
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSpec {
    /// Element kind for messages, e.g. `RouterNat`
    pub display_name: String,
    pub product: ProductLine,
    /// Parent kind, prefix of the lock key
    pub parent_kind: String,
    /// Project-relative path of the parent, with `{location}` and `{parent}` placeholders
    pub parent_path: String,
    /// Wire name of the list field
    pub list_field: String,
    #[serde(default = "default_key_field")]
    pub key_field: String,
    #[serde(default)]
    pub key_codec: KeyCodec,
    /// For `resource_name` keys: path a short key expands to, see [`KeyScope`]
    #[serde(default)]
    pub key_template: Option<String>,
    #[serde(default)]
    pub fingerprint_field: Option<String>,
}

impl CollectionSpec {
    pub fn parent_path(&self, parent: &ParentRef) -> String {
        self.parent_path
            .replace("{location}", &urlencoding::encode(&parent.location))
            .replace("{parent}", &urlencoding::encode(&parent.name))
    }

    pub fn lock_key(&self, project: &str, parent: &ParentRef) -> String {
        format!(
            "{}/{}/{}/{}",
            self.parent_kind, project, parent.location, parent.name
        )
    }

    pub fn key_scope<'a>(&'a self, project: &'a str, parent: &'a ParentRef) -> KeyScope<'a> {
        KeyScope {
            project,
            location: &parent.location,
            template: self.key_template.as_deref(),
        }
    }

    /// `key` as written to the element's key field
    pub fn wire_key(&self, key: &str, scope: &KeyScope<'_>) -> Value {
        self.key_codec.expand(key, scope)
    }

    /// Index of the element whose key matches `key`
    pub fn find_item(&self, items: &[Value], key: &str, scope: &KeyScope<'_>) -> Option<usize> {
        let expected = self.key_codec.flatten(&self.wire_key(key, scope));

        items.iter().position(|item| {
            let item_key = self
                .key_codec
                .flatten(item.get(&self.key_field).unwrap_or(&Value::Null));
            let matched = item_key == expected;
            if !matched {
                tracing::trace!(
                    "Skipping item with {}={}, looking for {}",
                    self.key_field,
                    item_key,
                    expected
                );
            }
            matched
        })
    }

    /// The list field of a fetched parent; absent or null is an empty list
    pub fn items_of(&self, parent_doc: &Value, parent: &str) -> Result<Vec<Value>, CollectionError> {
        match parent_doc.get(&self.list_field) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(_) => Err(CollectionError::MalformedParent {
                parent: parent.to_string(),
                field: self.list_field.clone(),
            }),
        }
    }

    /// New element from a payload, with the key field set from `key`
    pub fn new_item(&self, key: &str, payload: Map<String, Value>, scope: &KeyScope<'_>) -> Value {
        let mut item = payload;
        item.insert(self.key_field.clone(), self.wire_key(key, scope));
        Value::Object(item)
    }

    /// A payload key field that names another element than `key`
    pub fn renamed_key<'p>(
        &self,
        key: &str,
        payload: &'p Map<String, Value>,
        scope: &KeyScope<'_>,
    ) -> Option<&'p Value> {
        let requested = payload.get(&self.key_field)?;
        let expected = self.key_codec.flatten(&self.wire_key(key, scope));
        (self.key_codec.flatten(requested) != expected).then_some(requested)
    }
}

/// Overwrite the keys present in `payload`; everything else is kept.
/// `key_field` always keeps the existing element's value.
pub fn merge_item(existing: &Value, payload: &Map<String, Value>, key_field: &str) -> Value {
    let mut merged = existing.as_object().cloned().unwrap_or_default();
    for (k, v) in payload {
        if k != key_field {
            merged.insert(k.clone(), v.clone());
        }
    }
    Value::Object(merged)
}

/// Identity of a parent object within the client's project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    /// Region or zone, `global` for global parents
    pub location: String,
    pub name: String,
}

impl ParentRef {
    pub fn new(location: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nat_spec() -> CollectionSpec {
        serde_json::from_value(json!({
            "display_name": "RouterNat",
            "product": "compute",
            "parent_kind": "router",
            "parent_path": "regions/{location}/routers/{parent}",
            "list_field": "nats"
        }))
        .unwrap()
    }

    #[test]
    fn test_spec_defaults() {
        let spec = nat_spec();
        assert_eq!(spec.key_field, "name");
        assert_eq!(spec.key_codec, KeyCodec::Name);
        assert!(spec.fingerprint_field.is_none());
    }

    #[test]
    fn test_parent_path_and_lock_key() {
        let spec = nat_spec();
        let parent = ParentRef::new("us-central1", "r1");
        assert_eq!(spec.parent_path(&parent), "regions/us-central1/routers/r1");
        assert_eq!(spec.lock_key("proj", &parent), "router/proj/us-central1/r1");
    }

    fn scope<'a>(template: Option<&'a str>) -> KeyScope<'a> {
        KeyScope {
            project: "p",
            location: "us-central1",
            template,
        }
    }

    #[test]
    fn test_find_item_by_name() {
        let spec = nat_spec();
        let items = vec![json!({"name": "a"}), json!({"name": "b"})];
        assert_eq!(spec.find_item(&items, "b", &scope(None)), Some(1));
        assert_eq!(spec.find_item(&items, "c", &scope(None)), None);
    }

    #[test]
    fn test_resource_name_codec_matches_full_urls() {
        let mut spec = nat_spec();
        spec.key_codec = KeyCodec::ResourceName;
        spec.key_field = "network".to_string();
        let items = vec![json!({
            "network": "https://www.googleapis.com/compute/v1/projects/p/global/networks/peer-net"
        })];
        assert_eq!(spec.find_item(&items, "peer-net", &scope(None)), Some(0));
        assert_eq!(
            spec.find_item(&items, "projects/p/global/networks/peer-net", &scope(None)),
            Some(0)
        );
    }

    #[test]
    fn test_resource_name_expands_to_project_paths() {
        let codec = KeyCodec::ResourceName;
        let template = Some("projects/{project}/regions/{location}/networkEndpointGroups/{key}");

        assert_eq!(
            codec.expand("neg-1", &scope(template)),
            "projects/p/regions/us-central1/networkEndpointGroups/neg-1"
        );
        assert_eq!(
            codec.expand("zones/us-central1-a/instanceGroups/ig-1", &scope(template)),
            "projects/p/zones/us-central1-a/instanceGroups/ig-1"
        );
        assert_eq!(
            codec.expand("projects/other/global/networks/n", &scope(template)),
            "projects/other/global/networks/n"
        );
        let url = "https://www.googleapis.com/compute/v1/projects/p/global/networks/n";
        assert_eq!(codec.expand(url, &scope(template)), url);
        assert_eq!(codec.expand("n", &scope(None)), "n");
        assert_eq!(KeyCodec::Name.expand("a/b", &scope(template)), "a/b");
    }

    #[test]
    fn test_expanded_short_keys_flatten_back() {
        let codec = KeyCodec::ResourceName;
        let template = Some("projects/{project}/global/networks/{key}");
        for key in ["peer-net", "zones/z/instanceGroups/peer-net"] {
            assert_eq!(codec.flatten(&codec.expand(key, &scope(template))), "peer-net");
        }
    }

    #[test]
    fn test_renamed_key_detection() {
        let spec = nat_spec();
        let same = json!({"name": "a", "size": 2}).as_object().cloned().unwrap();
        let other = json!({"name": "b"}).as_object().cloned().unwrap();
        let keyless = json!({"size": 2}).as_object().cloned().unwrap();

        assert!(spec.renamed_key("a", &same, &scope(None)).is_none());
        assert_eq!(spec.renamed_key("a", &other, &scope(None)), Some(&json!("b")));
        assert!(spec.renamed_key("a", &keyless, &scope(None)).is_none());

        let mut backends = nat_spec();
        backends.key_codec = KeyCodec::ResourceName;
        backends.key_field = "group".to_string();
        let full = json!({
            "group": "https://www.googleapis.com/compute/v1/projects/p/zones/z/instanceGroups/ig-1"
        })
        .as_object()
        .cloned()
        .unwrap();
        assert!(backends.renamed_key("ig-1", &full, &scope(None)).is_none());
    }

    #[test]
    fn test_items_of_handles_missing_and_malformed() {
        let spec = nat_spec();
        assert!(spec.items_of(&json!({}), "r").unwrap().is_empty());
        assert!(spec.items_of(&json!({"nats": null}), "r").unwrap().is_empty());
        assert_eq!(spec.items_of(&json!({"nats": [{"name": "a"}]}), "r").unwrap().len(), 1);
        assert!(matches!(
            spec.items_of(&json!({"nats": "oops"}), "r"),
            Err(CollectionError::MalformedParent { .. })
        ));
    }

    #[test]
    fn test_merge_overwrites_only_given_keys() {
        let existing = json!({"name": "a", "size": 1, "mode": "AUTO"});
        let payload = json!({"size": 2}).as_object().cloned().unwrap();
        assert_eq!(
            merge_item(&existing, &payload, "name"),
            json!({"name": "a", "size": 2, "mode": "AUTO"})
        );
    }

    #[test]
    fn test_merge_keeps_existing_key() {
        let existing = json!({"group": "projects/p/zones/z/instanceGroups/ig-1", "capacityScaler": 1.0});
        let payload = json!({"group": "ig-1", "capacityScaler": 0.5})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(
            merge_item(&existing, &payload, "group"),
            json!({"group": "projects/p/zones/z/instanceGroups/ig-1", "capacityScaler": 0.5})
        );
    }

    #[test]
    fn test_new_item_sets_key() {
        let spec = nat_spec();
        let payload = json!({"size": 5}).as_object().cloned().unwrap();
        assert_eq!(
            spec.new_item("b", payload, &scope(None)),
            json!({"name": "b", "size": 5})
        );
    }
}
