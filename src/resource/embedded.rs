//! Embedded collection elements as standalone resources
//!
//! Binds a registry [`EmbeddedDef`] to the version resolver and the
//! [`CollectionItemStore`]: every verb first picks the API version from the
//! declared element, then runs against the parent at that version.

use serde_json::{Map, Value};

use super::data::{JsonResourceData, ResourceData};
use super::registry::EmbeddedDef;
use crate::collection::{CollectionError, CollectionItemStore, DeleteOutcome, ParentRef};
use crate::gcp::client::GcpClient;
use crate::gcp::operation::OperationWaiter;
use crate::version::{ApiVersion, FeatureSet, ResolveMode, VersionError};

pub struct EmbeddedResource<'a> {
    client: &'a GcpClient,
    waiter: &'a dyn OperationWaiter,
    def: &'a EmbeddedDef,
    features: FeatureSet,
}

impl<'a> EmbeddedResource<'a> {
    pub fn new(
        client: &'a GcpClient,
        waiter: &'a dyn OperationWaiter,
        def: &'a EmbeddedDef,
    ) -> Result<Self, VersionError> {
        Ok(Self {
            client,
            waiter,
            def,
            features: def.feature_set()?,
        })
    }

    pub fn def(&self) -> &EmbeddedDef {
        self.def
    }

    /// `project/location/parent/key`
    pub fn item_id(&self, parent: &ParentRef, key: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.client.project_id, parent.location, parent.name, key
        )
    }

    pub fn version_for(&self, data: &dyn ResourceData, mode: ResolveMode) -> ApiVersion {
        let version = self.features.resolve(data, mode);
        tracing::info!(
            "Using {} API {} for {}",
            self.features.line(),
            version,
            self.def.collection.display_name
        );
        version
    }

    fn store(&self, version: ApiVersion) -> CollectionItemStore<'_> {
        CollectionItemStore::new(self.client, self.waiter, &self.def.collection, version)
    }

    pub async fn create(
        &self,
        parent: &ParentRef,
        key: &str,
        payload: Map<String, Value>,
    ) -> Result<Value, CollectionError> {
        let data = JsonResourceData::new(Value::Object(payload.clone()));
        let version = self.version_for(&data, ResolveMode::AtCreate);
        self.store(version).create(parent, key, payload).await
    }

    /// The element as the API reports it; `None` means it has to be dropped from state
    pub async fn read(
        &self,
        parent: &ParentRef,
        key: &str,
        data: &dyn ResourceData,
    ) -> Result<Option<Value>, CollectionError> {
        let version = self.version_for(data, ResolveMode::AtCreate);
        let item = self.store(version).read(parent, key).await?;
        if item.is_none() {
            tracing::warn!(
                "Removing {} {} because it is gone",
                self.def.collection.display_name,
                self.item_id(parent, key)
            );
        }
        Ok(item)
    }

    /// Merge `payload` into the element. `prior` is the element as last
    /// persisted, used to detect fields being reverted.
    pub async fn update(
        &self,
        parent: &ParentRef,
        key: &str,
        payload: Map<String, Value>,
        prior: Option<&Value>,
    ) -> Result<Value, CollectionError> {
        let config = Value::Object(payload.clone());
        let data = match prior {
            Some(state) => JsonResourceData::with_state(config, state.clone()),
            None => JsonResourceData::new(config),
        };
        let version = self.version_for(&data, ResolveMode::AtUpdate);
        self.store(version).update(parent, key, payload).await
    }

    pub async fn delete(
        &self,
        parent: &ParentRef,
        key: &str,
        data: &dyn ResourceData,
    ) -> Result<DeleteOutcome, CollectionError> {
        let version = self.version_for(data, ResolveMode::AtCreate);
        self.store(version).delete(parent, key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcp::auth::GcpCredentials;
    use crate::gcp::operation::ComputeOperationWaiter;
    use crate::resource::registry::get_collection;
    use serde_json::json;

    fn client() -> GcpClient {
        GcpClient::with_credentials(GcpCredentials::from_access_token("t"), "proj", "us-central1")
            .unwrap()
    }

    #[test]
    fn test_item_id() {
        let client = client();
        let waiter = ComputeOperationWaiter::default();
        let def = get_collection("compute-router-nat").unwrap();
        let nat = EmbeddedResource::new(&client, &waiter, def).unwrap();
        assert_eq!(
            nat.item_id(&ParentRef::new("us-central1", "r1"), "nat-a"),
            "proj/us-central1/r1/nat-a"
        );
    }

    #[test]
    fn test_version_follows_element_fields() {
        let client = client();
        let waiter = ComputeOperationWaiter::default();
        let def = get_collection("compute-router-nat").unwrap();
        let nat = EmbeddedResource::new(&client, &waiter, def).unwrap();

        let plain = JsonResourceData::new(json!({"natIpAllocateOption": "AUTO_ONLY"}));
        assert_eq!(nat.version_for(&plain, ResolveMode::AtCreate), ApiVersion::V1);

        let ruled = JsonResourceData::new(json!({"rules": [{"ruleNumber": 1}]}));
        assert_eq!(nat.version_for(&ruled, ResolveMode::AtCreate), ApiVersion::V0Beta);
    }

    #[test]
    fn test_reverted_field_needs_beta_only_on_update() {
        let client = client();
        let waiter = ComputeOperationWaiter::default();
        let def = get_collection("compute-router-nat").unwrap();
        let nat = EmbeddedResource::new(&client, &waiter, def).unwrap();

        let data = JsonResourceData::with_state(
            json!({"enableDynamicPortAllocation": false}),
            json!({"enableDynamicPortAllocation": true}),
        );
        assert_eq!(nat.version_for(&data, ResolveMode::AtCreate), ApiVersion::V1);
        assert_eq!(nat.version_for(&data, ResolveMode::AtUpdate), ApiVersion::V0Beta);
    }
}
