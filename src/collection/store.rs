//! Create/Read/Update/Delete of one element of an embedded collection

use serde_json::{Map, Value};

use super::{merge_item, CollectionError, CollectionSpec, ParentRef};
use crate::gcp::client::GcpClient;
use crate::gcp::http::HttpError;
use crate::gcp::operation::OperationWaiter;
use crate::version::ApiVersion;

/// Result of deleting an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed,
    /// The element (or its parent) was already gone; treated as success
    AlreadyAbsent,
}

/// The parent as read before a mutation
struct ParentSnapshot {
    items: Vec<Value>,
    fingerprint: Option<Value>,
}

/// Element-level CRUD over a list field of a remote parent
pub struct CollectionItemStore<'a> {
    client: &'a GcpClient,
    waiter: &'a dyn OperationWaiter,
    spec: &'a CollectionSpec,
    version: ApiVersion,
}

impl<'a> CollectionItemStore<'a> {
    pub fn new(
        client: &'a GcpClient,
        waiter: &'a dyn OperationWaiter,
        spec: &'a CollectionSpec,
        version: ApiVersion,
    ) -> Self {
        Self {
            client,
            waiter,
            spec,
            version,
        }
    }

    pub fn spec(&self) -> &CollectionSpec {
        self.spec
    }

    /// Append a new element. Fails without writing if the key is taken.
    pub async fn create(
        &self,
        parent: &ParentRef,
        key: &str,
        payload: Map<String, Value>,
    ) -> Result<Value, CollectionError> {
        let _guard = self.lock(parent).await;
        let activity = self.activity("creating", parent, key);

        let snapshot = self
            .fetch(parent)
            .await?
            .ok_or_else(|| CollectionError::Request {
                activity: activity.clone(),
                source: HttpError::synthesized_not_found(format!(
                    "{} {} does not exist",
                    self.spec.parent_kind,
                    self.parent_label(parent)
                )),
            })?;

        let scope = self.spec.key_scope(&self.client.project_id, parent);
        if let Some(idx) = self.spec.find_item(&snapshot.items, key, &scope) {
            tracing::debug!("Existing {} at index {}: {}", self.spec.display_name, idx, snapshot.items[idx]);
            return Err(CollectionError::AlreadyExists {
                kind: self.spec.display_name.clone(),
                key: key.to_string(),
                parent: self.parent_label(parent),
            });
        }

        let item = self.spec.new_item(key, payload, &scope);
        let mut items = snapshot.items;
        items.push(item.clone());

        self.write(parent, items, snapshot.fingerprint, &activity).await?;
        tracing::info!("Created {} {:?} in {}", self.spec.display_name, key, self.parent_label(parent));
        Ok(item)
    }

    /// Current element, `None` if it or its parent no longer exists
    pub async fn read(&self, parent: &ParentRef, key: &str) -> Result<Option<Value>, CollectionError> {
        let _guard = self.lock(parent).await;

        let Some(snapshot) = self.fetch(parent).await? else {
            return Ok(None);
        };

        let scope = self.spec.key_scope(&self.client.project_id, parent);
        Ok(self
            .spec
            .find_item(&snapshot.items, key, &scope)
            .map(|idx| snapshot.items[idx].clone()))
    }

    /// Merge `payload` into the existing element. The key cannot change.
    pub async fn update(
        &self,
        parent: &ParentRef,
        key: &str,
        payload: Map<String, Value>,
    ) -> Result<Value, CollectionError> {
        let _guard = self.lock(parent).await;
        let activity = self.activity("updating", parent, key);

        let not_found = || CollectionError::NotFound {
            kind: self.spec.display_name.clone(),
            key: key.to_string(),
            parent: self.parent_label(parent),
        };

        let scope = self.spec.key_scope(&self.client.project_id, parent);
        if let Some(requested) = self.spec.renamed_key(key, &payload, &scope) {
            return Err(CollectionError::KeyChange {
                kind: self.spec.display_name.clone(),
                key: key.to_string(),
                requested: requested.clone(),
                parent: self.parent_label(parent),
            });
        }

        let snapshot = self.fetch(parent).await?.ok_or_else(not_found)?;
        let idx = self
            .spec
            .find_item(&snapshot.items, key, &scope)
            .ok_or_else(not_found)?;

        let mut items = snapshot.items;
        let merged = merge_item(&items[idx], &payload, &self.spec.key_field);
        items[idx] = merged.clone();

        self.write(parent, items, snapshot.fingerprint, &activity).await?;
        tracing::info!("Updated {} {:?} in {}", self.spec.display_name, key, self.parent_label(parent));
        Ok(merged)
    }

    /// Remove the element; an absent element counts as deleted
    pub async fn delete(&self, parent: &ParentRef, key: &str) -> Result<DeleteOutcome, CollectionError> {
        let _guard = self.lock(parent).await;
        let activity = self.activity("deleting", parent, key);

        let snapshot = match self.fetch(parent).await? {
            Some(snapshot) => snapshot,
            None => return Ok(self.already_absent(parent, key)),
        };
        let scope = self.spec.key_scope(&self.client.project_id, parent);
        let Some(idx) = self.spec.find_item(&snapshot.items, key, &scope) else {
            return Ok(self.already_absent(parent, key));
        };

        let mut items = snapshot.items;
        items.remove(idx);

        self.write(parent, items, snapshot.fingerprint, &activity).await?;
        tracing::info!("Deleted {} {:?} from {}", self.spec.display_name, key, self.parent_label(parent));
        Ok(DeleteOutcome::Removed)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn lock(&self, parent: &ParentRef) -> crate::lock::KeyGuard {
        let key = self.spec.lock_key(&self.client.project_id, parent);
        self.client.locks().lock(&key).await
    }

    fn parent_url(&self, parent: &ParentRef) -> String {
        self.client
            .api_url(self.spec.product, self.version, &self.spec.parent_path(parent))
    }

    fn parent_label(&self, parent: &ParentRef) -> String {
        format!(
            "{} {}/{}/{}",
            self.spec.parent_kind, self.client.project_id, parent.location, parent.name
        )
    }

    fn activity(&self, verb: &str, parent: &ParentRef, key: &str) -> String {
        format!(
            "{} {} {:?} in {}",
            verb,
            self.spec.display_name,
            key,
            self.parent_label(parent)
        )
    }

    fn already_absent(&self, parent: &ParentRef, key: &str) -> DeleteOutcome {
        let synthesized = HttpError::synthesized_not_found(format!(
            "{} not found in list",
            self.spec.display_name
        ));
        tracing::info!(
            "{} {:?} in {}: {}; treating as deleted",
            self.spec.display_name,
            key,
            self.parent_label(parent),
            synthesized
        );
        DeleteOutcome::AlreadyAbsent
    }

    /// GET the parent; `None` when the parent itself is gone
    async fn fetch(&self, parent: &ParentRef) -> Result<Option<ParentSnapshot>, CollectionError> {
        let url = self.parent_url(parent);
        let doc = match self.client.get(&url).await {
            Ok(doc) => doc,
            Err(e) if e.is_not_found() => {
                tracing::warn!("{} not found", self.parent_label(parent));
                return Ok(None);
            }
            Err(source) => {
                return Err(CollectionError::Request {
                    activity: format!("reading {}", self.parent_label(parent)),
                    source,
                })
            }
        };

        let items = self.spec.items_of(&doc, &self.parent_label(parent))?;
        let fingerprint = self
            .spec
            .fingerprint_field
            .as_ref()
            .and_then(|field| doc.get(field).cloned());

        Ok(Some(ParentSnapshot { items, fingerprint }))
    }

    /// PATCH the whole list back and wait for the operation
    async fn write(
        &self,
        parent: &ParentRef,
        items: Vec<Value>,
        fingerprint: Option<Value>,
        activity: &str,
    ) -> Result<(), CollectionError> {
        let mut body = Map::new();
        body.insert(self.spec.list_field.clone(), Value::Array(items));
        if let (Some(field), Some(fingerprint)) = (&self.spec.fingerprint_field, fingerprint) {
            body.insert(field.clone(), fingerprint);
        }

        let url = self.parent_url(parent);
        let operation = self
            .client
            .patch(&url, &Value::Object(body))
            .await
            .map_err(|source| CollectionError::Request {
                activity: activity.to_string(),
                source,
            })?;

        self.waiter.wait(self.client, operation, activity).await?;
        Ok(())
    }
}
