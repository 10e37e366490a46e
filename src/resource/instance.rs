//! VM instances, sent through GA or beta depending on the fields they use
//!
//! Callers describe an instance in the beta shape, which is a superset of
//! GA. When no beta-only feature is active the value is converted down to the
//! GA shape and sent to the `v1` surface.

use serde_json::Value;
use thiserror::Error;

use super::data::ResourceData;
use super::registry::get_resource;
use crate::api::compute::{beta, v1};
use crate::api::request_body;
use crate::convert::{convert, from_document, ConvertError};
use crate::gcp::client::GcpClient;
use crate::gcp::http::HttpError;
use crate::gcp::operation::{OperationError, OperationWaiter};
use crate::version::{ApiVersion, FeatureSet, ResolveMode, VersionError};

const INSTANCE_RESOURCE: &str = "compute-instance";

#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("Resource definition {0} is not registered")]
    MissingDefinition(&'static str),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("Error {activity}: {source}")]
    Request {
        activity: String,
        #[source]
        source: HttpError,
    },

    #[error(transparent)]
    Operation(#[from] OperationError),
}

pub struct InstanceClient<'a> {
    client: &'a GcpClient,
    waiter: &'a dyn OperationWaiter,
    features: FeatureSet,
}

impl<'a> InstanceClient<'a> {
    pub fn new(client: &'a GcpClient, waiter: &'a dyn OperationWaiter) -> Result<Self, InstanceError> {
        let def = get_resource(INSTANCE_RESOURCE)
            .ok_or(InstanceError::MissingDefinition(INSTANCE_RESOURCE))?;
        Ok(Self {
            client,
            waiter,
            features: def.feature_set()?,
        })
    }

    /// Create the instance and wait for it. Returns the version that was used.
    pub async fn insert(
        &self,
        zone: &str,
        instance: &beta::Instance,
        data: &dyn ResourceData,
    ) -> Result<ApiVersion, InstanceError> {
        let version = self.features.resolve(data, ResolveMode::AtCreate);
        let body = match version {
            ApiVersion::V1 => {
                let ga: v1::Instance = convert(instance)?;
                request_body(&ga)?
            }
            _ => request_body(instance)?,
        };

        let activity = format!("creating instance {:?} in {}", instance.name, zone);
        tracing::info!("{} via compute {}", activity, version);

        let url = self.client.compute_zonal_url(version, zone, "instances");
        let operation = self
            .client
            .post(&url, Some(&body))
            .await
            .map_err(|source| InstanceError::Request {
                activity: activity.clone(),
                source,
            })?;

        self.waiter.wait(self.client, operation, &activity).await?;
        Ok(version)
    }

    /// Read an instance through the beta surface so every field is visible
    pub async fn get(&self, zone: &str, name: &str) -> Result<Option<beta::Instance>, InstanceError> {
        let url = self.client.compute_zonal_url(
            self.features.line().most_capable(),
            zone,
            &format!("instances/{}", urlencoding::encode(name)),
        );

        let doc: Value = match self.client.get(&url).await {
            Ok(doc) => doc,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(source) => {
                return Err(InstanceError::Request {
                    activity: format!("reading instance {:?} in {}", name, zone),
                    source,
                })
            }
        };

        Ok(Some(from_document(doc)?))
    }
}
