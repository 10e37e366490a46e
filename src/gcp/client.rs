//! GCP Client
//!
//! Main client for interacting with GCP APIs, combining authentication,
//! HTTP functionality and the per-session lock registry.

use super::auth::GcpCredentials;
use super::http::{GcpHttpClient, HttpError};
use crate::lock::MutexRegistry;
use crate::version::{ApiVersion, ProductLine};
use serde_json::Value;
use std::sync::Arc;

pub const DEFAULT_COMPUTE_ENDPOINT: &str = "https://compute.googleapis.com";
pub const DEFAULT_CONTAINER_ENDPOINT: &str = "https://container.googleapis.com";

/// Main GCP client
#[derive(Clone)]
pub struct GcpClient {
    pub credentials: GcpCredentials,
    pub http: GcpHttpClient,
    pub project_id: String,
    pub region: String,
    compute_endpoint: String,
    container_endpoint: String,
    locks: Arc<MutexRegistry>,
}

impl GcpClient {
    /// Create a new GCP client using Application Default Credentials
    pub async fn new(project_id: &str, region: &str) -> Result<Self, HttpError> {
        let credentials = GcpCredentials::new().await?;
        Self::with_credentials(credentials, project_id, region)
    }

    pub fn with_credentials(
        credentials: GcpCredentials,
        project_id: &str,
        region: &str,
    ) -> Result<Self, HttpError> {
        Ok(Self {
            credentials,
            http: GcpHttpClient::new()?,
            project_id: project_id.to_string(),
            region: region.to_string(),
            compute_endpoint: DEFAULT_COMPUTE_ENDPOINT.to_string(),
            container_endpoint: DEFAULT_CONTAINER_ENDPOINT.to_string(),
            locks: Arc::new(MutexRegistry::new()),
        })
    }

    /// Point Compute Engine calls somewhere else (private endpoints, tests)
    pub fn with_compute_endpoint(mut self, endpoint: &str) -> Self {
        self.compute_endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn with_container_endpoint(mut self, endpoint: &str) -> Self {
        self.container_endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    /// Share a lock registry between clients
    pub fn with_locks(mut self, locks: Arc<MutexRegistry>) -> Self {
        self.locks = locks;
        self
    }

    pub fn locks(&self) -> &MutexRegistry {
        &self.locks
    }

    /// Get the current access token
    pub async fn get_token(&self) -> Result<String, HttpError> {
        self.credentials.get_token().await
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str) -> Result<Value, HttpError> {
        let token = self.get_token().await?;
        self.http.get(url, &token).await
    }

    /// Make a POST request to a GCP API
    pub async fn post(&self, url: &str, body: Option<&Value>) -> Result<Value, HttpError> {
        let token = self.get_token().await?;
        self.http.post(&with_request_id(url), &token, body).await
    }

    /// Make a PATCH request to a GCP API
    pub async fn patch(&self, url: &str, body: &Value) -> Result<Value, HttpError> {
        let token = self.get_token().await?;
        self.http.patch(&with_request_id(url), &token, body).await
    }

    /// Make a DELETE request to a GCP API
    pub async fn delete(&self, url: &str) -> Result<Value, HttpError> {
        let token = self.get_token().await?;
        self.http.delete(&with_request_id(url), &token).await
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build a project-scoped URL for any product line
    pub fn api_url(&self, line: ProductLine, version: ApiVersion, path: &str) -> String {
        match line {
            ProductLine::Compute => self.compute_url(version, path),
            ProductLine::Container => format!(
                "{}/{}/projects/{}/{}",
                self.container_endpoint,
                version.url_segment(),
                self.project_id,
                path
            ),
        }
    }

    /// Build Compute Engine API URL
    pub fn compute_url(&self, version: ApiVersion, path: &str) -> String {
        format!(
            "{}/compute/{}/projects/{}/{}",
            self.compute_endpoint,
            version.url_segment(),
            self.project_id,
            path
        )
    }

    /// Build zonal Compute Engine API URL
    pub fn compute_zonal_url(&self, version: ApiVersion, zone: &str, resource: &str) -> String {
        self.compute_url(version, &format!("zones/{}/{}", zone, resource))
    }

    /// Build regional Compute Engine API URL
    pub fn compute_regional_url(&self, version: ApiVersion, resource: &str) -> String {
        self.compute_url(version, &format!("regions/{}/{}", self.region, resource))
    }

    /// Build global Compute Engine API URL
    pub fn compute_global_url(&self, version: ApiVersion, resource: &str) -> String {
        self.compute_url(version, &format!("global/{}", resource))
    }
}

/// Tag a mutating request so the API can deduplicate retries of it
fn with_request_id(url: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}requestId={}", url, separator, uuid::Uuid::new_v4())
}
