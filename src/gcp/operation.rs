//! Long-running operation wait
//!
//! Mutating Compute Engine calls answer with an operation resource. The caller
//! blocks on it here until it reports `DONE` or the per-operation timeout
//! expires. Retrying failed operations is not this module's business.

use super::client::GcpClient;
use super::http::HttpError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(20 * 60);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("Timed out after {timeout:?} waiting for {activity}")]
    Timeout { activity: String, timeout: Duration },

    #[error("Error waiting for {activity}: {message}")]
    Failed { activity: String, message: String },

    #[error("Operation for {activity} has no selfLink to poll")]
    MissingSelfLink { activity: String },

    #[error("Error polling operation for {activity}: {source}")]
    Poll {
        activity: String,
        #[source]
        source: HttpError,
    },
}

/// Blocks until an operation returned by a mutating call completes
#[async_trait]
pub trait OperationWaiter: Send + Sync {
    async fn wait(
        &self,
        client: &GcpClient,
        operation: Value,
        activity: &str,
    ) -> Result<(), OperationError>;
}

/// Polls a Compute Engine operation through its `selfLink`
#[derive(Debug, Clone)]
pub struct ComputeOperationWaiter {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl ComputeOperationWaiter {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    async fn poll_until_done(
        &self,
        client: &GcpClient,
        mut operation: Value,
        activity: &str,
    ) -> Result<(), OperationError> {
        loop {
            match operation.get("status").and_then(|s| s.as_str()) {
                // Not an operation resource; nothing to wait on
                None => return Ok(()),
                Some("DONE") => return operation_result(&operation, activity),
                Some(status) => {
                    tracing::debug!("Waiting for {}: {}", activity, status);
                }
            }

            let self_link = operation
                .get("selfLink")
                .and_then(|s| s.as_str())
                .ok_or_else(|| OperationError::MissingSelfLink {
                    activity: activity.to_string(),
                })?
                .to_string();

            tokio::time::sleep(self.poll_interval).await;
            operation = client
                .get(&self_link)
                .await
                .map_err(|source| OperationError::Poll {
                    activity: activity.to_string(),
                    source,
                })?;
        }
    }
}

impl Default for ComputeOperationWaiter {
    fn default() -> Self {
        Self::new(DEFAULT_OPERATION_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

#[async_trait]
impl OperationWaiter for ComputeOperationWaiter {
    async fn wait(
        &self,
        client: &GcpClient,
        operation: Value,
        activity: &str,
    ) -> Result<(), OperationError> {
        tokio::time::timeout(self.timeout, self.poll_until_done(client, operation, activity))
            .await
            .map_err(|_| OperationError::Timeout {
                activity: activity.to_string(),
                timeout: self.timeout,
            })?
    }
}

/// Turn a finished operation's `error.errors` into a failure
fn operation_result(operation: &Value, activity: &str) -> Result<(), OperationError> {
    let Some(errors) = operation
        .get("error")
        .and_then(|e| e.get("errors"))
        .and_then(|e| e.as_array())
        .filter(|e| !e.is_empty())
    else {
        return Ok(());
    };

    let message = errors
        .iter()
        .map(|e| {
            let code = e.get("code").and_then(|c| c.as_str()).unwrap_or("UNKNOWN");
            let msg = e.get("message").and_then(|m| m.as_str()).unwrap_or("-");
            format!("{}: {}", code, msg)
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(OperationError::Failed {
        activity: activity.to_string(),
        message,
    })
}
