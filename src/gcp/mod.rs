//! GCP API interaction module
//!
//! This module provides the transport the rest of the crate builds on:
//! authentication, the HTTP client, and long-running operation waits.
//!
//! # Module Structure
//!
//! - [`auth`] - GCP authentication using Application Default Credentials
//! - [`client`] - Main GCP client for making API requests
//! - [`http`] - HTTP utilities for REST API calls
//! - [`operation`] - Polling of long-running operations
//!
//! # Example
//!
//! ```ignore
//! use gcp_plane::gcp::client::GcpClient;
//! use gcp_plane::version::ApiVersion;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = GcpClient::new("my-project", "us-central1").await?;
//!     let router = client.get(&client.compute_regional_url(ApiVersion::V1, "routers/r1")).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod operation;
