//! Resource abstraction layer
//!
//! Resource definitions are loaded from JSON files at compile time, so a new
//! versioned resource or embedded collection is a registry entry, not code.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches resource definitions from embedded JSON
//! - [`data`] - Declared configuration and prior state, as the resolver sees them
//! - [`embedded`] - Registry-driven CRUD for embedded collection elements
//! - [`instance`] - VM instances sent through GA or beta
//!
//! # Example
//!
//! ```ignore
//! use gcp_plane::collection::ParentRef;
//! use gcp_plane::gcp::operation::ComputeOperationWaiter;
//! use gcp_plane::resource::{get_collection, EmbeddedResource};
//!
//! async fn drop_nat(client: &GcpClient) -> anyhow::Result<()> {
//!     let waiter = ComputeOperationWaiter::default();
//!     let def = get_collection("compute-router-nat").unwrap();
//!     let nat = EmbeddedResource::new(client, &waiter, def)?;
//!     nat.delete(&ParentRef::new("us-central1", "r1"), "nat-a", &JsonResourceData::default())
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod data;
pub mod embedded;
pub mod instance;
mod registry;

pub use data::{JsonResourceData, ResourceData};
pub use embedded::EmbeddedResource;
pub use instance::{InstanceClient, InstanceError};
pub use registry::*;
